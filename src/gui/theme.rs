use crate::theme::color::hsl_to_color32;
use crate::theme::presets::ColorChannel;
use crate::theme::AppliedTheme;
use eframe::egui;

fn channel_color(theme: &AppliedTheme, channel: ColorChannel) -> Option<egui::Color32> {
    match hsl_to_color32(theme.variables.get(channel)) {
        Ok(color) => Some(color),
        Err(err) => {
            tracing::warn!(channel = ?channel, error = %err, "theme variable is not a valid HSL triple");
            None
        }
    }
}

fn mix(a: egui::Color32, b: egui::Color32, t: f32) -> egui::Color32 {
    let lerp = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    egui::Color32::from_rgb(lerp(a.r(), b.r()), lerp(a.g(), b.g()), lerp(a.b(), b.b()))
}

/// Map the applied theme variables onto egui visuals. Falls back to `defaults`
/// when a variable cannot be parsed.
pub fn applied_theme_to_visuals(theme: &AppliedTheme, defaults: &egui::Visuals) -> egui::Visuals {
    let (Some(background), Some(foreground), Some(primary), Some(ring)) = (
        channel_color(theme, ColorChannel::Background),
        channel_color(theme, ColorChannel::Foreground),
        channel_color(theme, ColorChannel::Primary),
        channel_color(theme, ColorChannel::Ring),
    ) else {
        return defaults.clone();
    };

    let mut visuals = if theme.dark {
        egui::Visuals::dark()
    } else {
        egui::Visuals::light()
    };
    visuals.dark_mode = theme.dark;
    visuals.panel_fill = background;
    visuals.window_fill = mix(background, foreground, 0.05);
    visuals.extreme_bg_color = mix(background, foreground, 0.1);
    visuals.faint_bg_color = mix(background, foreground, 0.03);
    visuals.override_text_color = Some(foreground);
    visuals.hyperlink_color = primary;

    visuals.widgets.noninteractive.bg_fill = background;
    visuals.widgets.noninteractive.bg_stroke.color = mix(background, foreground, 0.15);
    visuals.widgets.inactive.bg_fill = mix(background, foreground, 0.1);
    visuals.widgets.inactive.weak_bg_fill = mix(background, foreground, 0.1);
    visuals.widgets.hovered.bg_fill = mix(background, primary, 0.35);
    visuals.widgets.hovered.weak_bg_fill = mix(background, primary, 0.35);
    visuals.widgets.hovered.bg_stroke.color = ring;
    visuals.widgets.active.bg_fill = primary;
    visuals.widgets.active.weak_bg_fill = primary;
    visuals.widgets.active.bg_stroke.color = ring;

    visuals.selection.bg_fill = primary;
    visuals.selection.stroke.color = ring;

    visuals
}
