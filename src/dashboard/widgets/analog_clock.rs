use super::{Widget, WidgetSeed};
use crate::dashboard::dashboard::DashboardContext;
use chrono::Timelike;
use eframe::egui;
use std::time::Duration;

pub struct AnalogClockWidget;

impl AnalogClockWidget {
    pub fn new(_seed: &WidgetSeed<'_>) -> Self {
        Self
    }
}

/// Hour, minute and second hand angles in degrees, clockwise from twelve.
pub fn hand_angles(hour: u32, minute: u32, second: u32) -> (f32, f32, f32) {
    let hours = (hour % 12) as f32 * 30.0 + minute as f32 / 2.0;
    let minutes = minute as f32 * 6.0;
    let seconds = second as f32 * 6.0;
    (hours, minutes, seconds)
}

fn hand_end(center: egui::Pos2, degrees: f32, length: f32) -> egui::Pos2 {
    let radians = degrees.to_radians();
    center + egui::vec2(radians.sin(), -radians.cos()) * length
}

impl Widget for AnalogClockWidget {
    fn render(&mut self, ui: &mut egui::Ui, ctx: &DashboardContext<'_>) {
        let side = ui.available_width().min(ui.available_height()).max(60.0);
        let (rect, _) = ui.allocate_exact_size(egui::vec2(ui.available_width(), side), egui::Sense::hover());
        let painter = ui.painter_at(rect);
        let visuals = ui.visuals();
        let center = rect.center();
        let radius = side / 2.0 - 4.0;
        let fg = visuals.text_color();
        let accent = visuals.selection.bg_fill;

        painter.circle_stroke(center, radius, egui::Stroke::new(2.0, fg));
        for tick in 0..12 {
            let deg = tick as f32 * 30.0;
            painter.line_segment(
                [hand_end(center, deg, radius * 0.85), hand_end(center, deg, radius)],
                egui::Stroke::new(2.0, fg),
            );
        }

        let (h, m, s) = hand_angles(ctx.now.hour(), ctx.now.minute(), ctx.now.second());
        painter.line_segment([center, hand_end(center, h, radius * 0.5)], egui::Stroke::new(4.0, fg));
        painter.line_segment([center, hand_end(center, m, radius * 0.75)], egui::Stroke::new(3.0, fg));
        painter.line_segment([center, hand_end(center, s, radius * 0.85)], egui::Stroke::new(1.5, accent));
        painter.circle_filled(center, 4.0, accent);

        ui.ctx().request_repaint_after(Duration::from_secs(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hands_point_where_expected() {
        assert_eq!(hand_angles(0, 0, 0), (0.0, 0.0, 0.0));
        assert_eq!(hand_angles(3, 30, 15), (105.0, 180.0, 90.0));
        assert_eq!(hand_angles(15, 0, 45), (90.0, 0.0, 270.0));
    }

    #[test]
    fn twelve_o_clock_points_up() {
        let end = hand_end(egui::pos2(0.0, 0.0), 0.0, 10.0);
        assert!(end.x.abs() < 1e-4);
        assert!((end.y + 10.0).abs() < 1e-4);
    }
}
