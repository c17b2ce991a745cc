use crate::gui::background::{self, BackgroundError};
use crate::store::Store;
use crate::theme::color::parse_hex;
use crate::theme::presets::{ColorChannel, CUSTOM_PRESET, PRESETS};
use crate::theme::ThemeEngine;
use crate::transfer::{self, TransferError};
use eframe::egui;
use egui_toast::ToastKind;
use std::path::Path;

/// Side effects of a settings panel frame that the shell has to carry out.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsOutcome {
    Notify { kind: ToastKind, text: String },
    /// The store was replaced; everything must be re-read from it.
    Reload,
}

fn notify(kind: ToastKind, text: impl Into<String>) -> SettingsOutcome {
    SettingsOutcome::Notify {
        kind,
        text: text.into(),
    }
}

/// Channel order used by the color pickers.
const PICKER_ORDER: [ColorChannel; 4] = [
    ColorChannel::Primary,
    ColorChannel::Background,
    ColorChannel::Foreground,
    ColorChannel::Ring,
];

pub struct SettingsPanel {
    pub open: bool,
    synced: bool,
    background_url: String,
    background_file: String,
    export_dir: String,
    import_file: String,
}

impl SettingsPanel {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            open: false,
            synced: false,
            background_url: String::new(),
            background_file: String::new(),
            export_dir: data_dir.display().to_string(),
            import_file: String::new(),
        }
    }

    pub fn ui(&mut self, ctx: &egui::Context, theme: &mut ThemeEngine, store: &Store) -> Vec<SettingsOutcome> {
        let mut outcomes = Vec::new();
        if !self.open {
            self.synced = false;
            return outcomes;
        }
        if !self.synced {
            self.sync_from(theme);
            self.synced = true;
        }
        let mut open = self.open;
        egui::SidePanel::right("settings_panel")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("Settings");
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button("✖").clicked() {
                            open = false;
                        }
                    });
                });
                ui.separator();
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.theme_section(ui, theme);
                    ui.separator();
                    self.background_section(ui, theme, &mut outcomes);
                    ui.separator();
                    self.transfer_section(ui, store, &mut outcomes);
                });
            });
        self.open = open;
        outcomes
    }

    /// Fill the URL field from the stored backdrop. Embedded images stay out
    /// of the text field.
    fn sync_from(&mut self, theme: &ThemeEngine) {
        self.background_url = match theme.state().background_image.as_deref() {
            Some(src) if !src.starts_with("data:") => src.to_string(),
            _ => String::new(),
        };
    }

    fn theme_section(&mut self, ui: &mut egui::Ui, theme: &mut ThemeEngine) {
        ui.label(egui::RichText::new("Theme").strong());
        let active = theme.state().preset_name.clone();
        ui.horizontal_wrapped(|ui| {
            for preset in PRESETS {
                if ui.selectable_label(active == preset.name, preset.label).clicked() {
                    theme.select_preset(preset.name);
                }
            }
            if ui.selectable_label(active == CUSTOM_PRESET, "Custom").clicked() {
                theme.select_preset(CUSTOM_PRESET);
            }
        });
        ui.add_space(4.0);
        egui::Grid::new("theme_color_pickers")
            .num_columns(2)
            .show(ui, |ui| {
                for channel in PICKER_ORDER {
                    ui.label(channel.label());
                    let current = theme
                        .state()
                        .custom_colors
                        .as_ref()
                        .map(|c| c.resolved(channel))
                        .unwrap_or_else(|| channel.default_hex().to_string());
                    let mut rgb = parse_hex(&current).unwrap_or([0, 0, 0]);
                    if ui.color_edit_button_srgb(&mut rgb).changed() {
                        let hex = format!("#{}", hex::encode(rgb));
                        if let Err(err) = theme.set_custom_color(channel, &hex) {
                            tracing::warn!(channel = ?channel, error = %err, "rejected custom color");
                        }
                    }
                    ui.end_row();
                }
            });
    }

    fn background_section(&mut self, ui: &mut egui::Ui, theme: &mut ThemeEngine, outcomes: &mut Vec<SettingsOutcome>) {
        ui.label(egui::RichText::new("Background Image").strong());
        ui.horizontal(|ui| {
            ui.add(egui::TextEdit::singleline(&mut self.background_url).hint_text("Image URL"));
            if ui.button("Apply").clicked() {
                theme.set_background_image(&self.background_url);
            }
        });
        ui.horizontal(|ui| {
            ui.add(egui::TextEdit::singleline(&mut self.background_file).hint_text("Image file path"));
            if ui.button("Load").clicked() {
                match apply_background_file(theme, Path::new(self.background_file.trim())) {
                    Ok(()) => self.background_file.clear(),
                    Err(err) => outcomes.push(notify(ToastKind::Error, err.to_string())),
                }
            }
        });
        if theme.state().background_image.is_some() && ui.button("Remove Background").clicked() {
            theme.clear_background_image();
            self.background_url.clear();
        }
    }

    fn transfer_section(&mut self, ui: &mut egui::Ui, store: &Store, outcomes: &mut Vec<SettingsOutcome>) {
        ui.label(egui::RichText::new("Data").strong());
        ui.horizontal(|ui| {
            ui.add(egui::TextEdit::singleline(&mut self.export_dir).hint_text("Export folder"));
            if ui.button("Export").clicked() {
                outcomes.push(run_export(store, Path::new(self.export_dir.trim())));
            }
        });
        ui.horizontal(|ui| {
            ui.add(egui::TextEdit::singleline(&mut self.import_file).hint_text("Settings file"));
            if ui.button("Import").clicked() {
                outcomes.extend(run_import(store, Path::new(self.import_file.trim())));
            }
        });
    }
}

/// Embed a local image file as the dashboard background.
pub fn apply_background_file(theme: &mut ThemeEngine, path: &Path) -> Result<(), BackgroundError> {
    let uri = background::data_uri_from_file(path)?;
    theme.set_background_image(&uri);
    Ok(())
}

pub fn run_export(store: &Store, dir: &Path) -> SettingsOutcome {
    let today = chrono::Local::now().date_naive();
    match transfer::export_to_dir(store, dir, today) {
        Ok(path) => notify(ToastKind::Success, format!("Settings exported to {}", path.display())),
        Err(err) => {
            tracing::error!(error = %err, "export failed");
            notify(ToastKind::Error, format!("Export Failed: {err}"))
        }
    }
}

pub fn run_import(store: &Store, path: &Path) -> Vec<SettingsOutcome> {
    match transfer::import_from_file(store, path) {
        Ok(_) => vec![
            notify(ToastKind::Success, "Settings imported"),
            SettingsOutcome::Reload,
        ],
        Err(err) => vec![notify(ToastKind::Error, import_failure_text(&err))],
    }
}

fn import_failure_text(err: &TransferError) -> String {
    format!("Import Failed: Invalid settings file. {err}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_import_reports_and_keeps_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "not json").unwrap();
        let store = Store::in_memory();
        store.set("widgets", &Vec::<u8>::new());

        let outcomes = run_import(&store, &path);
        assert_eq!(outcomes.len(), 1);
        match &outcomes[0] {
            SettingsOutcome::Notify { kind, text } => {
                assert_eq!(*kind, ToastKind::Error);
                assert!(text.starts_with("Import Failed: Invalid settings file."));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert!(store.contains("widgets"));
    }

    #[test]
    fn successful_import_requests_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("good.json");
        std::fs::write(&path, r#"{"dashboard-theme": {"name": "rose"}}"#).unwrap();
        let store = Store::in_memory();
        let outcomes = run_import(&store, &path);
        assert_eq!(outcomes.last(), Some(&SettingsOutcome::Reload));
    }

    #[test]
    fn export_writes_into_folder() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::in_memory();
        store.set("notes-widget-notes-1", "hi");
        let outcome = run_export(&store, dir.path());
        assert!(matches!(outcome, SettingsOutcome::Notify { kind: ToastKind::Success, .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn oversized_background_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.png");
        std::fs::write(&path, vec![0u8; background::MAX_IMAGE_BYTES + 10]).unwrap();
        let mut theme = ThemeEngine::load(Store::in_memory());
        let err = apply_background_file(&mut theme, &path).unwrap_err();
        assert_eq!(err.to_string(), "Image size should not exceed 2MB.");
        assert_eq!(theme.state().background_image, None);
    }

    #[test]
    fn url_field_shows_stored_background() {
        let store = Store::in_memory();
        let mut theme = ThemeEngine::load(store.clone());
        theme.set_background_image("https://example.com/sky.jpg");
        let mut panel = SettingsPanel::new(Path::new("."));
        let ctx = egui::Context::default();

        panel.open = true;
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            panel.ui(ctx, &mut theme, &store);
        });
        assert_eq!(panel.background_url, "https://example.com/sky.jpg");

        theme.set_background_image("data:image/png;base64,AAAA");
        panel.sync_from(&theme);
        assert!(panel.background_url.is_empty());
    }
}
