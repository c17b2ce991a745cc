use crate::dashboard::widgets::WidgetRegistry;
use eframe::egui;

/// Catalog of widget kinds with an Add button for each.
#[derive(Default)]
pub struct AddWidgetPanel {
    pub open: bool,
}

impl AddWidgetPanel {
    /// Returns the kind the user asked to add, if any.
    pub fn ui(&mut self, ctx: &egui::Context, registry: &WidgetRegistry) -> Option<String> {
        if !self.open {
            return None;
        }
        let mut chosen = None;
        let mut open = self.open;
        egui::SidePanel::left("add_widget_panel")
            .resizable(false)
            .default_width(240.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("Add Widget");
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button("✖").clicked() {
                            open = false;
                        }
                    });
                });
                ui.separator();
                egui::ScrollArea::vertical().show(ui, |ui| {
                    chosen = catalog_list(ui, registry);
                });
            });
        self.open = open;
        chosen
    }
}

fn catalog_list(ui: &mut egui::Ui, registry: &WidgetRegistry) -> Option<String> {
    let mut chosen = None;
    for desc in registry.catalog() {
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(desc.icon).size(18.0));
            ui.label(desc.name);
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Add").clicked() {
                    chosen = Some(desc.kind.to_string());
                }
            });
        });
    }
    chosen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_panel_adds_nothing() {
        let ctx = egui::Context::default();
        let registry = WidgetRegistry::with_defaults();
        let mut panel = AddWidgetPanel::default();
        let mut chosen = Some(String::new());
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            chosen = panel.ui(ctx, &registry);
        });
        assert_eq!(chosen, None);
    }

    #[test]
    fn lists_every_kind() {
        let registry = WidgetRegistry::with_defaults();
        egui::__run_test_ui(|ui| {
            assert_eq!(catalog_list(ui, &registry), None);
        });
        assert_eq!(registry.catalog().count(), 10);
    }
}
