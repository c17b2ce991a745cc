use super::{Widget, WidgetSeed};
use crate::dashboard::dashboard::DashboardContext;
use chrono::{DateTime, Local};
use eframe::egui;
use std::time::Duration;

pub struct DigitalClockWidget;

impl DigitalClockWidget {
    pub fn new(_seed: &WidgetSeed<'_>) -> Self {
        Self
    }
}

pub fn clock_text(now: &DateTime<Local>) -> String {
    now.format("%H:%M:%S").to_string()
}

impl Widget for DigitalClockWidget {
    fn render(&mut self, ui: &mut egui::Ui, ctx: &DashboardContext<'_>) {
        ui.vertical_centered(|ui| {
            ui.label(
                egui::RichText::new(clock_text(&ctx.now))
                    .size(36.0)
                    .monospace()
                    .strong(),
            );
            ui.label(ctx.now.format("%A, %B %-d").to_string());
        });
        ui.ctx().request_repaint_after(Duration::from_secs(1));
    }
}
