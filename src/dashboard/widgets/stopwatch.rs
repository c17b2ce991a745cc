use super::{Widget, WidgetSeed};
use crate::dashboard::dashboard::DashboardContext;
use eframe::egui;
use std::time::{Duration, Instant};

/// `MM:SS.cc` for an elapsed time in milliseconds.
pub fn format_stopwatch(ms: u128) -> String {
    let minutes = ms / 60_000;
    let seconds = (ms / 1000) % 60;
    let centis = (ms / 10) % 100;
    format!("{minutes:02}:{seconds:02}.{centis:02}")
}

#[derive(Default)]
pub struct StopwatchWidget {
    accumulated: Duration,
    started: Option<Instant>,
}

impl StopwatchWidget {
    pub fn new(_seed: &WidgetSeed<'_>) -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }

    pub fn elapsed_at(&self, now: Instant) -> Duration {
        self.accumulated
            + self
                .started
                .map(|s| now.saturating_duration_since(s))
                .unwrap_or_default()
    }

    pub fn toggle_at(&mut self, now: Instant) {
        match self.started.take() {
            Some(start) => self.accumulated += now.saturating_duration_since(start),
            None => self.started = Some(now),
        }
    }

    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
        self.started = None;
    }
}

impl Widget for StopwatchWidget {
    fn render(&mut self, ui: &mut egui::Ui, _ctx: &DashboardContext<'_>) {
        let now = Instant::now();
        ui.vertical_centered(|ui| {
            ui.label(
                egui::RichText::new(format_stopwatch(self.elapsed_at(now).as_millis()))
                    .size(30.0)
                    .monospace(),
            );
            ui.horizontal(|ui| {
                let label = if self.is_running() { "⏸ Pause" } else { "▶ Start" };
                if ui.button(label).clicked() {
                    self.toggle_at(Instant::now());
                }
                if ui.button("⟲ Reset").clicked() {
                    self.reset();
                }
            });
        });
        if self.is_running() {
            ui.ctx().request_repaint_after(Duration::from_millis(10));
        }
    }
}
