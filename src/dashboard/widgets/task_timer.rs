use super::{private_key, Widget, WidgetSeed, TASK_DURATION_NS, TASK_NS};
use crate::dashboard::dashboard::DashboardContext;
use crate::store::Store;
use eframe::egui;
use std::time::{Duration, Instant};

const DEFAULT_TASK: &str = "My Important Task";
const DEFAULT_MINUTES: u32 = 15;
const MAX_MINUTES: u32 = 600;

/// Countdown for a single named task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskTimer {
    minutes: u32,
    remaining: u32,
    running: bool,
    completed: bool,
}

impl TaskTimer {
    pub fn new(minutes: u32) -> Self {
        let minutes = minutes.clamp(1, MAX_MINUTES);
        Self {
            minutes,
            remaining: minutes * 60,
            running: false,
            completed: false,
        }
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Change the duration. Zero is rejected and large values are capped.
    /// Restarts the countdown.
    pub fn set_minutes(&mut self, minutes: u32) -> bool {
        if minutes == 0 {
            return false;
        }
        self.minutes = minutes.min(MAX_MINUTES);
        self.reset();
        true
    }

    pub fn toggle(&mut self) {
        if self.completed {
            return;
        }
        self.running = !self.running;
    }

    pub fn reset(&mut self) {
        self.remaining = self.minutes * 60;
        self.running = false;
        self.completed = false;
    }

    pub fn tick(&mut self) {
        if !self.running {
            return;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            self.completed = true;
        }
    }

    pub fn progress(&self) -> f32 {
        let full = (self.minutes * 60).max(1) as f32;
        1.0 - self.remaining as f32 / full
    }

    pub fn display(&self) -> String {
        format!("{:02}:{:02}", self.remaining / 60, self.remaining % 60)
    }
}

pub struct TaskTimerWidget {
    task_key: String,
    duration_key: String,
    store: Store,
    task: String,
    timer: TaskTimer,
    next_tick: Option<Instant>,
}

impl TaskTimerWidget {
    pub fn new(seed: &WidgetSeed<'_>) -> Self {
        let task_key = private_key(TASK_NS, seed.id);
        let duration_key = private_key(TASK_DURATION_NS, seed.id);
        let task = seed.store.get(&task_key, DEFAULT_TASK.to_string());
        let minutes = seed.store.get(&duration_key, DEFAULT_MINUTES);
        Self {
            task_key,
            duration_key,
            store: seed.store.clone(),
            task,
            timer: TaskTimer::new(minutes),
            next_tick: None,
        }
    }

    fn advance(&mut self, now: Instant) {
        if !self.timer.is_running() {
            self.next_tick = None;
            return;
        }
        let mut next = self.next_tick.unwrap_or(now + Duration::from_secs(1));
        while self.timer.is_running() && now >= next {
            self.timer.tick();
            next += Duration::from_secs(1);
        }
        self.next_tick = self.timer.is_running().then_some(next);
    }

    pub fn set_task(&mut self, task: String) {
        self.task = task;
        self.store.set(&self.task_key, &self.task);
    }

    pub fn set_minutes(&mut self, minutes: u32) {
        if self.timer.set_minutes(minutes) {
            self.next_tick = None;
            self.store.set(&self.duration_key, &self.timer.minutes());
        }
    }
}

impl Widget for TaskTimerWidget {
    fn render(&mut self, ui: &mut egui::Ui, _ctx: &DashboardContext<'_>) {
        self.advance(Instant::now());

        let mut task = self.task.clone();
        if ui
            .add(egui::TextEdit::singleline(&mut task).hint_text("Task name"))
            .changed()
        {
            self.set_task(task);
        }
        let mut minutes = self.timer.minutes();
        ui.horizontal(|ui| {
            ui.label("Duration");
            let resp = ui.add_enabled(
                !self.timer.is_running(),
                egui::DragValue::new(&mut minutes).clamp_range(1..=MAX_MINUTES).suffix(" min"),
            );
            if resp.changed() {
                self.set_minutes(minutes);
            }
        });

        ui.vertical_centered(|ui| {
            if self.timer.is_completed() {
                ui.label(egui::RichText::new("Task completed!").strong().color(ui.visuals().selection.bg_fill));
            }
            ui.label(egui::RichText::new(self.timer.display()).size(28.0).monospace());
            ui.add(egui::ProgressBar::new(self.timer.progress()));
            ui.horizontal(|ui| {
                let label = if self.timer.is_running() { "⏸ Pause" } else { "▶ Start" };
                if ui
                    .add_enabled(!self.timer.is_completed(), egui::Button::new(label))
                    .clicked()
                {
                    self.timer.toggle();
                    self.next_tick = None;
                    self.advance(Instant::now());
                }
                if ui.button("⟲ Reset").clicked() {
                    self.timer.reset();
                    self.next_tick = None;
                }
            });
        });

        if self.timer.is_running() {
            ui.ctx().request_repaint_after(Duration::from_millis(250));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completes_at_zero() {
        let mut timer = TaskTimer::new(1);
        timer.toggle();
        for _ in 0..60 {
            timer.tick();
        }
        assert!(timer.is_completed());
        assert!(!timer.is_running());
        assert_eq!(timer.display(), "00:00");
        assert_eq!(timer.progress(), 1.0);
        timer.toggle();
        assert!(!timer.is_running());
        timer.reset();
        assert_eq!(timer.display(), "01:00");
    }

    #[test]
    fn zero_duration_is_rejected() {
        let mut timer = TaskTimer::new(15);
        assert!(!timer.set_minutes(0));
        assert_eq!(timer.minutes(), 15);
    }

    #[test]
    fn task_and_duration_persist() {
        let store = Store::in_memory();
        let seed = WidgetSeed {
            id: "task-timer-1",
            store: &store,
        };
        let mut widget = TaskTimerWidget::new(&seed);
        assert_eq!(widget.task, DEFAULT_TASK);
        assert_eq!(widget.timer.minutes(), DEFAULT_MINUTES);
        widget.set_task("Write report".into());
        widget.set_minutes(45);

        let reloaded = TaskTimerWidget::new(&seed);
        assert_eq!(reloaded.task, "Write report");
        assert_eq!(reloaded.timer.display(), "45:00");
    }

    #[test]
    fn oversized_stored_duration_is_clamped() {
        let store = Store::in_memory();
        crate::transfer::import_document(&store, r#"{"task-timer-duration-task-timer-1": 100000000}"#)
            .unwrap();
        let widget = TaskTimerWidget::new(&WidgetSeed {
            id: "task-timer-1",
            store: &store,
        });
        assert_eq!(widget.timer.minutes(), MAX_MINUTES);
        assert_eq!(widget.timer.display(), "600:00");

        let mut timer = TaskTimer::new(5);
        assert!(timer.set_minutes(u32::MAX));
        assert_eq!(timer.remaining_secs(), MAX_MINUTES * 60);
    }
}
