use super::{private_key, Widget, WidgetSeed, POMODORO_BREAK_NS, POMODORO_WORK_NS};
use crate::dashboard::dashboard::DashboardContext;
use crate::store::Store;
use eframe::egui;
use std::time::{Duration, Instant};

const DEFAULT_WORK_MINUTES: u32 = 25;
const DEFAULT_BREAK_MINUTES: u32 = 5;
const MAX_WORK_MINUTES: u32 = 120;
const MAX_BREAK_MINUTES: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PomodoroMode {
    Work,
    Break,
}

/// Work/break countdown. Advanced one second at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PomodoroTimer {
    work_minutes: u32,
    break_minutes: u32,
    mode: PomodoroMode,
    remaining: u32,
    running: bool,
}

impl PomodoroTimer {
    pub fn new(work_minutes: u32, break_minutes: u32) -> Self {
        let work_minutes = work_minutes.clamp(1, MAX_WORK_MINUTES);
        Self {
            work_minutes,
            break_minutes: break_minutes.clamp(1, MAX_BREAK_MINUTES),
            mode: PomodoroMode::Work,
            remaining: work_minutes * 60,
            running: false,
        }
    }

    pub fn mode(&self) -> PomodoroMode {
        self.mode
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn work_minutes(&self) -> u32 {
        self.work_minutes
    }

    pub fn break_minutes(&self) -> u32 {
        self.break_minutes
    }

    fn full_secs(&self) -> u32 {
        match self.mode {
            PomodoroMode::Work => self.work_minutes * 60,
            PomodoroMode::Break => self.break_minutes * 60,
        }
    }

    pub fn toggle(&mut self) {
        self.running = !self.running;
    }

    pub fn reset(&mut self) {
        self.running = false;
        self.remaining = self.full_secs();
    }

    /// Advance one second. At zero the timer switches mode and stops.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.mode = match self.mode {
                PomodoroMode::Work => PomodoroMode::Break,
                PomodoroMode::Break => PomodoroMode::Work,
            };
            self.remaining = self.full_secs();
            self.running = false;
        }
    }

    pub fn set_lengths(&mut self, work_minutes: u32, break_minutes: u32) {
        self.work_minutes = work_minutes.clamp(1, MAX_WORK_MINUTES);
        self.break_minutes = break_minutes.clamp(1, MAX_BREAK_MINUTES);
        if !self.running {
            self.remaining = self.full_secs();
        }
    }

    /// Fraction of the current period already elapsed.
    pub fn progress(&self) -> f32 {
        let full = self.full_secs().max(1) as f32;
        1.0 - self.remaining as f32 / full
    }

    pub fn display(&self) -> String {
        format!("{:02}:{:02}", self.remaining / 60, self.remaining % 60)
    }
}

pub struct PomodoroWidget {
    id: String,
    store: Store,
    timer: PomodoroTimer,
    next_tick: Option<Instant>,
    editing: bool,
}

impl PomodoroWidget {
    pub fn new(seed: &WidgetSeed<'_>) -> Self {
        let work = seed
            .store
            .get(&private_key(POMODORO_WORK_NS, seed.id), DEFAULT_WORK_MINUTES);
        let brk = seed
            .store
            .get(&private_key(POMODORO_BREAK_NS, seed.id), DEFAULT_BREAK_MINUTES);
        Self {
            id: seed.id.to_string(),
            store: seed.store.clone(),
            timer: PomodoroTimer::new(work, brk),
            next_tick: None,
            editing: false,
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

    fn save_lengths(&self) {
        let work_key = private_key(POMODORO_WORK_NS, &self.id);
        let break_key = private_key(POMODORO_BREAK_NS, &self.id);
        let (work, brk) = (self.timer.work_minutes(), self.timer.break_minutes());
        self.store.batch(|tx| {
            tx.set(&work_key, &work);
            tx.set(&break_key, &brk);
        });
    }
}

impl Widget for PomodoroWidget {
    fn header_ui(&mut self, ui: &mut egui::Ui, _ctx: &DashboardContext<'_>) {
        if ui.small_button("⚙").on_hover_text("Timer lengths").clicked() {
            self.editing = !self.editing;
        }
    }

    fn render(&mut self, ui: &mut egui::Ui, _ctx: &DashboardContext<'_>) {
        self.advance(Instant::now());

        if self.editing {
            let mut work = self.timer.work_minutes();
            let mut brk = self.timer.break_minutes();
            let mut changed = false;
            ui.horizontal(|ui| {
                ui.label("Work");
                changed |= ui
                    .add(egui::DragValue::new(&mut work).clamp_range(1..=MAX_WORK_MINUTES).suffix(" min"))
                    .changed();
            });
            ui.horizontal(|ui| {
                ui.label("Break");
                changed |= ui
                    .add(egui::DragValue::new(&mut brk).clamp_range(1..=MAX_BREAK_MINUTES).suffix(" min"))
                    .changed();
            });
            if changed {
                self.timer.set_lengths(work, brk);
                self.save_lengths();
            }
            ui.separator();
        }

        ui.vertical_centered(|ui| {
            let mode = match self.timer.mode() {
                PomodoroMode::Work => "Work",
                PomodoroMode::Break => "Break",
            };
            ui.label(mode);
            ui.label(egui::RichText::new(self.timer.display()).size(30.0).monospace());
            ui.add(egui::ProgressBar::new(self.timer.progress()));
            ui.horizontal(|ui| {
                let label = if self.timer.is_running() { "⏸ Pause" } else { "▶ Start" };
                if ui.button(label).clicked() {
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
    fn counts_down_and_switches_to_break() {
        let mut timer = PomodoroTimer::new(1, 2);
        timer.toggle();
        for _ in 0..59 {
            timer.tick();
        }
        assert_eq!(timer.display(), "00:01");
        timer.tick();
        assert_eq!(timer.mode(), PomodoroMode::Break);
        assert_eq!(timer.remaining_secs(), 120);
        assert!(!timer.is_running());
    }

    #[test]
    fn paused_timer_does_not_move() {
        let mut timer = PomodoroTimer::new(25, 5);
        timer.tick();
        assert_eq!(timer.display(), "25:00");
        assert_eq!(timer.progress(), 0.0);
    }

    #[test]
    fn lengths_are_persisted_per_instance() {
        let store = Store::in_memory();
        let seed = WidgetSeed {
            id: "pomodoro-1",
            store: &store,
        };
        let mut widget = PomodoroWidget::new(&seed);
        assert_eq!(widget.timer.work_minutes(), 25);
        widget.timer.set_lengths(50, 10);
        widget.save_lengths();

        let reloaded = PomodoroWidget::new(&seed);
        assert_eq!(reloaded.timer.display(), "50:00");
        assert_eq!(reloaded.timer.break_minutes(), 10);

        let other = PomodoroWidget::new(&WidgetSeed {
            id: "pomodoro-2",
            store: &store,
        });
        assert_eq!(other.timer.work_minutes(), 25);
    }

    #[test]
    fn oversized_stored_lengths_are_clamped() {
        let store = Store::in_memory();
        crate::transfer::import_document(
            &store,
            r#"{"pomodoro-work-pomodoro-1": 100000000, "pomodoro-break-pomodoro-1": 4294967295}"#,
        )
        .unwrap();
        let widget = PomodoroWidget::new(&WidgetSeed {
            id: "pomodoro-1",
            store: &store,
        });
        assert_eq!(widget.timer.work_minutes(), MAX_WORK_MINUTES);
        assert_eq!(widget.timer.break_minutes(), MAX_BREAK_MINUTES);
        assert_eq!(widget.timer.display(), "120:00");

        let mut timer = PomodoroTimer::new(0, 0);
        assert_eq!((timer.work_minutes(), timer.break_minutes()), (1, 1));
        timer.set_lengths(u32::MAX, u32::MAX);
        assert_eq!(timer.remaining_secs(), MAX_WORK_MINUTES * 60);
    }

    #[test]
    fn advance_catches_up_whole_seconds() {
        let store = Store::in_memory();
        let mut widget = PomodoroWidget::new(&WidgetSeed {
            id: "pomodoro-3",
            store: &store,
        });
        let t0 = Instant::now();
        widget.timer.toggle();
        widget.advance(t0);
        widget.advance(t0 + Duration::from_millis(3500));
        assert_eq!(widget.timer.remaining_secs(), 25 * 60 - 3);
    }
}
