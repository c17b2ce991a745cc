use crate::dashboard::dashboard::DashboardContext;
use crate::store::Store;
use eframe::egui;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

mod analog_clock;
mod calendar;
mod digital_clock;
mod doodle;
mod notes;
mod pomodoro;
mod stopwatch;
mod task_timer;
mod todo_list;
mod weather;

pub use analog_clock::AnalogClockWidget;
pub use calendar::CalendarWidget;
pub use digital_clock::DigitalClockWidget;
pub use doodle::{DoodleWidget, Stroke};
pub use notes::NotesWidget;
pub use pomodoro::{PomodoroTimer, PomodoroWidget};
pub use stopwatch::{format_stopwatch, StopwatchWidget};
pub use task_timer::{TaskTimer, TaskTimerWidget};
pub use todo_list::{TodoItem, TodoListWidget};
pub use weather::WeatherWidget;

/// Widget trait implemented by all dashboard widgets.
pub trait Widget: Send {
    fn render(&mut self, ui: &mut egui::Ui, ctx: &DashboardContext<'_>);

    /// Extra controls drawn in the frame header, next to the title.
    fn header_ui(&mut self, _ui: &mut egui::Ui, _ctx: &DashboardContext<'_>) {}
}

/// Inputs handed to a widget constructor.
pub struct WidgetSeed<'a> {
    pub id: &'a str,
    pub store: &'a Store,
}

/// Default and minimum grid footprint of a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultSize {
    pub w: i32,
    pub h: i32,
    #[serde(rename = "minW")]
    pub min_w: i32,
    #[serde(rename = "minH")]
    pub min_h: i32,
}

impl DefaultSize {
    pub const fn new(w: i32, h: i32, min_w: i32, min_h: i32) -> Self {
        Self { w, h, min_w, min_h }
    }
}

/// Static descriptor of a widget kind.
#[derive(Clone)]
pub struct WidgetDescriptor {
    pub kind: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
    pub default_size: DefaultSize,
    ctor: Arc<dyn Fn(&WidgetSeed<'_>) -> Box<dyn Widget> + Send + Sync>,
}

impl WidgetDescriptor {
    pub fn new<T: Widget + 'static>(
        kind: &'static str,
        name: &'static str,
        icon: &'static str,
        default_size: DefaultSize,
        build: fn(&WidgetSeed<'_>) -> T,
    ) -> Self {
        Self {
            kind,
            name,
            icon,
            default_size,
            ctor: Arc::new(move |seed: &WidgetSeed<'_>| -> Box<dyn Widget> {
                Box::new(build(seed))
            }),
        }
    }

    pub fn create(&self, seed: &WidgetSeed<'_>) -> Box<dyn Widget> {
        (self.ctor)(seed)
    }
}

/// Closed catalog of widget kinds, in display order.
#[derive(Clone, Default)]
pub struct WidgetRegistry {
    map: HashMap<String, WidgetDescriptor>,
    order: Vec<String>,
}

impl WidgetRegistry {
    pub fn with_defaults() -> Self {
        let mut reg = Self::default();
        reg.register(WidgetDescriptor::new(
            "digital-clock",
            "Digital Clock",
            "🕒",
            DefaultSize::new(3, 2, 2, 1),
            DigitalClockWidget::new,
        ));
        reg.register(WidgetDescriptor::new(
            "analog-clock",
            "Analog Clock",
            "🕰",
            DefaultSize::new(2, 4, 2, 4),
            AnalogClockWidget::new,
        ));
        reg.register(WidgetDescriptor::new(
            "stopwatch",
            "Stopwatch",
            "⏱",
            DefaultSize::new(2, 4, 2, 3),
            StopwatchWidget::new,
        ));
        reg.register(WidgetDescriptor::new(
            "pomodoro",
            "Pomodoro Timer",
            "⏳",
            DefaultSize::new(2, 4, 2, 3),
            PomodoroWidget::new,
        ));
        reg.register(WidgetDescriptor::new(
            "notes",
            "Notes",
            "📝",
            DefaultSize::new(3, 4, 2, 3),
            NotesWidget::new,
        ));
        reg.register(WidgetDescriptor::new(
            "calendar",
            "Calendar",
            "📅",
            DefaultSize::new(3, 6, 3, 6),
            CalendarWidget::new,
        ));
        reg.register(WidgetDescriptor::new(
            "todo-list",
            "To-Do List",
            "☑",
            DefaultSize::new(3, 5, 2, 4),
            TodoListWidget::new,
        ));
        reg.register(WidgetDescriptor::new(
            "weather",
            "Weather",
            "⛅",
            DefaultSize::new(3, 4, 2, 3),
            WeatherWidget::new,
        ));
        reg.register(WidgetDescriptor::new(
            "doodle",
            "Doodle Pad",
            "✏",
            DefaultSize::new(4, 5, 3, 4),
            DoodleWidget::new,
        ));
        reg.register(WidgetDescriptor::new(
            "task-timer",
            "Task Timer",
            "📋",
            DefaultSize::new(3, 4, 2, 3),
            TaskTimerWidget::new,
        ));
        reg
    }

    pub fn register(&mut self, descriptor: WidgetDescriptor) {
        let kind = descriptor.kind.to_string();
        if self.map.insert(kind.clone(), descriptor).is_none() {
            self.order.push(kind);
        }
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.map.contains_key(kind)
    }

    pub fn lookup(&self, kind: &str) -> Option<&WidgetDescriptor> {
        self.map.get(kind)
    }

    pub fn default_size(&self, kind: &str) -> Option<DefaultSize> {
        self.map.get(kind).map(|d| d.default_size)
    }

    pub fn create(&self, kind: &str, seed: &WidgetSeed<'_>) -> Option<Box<dyn Widget>> {
        self.map.get(kind).map(|d| d.create(seed))
    }

    /// Descriptors in catalog order.
    pub fn catalog(&self) -> impl Iterator<Item = &WidgetDescriptor> {
        self.order.iter().filter_map(|kind| self.map.get(kind))
    }

    pub fn kinds(&self) -> Vec<String> {
        self.order.clone()
    }
}

pub(crate) const NOTES_NS: &str = "notes-widget";
pub(crate) const TODO_NS: &str = "todo-list-widget";
pub(crate) const DOODLE_NS: &str = "doodle-widget";
pub(crate) const DOODLE_COLOR_NS: &str = "doodle-color";
pub(crate) const TASK_NS: &str = "task-timer-task";
pub(crate) const TASK_DURATION_NS: &str = "task-timer-duration";
pub(crate) const POMODORO_WORK_NS: &str = "pomodoro-work";
pub(crate) const POMODORO_BREAK_NS: &str = "pomodoro-break";
pub(crate) const WEATHER_CITY_NS: &str = "weather-city";

/// Id prefix to the private namespaces an instance with that prefix may own.
/// Independent of the registry so stale kinds are still cleaned up.
const PRIVATE_NAMESPACES: &[(&str, &[&str])] = &[
    ("notes-", &[NOTES_NS]),
    ("todo-list-", &[TODO_NS]),
    ("doodle-", &[DOODLE_NS, DOODLE_COLOR_NS]),
    ("task-timer-", &[TASK_NS, TASK_DURATION_NS, "task-timer-widget"]),
    ("pomodoro-", &[POMODORO_WORK_NS, POMODORO_BREAK_NS]),
    ("weather-", &[WEATHER_CITY_NS]),
];

/// Durable key of a private record.
pub fn private_key(namespace: &str, id: &str) -> String {
    format!("{namespace}-{id}")
}

/// Every private key an instance with `id` may have written.
pub fn private_keys_for(id: &str) -> Vec<String> {
    PRIVATE_NAMESPACES
        .iter()
        .filter(|(prefix, _)| id.starts_with(prefix))
        .flat_map(|(_, namespaces)| namespaces.iter().map(|ns| private_key(ns, id)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_keeps_registration_order() {
        let reg = WidgetRegistry::with_defaults();
        let kinds: Vec<_> = reg.catalog().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![
                "digital-clock",
                "analog-clock",
                "stopwatch",
                "pomodoro",
                "notes",
                "calendar",
                "todo-list",
                "weather",
                "doodle",
                "task-timer"
            ]
        );
    }

    #[test]
    fn lookup_reports_unknown_kinds() {
        let reg = WidgetRegistry::with_defaults();
        assert!(reg.lookup("spreadsheet").is_none());
        assert_eq!(reg.default_size("notes"), Some(DefaultSize::new(3, 4, 2, 3)));
    }

    #[test]
    fn private_keys_follow_id_prefix() {
        assert_eq!(
            private_keys_for("notes-1700000000000"),
            vec!["notes-widget-notes-1700000000000".to_string()]
        );
        let doodle = private_keys_for("doodle-5");
        assert!(doodle.contains(&"doodle-widget-doodle-5".to_string()));
        assert!(doodle.contains(&"doodle-color-doodle-5".to_string()));
        assert!(private_keys_for("digital-clock-5").is_empty());
    }
}
