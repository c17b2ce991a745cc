use super::{private_key, Widget, WidgetSeed, TODO_NS};
use crate::dashboard::dashboard::DashboardContext;
use crate::store::Store;
use eframe::egui;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: i64,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

pub struct TodoListWidget {
    key: String,
    store: Store,
    items: Vec<TodoItem>,
    input: String,
}

impl TodoListWidget {
    pub fn new(seed: &WidgetSeed<'_>) -> Self {
        let key = private_key(TODO_NS, seed.id);
        let items = seed.store.get(&key, Vec::new());
        Self {
            key,
            store: seed.store.clone(),
            items,
            input: String::new(),
        }
    }

    pub fn items(&self) -> &[TodoItem] {
        &self.items
    }

    fn save(&self) {
        self.store.set(&self.key, &self.items);
    }

    /// Add a trimmed, non-empty entry. Returns `false` for blank input.
    pub fn add(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        let now = chrono::Utc::now().timestamp_millis();
        let id = self.items.iter().map(|t| t.id + 1).max().unwrap_or(now).max(now);
        self.items.push(TodoItem {
            id,
            text: text.to_string(),
            completed: false,
        });
        self.save();
        true
    }

    pub fn toggle(&mut self, id: i64) {
        if let Some(item) = self.items.iter_mut().find(|t| t.id == id) {
            item.completed = !item.completed;
            self.save();
        }
    }

    pub fn remove(&mut self, id: i64) {
        let before = self.items.len();
        self.items.retain(|t| t.id != id);
        if self.items.len() != before {
            self.save();
        }
    }
}

impl Widget for TodoListWidget {
    fn render(&mut self, ui: &mut egui::Ui, _ctx: &DashboardContext<'_>) {
        ui.horizontal(|ui| {
            let resp = ui.add(
                egui::TextEdit::singleline(&mut self.input)
                    .hint_text("Add a new task...")
                    .desired_width(ui.available_width() - 40.0),
            );
            let submitted = resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("+").clicked() || submitted {
                let text = std::mem::take(&mut self.input);
                if !self.add(&text) {
                    self.input = text;
                }
            }
        });
        ui.separator();

        if self.items.is_empty() {
            ui.weak("No tasks yet!");
            return;
        }
        let mut toggle = None;
        let mut remove = None;
        for item in &self.items {
            ui.horizontal(|ui| {
                let mut done = item.completed;
                if ui.checkbox(&mut done, "").changed() {
                    toggle = Some(item.id);
                }
                let mut text = egui::RichText::new(&item.text);
                if item.completed {
                    text = text.strikethrough().weak();
                }
                ui.label(text);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.small_button("🗑").clicked() {
                        remove = Some(item.id);
                    }
                });
            });
        }
        if let Some(id) = toggle {
            self.toggle(id);
        }
        if let Some(id) = remove {
            self.remove(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget(store: &Store, id: &str) -> TodoListWidget {
        TodoListWidget::new(&WidgetSeed { id, store })
    }

    #[test]
    fn add_toggle_remove_persist() {
        let store = Store::in_memory();
        let mut todos = widget(&store, "todo-list-1");
        assert!(!todos.add("   "));
        assert!(todos.add("  buy milk "));
        assert!(todos.add("walk dog"));
        let first = todos.items()[0].id;
        assert_ne!(first, todos.items()[1].id);
        assert_eq!(todos.items()[0].text, "buy milk");

        todos.toggle(first);
        let reloaded = widget(&store, "todo-list-1");
        assert!(reloaded.items()[0].completed);

        todos.remove(first);
        let reloaded = widget(&store, "todo-list-1");
        assert_eq!(reloaded.items().len(), 1);
        assert_eq!(reloaded.items()[0].text, "walk dog");
    }

    #[test]
    fn reads_stored_shape() {
        let store = Store::in_memory();
        store.set_raw(
            "todo-list-widget-todo-list-2",
            r#"[{"id":1,"text":"a","completed":true},{"id":2,"text":"b"}]"#,
        );
        let todos = widget(&store, "todo-list-2");
        assert_eq!(todos.items().len(), 2);
        assert!(todos.items()[0].completed);
        assert!(!todos.items()[1].completed);
    }
}
