use super::{private_key, Widget, WidgetSeed, NOTES_NS};
use crate::dashboard::dashboard::DashboardContext;
use crate::store::Store;
use eframe::egui;

const DEFAULT_NOTE: &str = "My new note...";

pub struct NotesWidget {
    key: String,
    store: Store,
    text: String,
}

impl NotesWidget {
    pub fn new(seed: &WidgetSeed<'_>) -> Self {
        let key = private_key(NOTES_NS, seed.id);
        let text = seed.store.get(&key, DEFAULT_NOTE.to_string());
        Self {
            key,
            store: seed.store.clone(),
            text,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.store.set(&self.key, &self.text);
    }
}

impl Widget for NotesWidget {
    fn render(&mut self, ui: &mut egui::Ui, _ctx: &DashboardContext<'_>) {
        let resp = ui.add_sized(
            ui.available_size(),
            egui::TextEdit::multiline(&mut self.text).hint_text("Write something..."),
        );
        if resp.changed() {
            self.store.set(&self.key, &self.text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_placeholder_and_persists_edits() {
        let store = Store::in_memory();
        let seed = WidgetSeed {
            id: "notes-1",
            store: &store,
        };
        let mut notes = NotesWidget::new(&seed);
        assert_eq!(notes.text(), DEFAULT_NOTE);
        assert!(!store.contains("notes-widget-notes-1"));

        notes.set_text("hello");
        assert_eq!(NotesWidget::new(&seed).text(), "hello");
    }
}
