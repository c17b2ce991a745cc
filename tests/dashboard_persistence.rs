use widgetopia::dashboard::layout::LAYOUT_KEY;
use widgetopia::dashboard::widgets::{NotesWidget, WidgetRegistry, WidgetSeed};
use widgetopia::dashboard::LayoutManager;
use widgetopia::store::Store;
use tempfile::tempdir;

#[test]
fn notes_survive_a_full_reload() {
    let dir = tempdir().unwrap();
    let registry = WidgetRegistry::with_defaults();

    let id = {
        let store = Store::open_dir(dir.path());
        let mut layout = LayoutManager::load(store.clone(), &registry, 12);
        assert!(layout.is_empty());
        let id = layout.add_instance("notes", &registry).unwrap();
        let inst = layout.get(&id).unwrap();
        assert_eq!((inst.w, inst.h), (3, 4));

        let mut notes = NotesWidget::new(&WidgetSeed { id: &id, store: &store });
        notes.set_text("hello");
        id
    };

    let store = Store::open_dir(dir.path());
    let layout = LayoutManager::load(store.clone(), &registry, 12);
    assert_eq!(layout.len(), 1);
    assert_eq!(layout.list_instances()[0].id, id);
    let notes = NotesWidget::new(&WidgetSeed { id: &id, store: &store });
    assert_eq!(notes.text(), "hello");
}

#[test]
fn removing_a_widget_purges_its_records_on_disk() {
    let dir = tempdir().unwrap();
    let registry = WidgetRegistry::with_defaults();
    let store = Store::open_dir(dir.path());
    let mut layout = LayoutManager::load(store.clone(), &registry, 12);
    let id = layout.add_instance("notes", &registry).unwrap();
    NotesWidget::new(&WidgetSeed { id: &id, store: &store }).set_text("bye");

    assert!(layout.remove_instance(&id));

    let reopened = Store::open_dir(dir.path());
    assert_eq!(reopened.get_raw(LAYOUT_KEY).as_deref(), Some("[]"));
    assert_eq!(reopened.keys(), vec![LAYOUT_KEY.to_string()]);
}

#[test]
fn corrupt_storage_starts_empty() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("storage.json"), "{ nope").unwrap();
    let store = Store::open_dir(dir.path());
    assert!(store.keys().is_empty());
    assert!(dir.path().join("storage.corrupt").exists());
}
