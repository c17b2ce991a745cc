//! Dashboard shell: header, side panels and the widget grid.

mod add_widget_panel;
pub mod background;
mod settings_panel;
pub mod theme;

pub use add_widget_panel::AddWidgetPanel;
pub use settings_panel::{SettingsOutcome, SettingsPanel};

use crate::dashboard::{Dashboard, DashboardContext, DashboardEvent, LayoutManager, WidgetRegistry};
use crate::settings::Settings;
use crate::store::Store;
use crate::theme::{AppliedTheme, ThemeEngine, ThemeSubscription};
use crate::weather::WeatherClient;
use background::Background;
use eframe::egui;
use egui_toast::{Toast, ToastKind, ToastOptions, Toasts};
use std::sync::Arc;

/// Everything that is read from the store when the dashboard mounts.
pub struct Mounted {
    pub layout: LayoutManager,
    pub theme: ThemeEngine,
    subscription: ThemeSubscription,
    dashboard: Dashboard,
}

enum Session {
    Loading,
    Mounted(Box<Mounted>),
}

pub struct WidgetopiaApp {
    settings: Settings,
    settings_path: String,
    store: Store,
    registry: Arc<WidgetRegistry>,
    weather: WeatherClient,
    session: Session,
    base_visuals: egui::Visuals,
    background: Background,
    add_panel: AddWidgetPanel,
    settings_panel: SettingsPanel,
    toasts: Toasts,
    window_size: Option<(f32, f32)>,
}

impl WidgetopiaApp {
    pub fn new(settings: Settings, settings_path: String, store: Store) -> Self {
        let weather = WeatherClient::new(settings.weather_api_key());
        let settings_panel = SettingsPanel::new(&settings.data_dir());
        Self {
            window_size: settings.window_size,
            settings,
            settings_path,
            store,
            registry: Arc::new(WidgetRegistry::with_defaults()),
            weather,
            session: Session::Loading,
            base_visuals: egui::Visuals::light(),
            background: Background::default(),
            add_panel: AddWidgetPanel::default(),
            settings_panel,
            toasts: Toasts::new().anchor(egui::Align2::RIGHT_TOP, [10.0, 10.0]),
        }
    }

    pub fn is_mounted(&self) -> bool {
        matches!(self.session, Session::Mounted(_))
    }

    pub fn mounted(&self) -> Option<&Mounted> {
        match &self.session {
            Session::Mounted(m) => Some(&**m),
            Session::Loading => None,
        }
    }

    /// Read layout and theme from the store and build the runtime dashboard.
    pub fn mount(&mut self) {
        let layout = LayoutManager::load(
            self.store.clone(),
            &self.registry,
            self.settings.grid_columns(),
        );
        let theme = ThemeEngine::load(self.store.clone());
        let subscription = theme.subscribe();
        let dashboard = Dashboard::new(
            Arc::clone(&self.registry),
            self.store.clone(),
            self.settings.row_height,
            self.settings.grid_margin,
        );
        tracing::info!(widgets = layout.len(), preset = %theme.state().preset_name, "dashboard mounted");
        self.session = Session::Mounted(Box::new(Mounted {
            layout,
            theme,
            subscription,
            dashboard,
        }));
    }

    /// Drop all live state and mount again from the store.
    pub fn remount(&mut self) {
        self.session = Session::Loading;
        self.mount();
    }

    /// Add an instance of `kind`. The add panel closes once it succeeds.
    pub fn add_widget(&mut self, kind: &str) -> bool {
        let Session::Mounted(m) = &mut self.session else {
            return false;
        };
        match m.layout.add_instance(kind, &self.registry) {
            Ok(_) => {
                self.add_panel.open = false;
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "could not add widget");
                self.notify(ToastKind::Error, err.to_string());
                false
            }
        }
    }

    fn apply_events(&mut self, events: Vec<DashboardEvent>) {
        let Session::Mounted(m) = &mut self.session else {
            return;
        };
        for event in events {
            match event {
                DashboardEvent::Layout(items) => {
                    m.layout.apply_external_layout(&items);
                }
                DashboardEvent::Remove(id) => {
                    m.layout.remove_instance(&id);
                }
            }
        }
    }

    fn notify(&mut self, kind: ToastKind, text: impl Into<String>) {
        let text: String = text.into();
        self.toasts.add(Toast {
            text: text.into(),
            kind,
            options: ToastOptions::default()
                .duration_in_seconds(self.settings.toast_duration as f64),
        });
    }

    fn apply_theme(&mut self, ctx: &egui::Context, applied: &AppliedTheme) {
        ctx.set_visuals(theme::applied_theme_to_visuals(applied, &self.base_visuals));
        self.background.set_source(applied.background_image.clone());
    }

    fn header(&mut self, ctx: &egui::Context, fullscreen: bool) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Widgetopia");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let label = if fullscreen { "Exit Fullscreen" } else { "⛶ Fullscreen" };
                    if ui.button(label).clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(!fullscreen));
                    }
                    if ui
                        .selectable_label(self.settings_panel.open, "⚙ Settings")
                        .clicked()
                    {
                        self.settings_panel.open = !self.settings_panel.open;
                    }
                    if ui
                        .selectable_label(self.add_panel.open, "+ Add Widget")
                        .clicked()
                    {
                        self.add_panel.open = !self.add_panel.open;
                    }
                });
            });
        });
    }

    fn remember_window_size(&mut self, ctx: &egui::Context) {
        if let Some(rect) = ctx.input(|i| i.viewport().inner_rect) {
            self.window_size = Some((rect.width(), rect.height()));
        }
        if ctx.input(|i| i.viewport().close_requested()) && self.window_size != self.settings.window_size {
            self.settings.window_size = self.window_size;
            if let Err(err) = self.settings.save(&self.settings_path) {
                tracing::warn!(error = %err, "failed to save window size");
            }
        }
    }
}

fn empty_state(ui: &mut egui::Ui) {
    ui.vertical_centered(|ui| {
        ui.add_space(ui.available_height() / 3.0);
        ui.heading("Your dashboard is empty.");
        ui.label("Click \"Add Widget\" to get started.");
    });
}

impl eframe::App for WidgetopiaApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.toasts.show(ctx);
        self.remember_window_size(ctx);

        if !self.is_mounted() {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.centered_and_justified(|ui| ui.label("Loading Dashboard..."));
            });
            self.mount();
            ctx.request_repaint();
            return;
        }

        let changed = match &mut self.session {
            Session::Mounted(m) => m.subscription.poll(),
            Session::Loading => None,
        };
        if let Some(applied) = changed {
            self.apply_theme(ctx, &applied);
        }

        let fullscreen = ctx.input(|i| i.viewport().fullscreen.unwrap_or(false));
        if ctx.input(|i| i.key_pressed(egui::Key::F11)) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(!fullscreen));
        } else if fullscreen && ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(false));
        }
        if !fullscreen {
            self.header(ctx, fullscreen);
        }

        if let Some(kind) = self.add_panel.ui(ctx, &self.registry) {
            self.add_widget(&kind);
        }

        let outcomes = match &mut self.session {
            Session::Mounted(m) => self.settings_panel.ui(ctx, &mut m.theme, &self.store),
            Session::Loading => Vec::new(),
        };
        let mut reload = false;
        for outcome in outcomes {
            match outcome {
                SettingsOutcome::Notify { kind, text } => self.notify(kind, text),
                SettingsOutcome::Reload => reload = true,
            }
        }
        if reload {
            self.remount();
            ctx.request_repaint();
            return;
        }

        let mut events = Vec::new();
        let Self {
            session,
            background,
            store,
            weather,
            ..
        } = self;
        let Session::Mounted(m) = session else {
            return;
        };
        egui::CentralPanel::default().show(ctx, |ui| {
            background.paint(ctx, ui.painter(), ui.max_rect());
            if m.layout.is_empty() {
                empty_state(ui);
                return;
            }
            let dash_ctx = DashboardContext {
                store: &*store,
                weather: &*weather,
                now: chrono::Local::now(),
            };
            let instances = m.layout.list_instances().to_vec();
            let columns = m.layout.columns();
            egui::ScrollArea::vertical()
                .id_source("dashboard_scroll")
                .auto_shrink([false; 2])
                .show(ui, |ui| {
                    events = m.dashboard.ui(ui, &instances, columns, &dash_ctx);
                });
        });
        self.apply_events(events);
        // Clocks tick once per second even when nothing else changes.
        ctx.request_repaint_after(std::time::Duration::from_secs(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(store: Store) -> WidgetopiaApp {
        WidgetopiaApp::new(Settings::default(), "unused-settings.json".into(), store)
    }

    #[test]
    fn starts_unmounted_and_mounts_from_store() {
        let store = Store::in_memory();
        store.set_raw("dashboard-theme", r#"{"name":"violet"}"#);
        let mut app = app(store);
        assert!(!app.is_mounted());
        app.mount();
        let mounted = app.mounted().unwrap();
        assert_eq!(mounted.theme.state().preset_name, "violet");
        assert!(mounted.layout.is_empty());
    }

    #[test]
    fn add_and_remove_through_events() {
        let store = Store::in_memory();
        let mut app = app(store.clone());
        app.mount();
        app.add_widget("notes");
        app.add_widget("no-such-widget");
        let id = app.mounted().unwrap().layout.list_instances()[0].id.clone();
        store.set(&format!("notes-widget-{id}"), "hello");

        app.apply_events(vec![DashboardEvent::Remove(id.clone())]);
        assert!(app.mounted().unwrap().layout.is_empty());
        assert!(!store.contains(&format!("notes-widget-{id}")));
    }

    #[test]
    fn add_panel_closes_after_successful_add() {
        let mut app = app(Store::in_memory());
        app.mount();
        app.add_panel.open = true;
        assert!(!app.add_widget("no-such-widget"));
        assert!(app.add_panel.open);
        assert!(app.add_widget("stopwatch"));
        assert!(!app.add_panel.open);
    }

    #[test]
    fn remount_reads_replaced_store() {
        let store = Store::in_memory();
        let mut app = app(store.clone());
        app.mount();
        app.add_widget("calendar");
        crate::transfer::import_document(&store, r#"{"dashboard-theme":{"name":"green"}}"#).unwrap();
        app.remount();
        let mounted = app.mounted().unwrap();
        assert_eq!(mounted.theme.state().preset_name, "green");
        assert!(mounted.layout.is_empty());
    }
}
