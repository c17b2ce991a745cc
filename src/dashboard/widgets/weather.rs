use super::{private_key, Widget, WidgetSeed, WEATHER_CITY_NS};
use crate::dashboard::dashboard::DashboardContext;
use crate::store::Store;
use crate::weather::{WeatherClient, WeatherIcon, WeatherReply, WeatherReport};
use eframe::egui;
use std::sync::mpsc::{channel, Receiver, Sender};

const DEFAULT_CITY: &str = "New York";

pub const POPULAR_CITIES: &[&str] = &[
    "New York",
    "London",
    "Paris",
    "Tokyo",
    "Delhi",
    "Sydney",
    "Toronto",
    "Berlin",
    "Moscow",
    "Singapore",
];

#[derive(Debug, Clone, PartialEq, Eq)]
enum WeatherView {
    Idle,
    Loading,
    Ready(WeatherReport),
    Failed(String),
}

pub struct WeatherWidget {
    key: String,
    store: Store,
    city: String,
    draft: String,
    editing: bool,
    view: WeatherView,
    generation: u64,
    tx: Sender<WeatherReply>,
    rx: Receiver<WeatherReply>,
}

impl WeatherWidget {
    pub fn new(seed: &WidgetSeed<'_>) -> Self {
        let key = private_key(WEATHER_CITY_NS, seed.id);
        let city: String = seed.store.get(&key, DEFAULT_CITY.to_string());
        let (tx, rx) = channel();
        Self {
            key,
            store: seed.store.clone(),
            draft: city.clone(),
            city,
            editing: false,
            view: WeatherView::Idle,
            generation: 0,
            tx,
            rx,
        }
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    /// Persist a new city and start a fresh lookup for it. Blank input is
    /// ignored.
    pub fn set_city(&mut self, city: &str, client: &WeatherClient) -> bool {
        let city = city.trim().to_string();
        if city.is_empty() {
            return false;
        }
        self.store.set(&self.key, &city);
        self.city = city;
        self.draft = self.city.clone();
        self.refresh(client);
        true
    }

    fn refresh(&mut self, client: &WeatherClient) {
        self.generation += 1;
        self.view = WeatherView::Loading;
        client.spawn_fetch(&self.city, self.generation, self.tx.clone());
    }

    /// Apply finished lookups, ignoring replies for superseded requests.
    fn drain_replies(&mut self) {
        while let Ok(reply) = self.rx.try_recv() {
            if reply.generation != self.generation {
                continue;
            }
            self.view = match reply.result {
                Ok(report) => WeatherView::Ready(report),
                Err(err) => WeatherView::Failed(err.to_string()),
            };
        }
    }

    fn city_editor(&mut self, ui: &mut egui::Ui, client: &WeatherClient) {
        let mut chosen = None;
        ui.horizontal(|ui| {
            let resp = ui.text_edit_singleline(&mut self.draft);
            let submitted = resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("Save").clicked() || submitted {
                chosen = Some(self.draft.clone());
            }
        });
        ui.label(egui::RichText::new("Popular cities").weak());
        ui.horizontal_wrapped(|ui| {
            for city in POPULAR_CITIES {
                if ui.small_button(*city).clicked() {
                    chosen = Some(city.to_string());
                }
            }
        });
        if let Some(city) = chosen {
            if self.set_city(&city, client) {
                self.editing = false;
            }
        }
        ui.separator();
    }
}

impl Widget for WeatherWidget {
    fn header_ui(&mut self, ui: &mut egui::Ui, _ctx: &DashboardContext<'_>) {
        if ui.small_button("✎").on_hover_text("Change city").clicked() {
            self.editing = !self.editing;
            self.draft = self.city.clone();
        }
    }

    fn render(&mut self, ui: &mut egui::Ui, ctx: &DashboardContext<'_>) {
        if self.view == WeatherView::Idle {
            self.refresh(ctx.weather);
        }
        self.drain_replies();

        if self.editing {
            self.city_editor(ui, ctx.weather);
        }

        match &self.view {
            WeatherView::Idle | WeatherView::Loading => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Loading...");
                });
                ui.ctx().request_repaint_after(std::time::Duration::from_millis(200));
            }
            WeatherView::Failed(message) => {
                ui.colored_label(ui.visuals().error_fg_color, message);
            }
            WeatherView::Ready(report) => {
                ui.vertical_centered(|ui| {
                    let icon = WeatherIcon::from_condition(&report.condition);
                    ui.label(egui::RichText::new(icon.glyph()).size(32.0));
                    ui.label(
                        egui::RichText::new(format!("{}°{}", report.temperature, report.unit))
                            .size(28.0)
                            .strong(),
                    );
                    ui.label(&report.condition);
                    ui.label(
                        egui::RichText::new(format!("{}, {}", report.city, report.country)).weak(),
                    );
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::WeatherError;

    #[test]
    fn stale_replies_are_ignored() {
        let store = Store::in_memory();
        let client = WeatherClient::new(None);
        let mut widget = WeatherWidget::new(&WidgetSeed {
            id: "weather-1",
            store: &store,
        });
        assert_eq!(widget.city(), DEFAULT_CITY);

        assert!(widget.set_city("Paris", &client));
        assert!(widget.set_city("London", &client));
        let stale = WeatherReply {
            generation: 1,
            result: Ok(WeatherReport {
                city: "Paris".into(),
                country: "France".into(),
                temperature: 20,
                condition: "Sunny".into(),
                unit: "C".into(),
            }),
        };
        widget.tx.send(stale).unwrap();
        widget.drain_replies();
        assert_eq!(
            widget.view,
            WeatherView::Failed(WeatherError::MissingApiKey.to_string())
        );
    }

    #[test]
    fn blank_city_is_ignored() {
        let store = Store::in_memory();
        let client = WeatherClient::new(None);
        let mut widget = WeatherWidget::new(&WidgetSeed {
            id: "weather-1",
            store: &store,
        });
        assert!(widget.set_city("Berlin", &client));
        let generation = widget.generation;

        assert!(!widget.set_city("   ", &client));
        assert_eq!(widget.city(), "Berlin");
        assert_eq!(widget.generation, generation);
        assert_eq!(store.get::<String>("weather-city-weather-1", String::new()), "Berlin");
    }

    #[test]
    fn city_is_stored_per_instance() {
        let store = Store::in_memory();
        let client = WeatherClient::new(None);
        let mut a = WeatherWidget::new(&WidgetSeed {
            id: "weather-1",
            store: &store,
        });
        a.set_city(" Tokyo ", &client);
        let b = WeatherWidget::new(&WidgetSeed {
            id: "weather-2",
            store: &store,
        });
        assert_eq!(b.city(), DEFAULT_CITY);
        let a_again = WeatherWidget::new(&WidgetSeed {
            id: "weather-1",
            store: &store,
        });
        assert_eq!(a_again.city(), "Tokyo");
    }
}
