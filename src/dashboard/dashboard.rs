use crate::dashboard::grid::{GridItem, GridView, ItemChrome};
use crate::dashboard::layout::{LayoutItem, WidgetInstance};
use crate::dashboard::widgets::{Widget, WidgetRegistry, WidgetSeed};
use crate::store::Store;
use crate::weather::WeatherClient;
use chrono::{DateTime, Local};
use eframe::egui;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Something the user did on the grid that the layout manager must apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardEvent {
    Remove(String),
    Layout(Vec<LayoutItem>),
}

/// Context shared with widgets at render time.
pub struct DashboardContext<'a> {
    pub store: &'a Store,
    pub weather: &'a WeatherClient,
    pub now: DateTime<Local>,
}

struct SlotRuntime {
    kind: String,
    widget: Box<dyn Widget>,
}

/// Runtime side of the dashboard: one live widget per placed instance.
pub struct Dashboard {
    registry: Arc<WidgetRegistry>,
    store: Store,
    runtime: HashMap<String, SlotRuntime>,
    warned: HashSet<String>,
    grid: GridView,
    row_height: f32,
    margin: f32,
}

impl Dashboard {
    pub fn new(registry: Arc<WidgetRegistry>, store: Store, row_height: f32, margin: f32) -> Self {
        Self {
            registry,
            store,
            runtime: HashMap::new(),
            warned: HashSet::new(),
            grid: GridView::new(),
            row_height,
            margin,
        }
    }

    pub fn registry(&self) -> &WidgetRegistry {
        &self.registry
    }

    /// Create widgets for new instances, drop widgets of removed ones and
    /// reuse the rest.
    pub fn sync(&mut self, instances: &[WidgetInstance]) {
        let mut reusable: HashMap<String, SlotRuntime> = self.runtime.drain().collect();
        let mut runtime = HashMap::with_capacity(instances.len());
        for inst in instances {
            match reusable.remove(&inst.id) {
                Some(slot) if slot.kind == inst.kind => {
                    runtime.insert(inst.id.clone(), slot);
                }
                _ => {
                    let seed = WidgetSeed {
                        id: &inst.id,
                        store: &self.store,
                    };
                    match self.registry.create(&inst.kind, &seed) {
                        Some(widget) => {
                            runtime.insert(
                                inst.id.clone(),
                                SlotRuntime {
                                    kind: inst.kind.clone(),
                                    widget,
                                },
                            );
                        }
                        None => {
                            if self.warned.insert(inst.id.clone()) {
                                tracing::warn!(widget = %inst.id, kind = %inst.kind, "skipping widget of unknown kind");
                            }
                        }
                    }
                }
            }
        }
        self.runtime = runtime;
    }

    pub fn live_widgets(&self) -> usize {
        self.runtime.len()
    }

    pub fn is_dragging(&self) -> bool {
        self.grid.is_dragging()
    }

    pub fn ui(
        &mut self,
        ui: &mut egui::Ui,
        instances: &[WidgetInstance],
        columns: i32,
        ctx: &DashboardContext<'_>,
    ) -> Vec<DashboardEvent> {
        self.sync(instances);

        let items: Vec<GridItem> = instances
            .iter()
            .filter(|inst| self.runtime.contains_key(&inst.id))
            .map(GridItem::from)
            .collect();

        let Self {
            registry,
            runtime,
            grid,
            row_height,
            margin,
            ..
        } = self;

        let mut removed = None;
        let response = grid.show(ui, &items, columns, *row_height, *margin, |ui, item| {
            let Some(slot) = runtime.get_mut(&item.id) else {
                return ItemChrome::default();
            };
            let (title, icon) = registry
                .lookup(&slot.kind)
                .map(|d| (d.name, d.icon))
                .unwrap_or(("Widget", "?"));
            render_slot(ui, &item.id, title, icon, slot, ctx, &mut removed)
        });

        let mut events = Vec::new();
        if let Some(update) = response.update {
            events.push(DashboardEvent::Layout(update));
        }
        if let Some(id) = removed {
            events.push(DashboardEvent::Remove(id));
        }
        events
    }
}

fn render_slot(
    ui: &mut egui::Ui,
    id: &str,
    title: &str,
    icon: &str,
    slot: &mut SlotRuntime,
    ctx: &DashboardContext<'_>,
    removed: &mut Option<String>,
) -> ItemChrome {
    let size = ui.max_rect().size();
    let frame = egui::Frame::group(ui.style())
        .fill(ui.visuals().window_fill)
        .rounding(8.0)
        .inner_margin(egui::Margin::same(8.0));
    frame
        .show(ui, |ui| {
            ui.set_min_size((size - egui::vec2(16.0, 16.0)).max(egui::Vec2::ZERO));
            let handle = ui
                .horizontal(|ui| {
                    let handle = ui
                        .add(
                            egui::Label::new(egui::RichText::new(format!("{icon} {title}")).strong())
                                .sense(egui::Sense::drag()),
                        )
                        .on_hover_cursor(egui::CursorIcon::Grab);
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button("✖").on_hover_text("Remove widget").clicked() {
                            *removed = Some(id.to_string());
                        }
                        slot.widget.header_ui(ui, ctx);
                    });
                    handle
                })
                .inner;
            ui.separator();
            egui::ScrollArea::vertical()
                .id_source(("widget-body", id))
                .auto_shrink([false; 2])
                .show(ui, |ui| slot.widget.render(ui, ctx));
            ItemChrome {
                handle: Some(handle),
            }
        })
        .inner
}
