//! Draggable, resizable grid with vertical compaction.
//!
//! The grid is driven purely by data: callers pass the current items and get
//! back [`LayoutItem`] batches describing where things ended up.

use crate::dashboard::layout::{LayoutItem, WidgetInstance};
use eframe::egui;

/// Geometry of one grid item in cell units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridItem {
    pub id: String,
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    pub min_w: i32,
    pub min_h: i32,
}

impl GridItem {
    fn collides(&self, other: &GridItem) -> bool {
        self.id != other.id
            && self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y.saturating_add(other.h)
            && other.y < self.y.saturating_add(self.h)
    }

    fn bottom(&self) -> i32 {
        self.y.saturating_add(self.h)
    }

    fn clamp_to(&mut self, cols: i32) {
        self.min_w = self.min_w.clamp(1, cols);
        self.min_h = self.min_h.max(1);
        self.w = self.w.clamp(self.min_w, cols);
        self.h = self.h.max(self.min_h);
        self.x = self.x.clamp(0, cols - self.w);
        self.y = self.y.max(0);
    }

    pub fn to_layout_item(&self) -> LayoutItem {
        LayoutItem {
            id: self.id.clone(),
            x: self.x,
            y: self.y,
            w: self.w,
            h: self.h,
        }
    }
}

impl From<&WidgetInstance> for GridItem {
    fn from(inst: &WidgetInstance) -> Self {
        Self {
            id: inst.id.clone(),
            x: inst.x,
            y: inst.y,
            w: inst.w,
            h: inst.h,
            min_w: inst.min_w.unwrap_or(1),
            min_h: inst.min_h.unwrap_or(1),
        }
    }
}

fn layout_bottom(items: &[GridItem]) -> i32 {
    items.iter().map(GridItem::bottom).max().unwrap_or(0)
}

fn place(mut item: GridItem, placed: &[GridItem], float_up: bool) -> GridItem {
    if float_up {
        item.y = item.y.min(layout_bottom(placed));
        while item.y > 0 {
            let mut candidate = item.clone();
            candidate.y -= 1;
            if placed.iter().any(|p| candidate.collides(p)) {
                break;
            }
            item.y -= 1;
        }
    }
    while let Some(hit) = placed.iter().find(|p| item.collides(p)) {
        item.y = hit.bottom();
    }
    item
}

fn compact_inner(items: &[GridItem], cols: i32, pinned: Option<&str>) -> Vec<GridItem> {
    let cols = cols.max(1);
    let mut out: Vec<GridItem> = items.to_vec();
    for item in &mut out {
        item.clamp_to(cols);
    }
    let mut order: Vec<usize> = (0..out.len()).collect();
    order.sort_by_key(|&i| (out[i].y, out[i].x));

    let mut placed: Vec<GridItem> = Vec::with_capacity(out.len());
    if let Some(pin) = pinned.and_then(|id| out.iter().position(|it| it.id == id)) {
        order.retain(|&i| i != pin);
        placed.push(out[pin].clone());
    }
    for i in order {
        let item = place(out[i].clone(), &placed, true);
        placed.push(item.clone());
        out[i] = item;
    }
    out
}

/// Vertical compaction: items are clamped into the columns and floated up as
/// far as collisions allow. Output order matches input order.
pub fn compact(items: &[GridItem], cols: i32) -> Vec<GridItem> {
    compact_inner(items, cols, None)
}

/// Place `id` at `(x, y)` and compact everything else around it.
pub fn move_item(items: &[GridItem], id: &str, x: i32, y: i32, cols: i32) -> Vec<GridItem> {
    let mut next = items.to_vec();
    if let Some(item) = next.iter_mut().find(|it| it.id == id) {
        item.x = x;
        item.y = y;
    }
    compact_inner(&next, cols, Some(id))
}

/// Resize `id` to `(w, h)`, honouring its minimum size and the column count.
pub fn resize_item(items: &[GridItem], id: &str, w: i32, h: i32, cols: i32) -> Vec<GridItem> {
    let mut next = items.to_vec();
    if let Some(item) = next.iter_mut().find(|it| it.id == id) {
        item.w = w.min(cols.max(1) - item.x.max(0)).max(item.min_w);
        item.h = h.max(item.min_h);
    }
    compact_inner(&next, cols, Some(id))
}

fn layout_items(items: &[GridItem]) -> Vec<LayoutItem> {
    items.iter().map(GridItem::to_layout_item).collect()
}

fn same_geometry(a: &[GridItem], b: &[GridItem]) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b)
            .all(|(l, r)| (l.x, l.y, l.w, l.h) == (r.x, r.y, r.w, r.h))
}

/// Pixel metrics of the grid for a given width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMetrics {
    pub cols: i32,
    pub col_width: f32,
    pub row_height: f32,
    pub margin: f32,
}

impl GridMetrics {
    pub fn new(width: f32, cols: i32, row_height: f32, margin: f32) -> Self {
        let cols = cols.max(1);
        let col_width = ((width - margin * (cols as f32 + 1.0)) / cols as f32).max(1.0);
        Self {
            cols,
            col_width,
            row_height,
            margin,
        }
    }

    pub fn item_rect(&self, origin: egui::Pos2, item: &GridItem) -> egui::Rect {
        let min = origin
            + egui::vec2(
                self.margin + item.x as f32 * (self.col_width + self.margin),
                self.margin + item.y as f32 * (self.row_height + self.margin),
            );
        let size = egui::vec2(
            item.w as f32 * self.col_width + (item.w - 1).max(0) as f32 * self.margin,
            item.h as f32 * self.row_height + (item.h - 1).max(0) as f32 * self.margin,
        );
        egui::Rect::from_min_size(min, size)
    }

    pub fn height_for(&self, items: &[GridItem]) -> f32 {
        let rows = layout_bottom(items);
        self.margin + rows as f32 * (self.row_height + self.margin)
    }

    /// Whole cells covered by a pointer offset.
    pub fn cells(&self, delta: egui::Vec2) -> (i32, i32) {
        let dx = (delta.x / (self.col_width + self.margin)).round() as i32;
        let dy = (delta.y / (self.row_height + self.margin)).round() as i32;
        (dx, dy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragMode {
    Move,
    Resize,
}

#[derive(Debug, Clone)]
struct DragState {
    id: String,
    mode: DragMode,
    origin: GridItem,
    pointer_origin: egui::Pos2,
    preview: Vec<GridItem>,
}

/// What the caller drew inside an item frame.
#[derive(Default)]
pub struct ItemChrome {
    /// Response of the drag handle, if the frame has one.
    pub handle: Option<egui::Response>,
}

pub struct GridResponse {
    /// Positions to hand to the layout manager, when something moved.
    pub update: Option<Vec<LayoutItem>>,
    pub dragging: bool,
}

/// Immediate-mode grid view. Keeps drag state between frames.
#[derive(Default)]
pub struct GridView {
    drag: Option<DragState>,
    last_width: Option<f32>,
}

impl GridView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        items: &[GridItem],
        cols: i32,
        row_height: f32,
        margin: f32,
        mut add_contents: impl FnMut(&mut egui::Ui, &GridItem) -> ItemChrome,
    ) -> GridResponse {
        let width = ui.available_width();
        let metrics = GridMetrics::new(width, cols, row_height, margin);
        let compacted = compact(items, cols);
        let mut update = None;

        let width_changed = self
            .last_width
            .map_or(false, |last| (last - width).abs() > 0.5);
        self.last_width = Some(width);
        if !same_geometry(items, &compacted) || (width_changed && self.drag.is_none()) {
            update = Some(layout_items(&compacted));
        }

        let shown = match &self.drag {
            Some(drag) => drag.preview.clone(),
            None => compacted.clone(),
        };
        let height = metrics.height_for(&shown).max(ui.available_height());
        let (rect, _) = ui.allocate_exact_size(egui::vec2(width, height), egui::Sense::hover());
        let origin = rect.min;
        let pointer = ui.input(|i| i.pointer.interact_pos());

        if let Some(drag) = &self.drag {
            if let Some(target) = drag.preview.iter().find(|it| it.id == drag.id) {
                let placeholder = metrics.item_rect(origin, target);
                let fill = ui.visuals().selection.bg_fill.gamma_multiply(0.2);
                ui.painter().rect_filled(placeholder, 6.0, fill);
            }
        }

        let mut started: Option<DragState> = None;
        for item in &shown {
            let mut item_rect = metrics.item_rect(origin, item);
            if let (Some(drag), Some(pos)) = (&self.drag, pointer) {
                if drag.id == item.id {
                    let delta = pos - drag.pointer_origin;
                    let base = metrics.item_rect(origin, &drag.origin);
                    item_rect = match drag.mode {
                        DragMode::Move => base.translate(delta),
                        DragMode::Resize => egui::Rect::from_min_size(
                            base.min,
                            (base.size() + delta).max(egui::vec2(metrics.col_width, row_height)),
                        ),
                    };
                }
            }

            let chrome = ui
                .allocate_ui_at_rect(item_rect, |ui| {
                    ui.set_clip_rect(item_rect.intersect(ui.clip_rect()));
                    ui.set_min_size(item_rect.size());
                    add_contents(ui, item)
                })
                .inner;

            let grip = egui::Rect::from_min_max(item_rect.max - egui::vec2(14.0, 14.0), item_rect.max);
            let grip_resp = ui
                .interact(grip, ui.id().with(("grid-resize", &item.id)), egui::Sense::drag())
                .on_hover_cursor(egui::CursorIcon::ResizeNwSe);
            paint_grip(ui, grip);

            let begin = |mode| DragState {
                id: item.id.clone(),
                mode,
                origin: item.clone(),
                pointer_origin: pointer.unwrap_or(item_rect.center()),
                preview: shown.clone(),
            };
            if self.drag.is_none() && started.is_none() {
                if chrome.handle.as_ref().is_some_and(|h| h.drag_started()) {
                    started = Some(begin(DragMode::Move));
                } else if grip_resp.drag_started() {
                    started = Some(begin(DragMode::Resize));
                }
            }
        }
        if started.is_some() {
            self.drag = started;
        }

        if let Some(drag) = &mut self.drag {
            if let Some(pos) = pointer {
                let (dx, dy) = metrics.cells(pos - drag.pointer_origin);
                let base: Vec<GridItem> = compacted.clone();
                drag.preview = match drag.mode {
                    DragMode::Move => move_item(
                        &base,
                        &drag.id,
                        drag.origin.x + dx,
                        drag.origin.y + dy,
                        cols,
                    ),
                    DragMode::Resize => resize_item(
                        &base,
                        &drag.id,
                        drag.origin.w + dx,
                        drag.origin.h + dy,
                        cols,
                    ),
                };
            }
            let released = !ui.input(|i| i.pointer.primary_down());
            if released {
                let final_layout = compact(&drag.preview, cols);
                update = Some(layout_items(&final_layout));
                self.drag = None;
            }
            ui.ctx().request_repaint();
        }

        GridResponse {
            update,
            dragging: self.drag.is_some(),
        }
    }
}

fn paint_grip(ui: &egui::Ui, rect: egui::Rect) {
    let stroke = egui::Stroke::new(1.0, ui.visuals().weak_text_color());
    let painter = ui.painter();
    for offset in [4.0, 8.0, 12.0] {
        painter.line_segment(
            [
                egui::pos2(rect.max.x - offset, rect.max.y - 2.0),
                egui::pos2(rect.max.x - 2.0, rect.max.y - offset),
            ],
            stroke,
        );
    }
}
