use super::{private_key, Widget, WidgetSeed, DOODLE_COLOR_NS, DOODLE_NS};
use crate::dashboard::dashboard::DashboardContext;
use crate::store::Store;
use crate::theme::color::parse_hex;
use eframe::egui;
use serde::{Deserialize, Serialize};

const DEFAULT_PEN: &str = "#000000";
const CANVAS: &str = "#ffffff";
const PEN_WIDTH: f32 = 5.0;
const ERASER_WIDTH: f32 = 20.0;

/// A freehand stroke. Points are stored relative to the canvas size so the
/// drawing follows the widget when it is resized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: String,
    pub width: f32,
    pub points: Vec<[f32; 2]>,
}

pub struct DoodleWidget {
    key: String,
    color_key: String,
    store: Store,
    strokes: Vec<Stroke>,
    current: Option<Stroke>,
    color: String,
    eraser: bool,
}

fn to_color32(hex: &str) -> egui::Color32 {
    let [r, g, b] = parse_hex(hex).unwrap_or([0, 0, 0]);
    egui::Color32::from_rgb(r, g, b)
}

impl DoodleWidget {
    pub fn new(seed: &WidgetSeed<'_>) -> Self {
        let key = private_key(DOODLE_NS, seed.id);
        let color_key = private_key(DOODLE_COLOR_NS, seed.id);
        let strokes = seed.store.get(&key, Vec::new());
        let color = seed.store.get(&color_key, DEFAULT_PEN.to_string());
        Self {
            key,
            color_key,
            store: seed.store.clone(),
            strokes,
            current: None,
            color,
            eraser: false,
        }
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn set_color(&mut self, hex: String) {
        self.color = hex;
        self.store.set(&self.color_key, &self.color);
    }

    pub fn set_eraser(&mut self, on: bool) {
        self.eraser = on;
    }

    /// Start a stroke at a normalized canvas position.
    pub fn begin_stroke(&mut self, point: [f32; 2]) {
        let (color, width) = if self.eraser {
            (CANVAS.to_string(), ERASER_WIDTH)
        } else {
            (self.color.clone(), PEN_WIDTH)
        };
        self.current = Some(Stroke {
            color,
            width,
            points: vec![point],
        });
    }

    pub fn extend_stroke(&mut self, point: [f32; 2]) {
        if let Some(stroke) = &mut self.current {
            if stroke.points.last() != Some(&point) {
                stroke.points.push(point);
            }
        }
    }

    pub fn end_stroke(&mut self) {
        if let Some(stroke) = self.current.take() {
            self.strokes.push(stroke);
            self.store.set(&self.key, &self.strokes);
        }
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
        self.current = None;
        self.store.set(&self.key, &self.strokes);
    }

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let mut rgb = parse_hex(&self.color).unwrap_or([0, 0, 0]);
            if ui.color_edit_button_srgb(&mut rgb).changed() {
                self.set_color(format!("#{}", hex::encode(rgb)));
                self.eraser = false;
            }
            if ui.selectable_label(!self.eraser, "✏ Pen").clicked() {
                self.set_eraser(false);
            }
            if ui.selectable_label(self.eraser, "⌫ Eraser").clicked() {
                self.set_eraser(true);
            }
            if ui.button("Clear").clicked() {
                self.clear();
            }
        });
    }
}

fn paint_stroke(painter: &egui::Painter, rect: egui::Rect, stroke: &Stroke) {
    let color = to_color32(&stroke.color);
    let points: Vec<egui::Pos2> = stroke
        .points
        .iter()
        .map(|[x, y]| rect.min + egui::vec2(x * rect.width(), y * rect.height()))
        .collect();
    if points.len() == 1 {
        painter.circle_filled(points[0], stroke.width / 2.0, color);
    } else {
        painter.add(egui::Shape::line(points, egui::Stroke::new(stroke.width, color)));
    }
}

impl Widget for DoodleWidget {
    fn render(&mut self, ui: &mut egui::Ui, _ctx: &DashboardContext<'_>) {
        self.toolbar(ui);
        let size = ui.available_size().max(egui::vec2(60.0, 60.0));
        let (response, painter) = ui.allocate_painter(size, egui::Sense::drag());
        let rect = response.rect;
        painter.rect_filled(rect, 4.0, to_color32(CANVAS));

        let normalized = |pos: egui::Pos2| {
            let rel = pos - rect.min;
            [
                (rel.x / rect.width()).clamp(0.0, 1.0),
                (rel.y / rect.height()).clamp(0.0, 1.0),
            ]
        };
        if let Some(pos) = response.interact_pointer_pos() {
            if response.drag_started() || self.current.is_none() {
                self.begin_stroke(normalized(pos));
            } else {
                self.extend_stroke(normalized(pos));
            }
        }
        let released = response.drag_stopped() || !ui.input(|i| i.pointer.any_down());
        if self.current.is_some() && released {
            self.end_stroke();
        }

        for stroke in self.strokes.iter().chain(self.current.iter()) {
            paint_stroke(&painter, rect, stroke);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget(store: &Store) -> DoodleWidget {
        DoodleWidget::new(&WidgetSeed {
            id: "doodle-1",
            store,
        })
    }

    #[test]
    fn strokes_and_color_persist() {
        let store = Store::in_memory();
        let mut pad = widget(&store);
        pad.set_color("#ff0000".into());
        pad.begin_stroke([0.1, 0.1]);
        pad.extend_stroke([0.2, 0.2]);
        pad.extend_stroke([0.2, 0.2]);
        pad.end_stroke();

        let reloaded = widget(&store);
        assert_eq!(reloaded.color, "#ff0000");
        assert_eq!(reloaded.strokes().len(), 1);
        assert_eq!(reloaded.strokes()[0].points.len(), 2);
        assert_eq!(reloaded.strokes()[0].width, PEN_WIDTH);
    }

    #[test]
    fn eraser_paints_wide_canvas_strokes() {
        let store = Store::in_memory();
        let mut pad = widget(&store);
        pad.set_eraser(true);
        pad.begin_stroke([0.5, 0.5]);
        pad.end_stroke();
        let stroke = &pad.strokes()[0];
        assert_eq!(stroke.color, CANVAS);
        assert_eq!(stroke.width, ERASER_WIDTH);
    }

    #[test]
    fn clear_empties_saved_drawing() {
        let store = Store::in_memory();
        let mut pad = widget(&store);
        pad.begin_stroke([0.0, 0.0]);
        pad.end_stroke();
        pad.clear();
        assert!(widget(&store).strokes().is_empty());
    }
}
