use crate::dashboard::widgets::{private_keys_for, WidgetRegistry};
use crate::store::Store;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Durable key holding the instance list.
pub const LAYOUT_KEY: &str = "widgets";

/// Row sentinel meaning "below everything"; resolved by grid compaction.
pub const APPEND_ROW: i32 = i32::MAX;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("unknown widget kind '{0}'")]
    InvalidKind(String),
}

fn append_row() -> i32 {
    APPEND_ROW
}

fn row_or_append<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<i32>::deserialize(deserializer)?.unwrap_or(APPEND_ROW))
}

/// One placed widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetInstance {
    #[serde(rename = "i")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub x: i32,
    #[serde(default = "append_row", deserialize_with = "row_or_append")]
    pub y: i32,
    pub w: i32,
    pub h: i32,
    #[serde(rename = "minW", default, skip_serializing_if = "Option::is_none")]
    pub min_w: Option<i32>,
    #[serde(rename = "minH", default, skip_serializing_if = "Option::is_none")]
    pub min_h: Option<i32>,
}

/// Position and size reported by the grid engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutItem {
    #[serde(rename = "i")]
    pub id: String,
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

/// Hands out `<kind>-<millis>` ids that never repeat within a session.
pub struct IdGenerator {
    last: i64,
    clock: fn() -> i64,
}

fn wall_clock_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::with_clock(wall_clock_millis)
    }
}

impl IdGenerator {
    pub fn with_clock(clock: fn() -> i64) -> Self {
        Self { last: 0, clock }
    }

    pub fn next(&mut self, kind: &str) -> String {
        let stamp = (self.clock)().max(self.last + 1);
        self.last = stamp;
        format!("{kind}-{stamp}")
    }
}

/// Owns the ordered instance list and writes it through the store.
pub struct LayoutManager {
    store: Store,
    instances: Vec<WidgetInstance>,
    columns: i32,
    ids: IdGenerator,
}

impl LayoutManager {
    pub fn load(store: Store, registry: &WidgetRegistry, columns: i32) -> Self {
        let stored: Vec<WidgetInstance> = store.get(LAYOUT_KEY, Vec::new());
        let instances = sanitize(stored, registry);
        Self {
            store,
            instances,
            columns: columns.max(1),
            ids: IdGenerator::default(),
        }
    }

    pub fn with_id_generator(mut self, ids: IdGenerator) -> Self {
        self.ids = ids;
        self
    }

    pub fn list_instances(&self) -> &[WidgetInstance] {
        &self.instances
    }

    pub fn get(&self, id: &str) -> Option<&WidgetInstance> {
        self.instances.iter().find(|inst| inst.id == id)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn columns(&self) -> i32 {
        self.columns
    }

    pub fn add_instance(
        &mut self,
        kind: &str,
        registry: &WidgetRegistry,
    ) -> Result<String, LayoutError> {
        let size = registry
            .default_size(kind)
            .ok_or_else(|| LayoutError::InvalidKind(kind.to_string()))?;
        let id = self.ids.next(kind);
        let count = self.instances.len() as i32;
        let instance = WidgetInstance {
            id: id.clone(),
            kind: kind.to_string(),
            x: (count * 2) % self.columns,
            y: APPEND_ROW,
            w: size.w.min(self.columns),
            h: size.h,
            min_w: Some(size.min_w),
            min_h: Some(size.min_h),
        };
        match self.instances.iter_mut().find(|inst| inst.id == id) {
            Some(existing) => {
                tracing::warn!(widget = %id, "duplicate widget id; replacing existing entry");
                *existing = instance;
            }
            None => self.instances.push(instance),
        }
        tracing::info!(widget = %id, kind = %kind, "added widget");
        self.persist();
        Ok(id)
    }

    /// Remove an instance together with its private records.
    pub fn remove_instance(&mut self, id: &str) -> bool {
        let before = self.instances.len();
        self.instances.retain(|inst| inst.id != id);
        if self.instances.len() == before {
            return false;
        }
        let private = private_keys_for(id);
        let instances = &self.instances;
        self.store.batch(|tx| {
            tx.set(LAYOUT_KEY, instances);
            for key in &private {
                tx.remove(key);
            }
        });
        tracing::info!(widget = %id, purged = private.len(), "removed widget");
        true
    }

    /// Merge positions reported by the grid engine. Returns `true` when the
    /// layout changed and was written.
    pub fn apply_external_layout(&mut self, update: &[LayoutItem]) -> bool {
        let by_id: HashMap<&str, &LayoutItem> =
            update.iter().map(|item| (item.id.as_str(), item)).collect();
        let mut changed = false;
        for inst in &mut self.instances {
            let Some(item) = by_id.get(inst.id.as_str()) else {
                continue;
            };
            if (inst.x, inst.y, inst.w, inst.h) != (item.x, item.y, item.w, item.h) {
                inst.x = item.x;
                inst.y = item.y;
                inst.w = item.w;
                inst.h = item.h;
                changed = true;
            }
        }
        if changed {
            tracing::debug!(items = update.len(), "layout updated");
            self.persist();
        }
        changed
    }

    fn persist(&self) {
        self.store.set(LAYOUT_KEY, &self.instances);
    }
}

fn sanitize(stored: Vec<WidgetInstance>, registry: &WidgetRegistry) -> Vec<WidgetInstance> {
    let mut out: Vec<WidgetInstance> = Vec::with_capacity(stored.len());
    for inst in stored {
        if !registry.contains(&inst.kind) {
            tracing::warn!(widget = %inst.id, kind = %inst.kind, "unknown widget kind in layout");
        }
        match out.iter_mut().find(|existing| existing.id == inst.id) {
            Some(existing) => {
                tracing::warn!(widget = %inst.id, "duplicate widget id in layout; keeping the later entry");
                *existing = inst;
            }
            None => out.push(inst),
        }
    }
    out
}
