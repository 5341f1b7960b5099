use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::item::TimelineItem;
use super::layer::Layer;
use super::settings::{ViewSettings, ZoomBounds};
use super::tray::TrayTask;

/// The whole persisted board document (board.json).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Board {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub layers: Vec<Layer>,
    /// Items keyed by id; insertion order is preserved on disk
    #[serde(default)]
    pub items: IndexMap<String, TimelineItem>,
    #[serde(default)]
    pub tray: Vec<TrayTask>,
    #[serde(default)]
    pub settings: ViewSettings,
    #[serde(default)]
    pub counters: Counters,
}

/// Monotonic id counters, one per entity kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    #[serde(default)]
    pub item: u64,
    #[serde(default)]
    pub tray: u64,
    #[serde(default)]
    pub layer: u64,
    #[serde(default)]
    pub series: u64,
}

impl Board {
    pub fn next_item_id(&mut self) -> String {
        self.counters.item += 1;
        format!("i-{:03}", self.counters.item)
    }

    pub fn next_tray_id(&mut self) -> String {
        self.counters.tray += 1;
        format!("t-{:03}", self.counters.tray)
    }

    pub fn next_layer_id(&mut self) -> String {
        self.counters.layer += 1;
        format!("l-{:03}", self.counters.layer)
    }

    pub fn next_series_id(&mut self) -> String {
        self.counters.series += 1;
        format!("s-{:03}", self.counters.series)
    }

    pub fn layer(&self, layer_id: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == layer_id)
    }

    pub fn layer_mut(&mut self, layer_id: &str) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id == layer_id)
    }

    pub fn tray_task(&self, task_id: &str) -> Option<&TrayTask> {
        self.tray.iter().find(|t| t.id == task_id)
    }

    /// Items belonging to one series, ordered by occurrence index.
    pub fn series_items(&self, series_id: &str) -> Vec<&TimelineItem> {
        let mut items: Vec<&TimelineItem> = self
            .items
            .values()
            .filter(|i| i.series_id.as_deref() == Some(series_id))
            .collect();
        items.sort_by_key(|i| i.occurrence_index);
        items
    }

    /// Walk the document and report every invariant violation. Read-only.
    pub fn validate(&self, bounds: ZoomBounds) -> Vec<Problem> {
        let mut problems = Vec::new();

        for item in self.items.values() {
            if item.duration_minutes <= 0 {
                problems.push(Problem::NonPositiveDuration {
                    item_id: item.id.clone(),
                    minutes: item.duration_minutes,
                });
            }
            if self.layer(&item.layer_id).is_none() {
                problems.push(Problem::OrphanedLayerRef {
                    item_id: item.id.clone(),
                    layer_id: item.layer_id.clone(),
                });
            }
            if item.series_id.is_some() != item.occurrence_index.is_some() {
                problems.push(Problem::DanglingOccurrence {
                    item_id: item.id.clone(),
                });
            }
        }

        for task in &self.tray {
            if task.duration_minutes <= 0 {
                problems.push(Problem::NonPositiveDuration {
                    item_id: task.id.clone(),
                    minutes: task.duration_minutes,
                });
            }
        }

        let mut seen = std::collections::HashSet::new();
        for id in self.items.keys().chain(self.tray.iter().map(|t| &t.id)) {
            if !seen.insert(id.clone()) {
                problems.push(Problem::DuplicateId { id: id.clone() });
            }
        }

        let zh = self.settings.zoom_horizontal;
        let zv = self.settings.zoom_vertical;
        if zh < bounds.min || zh > bounds.max {
            problems.push(Problem::ZoomOutOfBounds {
                axis: "horizontal".to_string(),
                zoom: zh,
            });
        }
        if zv < bounds.min || zv > bounds.max {
            problems.push(Problem::ZoomOutOfBounds {
                axis: "vertical".to_string(),
                zoom: zv,
            });
        }

        problems
    }
}

/// A single invariant violation found by `validate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Problem {
    NonPositiveDuration { item_id: String, minutes: i64 },
    OrphanedLayerRef { item_id: String, layer_id: String },
    DanglingOccurrence { item_id: String },
    DuplicateId { id: String },
    ZoomOutOfBounds { axis: String, zoom: f64 },
}

impl std::fmt::Display for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Problem::NonPositiveDuration { item_id, minutes } => {
                write!(f, "{}: duration must be positive, got {}", item_id, minutes)
            }
            Problem::OrphanedLayerRef { item_id, layer_id } => {
                write!(f, "{}: references missing layer {}", item_id, layer_id)
            }
            Problem::DanglingOccurrence { item_id } => {
                write!(f, "{}: occurrence index and series id must be set together", item_id)
            }
            Problem::DuplicateId { id } => write!(f, "duplicate id {}", id),
            Problem::ZoomOutOfBounds { axis, zoom } => {
                write!(f, "{} zoom {} outside bounds", axis, zoom)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::item::NewItem;
    use chrono::{TimeZone, Utc};

    fn sample_board() -> Board {
        let mut board = Board {
            name: "test".into(),
            ..Default::default()
        };
        let layer_id = board.next_layer_id();
        board.layers.push(Layer::new(&layer_id, "Work", "#4488FF", 1));
        let start = Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap();
        let item_id = board.next_item_id();
        board.items.insert(
            item_id.clone(),
            NewItem::block("Write report", &layer_id, start, 60).into_item(item_id),
        );
        board
    }

    #[test]
    fn id_counters_are_monotonic() {
        let mut board = Board::default();
        assert_eq!(board.next_item_id(), "i-001");
        assert_eq!(board.next_item_id(), "i-002");
        assert_eq!(board.next_layer_id(), "l-001");
        assert_eq!(board.next_series_id(), "s-001");
    }

    #[test]
    fn valid_board_has_no_problems() {
        let board = sample_board();
        assert!(board.validate(ZoomBounds::default()).is_empty());
    }

    #[test]
    fn validate_flags_orphaned_layer_ref() {
        let mut board = sample_board();
        let id = board.next_item_id();
        let start = Utc.with_ymd_and_hms(2024, 6, 3, 11, 0, 0).unwrap();
        board.items.insert(
            id.clone(),
            NewItem::block("Stray", "gone", start, 30).into_item(id.clone()),
        );
        let problems = board.validate(ZoomBounds::default());
        assert!(problems.iter().any(|p| matches!(
            p,
            Problem::OrphanedLayerRef { item_id, layer_id } if *item_id == id && layer_id == "gone"
        )));
    }

    #[test]
    fn validate_flags_bad_duration_and_zoom() {
        let mut board = sample_board();
        if let Some(item) = board.items.values_mut().next() {
            item.duration_minutes = 0;
        }
        board.settings.zoom_horizontal = 9999.0;
        let problems = board.validate(ZoomBounds::default());
        assert!(problems
            .iter()
            .any(|p| matches!(p, Problem::NonPositiveDuration { .. })));
        assert!(problems
            .iter()
            .any(|p| matches!(p, Problem::ZoomOutOfBounds { axis, .. } if axis == "horizontal")));
    }

    #[test]
    fn validate_flags_occurrence_without_series() {
        let mut board = sample_board();
        if let Some(item) = board.items.values_mut().next() {
            item.occurrence_index = Some(2);
        }
        let problems = board.validate(ZoomBounds::default());
        assert!(problems
            .iter()
            .any(|p| matches!(p, Problem::DanglingOccurrence { .. })));
    }

    #[test]
    fn series_items_sorted_by_index() {
        let mut board = sample_board();
        let layer = board.layers[0].id.clone();
        let start = Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap();
        for idx in [2u32, 0, 1] {
            let id = board.next_item_id();
            let mut new = NewItem::block("Occ", &layer, start, 30);
            new.series_id = Some("s-001".into());
            new.occurrence_index = Some(idx);
            board.items.insert(id.clone(), new.into_item(id));
        }
        let series = board.series_items("s-001");
        let indices: Vec<u32> = series.iter().filter_map(|i| i.occurrence_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn board_serde_round_trip() {
        let board = sample_board();
        let json = serde_json::to_string_pretty(&board).unwrap();
        let back: Board = serde_json::from_str(&json).unwrap();
        assert_eq!(back, board);
    }
}
