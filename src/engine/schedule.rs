use chrono::{DateTime, Utc};

use crate::engine::lanes::LaneGeometry;
use crate::engine::recur::{align_start, expand};
use crate::engine::scale::Viewport;
use crate::model::item::{InvalidItem, ItemPatch, NewItem, TimelineItem};
use crate::model::layer::Layer;
use crate::model::recurrence::RecurrenceRule;
use crate::model::tray::TrayTask;
use crate::store::{Store, StoreError};

/// Error type for drop handling and tray placement
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("no visible layers to drop onto")]
    NoVisibleLanes,
    #[error(transparent)]
    Invalid(#[from] InvalidItem),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("could not create any occurrence ({attempted} attempted)")]
    NothingCreated { attempted: u32 },
}

// ----
// Drop resolution

/// Where a pointer drop lands: a snapped start time and a target layer.
#[derive(Debug, Clone, PartialEq)]
pub struct DropSpot {
    pub start: DateTime<Utc>,
    pub layer_id: String,
    pub lane: usize,
}

/// Round to the nearest quarter-hour boundary. Nearest, not floor: a drop
/// at 9:08 lands on 9:15, a drop at 9:07 on 9:00.
pub fn snap_to_quarter_hour(t: DateTime<Utc>) -> DateTime<Utc> {
    const QUARTER_MS: i64 = 15 * 60 * 1000;
    let ms = t.timestamp_millis();
    let rem = ms.rem_euclid(QUARTER_MS);
    let down = ms - rem;
    let snapped = if rem * 2 >= QUARTER_MS {
        down + QUARTER_MS
    } else {
        down
    };
    DateTime::from_timestamp_millis(snapped).unwrap_or(t)
}

/// Resolve a drop coordinate to a snapped time and lane. Fails only when
/// there is no visible lane to receive the drop; callers ignore the drop
/// in that case rather than creating anything.
pub fn resolve_drop(
    view: &Viewport,
    lanes: &LaneGeometry,
    visible: &[&Layer],
    x: f64,
    y: u16,
) -> Result<DropSpot, ScheduleError> {
    let lane = lanes.lane_at(y).ok_or(ScheduleError::NoVisibleLanes)?;
    let layer = visible.get(lane).ok_or(ScheduleError::NoVisibleLanes)?;
    Ok(DropSpot {
        start: snap_to_quarter_hour(view.time_at(x)),
        layer_id: layer.id.clone(),
        lane,
    })
}

// ----
// Placement

/// What a placement produced. `failed_indices` lists occurrences that were
/// skipped over store errors; the placement as a whole still succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceOutcome {
    pub created_ids: Vec<String>,
    pub failed_indices: Vec<u32>,
    pub series_id: Option<String>,
    pub source_removed: bool,
}

impl PlaceOutcome {
    pub fn created(&self) -> usize {
        self.created_ids.len()
    }
}

fn draft_from_tray(task: &TrayTask, spot: &DropSpot) -> NewItem {
    NewItem {
        title: task.title.clone(),
        layer_id: spot.layer_id.clone(),
        start_time: spot.start,
        duration_minutes: task.duration_minutes,
        planned_minutes: None,
        color: task.color.clone(),
        is_meeting: task.is_meeting,
        is_flexible: task.is_flexible,
        series_id: None,
        occurrence_index: None,
    }
}

/// Consume the source only after something was actually created, and never
/// consume a template.
fn remove_source(store: &mut dyn Store, task: &TrayTask) -> bool {
    if task.is_template {
        return false;
    }
    store.delete_tray_task(&task.id).is_ok()
}

/// Place a one-off tray task as a single timeline item.
pub fn place_one_off(
    store: &mut dyn Store,
    task: &TrayTask,
    spot: &DropSpot,
) -> Result<PlaceOutcome, ScheduleError> {
    let draft = draft_from_tray(task, spot);
    draft.validate()?;
    let item = store.create_item(draft)?;
    let source_removed = remove_source(store, task);
    Ok(PlaceOutcome {
        created_ids: vec![item.id],
        failed_indices: Vec::new(),
        series_id: None,
        source_removed,
    })
}

/// Place a recurring tray task: align the drop to the pattern, expand a
/// bounded run of occurrences, and create them one at a time. Individual
/// failures are skipped and reported by index; the source task is only
/// consumed when at least one occurrence landed.
pub fn place_recurring(
    store: &mut dyn Store,
    task: &TrayTask,
    rule: &RecurrenceRule,
    spot: &DropSpot,
    max_occurrences: u32,
) -> Result<PlaceOutcome, ScheduleError> {
    let prototype = draft_from_tray(task, spot);
    prototype.validate()?;

    let aligned = align_start(spot.start, rule.recurrence);
    let series_id = store.next_series_id()?;

    let mut created_ids = Vec::new();
    let mut failed_indices = Vec::new();
    for (k, start) in expand(aligned, rule.recurrence, rule.until, max_occurrences).enumerate() {
        let mut draft = prototype.clone();
        draft.start_time = start;
        draft.series_id = Some(series_id.clone());
        draft.occurrence_index = Some(k as u32);
        match store.create_item(draft) {
            Ok(item) => created_ids.push(item.id),
            Err(_) => failed_indices.push(k as u32),
        }
    }

    if created_ids.is_empty() {
        return Err(ScheduleError::NothingCreated {
            attempted: failed_indices.len() as u32,
        });
    }
    let source_removed = remove_source(store, task);
    Ok(PlaceOutcome {
        created_ids,
        failed_indices,
        series_id: Some(series_id),
        source_removed,
    })
}

/// Place a tray task at a drop spot, dispatching on whether it recurs.
pub fn place_tray_task(
    store: &mut dyn Store,
    task: &TrayTask,
    spot: &DropSpot,
    max_occurrences: u32,
) -> Result<PlaceOutcome, ScheduleError> {
    match &task.recurrence {
        Some(rule) => {
            let rule = rule.clone();
            place_recurring(store, task, &rule, spot, max_occurrences)
        }
        None => place_one_off(store, task, spot),
    }
}

/// Move an existing item to a new drop spot.
pub fn move_item(
    store: &mut dyn Store,
    item_id: &str,
    spot: &DropSpot,
) -> Result<TimelineItem, ScheduleError> {
    let patch = ItemPatch::reschedule(spot.start, &spot.layer_id);
    Ok(store.update_item(item_id, &patch)?)
}

/// Delete this occurrence and every later one in the series. Earlier
/// occurrences are left alone. Returns how many were deleted; individual
/// delete failures are skipped like batch-create failures are.
pub fn truncate_series(
    store: &mut dyn Store,
    series_id: &str,
    from_index: u32,
) -> Result<usize, ScheduleError> {
    let doomed: Vec<String> = store
        .board()
        .series_items(series_id)
        .into_iter()
        .filter(|i| i.occurrence_index.is_some_and(|k| k >= from_index))
        .map(|i| i.id.clone())
        .collect();

    let mut deleted = 0;
    for id in doomed {
        if store.delete_item(&id).is_ok() {
            deleted += 1;
        }
    }
    Ok(deleted)
}
