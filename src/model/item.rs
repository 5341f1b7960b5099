use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Persisted item status. `Logjam` is cached here but derived on read;
/// the classifier in `engine::status` is the source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Scheduled,
    Completed,
    Parked,
    Logjam,
}

impl ItemStatus {
    /// Single-character glyph shown in listings and on timeline bars.
    pub fn glyph(self) -> char {
        match self {
            ItemStatus::Scheduled => ' ',
            ItemStatus::Completed => 'x',
            ItemStatus::Parked => '~',
            ItemStatus::Logjam => '!',
        }
    }

    pub fn parse_status(s: &str) -> Option<ItemStatus> {
        match s {
            "scheduled" => Some(ItemStatus::Scheduled),
            "completed" | "done" => Some(ItemStatus::Completed),
            "parked" => Some(ItemStatus::Parked),
            "logjam" => Some(ItemStatus::Logjam),
            _ => None,
        }
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemStatus::Scheduled => write!(f, "scheduled"),
            ItemStatus::Completed => write!(f, "completed"),
            ItemStatus::Parked => write!(f, "parked"),
            ItemStatus::Logjam => write!(f, "logjam"),
        }
    }
}

/// A scheduled block on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineItem {
    pub id: String,
    pub title: String,
    /// Lane this item belongs to (reference by id, not containment)
    pub layer_id: String,
    pub start_time: DateTime<Utc>,
    /// Block size on the canvas, always > 0
    pub duration_minutes: i64,
    /// Optional estimate distinct from the block size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_minutes: Option<i64>,
    /// Hex color override; falls back to the layer color when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub is_meeting: bool,
    #[serde(default)]
    pub is_flexible: bool,
    /// Cached status; re-derived whenever `now` crosses a boundary
    pub status: ItemStatus,
    /// Set on every occurrence materialized from one recurring placement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_id: Option<String>,
    /// 0-based position within the series; set iff `series_id` is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurrence_index: Option<u32>,
}

impl TimelineItem {
    /// Scheduled end of the item's window.
    pub fn end_time(&self) -> DateTime<Utc> {
        self.start_time + Duration::minutes(self.duration_minutes)
    }

    pub fn is_occurrence(&self) -> bool {
        self.series_id.is_some()
    }
}

/// Fields for item creation, before an id is assigned.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub title: String,
    pub layer_id: String,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: i64,
    pub planned_minutes: Option<i64>,
    pub color: Option<String>,
    pub is_meeting: bool,
    pub is_flexible: bool,
    pub series_id: Option<String>,
    pub occurrence_index: Option<u32>,
}

impl NewItem {
    /// A plain one-off block with every flag off.
    pub fn block(title: &str, layer_id: &str, start: DateTime<Utc>, minutes: i64) -> Self {
        NewItem {
            title: title.to_string(),
            layer_id: layer_id.to_string(),
            start_time: start,
            duration_minutes: minutes,
            planned_minutes: None,
            color: None,
            is_meeting: false,
            is_flexible: false,
            series_id: None,
            occurrence_index: None,
        }
    }

    /// Reject structurally invalid input before any mutation happens.
    pub fn validate(&self) -> Result<(), InvalidItem> {
        if self.title.trim().is_empty() {
            return Err(InvalidItem::EmptyTitle);
        }
        if self.duration_minutes <= 0 {
            return Err(InvalidItem::NonPositiveDuration(self.duration_minutes));
        }
        if let Some(p) = self.planned_minutes
            && p <= 0
        {
            return Err(InvalidItem::NonPositiveDuration(p));
        }
        if self.series_id.is_some() != self.occurrence_index.is_some() {
            return Err(InvalidItem::DanglingOccurrence);
        }
        Ok(())
    }

    pub fn into_item(self, id: String) -> TimelineItem {
        TimelineItem {
            id,
            title: self.title,
            layer_id: self.layer_id,
            start_time: self.start_time,
            duration_minutes: self.duration_minutes,
            planned_minutes: self.planned_minutes,
            color: self.color,
            is_meeting: self.is_meeting,
            is_flexible: self.is_flexible,
            status: ItemStatus::Scheduled,
            series_id: self.series_id,
            occurrence_index: self.occurrence_index,
        }
    }
}

/// Structural validation failures, caught before any store call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidItem {
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("duration must be positive, got {0}")]
    NonPositiveDuration(i64),
    #[error("occurrence index and series id must be set together")]
    DanglingOccurrence,
}

/// Partial update for an item; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub title: Option<String>,
    pub layer_id: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i64>,
    pub planned_minutes: Option<Option<i64>>,
    pub color: Option<Option<String>>,
    pub is_meeting: Option<bool>,
    pub is_flexible: Option<bool>,
    pub status: Option<ItemStatus>,
}

impl ItemPatch {
    pub fn apply(&self, item: &mut TimelineItem) {
        if let Some(title) = &self.title {
            item.title = title.clone();
        }
        if let Some(layer_id) = &self.layer_id {
            item.layer_id = layer_id.clone();
        }
        if let Some(start) = self.start_time {
            item.start_time = start;
        }
        if let Some(minutes) = self.duration_minutes {
            item.duration_minutes = minutes;
        }
        if let Some(planned) = &self.planned_minutes {
            item.planned_minutes = *planned;
        }
        if let Some(color) = &self.color {
            item.color = color.clone();
        }
        if let Some(meeting) = self.is_meeting {
            item.is_meeting = meeting;
        }
        if let Some(flexible) = self.is_flexible {
            item.is_flexible = flexible;
        }
        if let Some(status) = self.status {
            item.status = status;
        }
    }

    /// A patch that only moves the item in time and lane.
    pub fn reschedule(start: DateTime<Utc>, layer_id: &str) -> Self {
        ItemPatch {
            start_time: Some(start),
            layer_id: Some(layer_id.to_string()),
            ..Default::default()
        }
    }

    pub fn set_status(status: ItemStatus) -> Self {
        ItemPatch {
            status: Some(status),
            ..Default::default()
        }
    }
}
