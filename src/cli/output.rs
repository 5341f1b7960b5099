use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::model::item::{ItemStatus, TimelineItem};
use crate::model::layer::Layer;
use crate::model::settings::ViewMode;
use crate::model::tray::TrayTask;
use crate::model::Problem;
use crate::util::format_duration;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct ItemJson {
    pub id: String,
    pub title: String,
    pub layer: String,
    pub start: String,
    pub end: String,
    pub duration_minutes: i64,
    pub status: ItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occurrence: Option<u32>,
    pub is_meeting: bool,
    pub is_flexible: bool,
}

#[derive(Serialize)]
pub struct TrayTaskJson {
    pub id: String,
    pub title: String,
    pub duration_minutes: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<String>,
    pub is_meeting: bool,
    pub is_flexible: bool,
    pub is_template: bool,
}

#[derive(Serialize)]
pub struct LayerJson {
    pub id: String,
    pub name: String,
    pub color: String,
    pub visible: bool,
    pub items: usize,
}

#[derive(Serialize)]
pub struct PlacementJson {
    pub created: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_occurrences: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    pub source_removed: bool,
}

#[derive(Serialize)]
pub struct CheckJson {
    pub valid: bool,
    pub problems: Vec<Problem>,
}

#[derive(Serialize)]
pub struct ModeJson {
    pub mode: ViewMode,
    pub zoom_horizontal: f64,
    pub zoom_vertical: f64,
    pub locked: bool,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn item_to_json(item: &TimelineItem) -> ItemJson {
    ItemJson {
        id: item.id.clone(),
        title: item.title.clone(),
        layer: item.layer_id.clone(),
        start: item.start_time.to_rfc3339_opts(SecondsFormat::Secs, true),
        end: item.end_time().to_rfc3339_opts(SecondsFormat::Secs, true),
        duration_minutes: item.duration_minutes,
        status: item.status,
        series: item.series_id.clone(),
        occurrence: item.occurrence_index,
        is_meeting: item.is_meeting,
        is_flexible: item.is_flexible,
    }
}

pub fn tray_task_to_json(task: &TrayTask) -> TrayTaskJson {
    TrayTaskJson {
        id: task.id.clone(),
        title: task.title.clone(),
        duration_minutes: task.duration_minutes,
        recurrence: task.recurrence.as_ref().map(|r| r.recurrence.to_string()),
        is_meeting: task.is_meeting,
        is_flexible: task.is_flexible,
        is_template: task.is_template,
    }
}

pub fn layer_to_json(layer: &Layer, items: usize) -> LayerJson {
    LayerJson {
        id: layer.id.clone(),
        name: layer.name.clone(),
        color: layer.color.clone(),
        visible: layer.is_visible,
        items,
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// Format a timeline item as a one-line summary
pub fn format_item_line(item: &TimelineItem) -> String {
    let series_str = match (&item.series_id, item.occurrence_index) {
        (Some(sid), Some(k)) => format!("  ({} #{})", sid, k),
        _ => String::new(),
    };
    format!(
        "[{}] {}  {} +{}  {}{}",
        item.status.glyph(),
        item.id,
        item.start_time.format("%Y-%m-%d %H:%M"),
        format_duration(item.duration_minutes),
        item.title,
        series_str
    )
}

/// Format a tray task as a one-line summary
pub fn format_tray_line(task: &TrayTask) -> String {
    let mut marks: Vec<String> = Vec::new();
    if let Some(rule) = &task.recurrence {
        marks.push(rule.recurrence.to_string());
    }
    if task.is_meeting {
        marks.push("meeting".to_string());
    }
    if task.is_flexible {
        marks.push("flexible".to_string());
    }
    if task.is_template {
        marks.push("template".to_string());
    }
    let marks_str = if marks.is_empty() {
        String::new()
    } else {
        format!("  ({})", marks.join(", "))
    };
    format!(
        "{}  {:>5}  {}{}",
        task.id,
        format_duration(task.duration_minutes),
        task.title,
        marks_str
    )
}

/// Format a layer for the layer listing
pub fn format_layer_line(layer: &Layer, items: usize) -> String {
    let hidden = if layer.is_visible { "" } else { "  (hidden)" };
    format!(
        "{}  {}  {}  {} item{}{}",
        layer.id,
        layer.color,
        layer.name,
        items,
        if items == 1 { "" } else { "s" },
        hidden
    )
}

// ---------------------------------------------------------------------------
// Argument parsing
// ---------------------------------------------------------------------------

/// Parse a status string into ItemStatus
pub fn parse_item_status(s: &str) -> Result<ItemStatus, String> {
    ItemStatus::parse_status(s).ok_or_else(|| {
        format!(
            "unknown status '{}' (expected: scheduled, completed, parked, logjam)",
            s
        )
    })
}

/// Parse an instant given as RFC 3339 or "YYYY-MM-DD HH:MM" (read as UTC)
pub fn parse_instant(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M") {
        return Ok(naive.and_utc());
    }
    Err(format!(
        "could not parse time '{}' (expected \"YYYY-MM-DD HH:MM\" or RFC 3339)",
        s
    ))
}

/// Parse a calendar day given as "YYYY-MM-DD"
pub fn parse_day(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("could not parse day '{}' (expected YYYY-MM-DD)", s))
}
