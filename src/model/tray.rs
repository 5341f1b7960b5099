use serde::{Deserialize, Serialize};

use super::item::InvalidItem;
use super::recurrence::RecurrenceRule;

/// An unscheduled task waiting in the tray. Dragging (or `dr schedule`)
/// turns it into one or more timeline items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrayTask {
    pub id: String,
    pub title: String,
    pub duration_minutes: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub is_meeting: bool,
    #[serde(default)]
    pub is_flexible: bool,
    /// Templates survive placement; plain tasks are consumed by it
    #[serde(default)]
    pub is_template: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrenceRule>,
}

impl TrayTask {
    pub fn new(id: &str, title: &str, duration_minutes: i64) -> Self {
        TrayTask {
            id: id.to_string(),
            title: title.to_string(),
            duration_minutes,
            color: None,
            is_meeting: false,
            is_flexible: false,
            is_template: false,
            recurrence: None,
        }
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }
}

/// Fields for a tray task before an id is assigned.
#[derive(Debug, Clone)]
pub struct NewTrayTask {
    pub title: String,
    pub duration_minutes: i64,
    pub color: Option<String>,
    pub is_meeting: bool,
    pub is_flexible: bool,
    pub is_template: bool,
    pub recurrence: Option<RecurrenceRule>,
}

impl NewTrayTask {
    pub fn plain(title: &str, duration_minutes: i64) -> Self {
        NewTrayTask {
            title: title.to_string(),
            duration_minutes,
            color: None,
            is_meeting: false,
            is_flexible: false,
            is_template: false,
            recurrence: None,
        }
    }

    pub fn validate(&self) -> Result<(), InvalidItem> {
        if self.title.trim().is_empty() {
            return Err(InvalidItem::EmptyTitle);
        }
        if self.duration_minutes <= 0 {
            return Err(InvalidItem::NonPositiveDuration(self.duration_minutes));
        }
        Ok(())
    }

    pub fn into_task(self, id: String) -> TrayTask {
        TrayTask {
            id,
            title: self.title,
            duration_minutes: self.duration_minutes,
            color: self.color,
            is_meeting: self.is_meeting,
            is_flexible: self.is_flexible,
            is_template: self.is_template,
            recurrence: self.recurrence,
        }
    }
}
