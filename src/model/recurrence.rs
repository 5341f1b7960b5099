use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// How a recurring placement repeats. Closed set so mode handling is
/// exhaustive at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Recurrence {
    /// Every day
    Daily,
    /// Every week on the given weekday
    Weekly { weekday: Weekday },
    /// Every month on the given day (clamped to month length)
    Monthly { day: u32 },
    /// Every `n` days
    EveryNDays { n: u32 },
}

impl Recurrence {
    /// Short form used by the CLI and JSON output: `daily`, `weekly:mon`,
    /// `monthly:15`, `every:3`.
    pub fn parse_rule(s: &str) -> Option<Recurrence> {
        let s = s.trim().to_ascii_lowercase();
        if s == "daily" {
            return Some(Recurrence::Daily);
        }
        if let Some(day) = s.strip_prefix("weekly:") {
            return parse_weekday(day).map(|weekday| Recurrence::Weekly { weekday });
        }
        if let Some(day) = s.strip_prefix("monthly:") {
            let day: u32 = day.parse().ok()?;
            if (1..=31).contains(&day) {
                return Some(Recurrence::Monthly { day });
            }
            return None;
        }
        if let Some(n) = s.strip_prefix("every:") {
            let n: u32 = n.parse().ok()?;
            if n >= 1 {
                return Some(Recurrence::EveryNDays { n });
            }
        }
        None
    }
}

impl std::fmt::Display for Recurrence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Recurrence::Daily => write!(f, "daily"),
            Recurrence::Weekly { weekday } => write!(f, "weekly:{}", weekday_short(*weekday)),
            Recurrence::Monthly { day } => write!(f, "monthly:{}", day),
            Recurrence::EveryNDays { n } => write!(f, "every:{}", n),
        }
    }
}

fn parse_weekday(s: &str) -> Option<Weekday> {
    match s {
        "mon" | "monday" => Some(Weekday::Mon),
        "tue" | "tuesday" => Some(Weekday::Tue),
        "wed" | "wednesday" => Some(Weekday::Wed),
        "thu" | "thursday" => Some(Weekday::Thu),
        "fri" | "friday" => Some(Weekday::Fri),
        "sat" | "saturday" => Some(Weekday::Sat),
        "sun" | "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

fn weekday_short(w: Weekday) -> &'static str {
    match w {
        Weekday::Mon => "mon",
        Weekday::Tue => "tue",
        Weekday::Wed => "wed",
        Weekday::Thu => "thu",
        Weekday::Fri => "fri",
        Weekday::Sat => "sat",
        Weekday::Sun => "sun",
    }
}

/// A recurrence plus its optional end. Read-only once attached to a tray
/// task; consumed by the expander at placement time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub recurrence: Recurrence,
    /// No occurrence is materialized at or after this instant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<DateTime<Utc>>,
}

impl RecurrenceRule {
    pub fn new(recurrence: Recurrence) -> Self {
        RecurrenceRule {
            recurrence,
            until: None,
        }
    }
}
