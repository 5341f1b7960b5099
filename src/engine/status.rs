use chrono::{DateTime, Duration, Utc};

use crate::model::item::{ItemStatus, TimelineItem};

/// Derive an item's display status at `now`. First match wins: completion
/// and parking stick regardless of elapsed time, then an item whose window
/// has fully elapsed (plus the grace slack) is a logjam, everything else is
/// scheduled.
pub fn classify(item: &TimelineItem, now: DateTime<Utc>, grace_minutes: i64) -> ItemStatus {
    match item.status {
        ItemStatus::Completed => ItemStatus::Completed,
        ItemStatus::Parked => ItemStatus::Parked,
        ItemStatus::Scheduled | ItemStatus::Logjam => {
            if item.end_time() + Duration::minutes(grace_minutes) < now {
                ItemStatus::Logjam
            } else {
                ItemStatus::Scheduled
            }
        }
    }
}

/// Display-only predicate: the item's window contains `now`. Never persisted.
pub fn is_active(item: &TimelineItem, now: DateTime<Utc>) -> bool {
    classify(item, now, 0) == ItemStatus::Scheduled
        && item.start_time <= now
        && now <= item.end_time()
}

/// Ids whose cached status is stale against the classifier: scheduled items
/// that crossed the logjam boundary, and cached logjams that moved back out
/// of it (rescheduled into the future).
pub fn stale_status_ids<'a>(
    items: impl Iterator<Item = &'a TimelineItem>,
    now: DateTime<Utc>,
    grace_minutes: i64,
) -> Vec<(String, ItemStatus)> {
    items
        .filter_map(|item| {
            let derived = classify(item, now, grace_minutes);
            if derived != item.status {
                Some((item.id.clone(), derived))
            } else {
                None
            }
        })
        .collect()
}
