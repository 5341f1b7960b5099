use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use crate::model::recurrence::Recurrence;

/// Move a requested start forward onto the pattern's anchor. Never moves
/// backward: dropping a "Monday" task on a Wednesday schedules the following
/// Monday, not the one already past. A date already on the anchor stays.
pub fn align_start(requested: DateTime<Utc>, recurrence: Recurrence) -> DateTime<Utc> {
    match recurrence {
        Recurrence::Daily | Recurrence::EveryNDays { .. } => requested,
        Recurrence::Weekly { weekday } => {
            let days_ahead =
                (7 + weekday.num_days_from_monday() as i64
                    - requested.weekday().num_days_from_monday() as i64)
                    % 7;
            requested + Duration::days(days_ahead)
        }
        Recurrence::Monthly { day } => {
            // First clamped day-of-month candidate on or after the request
            for k in 0..=2 {
                if let Some(candidate) = monthly_candidate(requested, day, k)
                    && candidate.date_naive() >= requested.date_naive()
                {
                    return candidate;
                }
            }
            requested
        }
    }
}

/// Occurrence `k` months after `anchor`, on the pattern's day-of-month
/// clamped to the target month's length, at the anchor's time-of-day.
fn monthly_candidate(anchor: DateTime<Utc>, day: u32, k: u32) -> Option<DateTime<Utc>> {
    let months = anchor.year() as i64 * 12 + anchor.month0() as i64 + k as i64;
    let year = (months.div_euclid(12)) as i32;
    let month = months.rem_euclid(12) as u32 + 1;
    let clamped = day.min(days_in_month(year, month));
    let date = NaiveDate::from_ymd_opt(year, month, clamped)?;
    Some(date.and_time(anchor.time()).and_utc())
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if year % 4 == 0 && (year % 100 != 0 || year % 400 == 0) {
                29
            } else {
                28
            }
        }
        _ => 30,
    }
}

/// Lazy, bounded sequence of occurrence instants for one recurring
/// placement. Every instant keeps the aligned start's time-of-day; weekly
/// steps are exactly seven days, daily exactly one day (UTC arithmetic, no
/// wall-clock adjustment).
pub fn expand(
    aligned_start: DateTime<Utc>,
    recurrence: Recurrence,
    until: Option<DateTime<Utc>>,
    max_occurrences: u32,
) -> Occurrences {
    Occurrences {
        recurrence,
        anchor: aligned_start,
        until,
        remaining: max_occurrences,
        k: 0,
    }
}

/// Iterator produced by [`expand`].
#[derive(Debug, Clone)]
pub struct Occurrences {
    recurrence: Recurrence,
    anchor: DateTime<Utc>,
    until: Option<DateTime<Utc>>,
    remaining: u32,
    k: u32,
}

impl Occurrences {
    /// Occurrence `k` counted from the anchor. Computed from the anchor
    /// each time so monthly clamping never loses the pattern's day (Jan 31
    /// yields Feb 29 then Mar 31, not Mar 29).
    fn occurrence_at(&self, k: u32) -> Option<DateTime<Utc>> {
        match self.recurrence {
            Recurrence::Daily => Some(self.anchor + Duration::days(k as i64)),
            Recurrence::Weekly { .. } => Some(self.anchor + Duration::weeks(k as i64)),
            Recurrence::EveryNDays { n } => {
                Some(self.anchor + Duration::days(k as i64 * n as i64))
            }
            Recurrence::Monthly { day } => monthly_candidate(self.anchor, day, k),
        }
    }
}

impl Iterator for Occurrences {
    type Item = DateTime<Utc>;

    fn next(&mut self) -> Option<DateTime<Utc>> {
        if self.remaining == 0 {
            return None;
        }
        let t = self.occurrence_at(self.k)?;
        if let Some(until) = self.until
            && t >= until
        {
            self.remaining = 0;
            return None;
        }
        self.remaining -= 1;
        self.k += 1;
        Some(t)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining as usize))
    }
}
