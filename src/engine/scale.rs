use chrono::{DateTime, Duration, Utc};

use crate::model::settings::ViewMode;

/// Smallest usable scale. `time_at` divides by the scale, so a zero from a
/// degenerate caller is pushed up to this instead.
const MIN_COLS_PER_HOUR: f64 = 1e-6;

/// Horizontal scale in fractional columns per hour for a mode and zoom.
pub fn cols_per_hour(mode: ViewMode, zoom_horizontal: f64) -> f64 {
    mode.base_cols_per_hour() * (zoom_horizontal / 100.0)
}

/// The time↔column mapping for one rendered frame. Pure; build a fresh one
/// per frame from the current clock reading and settings.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub now: DateTime<Utc>,
    /// Viewport width in columns
    pub width: f64,
    /// Now-line position as a fraction of width
    pub now_fraction: f64,
    pub cols_per_hour: f64,
    pub scroll_offset: f64,
}

impl Viewport {
    pub fn new(
        now: DateTime<Utc>,
        width: f64,
        now_fraction: f64,
        cols_per_hour: f64,
        scroll_offset: f64,
    ) -> Self {
        Viewport {
            now,
            width,
            now_fraction,
            cols_per_hour: cols_per_hour.max(MIN_COLS_PER_HOUR),
            scroll_offset,
        }
    }

    /// Column of the now line with zero scroll offset.
    pub fn now_line_x(&self) -> f64 {
        self.width * self.now_fraction
    }

    /// Signed distance of `t` from now, in hours.
    pub fn hours_from_now(&self, t: DateTime<Utc>) -> f64 {
        (t - self.now).num_milliseconds() as f64 / 3_600_000.0
    }

    /// Column for an instant. Past instants land left of the now line,
    /// future ones right of it.
    pub fn x_of(&self, t: DateTime<Utc>) -> f64 {
        self.now_line_x() + self.hours_from_now(t) * self.cols_per_hour + self.scroll_offset
    }

    /// Instant under a column. Exact algebraic inverse of `x_of` up to
    /// millisecond rounding.
    pub fn time_at(&self, x: f64) -> DateTime<Utc> {
        let hours = (x - self.now_line_x() - self.scroll_offset) / self.cols_per_hour;
        self.now + Duration::milliseconds((hours * 3_600_000.0).round() as i64)
    }

    /// Rendered width of a span of minutes.
    pub fn span_cols(&self, minutes: i64) -> f64 {
        minutes as f64 / 60.0 * self.cols_per_hour
    }
}
