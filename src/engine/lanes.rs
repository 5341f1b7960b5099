/// Vertical geometry of the lane area: a header band followed by equal-height
/// lanes, one per visible layer.
#[derive(Debug, Clone, Copy)]
pub struct LaneGeometry {
    /// Rows above the first lane (time axis)
    pub header_rows: u16,
    /// Rows per lane, always at least 1
    pub lane_rows: u16,
    /// Number of visible lanes participating in the index space
    pub lane_count: usize,
}

/// Rows at the top of the canvas taken by the time axis.
pub const HEADER_ROWS: u16 = 2;

/// Lane height in rows for a vertical zoom percent.
pub fn lane_rows(zoom_vertical: f64) -> u16 {
    let rows = (3.0 * zoom_vertical / 100.0).round();
    if rows < 1.0 { 1 } else { rows as u16 }
}

impl LaneGeometry {
    pub fn new(lane_count: usize, zoom_vertical: f64) -> Self {
        LaneGeometry {
            header_rows: HEADER_ROWS,
            lane_rows: lane_rows(zoom_vertical),
            lane_count,
        }
    }

    /// Visible-lane index under a row. Rows above the first lane clamp to
    /// lane 0, rows below the last clamp to the last lane. `None` iff there
    /// are no visible lanes; callers must guard before resolving a drop.
    pub fn lane_at(&self, y: u16) -> Option<usize> {
        if self.lane_count == 0 {
            return None;
        }
        let offset = y.saturating_sub(self.header_rows);
        let index = (offset / self.lane_rows) as usize;
        Some(index.min(self.lane_count - 1))
    }

    /// First row of a lane.
    pub fn lane_top(&self, index: usize) -> u16 {
        self.header_rows + index as u16 * self.lane_rows
    }

    /// Total rows needed to show every lane.
    pub fn total_rows(&self) -> u16 {
        self.header_rows + self.lane_count as u16 * self.lane_rows
    }
}
