use serde::{Deserialize, Serialize};

/// Discrete time horizon for the canvas. Closed set so scale derivation
/// is exhaustive at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Day,
    Week,
    Month,
    Year,
}

impl ViewMode {
    /// Columns per hour at 100% horizontal zoom.
    pub fn base_cols_per_hour(self) -> f64 {
        match self {
            ViewMode::Day => 6.0,
            ViewMode::Week => 1.0,
            ViewMode::Month => 0.25,
            ViewMode::Year => 0.03,
        }
    }

    pub fn parse_mode(s: &str) -> Option<ViewMode> {
        match s.to_ascii_lowercase().as_str() {
            "day" => Some(ViewMode::Day),
            "week" => Some(ViewMode::Week),
            "month" => Some(ViewMode::Month),
            "year" => Some(ViewMode::Year),
            _ => None,
        }
    }
}

impl std::fmt::Display for ViewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewMode::Day => write!(f, "day"),
            ViewMode::Week => write!(f, "week"),
            ViewMode::Month => write!(f, "month"),
            ViewMode::Year => write!(f, "year"),
        }
    }
}

/// Zoom percent limits. Both axes share one pair of bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomBounds {
    pub min: f64,
    pub max: f64,
}

impl Default for ZoomBounds {
    fn default() -> Self {
        ZoomBounds {
            min: 25.0,
            max: 400.0,
        }
    }
}

impl ZoomBounds {
    pub fn clamp(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min, self.max)
    }
}

/// Zoom step for keyboard zoom in/out, in percent points.
pub const ZOOM_STEP: f64 = 25.0;

/// The single per-board view state: zoom, lock, offset, mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewSettings {
    #[serde(default = "default_zoom")]
    pub zoom_horizontal: f64,
    #[serde(default = "default_zoom")]
    pub zoom_vertical: f64,
    /// Locked = auto-scrolling with real time
    #[serde(default = "default_locked")]
    pub is_locked: bool,
    /// Manual pan offset in fractional columns; 0 while locked
    #[serde(default)]
    pub scroll_offset: f64,
    #[serde(default = "default_mode")]
    pub view_mode: ViewMode,
}

fn default_zoom() -> f64 {
    100.0
}

fn default_locked() -> bool {
    true
}

fn default_mode() -> ViewMode {
    ViewMode::Day
}

impl Default for ViewSettings {
    fn default() -> Self {
        ViewSettings {
            zoom_horizontal: 100.0,
            zoom_vertical: 100.0,
            is_locked: true,
            scroll_offset: 0.0,
            view_mode: ViewMode::Day,
        }
    }
}

impl ViewSettings {
    /// Set horizontal zoom, clamped. Out-of-range requests land exactly on
    /// the nearer bound.
    pub fn set_zoom_horizontal(&mut self, zoom: f64, bounds: ZoomBounds) {
        self.zoom_horizontal = bounds.clamp(zoom);
    }

    pub fn set_zoom_vertical(&mut self, zoom: f64, bounds: ZoomBounds) {
        self.zoom_vertical = bounds.clamp(zoom);
    }

    pub fn zoom_in(&mut self, bounds: ZoomBounds) {
        self.set_zoom_horizontal(self.zoom_horizontal + ZOOM_STEP, bounds);
    }

    pub fn zoom_out(&mut self, bounds: ZoomBounds) {
        self.set_zoom_horizontal(self.zoom_horizontal - ZOOM_STEP, bounds);
    }

    /// Clamp whatever was read from disk back into bounds.
    pub fn sanitize(&mut self, bounds: ZoomBounds) {
        self.zoom_horizontal = bounds.clamp(self.zoom_horizontal);
        self.zoom_vertical = bounds.clamp(self.zoom_vertical);
        if self.is_locked {
            self.scroll_offset = 0.0;
        }
    }
}
