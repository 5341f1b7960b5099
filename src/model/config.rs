use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::settings::ZoomBounds;

/// Configuration from board.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardConfig {
    #[serde(default)]
    pub board: BoardInfo,
    #[serde(default)]
    pub timeline: TimelineConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardInfo {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineConfig {
    /// Horizontal position of the now line as a fraction of viewport width
    #[serde(default = "default_now_fraction")]
    pub now_fraction: f64,
    #[serde(default = "default_min_zoom")]
    pub min_zoom: f64,
    #[serde(default = "default_max_zoom")]
    pub max_zoom: f64,
    /// Slack before an elapsed item is flagged as a logjam
    #[serde(default)]
    pub logjam_grace_minutes: i64,
    /// Cap on materialized occurrences per recurring placement
    #[serde(default = "default_max_occurrences")]
    pub max_occurrences: u32,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        TimelineConfig {
            now_fraction: 0.3,
            min_zoom: 25.0,
            max_zoom: 400.0,
            logjam_grace_minutes: 0,
            max_occurrences: 52,
        }
    }
}

fn default_now_fraction() -> f64 {
    0.3
}

fn default_min_zoom() -> f64 {
    25.0
}

fn default_max_zoom() -> f64 {
    400.0
}

fn default_max_occurrences() -> u32 {
    52
}

impl TimelineConfig {
    /// The now-line fraction with degenerate values pushed off the edges.
    pub fn now_fraction_clamped(&self) -> f64 {
        self.now_fraction.clamp(0.05, 0.95)
    }

    pub fn zoom_bounds(&self) -> ZoomBounds {
        if self.min_zoom > 0.0 && self.max_zoom >= self.min_zoom {
            ZoomBounds {
                min: self.min_zoom,
                max: self.max_zoom,
            }
        } else {
            ZoomBounds::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiConfig {
    /// Theme color overrides, hex strings keyed by slot name
    #[serde(default)]
    pub colors: HashMap<String, String>,
    /// Default colors cycled through when creating layers
    #[serde(default)]
    pub layer_colors: Vec<String>,
}

/// Built-in palette used when the config names no layer colors.
const DEFAULT_LAYER_COLORS: [&str; 6] = [
    "#4C9BE8", "#52C47B", "#E8A13C", "#C678DD", "#E06C75", "#56B6C2",
];

impl UiConfig {
    /// Color for the nth created layer, cycling through the palette.
    pub fn layer_color(&self, n: usize) -> String {
        if self.layer_colors.is_empty() {
            DEFAULT_LAYER_COLORS[n % DEFAULT_LAYER_COLORS.len()].to_string()
        } else {
            self.layer_colors[n % self.layer_colors.len()].clone()
        }
    }
}
