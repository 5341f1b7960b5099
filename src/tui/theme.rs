use ratatui::style::Color;

use crate::model::UiConfig;

/// Parsed color theme for the TUI
#[derive(Debug, Clone)]
pub struct Theme {
    pub background: Color,
    pub text: Color,
    pub text_bright: Color,
    pub dim: Color,
    pub highlight: Color,
    /// The vertical marker tracking wall time
    pub now_line: Color,
    /// Day boundaries and hour ticks
    pub grid: Color,
    pub logjam: Color,
    pub completed: Color,
    pub parked: Color,
    pub toast_info: Color,
    pub toast_error: Color,
    pub selection: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            background: Color::Rgb(0x10, 0x12, 0x1A),
            text: Color::Rgb(0xC8, 0xCC, 0xD4),
            text_bright: Color::Rgb(0xFF, 0xFF, 0xFF),
            dim: Color::Rgb(0x5C, 0x64, 0x70),
            highlight: Color::Rgb(0x4C, 0x9B, 0xE8),
            now_line: Color::Rgb(0xE8, 0x53, 0x5A),
            grid: Color::Rgb(0x2A, 0x2E, 0x3A),
            logjam: Color::Rgb(0xE0, 0x6C, 0x75),
            completed: Color::Rgb(0x5C, 0x64, 0x70),
            parked: Color::Rgb(0xE8, 0xA1, 0x3C),
            toast_info: Color::Rgb(0x52, 0xC4, 0x7B),
            toast_error: Color::Rgb(0xE0, 0x6C, 0x75),
            selection: Color::Rgb(0xE8, 0xD4, 0x4C),
        }
    }
}

/// Parse a hex color string like "#4C9BE8" into an RGB Color
pub fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

/// Black or white, whichever reads against `bg`. Item bars carry arbitrary
/// layer colors so the label color is picked per bar.
pub fn contrast_text(bg: Color) -> Color {
    if let Color::Rgb(r, g, b) = bg {
        // Perceptual luma, integer weights
        let luma = 299 * r as u32 + 587 * g as u32 + 114 * b as u32;
        if luma > 140_000 {
            return Color::Rgb(0x10, 0x12, 0x1A);
        }
    }
    Color::Rgb(0xFF, 0xFF, 0xFF)
}

impl Theme {
    /// Create a theme from board UI config, falling back to defaults
    pub fn from_config(ui: &UiConfig) -> Self {
        let mut theme = Theme::default();

        // Apply color overrides from [ui.colors]
        for (key, value) in &ui.colors {
            if let Some(color) = parse_hex_color(value) {
                match key.as_str() {
                    "background" => theme.background = color,
                    "text" => theme.text = color,
                    "text_bright" => theme.text_bright = color,
                    "dim" => theme.dim = color,
                    "highlight" => theme.highlight = color,
                    "now_line" => theme.now_line = color,
                    "grid" => theme.grid = color,
                    "logjam" => theme.logjam = color,
                    "completed" => theme.completed = color,
                    "parked" => theme.parked = color,
                    "toast_info" => theme.toast_info = color,
                    "toast_error" => theme.toast_error = color,
                    "selection" => theme.selection = color,
                    _ => {}
                }
            }
        }

        theme
    }

    /// Bar fill for an item: its own override, else its layer's color.
    pub fn bar_color(&self, item_color: Option<&str>, layer_color: &str) -> Color {
        item_color
            .and_then(parse_hex_color)
            .or_else(|| parse_hex_color(layer_color))
            .unwrap_or(self.highlight)
    }
}
