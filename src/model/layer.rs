use serde::{Deserialize, Serialize};

/// A named horizontal lane grouping timeline items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    pub id: String,
    pub name: String,
    /// Hex color like "#44DDFF"
    pub color: String,
    #[serde(default = "default_visible")]
    pub is_visible: bool,
    /// Display order, ascending top to bottom
    pub order: u32,
}

fn default_visible() -> bool {
    true
}

impl Layer {
    pub fn new(id: &str, name: &str, color: &str, order: u32) -> Self {
        Layer {
            id: id.to_string(),
            name: name.to_string(),
            color: color.to_string(),
            is_visible: true,
            order,
        }
    }
}

/// The visible layers in display order. Hidden layers are excluded before
/// any lane indexing happens, never skipped mid-index.
pub fn visible_sorted(layers: &[Layer]) -> Vec<&Layer> {
    let mut visible: Vec<&Layer> = layers.iter().filter(|l| l.is_visible).collect();
    visible.sort_by_key(|l| l.order);
    visible
}
