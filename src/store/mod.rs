pub mod journal;
pub mod json_store;
pub mod lock;
pub mod watcher;

pub use journal::{JournalCategory, JournalEntry};
pub use json_store::{discover_board, JsonStore};
pub use lock::BoardLock;
pub use watcher::{BoardEvent, BoardWatcher};

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::model::item::{InvalidItem, ItemPatch, ItemStatus, NewItem, TimelineItem};
use crate::model::layer::Layer;
use crate::model::settings::ViewSettings;
use crate::model::tray::{NewTrayTask, TrayTask};
use crate::model::Board;

/// Error type for board persistence operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not a drift board: no drift/ directory found")]
    NotABoard,
    #[error("already a drift board: {0}")]
    AlreadyABoard(PathBuf),
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not parse board.toml: {0}")]
    ConfigParseError(#[from] toml::de::Error),
    #[error("could not serialize board: {0}")]
    SerializeError(#[from] serde_json::Error),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    InvalidItem(#[from] InvalidItem),
    #[error("no item with id {0}")]
    UnknownItem(String),
    #[error("no layer with id {0}")]
    UnknownLayer(String),
    #[error("no tray task with id {0}")]
    UnknownTrayTask(String),
    #[error("layer {0} still has items scheduled on it")]
    LayerInUse(String),
}

/// Selection for `list_items`. Empty filter matches everything.
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub layer_id: Option<String>,
    pub status: Option<ItemStatus>,
    pub series_id: Option<String>,
    /// Keep items whose window overlaps [from, to)
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl ItemFilter {
    pub fn matches(&self, item: &TimelineItem) -> bool {
        if let Some(layer_id) = &self.layer_id
            && item.layer_id != *layer_id
        {
            return false;
        }
        if let Some(status) = self.status
            && item.status != status
        {
            return false;
        }
        if let Some(series_id) = &self.series_id
            && item.series_id.as_deref() != Some(series_id.as_str())
        {
            return false;
        }
        if let Some(from) = self.from
            && item.end_time() <= from
        {
            return false;
        }
        if let Some(to) = self.to
            && item.start_time >= to
        {
            return false;
        }
        true
    }
}

/// The persistence collaborator the engine and UI write through. Every
/// mutation either lands fully or returns an error with the board
/// unchanged; callers surface failures as notifications, never crashes.
pub trait Store {
    fn board(&self) -> &Board;

    /// Re-read from the backing file if it changed. Returns true when the
    /// in-memory board was replaced. Duplicate or missed change
    /// notifications are fine; reload is idempotent.
    fn reload(&mut self) -> Result<bool, StoreError>;

    fn create_item(&mut self, new: NewItem) -> Result<TimelineItem, StoreError>;
    fn update_item(&mut self, id: &str, patch: &ItemPatch) -> Result<TimelineItem, StoreError>;
    fn delete_item(&mut self, id: &str) -> Result<TimelineItem, StoreError>;
    fn list_items(&self, filter: &ItemFilter) -> Vec<TimelineItem>;

    fn create_layer(&mut self, name: &str, color: &str) -> Result<Layer, StoreError>;
    fn rename_layer(&mut self, id: &str, name: &str) -> Result<Layer, StoreError>;
    fn set_layer_color(&mut self, id: &str, color: &str) -> Result<Layer, StoreError>;
    fn set_layer_visible(&mut self, id: &str, visible: bool) -> Result<Layer, StoreError>;
    fn delete_layer(&mut self, id: &str) -> Result<Layer, StoreError>;

    fn create_tray_task(&mut self, draft: NewTrayTask) -> Result<TrayTask, StoreError>;
    fn delete_tray_task(&mut self, id: &str) -> Result<TrayTask, StoreError>;

    fn put_settings(&mut self, settings: ViewSettings) -> Result<(), StoreError>;

    /// Reserve the next series id for a recurring placement.
    fn next_series_id(&mut self) -> Result<String, StoreError>;
}
