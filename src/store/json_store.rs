use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::model::config::BoardConfig;
use crate::model::item::{ItemPatch, NewItem, TimelineItem};
use crate::model::layer::Layer;
use crate::model::settings::ViewSettings;
use crate::model::tray::{NewTrayTask, TrayTask};
use crate::model::Board;
use crate::store::journal;
use crate::store::lock::BoardLock;
use crate::store::{ItemFilter, Store, StoreError};

/// Board persistence over a `drift/` directory: `board.json` holds the
/// document, `board.toml` the configuration. Every mutation commits a
/// full atomic rewrite of board.json under the advisory lock; a failed
/// write leaves the in-memory board untouched.
pub struct JsonStore {
    root: PathBuf,
    drift_dir: PathBuf,
    board_path: PathBuf,
    board: Board,
    config: BoardConfig,
    /// (mtime, len) of the file as last read or written by us
    loaded: Option<(SystemTime, u64)>,
}

// ---------------------------------------------------------------------------
// Discovery and construction
// ---------------------------------------------------------------------------

/// Discover the board root by walking up from the given directory,
/// looking for a `drift/board.json`.
pub fn discover_board(start: &Path) -> Result<PathBuf, StoreError> {
    let mut current = start.to_path_buf();
    loop {
        let drift_dir = current.join("drift");
        if drift_dir.is_dir() && drift_dir.join("board.json").exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(StoreError::NotABoard);
        }
    }
}

/// Sample config written by `dr init`; everything commented, so parsing
/// yields the defaults until the user uncomments a line.
const CONFIG_TEMPLATE: &str = "\
# drift board configuration
#
# [timeline]
# now_fraction = 0.3
# min_zoom = 25.0
# max_zoom = 400.0
# logjam_grace_minutes = 0
# max_occurrences = 52
#
# [ui]
# layer_colors = [\"#4C9BE8\", \"#52C47B\", \"#E8A13C\"]
";

impl JsonStore {
    /// Create a fresh board under `root/drift/` with one starter layer.
    pub fn init(root: &Path, name: &str) -> Result<JsonStore, StoreError> {
        let drift_dir = root.join("drift");
        let board_path = drift_dir.join("board.json");
        if board_path.exists() {
            return Err(StoreError::AlreadyABoard(root.to_path_buf()));
        }
        fs::create_dir_all(&drift_dir)?;

        let config = BoardConfig::default();
        let mut board = Board {
            name: name.to_string(),
            ..Default::default()
        };
        let layer_id = board.next_layer_id();
        board
            .layers
            .push(Layer::new(&layer_id, "General", &config.ui.layer_color(0), 1));

        let mut store = JsonStore {
            root: root.to_path_buf(),
            drift_dir: drift_dir.clone(),
            board_path,
            board: Board::default(),
            config,
            loaded: None,
        };
        store.save_board(&board)?;
        store.board = board;

        let config_path = drift_dir.join("board.toml");
        if !config_path.exists() {
            fs::write(&config_path, CONFIG_TEMPLATE)?;
        }
        Ok(store)
    }

    /// Open the board discovered from `start`.
    pub fn open(start: &Path) -> Result<JsonStore, StoreError> {
        let root = discover_board(start)?;
        let drift_dir = root.join("drift");
        let board_path = drift_dir.join("board.json");

        let config = load_config(&drift_dir)?;
        let (board, meta) = read_board(&board_path, &config)?;

        Ok(JsonStore {
            root,
            drift_dir,
            board_path,
            board,
            config,
            loaded: Some(meta),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn drift_dir(&self) -> &Path {
        &self.drift_dir
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Persistence internals
    // -----------------------------------------------------------------------

    fn save_board(&mut self, board: &Board) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(board)?;
        let _lock = BoardLock::acquire_default(&self.drift_dir)
            .map_err(|e| StoreError::IoError(std::io::Error::other(e.to_string())))?;
        if let Err(e) = journal::atomic_write(&self.board_path, content.as_bytes()) {
            journal::log_write_failure(&self.drift_dir, &e.to_string(), &content);
            return Err(StoreError::IoError(e));
        }
        self.loaded = file_meta(&self.board_path).ok();
        Ok(())
    }

    /// Persist `next` and only then make it the current board.
    fn commit(&mut self, next: Board) -> Result<(), StoreError> {
        self.save_board(&next)?;
        self.board = next;
        Ok(())
    }
}

fn load_config(drift_dir: &Path) -> Result<BoardConfig, StoreError> {
    let config_path = drift_dir.join("board.toml");
    if !config_path.exists() {
        return Ok(BoardConfig::default());
    }
    let text = fs::read_to_string(&config_path).map_err(|e| StoreError::ReadError {
        path: config_path,
        source: e,
    })?;
    Ok(toml::from_str(&text)?)
}

fn read_board(
    board_path: &Path,
    config: &BoardConfig,
) -> Result<(Board, (SystemTime, u64)), StoreError> {
    let text = fs::read_to_string(board_path).map_err(|e| StoreError::ReadError {
        path: board_path.to_path_buf(),
        source: e,
    })?;
    let mut board: Board = serde_json::from_str(&text).map_err(|e| StoreError::ParseError {
        path: board_path.to_path_buf(),
        source: e,
    })?;
    board.settings.sanitize(config.timeline.zoom_bounds());
    let meta = file_meta(board_path)?;
    Ok((board, meta))
}

fn file_meta(path: &Path) -> Result<(SystemTime, u64), std::io::Error> {
    let meta = fs::metadata(path)?;
    Ok((meta.modified()?, meta.len()))
}

// ---------------------------------------------------------------------------
// Store implementation
// ---------------------------------------------------------------------------

impl Store for JsonStore {
    fn board(&self) -> &Board {
        &self.board
    }

    fn reload(&mut self) -> Result<bool, StoreError> {
        let current = file_meta(&self.board_path)?;
        if Some(current) == self.loaded {
            return Ok(false);
        }
        let (board, meta) = read_board(&self.board_path, &self.config)?;
        self.board = board;
        self.loaded = Some(meta);
        Ok(true)
    }

    fn create_item(&mut self, new: NewItem) -> Result<TimelineItem, StoreError> {
        new.validate()?;
        if self.board.layer(&new.layer_id).is_none() {
            return Err(StoreError::UnknownLayer(new.layer_id.clone()));
        }
        let mut next = self.board.clone();
        let id = next.next_item_id();
        let item = new.into_item(id.clone());
        next.items.insert(id, item.clone());
        self.commit(next)?;
        Ok(item)
    }

    fn update_item(&mut self, id: &str, patch: &ItemPatch) -> Result<TimelineItem, StoreError> {
        if let Some(layer_id) = &patch.layer_id
            && self.board.layer(layer_id).is_none()
        {
            return Err(StoreError::UnknownLayer(layer_id.clone()));
        }
        let mut next = self.board.clone();
        let item = next
            .items
            .get_mut(id)
            .ok_or_else(|| StoreError::UnknownItem(id.to_string()))?;
        patch.apply(item);
        let updated = item.clone();
        self.commit(next)?;
        Ok(updated)
    }

    fn delete_item(&mut self, id: &str) -> Result<TimelineItem, StoreError> {
        let mut next = self.board.clone();
        let removed = next
            .items
            .shift_remove(id)
            .ok_or_else(|| StoreError::UnknownItem(id.to_string()))?;
        self.commit(next)?;
        // Journaled after the commit so a failed delete leaves no entry
        journal::log_item_deletion(&self.drift_dir, &removed);
        Ok(removed)
    }

    fn list_items(&self, filter: &ItemFilter) -> Vec<TimelineItem> {
        self.board
            .items
            .values()
            .filter(|i| filter.matches(i))
            .cloned()
            .collect()
    }

    fn create_layer(&mut self, name: &str, color: &str) -> Result<Layer, StoreError> {
        let mut next = self.board.clone();
        let id = next.next_layer_id();
        let order = next.layers.iter().map(|l| l.order).max().unwrap_or(0) + 1;
        let layer = Layer::new(&id, name, color, order);
        next.layers.push(layer.clone());
        self.commit(next)?;
        Ok(layer)
    }

    fn rename_layer(&mut self, id: &str, name: &str) -> Result<Layer, StoreError> {
        let mut next = self.board.clone();
        let layer = next
            .layer_mut(id)
            .ok_or_else(|| StoreError::UnknownLayer(id.to_string()))?;
        layer.name = name.to_string();
        let updated = layer.clone();
        self.commit(next)?;
        Ok(updated)
    }

    fn set_layer_color(&mut self, id: &str, color: &str) -> Result<Layer, StoreError> {
        let mut next = self.board.clone();
        let layer = next
            .layer_mut(id)
            .ok_or_else(|| StoreError::UnknownLayer(id.to_string()))?;
        layer.color = color.to_string();
        let updated = layer.clone();
        self.commit(next)?;
        Ok(updated)
    }

    fn set_layer_visible(&mut self, id: &str, visible: bool) -> Result<Layer, StoreError> {
        let mut next = self.board.clone();
        let layer = next
            .layer_mut(id)
            .ok_or_else(|| StoreError::UnknownLayer(id.to_string()))?;
        layer.is_visible = visible;
        let updated = layer.clone();
        self.commit(next)?;
        Ok(updated)
    }

    fn delete_layer(&mut self, id: &str) -> Result<Layer, StoreError> {
        if self.board.items.values().any(|i| i.layer_id == id) {
            return Err(StoreError::LayerInUse(id.to_string()));
        }
        let mut next = self.board.clone();
        let pos = next
            .layers
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| StoreError::UnknownLayer(id.to_string()))?;
        let removed = next.layers.remove(pos);
        self.commit(next)?;
        Ok(removed)
    }

    fn create_tray_task(&mut self, draft: NewTrayTask) -> Result<TrayTask, StoreError> {
        draft.validate()?;
        let mut next = self.board.clone();
        let id = next.next_tray_id();
        let task = draft.into_task(id);
        next.tray.push(task.clone());
        self.commit(next)?;
        Ok(task)
    }

    fn delete_tray_task(&mut self, id: &str) -> Result<TrayTask, StoreError> {
        let mut next = self.board.clone();
        let pos = next
            .tray
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| StoreError::UnknownTrayTask(id.to_string()))?;
        let removed = next.tray.remove(pos);
        self.commit(next)?;
        Ok(removed)
    }

    fn put_settings(&mut self, settings: ViewSettings) -> Result<(), StoreError> {
        let bounds = self.config.timeline.zoom_bounds();
        let mut next = self.board.clone();
        next.settings = settings;
        next.settings.zoom_horizontal = bounds.clamp(next.settings.zoom_horizontal);
        next.settings.zoom_vertical = bounds.clamp(next.settings.zoom_vertical);
        self.commit(next)
    }

    fn next_series_id(&mut self) -> Result<String, StoreError> {
        let mut next = self.board.clone();
        let id = next.next_series_id();
        self.commit(next)?;
        Ok(id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
