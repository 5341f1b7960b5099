use std::path::{Path, PathBuf};
use std::sync::mpsc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Events sent from the file watcher to the TUI event loop.
#[derive(Debug)]
pub enum BoardEvent {
    /// The board document or its config changed on disk.
    Changed(Vec<PathBuf>),
}

/// Watches the drift/ directory for external edits, standing in for a
/// realtime "items changed" subscription. Delivery is best-effort: the
/// loop treats any event as "reload and see", so duplicates and misses
/// are both harmless.
pub struct BoardWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<BoardEvent>,
}

impl BoardWatcher {
    /// Start watching the given `drift/` directory.
    /// Returns a `BoardWatcher` whose `poll()` method should be called each tick.
    pub fn start(drift_dir: &Path) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();
        let drift_dir_owned = drift_dir.to_path_buf();

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let event = match result {
                    Ok(e) => e,
                    Err(_) => return,
                };

                match event.kind {
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {}
                    _ => return,
                }

                // Only the board document and its config matter; our own
                // lock file and journal churn must not trigger reloads
                let relevant: Vec<PathBuf> = event
                    .paths
                    .into_iter()
                    .filter(|p| {
                        if !p.starts_with(&drift_dir_owned) {
                            return false;
                        }
                        matches!(
                            p.file_name().and_then(|n| n.to_str()),
                            Some("board.json") | Some("board.toml")
                        )
                    })
                    .collect();

                if !relevant.is_empty() {
                    let _ = tx.send(BoardEvent::Changed(relevant));
                }
            },
            Config::default(),
        )?;

        watcher.watch(drift_dir, RecursiveMode::NonRecursive)?;
        Ok(BoardWatcher {
            _watcher: watcher,
            rx,
        })
    }

    /// Non-blocking poll for pending change events.
    /// Returns all queued events (may be empty).
    pub fn poll(&self) -> Vec<BoardEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.rx.try_recv() {
            events.push(evt);
        }
        events
    }
}
