use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;

use crate::engine::{
    self, AutoScroll, Clock, DropSpot, LaneGeometry, ScheduleError, SystemClock,
    ViewModeController, Viewport, classify, cols_per_hour, snap_to_quarter_hour,
    stale_status_ids,
};
use crate::model::{
    ItemPatch, ItemStatus, TimelineItem, TrayTask, ViewMode, ViewSettings, visible_sorted,
};
use crate::store::{BoardWatcher, ItemFilter, JsonStore, Store, journal};

use super::input;
use super::render;
use super::theme::Theme;

/// Ticks of no further settings changes before the debounced write lands.
/// The event loop polls at 250ms, so this is roughly two seconds.
const SETTINGS_FLUSH_TICKS: u32 = 8;

/// Seconds between cached-status sweeps.
const STATUS_SYNC_SECS: u64 = 60;

const TOAST_TTL: StdDuration = StdDuration::from_secs(4);
const ERROR_TOAST_TTL: StdDuration = StdDuration::from_secs(8);

// ---------------------------------------------------------------------------
// Interaction state

/// Current interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Navigate,
    /// Keyboard drag: a grabbed item or tray task rides the arrow keys
    Place,
    /// Single-line text prompt
    Edit,
    /// Yes/no question before a destructive action
    Confirm,
}

/// Which pane keyboard navigation applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Timeline,
    Tray,
}

/// What is being carried by a keyboard or mouse drag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrabSource {
    Tray { task_id: String },
    Item { item_id: String },
}

/// State of a keyboard placement in progress
#[derive(Debug, Clone)]
pub struct PlaceState {
    pub source: GrabSource,
    pub start: DateTime<Utc>,
    pub lane: usize,
    /// Ghost bar width on the canvas
    pub duration_minutes: i64,
    /// Ghost bar label
    pub title: String,
}

/// What the edit prompt feeds into when committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditPrompt {
    AddTrayTask,
    RenameItem { item_id: String },
}

#[derive(Debug, Clone)]
pub struct EditState {
    pub prompt: EditPrompt,
    pub input: String,
    /// Byte offset into `input`, always on a grapheme boundary
    pub cursor: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    DeleteItem { item_id: String },
    /// Delete this occurrence and every later one in its series
    DeleteSeriesTail { series_id: String, from_index: u32 },
    DeleteTrayTask { task_id: String },
}

#[derive(Debug, Clone)]
pub struct ConfirmState {
    pub action: ConfirmAction,
    pub message: String,
}

/// A mouse drag in progress. `moved` separates a drag from a plain click.
#[derive(Debug, Clone)]
pub struct DragState {
    pub source: GrabSource,
    pub col: u16,
    pub row: u16,
    pub moved: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Error,
}

/// Transient status-row message with a monotonic deadline
#[derive(Debug, Clone)]
pub struct Toast {
    pub text: String,
    pub kind: ToastKind,
    pub expires: StdDuration,
}

// ---------------------------------------------------------------------------
// App

/// Main application state
pub struct App {
    pub store: JsonStore,
    /// Live view state; mutated every frame, flushed to the store debounced
    pub settings: ViewSettings,
    pub theme: Theme,
    pub clock: Box<dyn Clock>,
    pub auto_scroll: AutoScroll,
    pub mode_switcher: ViewModeController,
    pub watcher: Option<BoardWatcher>,
    pub mode: Mode,
    pub focus: Focus,
    /// Selected timeline item by id; cleared when the item disappears
    pub selected_item: Option<String>,
    pub tray_cursor: usize,
    pub show_tray: bool,
    pub show_help: bool,
    pub help_scroll: u16,
    pub should_quit: bool,
    pub toasts: Vec<Toast>,
    pub place: Option<PlaceState>,
    pub edit: Option<EditState>,
    pub confirm: Option<ConfirmState>,
    pub drag: Option<DragState>,
    /// Canvas rect from the last draw; mouse handlers translate through it
    pub timeline_area: Rect,
    pub tray_area: Option<Rect>,
    settings_dirty: bool,
    ticks_since_change: u32,
    last_status_sync: StdDuration,
}

impl App {
    pub fn new(store: JsonStore, clock: Box<dyn Clock>) -> Self {
        let settings = store.board().settings.clone();
        let theme = Theme::from_config(&store.config().ui);
        let auto_scroll = AutoScroll::new(clock.as_ref());
        let last_status_sync = clock.monotonic();

        let mut app = App {
            store,
            settings,
            theme,
            clock,
            auto_scroll,
            mode_switcher: ViewModeController::new(),
            watcher: None,
            mode: Mode::Navigate,
            focus: Focus::Timeline,
            selected_item: None,
            tray_cursor: 0,
            show_tray: true,
            show_help: false,
            help_scroll: 0,
            should_quit: false,
            toasts: Vec::new(),
            place: None,
            edit: None,
            confirm: None,
            drag: None,
            timeline_area: Rect::default(),
            tray_area: None,
            settings_dirty: false,
            ticks_since_change: 0,
            last_status_sync,
        };
        // Items that went stale while nothing was running get flagged on
        // open, not a minute later.
        app.sync_stale_statuses();
        app
    }

    // -- geometry ----------------------------------------------------------

    /// Mapping for the current frame. The reference instant is the scroll
    /// anchor, not the wall clock: while locked the decaying offset carries
    /// the motion, and re-sampling `now` here as well would double it.
    pub fn viewport(&self, width: u16) -> Viewport {
        Viewport::new(
            self.auto_scroll.anchor(),
            width as f64,
            self.store.config().timeline.now_fraction_clamped(),
            cols_per_hour(self.settings.view_mode, self.settings.zoom_horizontal),
            self.settings.scroll_offset,
        )
    }

    pub fn visible_layers(&self) -> Vec<&crate::model::Layer> {
        visible_sorted(&self.store.board().layers)
    }

    pub fn lane_geometry(&self) -> LaneGeometry {
        LaneGeometry::new(self.visible_layers().len(), self.settings.zoom_vertical)
    }

    /// Lane index for each visible layer id, in display order.
    pub fn lane_index_by_layer(&self) -> HashMap<String, usize> {
        self.visible_layers()
            .iter()
            .enumerate()
            .map(|(i, layer)| (layer.id.clone(), i))
            .collect()
    }

    /// Items overlapping the rendered window, hidden layers excluded,
    /// ordered by start time.
    pub fn window_items(&self, width: u16) -> Vec<TimelineItem> {
        let view = self.viewport(width);
        let filter = ItemFilter {
            from: Some(view.time_at(0.0)),
            to: Some(view.time_at(view.width)),
            ..ItemFilter::default()
        };
        let lanes = self.lane_index_by_layer();
        let mut items = self.store.list_items(&filter);
        items.retain(|i| lanes.contains_key(i.layer_id.as_str()));
        items.sort_by(|a, b| {
            a.start_time
                .cmp(&b.start_time)
                .then_with(|| a.id.cmp(&b.id))
        });
        items
    }

    pub fn selected(&self) -> Option<&TimelineItem> {
        let id = self.selected_item.as_deref()?;
        self.store.board().items.get(id)
    }

    pub fn tray_task_at_cursor(&self) -> Option<&TrayTask> {
        self.store.board().tray.get(self.tray_cursor)
    }

    /// First tray row shown for a panel with `visible` content rows. Derived
    /// from the cursor so the renderer and the mouse hit-test agree.
    pub fn tray_scroll(&self, visible: usize) -> usize {
        if visible > 0 && self.tray_cursor >= visible {
            self.tray_cursor + 1 - visible
        } else {
            0
        }
    }

    // -- toasts ------------------------------------------------------------

    pub fn toast(&mut self, text: impl Into<String>) {
        self.push_toast(text.into(), ToastKind::Info, TOAST_TTL);
    }

    pub fn toast_error(&mut self, text: impl Into<String>) {
        self.push_toast(text.into(), ToastKind::Error, ERROR_TOAST_TTL);
    }

    fn push_toast(&mut self, text: String, kind: ToastKind, ttl: StdDuration) {
        let expires = self.clock.monotonic() + ttl;
        self.toasts.push(Toast {
            text,
            kind,
            expires,
        });
    }

    /// Most recent live toast, if any.
    pub fn current_toast(&self) -> Option<&Toast> {
        self.toasts.last()
    }

    // -- view state changes ------------------------------------------------

    fn touch_settings(&mut self) {
        self.settings_dirty = true;
        self.ticks_since_change = 0;
    }

    /// Pan the window by whole hours. Positive pans toward later times.
    /// Any manual pan drops the lock.
    pub fn pan_hours(&mut self, hours: f64) {
        let cph = cols_per_hour(self.settings.view_mode, self.settings.zoom_horizontal);
        if self.settings.is_locked {
            self.auto_scroll.unlock(&mut self.settings);
        }
        self.settings.scroll_offset -= hours * cph;
        self.touch_settings();
    }

    pub fn lock_to_now(&mut self) {
        self.auto_scroll.lock(&mut self.settings, self.clock.as_ref());
        self.touch_settings();
    }

    /// Change horizontal zoom keeping the time under the now-line column
    /// fixed, so the view swells around the anchor instead of sliding.
    pub fn set_zoom_anchored(&mut self, zoom: f64) {
        let bounds = self.store.config().timeline.zoom_bounds();
        let old = cols_per_hour(self.settings.view_mode, self.settings.zoom_horizontal);
        self.settings.set_zoom_horizontal(zoom, bounds);
        let new = cols_per_hour(self.settings.view_mode, self.settings.zoom_horizontal);
        if old > 0.0 {
            self.settings.scroll_offset *= new / old;
        }
        self.touch_settings();
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom_anchored(self.settings.zoom_horizontal + crate::model::ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom_anchored(self.settings.zoom_horizontal - crate::model::ZOOM_STEP);
    }

    pub fn zoom_vertical_by(&mut self, delta: f64) {
        let bounds = self.store.config().timeline.zoom_bounds();
        self.settings
            .set_zoom_vertical(self.settings.zoom_vertical + delta, bounds);
        self.touch_settings();
    }

    /// Ask for a view mode change. The switch is two store writes spread
    /// over the next ticks; further requests are dropped until it lands.
    pub fn request_mode(&mut self, mode: ViewMode) {
        if mode == self.settings.view_mode && !self.mode_switcher.is_busy() {
            return;
        }
        if !self.mode_switcher.switch_to(mode) {
            self.toast_error("mode switch already in progress");
        }
    }

    // -- selection ---------------------------------------------------------

    pub fn select_step(&mut self, forward: bool) {
        let width = self.canvas_width();
        let items = self.window_items(width);
        if items.is_empty() {
            self.selected_item = None;
            return;
        }
        let pos = self
            .selected_item
            .as_deref()
            .and_then(|id| items.iter().position(|i| i.id == id));
        let next = match (pos, forward) {
            (Some(p), true) => (p + 1) % items.len(),
            (Some(p), false) => (p + items.len() - 1) % items.len(),
            (None, true) => 0,
            (None, false) => items.len() - 1,
        };
        self.selected_item = Some(items[next].id.clone());
    }

    fn canvas_width(&self) -> u16 {
        if self.timeline_area.width > 0 {
            self.timeline_area.width
        } else {
            120
        }
    }

    fn clamp_cursors(&mut self) {
        if let Some(id) = &self.selected_item
            && !self.store.board().items.contains_key(id)
        {
            self.selected_item = None;
        }
        let tray_len = self.store.board().tray.len();
        if self.tray_cursor >= tray_len {
            self.tray_cursor = tray_len.saturating_sub(1);
        }
    }

    // -- item actions ------------------------------------------------------

    /// Toggle `target` on the selected item. Toggling off hands the status
    /// back to the classifier, so a cleared completion on an elapsed item
    /// comes back as a logjam rather than pretending it is upcoming.
    pub fn toggle_selected_status(&mut self, target: ItemStatus) {
        let Some(item) = self.selected().cloned() else {
            self.toast_error("nothing selected");
            return;
        };
        let next = if item.status == target {
            let grace = self.store.config().timeline.logjam_grace_minutes;
            let mut probe = item.clone();
            probe.status = ItemStatus::Scheduled;
            classify(&probe, self.clock.now(), grace)
        } else {
            target
        };
        match self.store.update_item(&item.id, &ItemPatch::set_status(next)) {
            Ok(updated) => self.toast(format!("{}: {}", updated.status, updated.title)),
            Err(err) => self.toast_error(err.to_string()),
        }
    }

    /// Grab the selected item for keyboard placement.
    pub fn grab_selected(&mut self) {
        let Some(item) = self.selected().cloned() else {
            self.toast_error("nothing selected");
            return;
        };
        let lane = self
            .lane_index_by_layer()
            .get(item.layer_id.as_str())
            .copied()
            .unwrap_or(0);
        self.place = Some(PlaceState {
            source: GrabSource::Item {
                item_id: item.id.clone(),
            },
            start: snap_to_quarter_hour(item.start_time),
            lane,
            duration_minutes: item.duration_minutes,
            title: item.title,
        });
        self.mode = Mode::Place;
    }

    /// Grab the tray task under the cursor; it starts out near the now line.
    pub fn grab_tray_task(&mut self) {
        let Some(task) = self.tray_task_at_cursor().cloned() else {
            self.toast_error("tray is empty");
            return;
        };
        let lane = self
            .selected()
            .and_then(|i| self.lane_index_by_layer().get(i.layer_id.as_str()).copied())
            .unwrap_or(0);
        self.place = Some(PlaceState {
            source: GrabSource::Tray {
                task_id: task.id.clone(),
            },
            start: snap_to_quarter_hour(self.clock.now()),
            lane,
            duration_minutes: task.duration_minutes,
            title: task.title,
        });
        self.mode = Mode::Place;
        self.focus = Focus::Timeline;
    }

    /// Land a grab (keyboard or mouse) on a drop spot.
    pub fn commit_drop(&mut self, source: GrabSource, spot: DropSpot) {
        match source {
            GrabSource::Item { item_id } => {
                match engine::move_item(&mut self.store, &item_id, &spot) {
                    Ok(item) => {
                        self.selected_item = Some(item.id.clone());
                        self.toast(format!(
                            "moved {} to {}",
                            item.title,
                            format_stamp(item.start_time)
                        ));
                    }
                    Err(err) => self.toast_error(format!("move failed: {}", err)),
                }
            }
            GrabSource::Tray { task_id } => self.place_from_tray(&task_id, &spot),
        }
    }

    fn place_from_tray(&mut self, task_id: &str, spot: &DropSpot) {
        let Some(task) = self.store.board().tray_task(task_id).cloned() else {
            self.toast_error("tray task no longer exists");
            return;
        };
        let max = self.store.config().timeline.max_occurrences;
        match engine::place_tray_task(&mut self.store, &task, spot, max) {
            Ok(outcome) => {
                if outcome.failed_indices.is_empty() {
                    if outcome.created() == 1 {
                        self.toast(format!(
                            "placed {} at {}",
                            task.title,
                            format_stamp(spot.start)
                        ));
                    } else {
                        self.toast(format!(
                            "placed {} occurrences of {}",
                            outcome.created(),
                            task.title
                        ));
                    }
                } else {
                    let attempted = outcome.created() + outcome.failed_indices.len();
                    journal::log_batch_failure(
                        self.store.drift_dir(),
                        outcome.series_id.as_deref().unwrap_or("-"),
                        &task.title,
                        &outcome.failed_indices,
                        "create failed",
                    );
                    self.toast_error(format!(
                        "placed {} of {}; failures recorded in the journal",
                        outcome.created(),
                        attempted
                    ));
                }
                self.selected_item = outcome.created_ids.first().cloned();
                self.clamp_cursors();
            }
            Err(err) => {
                if let ScheduleError::NothingCreated { attempted } = err {
                    let indices: Vec<u32> = (0..attempted).collect();
                    journal::log_batch_failure(
                        self.store.drift_dir(),
                        "-",
                        &task.title,
                        &indices,
                        "no occurrence could be created",
                    );
                }
                self.toast_error(format!("place failed: {}", err));
            }
        }
    }

    /// Run the confirmed destructive action.
    pub fn perform_confirmed(&mut self, action: ConfirmAction) {
        match action {
            ConfirmAction::DeleteItem { item_id } => {
                match self.store.delete_item(&item_id) {
                    Ok(item) => self.toast(format!("deleted {} (saved to journal)", item.title)),
                    Err(err) => self.toast_error(err.to_string()),
                }
            }
            ConfirmAction::DeleteSeriesTail {
                series_id,
                from_index,
            } => match engine::truncate_series(&mut self.store, &series_id, from_index) {
                Ok(n) => self.toast(format!("removed {} occurrences", n)),
                Err(err) => self.toast_error(err.to_string()),
            },
            ConfirmAction::DeleteTrayTask { task_id } => {
                match self.store.delete_tray_task(&task_id) {
                    Ok(task) => self.toast(format!("removed {} from tray", task.title)),
                    Err(err) => self.toast_error(err.to_string()),
                }
            }
        }
        self.clamp_cursors();
    }

    // -- background work ---------------------------------------------------

    /// One frame of background work: auto-scroll decay, the staged mode
    /// switch, watcher-driven reloads, the status sweep, toast expiry and
    /// the debounced settings write.
    pub fn tick(&mut self) {
        let cph = cols_per_hour(self.settings.view_mode, self.settings.zoom_horizontal);
        self.auto_scroll
            .tick(&mut self.settings, cph, self.clock.as_ref());

        match self.mode_switcher.advance(&mut self.settings, &mut self.store) {
            Ok(Some(mode)) => self.toast(format!("view: {}", mode)),
            Ok(None) => {}
            Err(err) => self.toast_error(format!("mode switch failed: {}", err)),
        }

        let disk_changed = self
            .watcher
            .as_ref()
            .is_some_and(|w| !w.poll().is_empty());
        if disk_changed {
            self.reload_from_disk();
        }

        let mono = self.clock.monotonic();
        if mono.saturating_sub(self.last_status_sync) >= StdDuration::from_secs(STATUS_SYNC_SECS)
        {
            self.sync_stale_statuses();
        }

        self.toasts.retain(|t| t.expires > mono);

        if self.settings_dirty {
            self.ticks_since_change += 1;
            if self.ticks_since_change >= SETTINGS_FLUSH_TICKS {
                self.flush_settings();
            }
        }
    }

    fn reload_from_disk(&mut self) {
        match self.store.reload() {
            Ok(true) => {
                self.settings = self.store.board().settings.clone();
                if self.settings.is_locked {
                    self.auto_scroll
                        .lock(&mut self.settings, self.clock.as_ref());
                } else {
                    self.auto_scroll.re_anchor(self.clock.as_ref());
                }
                self.settings_dirty = false;
                self.clamp_cursors();
                self.toast("board changed on disk; reloaded");
            }
            Ok(false) => {}
            Err(err) => self.toast_error(format!("reload failed: {}", err)),
        }
    }

    /// Re-derive cached statuses and persist the ones that drifted.
    pub fn sync_stale_statuses(&mut self) {
        self.last_status_sync = self.clock.monotonic();
        let grace = self.store.config().timeline.logjam_grace_minutes;
        let now = self.clock.now();
        let stale = stale_status_ids(self.store.board().items.values(), now, grace);
        for (id, status) in stale {
            if let Err(err) = self.store.update_item(&id, &ItemPatch::set_status(status)) {
                self.toast_error(format!("status sync failed: {}", err));
                break;
            }
        }
    }

    /// Write the live view settings through to the board.
    pub fn flush_settings(&mut self) {
        if !self.settings_dirty {
            return;
        }
        match self.store.put_settings(self.settings.clone()) {
            Ok(()) => {
                self.settings_dirty = false;
                self.ticks_since_change = 0;
            }
            Err(err) => {
                // Keep dirty so the next debounce window retries.
                self.ticks_since_change = 0;
                self.toast_error(format!("could not save view state: {}", err));
            }
        }
    }

    pub fn quit(&mut self) {
        self.flush_settings();
        self.should_quit = true;
    }
}

/// Short human timestamp for toasts and the status row.
pub fn format_stamp(t: DateTime<Utc>) -> String {
    t.format("%a %d %b %H:%M").to_string()
}

// ---------------------------------------------------------------------------
// Event loop

/// Run the TUI application
pub fn run(board_dir: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let start = match board_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let store = JsonStore::open(&start)?;

    let mut app = App::new(store, Box::new(SystemClock::new()));
    match BoardWatcher::start(app.store.drift_dir()) {
        Ok(watcher) => app.watcher = Some(watcher),
        Err(_) => {
            app.toast_error("file watching unavailable; external edits need a restart");
        }
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app);

    // The last debounce window may not have elapsed.
    app.flush_settings();

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|frame| render::render(frame, app))?;

        if event::poll(StdDuration::from_millis(250))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    input::handle_key(app, key);
                }
                Event::Mouse(mouse) => input::handle_mouse(app, mouse),
                _ => {}
            }
        }

        app.tick();

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
