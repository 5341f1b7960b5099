use crate::model::settings::{ViewMode, ViewSettings};
use crate::store::{Store, StoreError};

/// Switching modes re-baselines the horizontal zoom before the mode takes
/// effect, so each mode opens at its canonical scale.
const RESET_ZOOM: f64 = 100.0;

/// Applies a view-mode switch as two sequential store writes: zoom reset
/// first, then the mode itself. At most one switch is in flight; requests
/// arriving while busy are dropped, not queued. Each write commits to the
/// in-memory settings only after the store accepted it, and a failure ends
/// the transition with the busy flag cleared.
pub struct ViewModeController {
    stage: Stage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Idle,
    WriteZoom(ViewMode),
    WriteMode(ViewMode),
}

impl ViewModeController {
    pub fn new() -> Self {
        ViewModeController { stage: Stage::Idle }
    }

    pub fn is_busy(&self) -> bool {
        self.stage != Stage::Idle
    }

    /// Mode a pending transition is heading to, for the busy indicator.
    pub fn pending_mode(&self) -> Option<ViewMode> {
        match self.stage {
            Stage::Idle => None,
            Stage::WriteZoom(mode) | Stage::WriteMode(mode) => Some(mode),
        }
    }

    /// Request a switch. Returns false when another switch is still in
    /// flight and this one was dropped.
    pub fn switch_to(&mut self, mode: ViewMode) -> bool {
        if self.is_busy() {
            return false;
        }
        self.stage = Stage::WriteZoom(mode);
        true
    }

    /// Perform at most one store write. Returns `Some(mode)` on the tick
    /// that completes a transition.
    pub fn advance(
        &mut self,
        settings: &mut ViewSettings,
        store: &mut dyn Store,
    ) -> Result<Option<ViewMode>, StoreError> {
        match self.stage {
            Stage::Idle => Ok(None),
            Stage::WriteZoom(mode) => {
                let mut next = settings.clone();
                next.zoom_horizontal = RESET_ZOOM;
                match store.put_settings(next.clone()) {
                    Ok(()) => {
                        *settings = next;
                        self.stage = Stage::WriteMode(mode);
                        Ok(None)
                    }
                    Err(e) => {
                        self.stage = Stage::Idle;
                        Err(e)
                    }
                }
            }
            Stage::WriteMode(mode) => {
                self.stage = Stage::Idle;
                let mut next = settings.clone();
                next.view_mode = mode;
                store.put_settings(next.clone())?;
                *settings = next;
                Ok(Some(mode))
            }
        }
    }

    /// Drain a pending transition in one call. The CLI path uses this; the
    /// TUI advances one write per tick instead.
    pub fn run_to_completion(
        &mut self,
        settings: &mut ViewSettings,
        store: &mut dyn Store,
    ) -> Result<Option<ViewMode>, StoreError> {
        let mut completed = None;
        while self.is_busy() {
            if let Some(mode) = self.advance(settings, store)? {
                completed = Some(mode);
            }
        }
        Ok(completed)
    }
}

impl Default for ViewModeController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::item::{ItemPatch, NewItem, TimelineItem};
    use crate::model::layer::Layer;
    use crate::model::tray::{NewTrayTask, TrayTask};
    use crate::model::Board;
    use crate::store::ItemFilter;

    /// Records every settings write; can fail the nth one.
    struct SettingsStore {
        board: Board,
        puts: Vec<ViewSettings>,
        fail_puts: Vec<usize>,
    }

    impl SettingsStore {
        fn new() -> Self {
            SettingsStore {
                board: Board::default(),
                puts: Vec::new(),
                fail_puts: Vec::new(),
            }
        }
    }

    impl Store for SettingsStore {
        fn board(&self) -> &Board {
            &self.board
        }

        fn reload(&mut self) -> Result<bool, StoreError> {
            Ok(false)
        }

        fn create_item(&mut self, _new: NewItem) -> Result<TimelineItem, StoreError> {
            unimplemented!("not exercised by these tests")
        }

        fn update_item(
            &mut self,
            _id: &str,
            _patch: &ItemPatch,
        ) -> Result<TimelineItem, StoreError> {
            unimplemented!("not exercised by these tests")
        }

        fn delete_item(&mut self, _id: &str) -> Result<TimelineItem, StoreError> {
            unimplemented!("not exercised by these tests")
        }

        fn list_items(&self, _filter: &ItemFilter) -> Vec<TimelineItem> {
            Vec::new()
        }

        fn create_layer(&mut self, _name: &str, _color: &str) -> Result<Layer, StoreError> {
            unimplemented!("not exercised by these tests")
        }

        fn rename_layer(&mut self, _id: &str, _name: &str) -> Result<Layer, StoreError> {
            unimplemented!("not exercised by these tests")
        }

        fn set_layer_color(&mut self, _id: &str, _color: &str) -> Result<Layer, StoreError> {
            unimplemented!("not exercised by these tests")
        }

        fn set_layer_visible(&mut self, _id: &str, _visible: bool) -> Result<Layer, StoreError> {
            unimplemented!("not exercised by these tests")
        }

        fn delete_layer(&mut self, _id: &str) -> Result<Layer, StoreError> {
            unimplemented!("not exercised by these tests")
        }

        fn create_tray_task(&mut self, _draft: NewTrayTask) -> Result<TrayTask, StoreError> {
            unimplemented!("not exercised by these tests")
        }

        fn delete_tray_task(&mut self, _id: &str) -> Result<TrayTask, StoreError> {
            unimplemented!("not exercised by these tests")
        }

        fn put_settings(&mut self, settings: ViewSettings) -> Result<(), StoreError> {
            if self.fail_puts.contains(&self.puts.len()) {
                return Err(StoreError::IoError(std::io::Error::other("disk full")));
            }
            self.puts.push(settings.clone());
            self.board.settings = settings;
            Ok(())
        }

        fn next_series_id(&mut self) -> Result<String, StoreError> {
            Ok(self.board.next_series_id())
        }
    }

    #[test]
    fn switch_applies_zoom_then_mode() {
        let mut store = SettingsStore::new();
        let mut settings = ViewSettings::default();
        settings.zoom_horizontal = 250.0;
        let mut ctl = ViewModeController::new();

        assert!(ctl.switch_to(ViewMode::Week));
        assert!(ctl.is_busy());
        assert_eq!(ctl.pending_mode(), Some(ViewMode::Week));

        // First write resets zoom, mode not yet changed
        assert_eq!(ctl.advance(&mut settings, &mut store).unwrap(), None);
        assert_eq!(settings.zoom_horizontal, 100.0);
        assert_eq!(settings.view_mode, ViewMode::Day);
        assert!(ctl.is_busy());

        // Second write lands the mode and clears the flag
        assert_eq!(
            ctl.advance(&mut settings, &mut store).unwrap(),
            Some(ViewMode::Week)
        );
        assert_eq!(settings.view_mode, ViewMode::Week);
        assert!(!ctl.is_busy());

        assert_eq!(store.puts.len(), 2);
        assert_eq!(store.puts[0].view_mode, ViewMode::Day);
        assert_eq!(store.puts[1].view_mode, ViewMode::Week);
    }

    #[test]
    fn requests_while_busy_are_dropped_not_queued() {
        let mut store = SettingsStore::new();
        let mut settings = ViewSettings::default();
        let mut ctl = ViewModeController::new();

        assert!(ctl.switch_to(ViewMode::Month));
        assert!(!ctl.switch_to(ViewMode::Year), "second request ignored");

        ctl.run_to_completion(&mut settings, &mut store).unwrap();
        assert_eq!(settings.view_mode, ViewMode::Month);

        // Once idle, a new request is accepted again
        assert!(ctl.switch_to(ViewMode::Year));
    }

    #[test]
    fn failed_zoom_write_aborts_and_clears_busy() {
        let mut store = SettingsStore::new();
        store.fail_puts = vec![0];
        let mut settings = ViewSettings::default();
        settings.zoom_horizontal = 250.0;
        let mut ctl = ViewModeController::new();

        ctl.switch_to(ViewMode::Week);
        assert!(ctl.advance(&mut settings, &mut store).is_err());

        assert!(!ctl.is_busy());
        assert_eq!(settings.zoom_horizontal, 250.0, "memory untouched on failure");
        assert_eq!(settings.view_mode, ViewMode::Day);
    }

    #[test]
    fn failed_mode_write_keeps_the_zoom_step_and_clears_busy() {
        let mut store = SettingsStore::new();
        store.fail_puts = vec![1];
        let mut settings = ViewSettings::default();
        settings.zoom_horizontal = 250.0;
        let mut ctl = ViewModeController::new();

        ctl.switch_to(ViewMode::Week);
        assert!(ctl.advance(&mut settings, &mut store).is_ok());
        assert!(ctl.advance(&mut settings, &mut store).is_err());

        assert!(!ctl.is_busy());
        assert_eq!(settings.zoom_horizontal, 100.0);
        assert_eq!(settings.view_mode, ViewMode::Day, "mode write never landed");
    }

    #[test]
    fn run_to_completion_reports_the_final_mode() {
        let mut store = SettingsStore::new();
        let mut settings = ViewSettings::default();
        let mut ctl = ViewModeController::new();

        ctl.switch_to(ViewMode::Year);
        let done = ctl.run_to_completion(&mut settings, &mut store).unwrap();
        assert_eq!(done, Some(ViewMode::Year));
        assert_eq!(settings.view_mode, ViewMode::Year);
    }
}
