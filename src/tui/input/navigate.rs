use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::model::{ItemStatus, ViewMode, ZOOM_STEP};
use crate::store::Store;
use crate::tui::app::{App, ConfirmAction, ConfirmState, EditPrompt, EditState, Focus, Mode};

pub(super) fn handle_navigate(app: &mut App, key: KeyEvent) {
    // Help overlay intercepts everything except its own keys
    if app.show_help {
        match key.code {
            KeyCode::Char('?') | KeyCode::Char('q') | KeyCode::Esc => app.show_help = false,
            KeyCode::Char('j') | KeyCode::Down => {
                app.help_scroll = app.help_scroll.saturating_add(1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                app.help_scroll = app.help_scroll.saturating_sub(1);
            }
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('?') => {
            app.show_help = true;
            app.help_scroll = 0;
        }
        KeyCode::Tab => {
            if app.show_tray {
                app.focus = match app.focus {
                    Focus::Timeline => Focus::Tray,
                    Focus::Tray => Focus::Timeline,
                };
            }
        }
        KeyCode::Char('t') => {
            app.show_tray = !app.show_tray;
            if !app.show_tray {
                app.focus = Focus::Timeline;
            }
        }
        KeyCode::Char('a') => {
            app.edit = Some(EditState {
                prompt: EditPrompt::AddTrayTask,
                input: String::new(),
                cursor: 0,
            });
            app.mode = Mode::Edit;
        }
        _ => match app.focus {
            Focus::Timeline => handle_timeline_key(app, key),
            Focus::Tray => handle_tray_key(app, key),
        },
    }
}

fn handle_timeline_key(app: &mut App, key: KeyEvent) {
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);
    match key.code {
        // Panning; shifted variants jump by a day
        KeyCode::Char('h') => app.pan_hours(-1.0),
        KeyCode::Char('l') => app.pan_hours(1.0),
        KeyCode::Char('H') => app.pan_hours(-24.0),
        KeyCode::Char('L') => app.pan_hours(24.0),
        KeyCode::Left => app.pan_hours(if shift { -24.0 } else { -1.0 }),
        KeyCode::Right => app.pan_hours(if shift { 24.0 } else { 1.0 }),

        KeyCode::Char('j') | KeyCode::Down => app.select_step(true),
        KeyCode::Char('k') | KeyCode::Up => app.select_step(false),

        KeyCode::Char('n') => app.lock_to_now(),

        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
        KeyCode::Char('-') => app.zoom_out(),
        KeyCode::Char('>') => app.zoom_vertical_by(ZOOM_STEP),
        KeyCode::Char('<') => app.zoom_vertical_by(-ZOOM_STEP),

        KeyCode::Char('m') => cycle_mode(app),
        KeyCode::Char('1') => app.request_mode(ViewMode::Day),
        KeyCode::Char('2') => app.request_mode(ViewMode::Week),
        KeyCode::Char('3') => app.request_mode(ViewMode::Month),
        KeyCode::Char('4') => app.request_mode(ViewMode::Year),

        KeyCode::Char('x') => app.toggle_selected_status(ItemStatus::Completed),
        KeyCode::Char('p') => app.toggle_selected_status(ItemStatus::Parked),

        KeyCode::Char('g') | KeyCode::Enter => app.grab_selected(),
        KeyCode::Char('r') => rename_selected(app),
        KeyCode::Char('d') => confirm_delete_item(app),
        KeyCode::Char('D') => confirm_delete_series_tail(app),
        _ => {}
    }
}

fn handle_tray_key(app: &mut App, key: KeyEvent) {
    let len = app.store.board().tray.len();
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            if len > 0 {
                app.tray_cursor = (app.tray_cursor + 1) % len;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            if len > 0 {
                app.tray_cursor = (app.tray_cursor + len - 1) % len;
            }
        }
        KeyCode::Char('g') | KeyCode::Enter => app.grab_tray_task(),
        KeyCode::Char('d') => confirm_delete_tray_task(app),
        _ => {}
    }
}

/// Day -> Week -> Month -> Year -> Day. Based on the pending mode so a
/// second press while a switch is in flight targets the right neighbor,
/// even though it will be dropped until the switch lands.
fn cycle_mode(app: &mut App) {
    let current = app
        .mode_switcher
        .pending_mode()
        .unwrap_or(app.settings.view_mode);
    let next = match current {
        ViewMode::Day => ViewMode::Week,
        ViewMode::Week => ViewMode::Month,
        ViewMode::Month => ViewMode::Year,
        ViewMode::Year => ViewMode::Day,
    };
    app.request_mode(next);
}

fn rename_selected(app: &mut App) {
    let Some(item) = app.selected().cloned() else {
        app.toast_error("nothing selected");
        return;
    };
    let cursor = item.title.len();
    app.edit = Some(EditState {
        prompt: EditPrompt::RenameItem { item_id: item.id },
        input: item.title,
        cursor,
    });
    app.mode = Mode::Edit;
}

fn confirm_delete_item(app: &mut App) {
    let Some(item) = app.selected().cloned() else {
        app.toast_error("nothing selected");
        return;
    };
    app.confirm = Some(ConfirmState {
        action: ConfirmAction::DeleteItem { item_id: item.id },
        message: format!("delete \"{}\"?", item.title),
    });
    app.mode = Mode::Confirm;
}

fn confirm_delete_series_tail(app: &mut App) {
    let Some(item) = app.selected().cloned() else {
        app.toast_error("nothing selected");
        return;
    };
    let (Some(series_id), Some(from_index)) = (item.series_id, item.occurrence_index) else {
        app.toast_error("not part of a series");
        return;
    };
    app.confirm = Some(ConfirmState {
        action: ConfirmAction::DeleteSeriesTail {
            series_id,
            from_index,
        },
        message: format!("delete \"{}\" and every later occurrence?", item.title),
    });
    app.mode = Mode::Confirm;
}

fn confirm_delete_tray_task(app: &mut App) {
    let Some(task) = app.tray_task_at_cursor().cloned() else {
        app.toast_error("tray is empty");
        return;
    };
    app.confirm = Some(ConfirmState {
        action: ConfirmAction::DeleteTrayTask { task_id: task.id },
        message: format!("remove \"{}\" from the tray?", task.title),
    });
    app.mode = Mode::Confirm;
}
