mod confirm;
mod edit;
mod mouse;
mod navigate;
mod place;

use crossterm::event::{KeyCode, KeyEvent};

use super::app::{App, Mode};

pub use mouse::handle_mouse;

/// Handle a key event in the current mode
pub fn handle_key(app: &mut App, key: KeyEvent) {
    // Ignore bare modifier key presses (Shift, Ctrl, Alt, etc.)
    if matches!(key.code, KeyCode::Modifier(_)) {
        return;
    }

    match app.mode {
        Mode::Navigate => navigate::handle_navigate(app, key),
        Mode::Place => place::handle_place(app, key),
        Mode::Edit => edit::handle_edit(app, key),
        Mode::Confirm => confirm::handle_confirm(app, key),
    }
}
