use crossterm::event::{KeyCode, KeyEvent};

use crate::tui::app::{App, Mode};

/// Yes/no gate in front of deletions. Anything that is not an answer is
/// swallowed so a stray keypress cannot stand in for consent.
pub(super) fn handle_confirm(app: &mut App, key: KeyEvent) {
    let Some(confirm) = app.confirm.take() else {
        app.mode = Mode::Navigate;
        return;
    };

    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
            app.mode = Mode::Navigate;
            app.perform_confirmed(confirm.action);
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.mode = Mode::Navigate;
        }
        _ => {
            app.confirm = Some(confirm);
        }
    }
}
