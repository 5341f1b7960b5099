use crossterm::event::{KeyCode, KeyEvent};

use crate::model::{ItemPatch, NewTrayTask};
use crate::store::Store;
use crate::tui::app::{App, EditPrompt, EditState, Mode};
use crate::util::{format_duration, next_grapheme_boundary, parse_duration, prev_grapheme_boundary};

/// Minutes given to a tray task typed without a duration suffix.
const DEFAULT_TRAY_MINUTES: i64 = 30;

pub(super) fn handle_edit(app: &mut App, key: KeyEvent) {
    let Some(mut edit) = app.edit.take() else {
        app.mode = Mode::Navigate;
        return;
    };

    match key.code {
        KeyCode::Esc => {
            app.mode = Mode::Navigate;
            return;
        }
        KeyCode::Enter => {
            app.mode = Mode::Navigate;
            commit_edit(app, edit);
            return;
        }
        KeyCode::Char(c) => {
            edit.input.insert(edit.cursor, c);
            edit.cursor += c.len_utf8();
        }
        KeyCode::Backspace => {
            if edit.cursor > 0 {
                if let Some(prev) = prev_grapheme_boundary(&edit.input, edit.cursor) {
                    edit.input.replace_range(prev..edit.cursor, "");
                    edit.cursor = prev;
                }
            }
        }
        KeyCode::Left => {
            if edit.cursor > 0 {
                if let Some(prev) = prev_grapheme_boundary(&edit.input, edit.cursor) {
                    edit.cursor = prev;
                }
            }
        }
        KeyCode::Right => {
            if edit.cursor < edit.input.len() {
                if let Some(next) = next_grapheme_boundary(&edit.input, edit.cursor) {
                    edit.cursor = next;
                }
            }
        }
        KeyCode::Home => edit.cursor = 0,
        KeyCode::End => edit.cursor = edit.input.len(),
        _ => {}
    }

    app.edit = Some(edit);
}

fn commit_edit(app: &mut App, edit: EditState) {
    match edit.prompt {
        EditPrompt::AddTrayTask => {
            let (title, minutes) = split_trailing_duration(edit.input.trim());
            if title.is_empty() {
                app.toast_error("a task needs a title");
                return;
            }
            match app.store.create_tray_task(NewTrayTask::plain(&title, minutes)) {
                Ok(task) => {
                    app.show_tray = true;
                    app.tray_cursor = app.store.board().tray.len().saturating_sub(1);
                    app.toast(format!(
                        "tray: {} ({})",
                        task.title,
                        format_duration(task.duration_minutes)
                    ));
                }
                Err(err) => app.toast_error(err.to_string()),
            }
        }
        EditPrompt::RenameItem { item_id } => {
            let title = edit.input.trim().to_string();
            if title.is_empty() {
                app.toast_error("a task needs a title");
                return;
            }
            let patch = ItemPatch {
                title: Some(title),
                ..ItemPatch::default()
            };
            match app.store.update_item(&item_id, &patch) {
                Ok(item) => app.toast(format!("renamed to {}", item.title)),
                Err(err) => app.toast_error(err.to_string()),
            }
        }
    }
}

/// "Ship report 45m" becomes ("Ship report", 45); no recognizable suffix
/// leaves the whole line as the title with the default block size. The
/// suffix must carry a unit so titles ending in a number stay whole.
fn split_trailing_duration(input: &str) -> (String, i64) {
    if let Some((head, tail)) = input.rsplit_once(' ')
        && (tail.ends_with('m') || tail.ends_with('h'))
        && let Some(minutes) = parse_duration(tail)
        && !head.trim().is_empty()
    {
        return (head.trim_end().to_string(), minutes);
    }
    (input.to_string(), DEFAULT_TRAY_MINUTES)
}
