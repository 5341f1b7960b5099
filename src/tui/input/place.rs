use chrono::Duration;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::engine::DropSpot;
use crate::tui::app::{App, Mode};

/// Keyboard drag: arrows nudge the candidate spot, Enter drops it,
/// Esc puts everything back the way it was.
pub(super) fn handle_place(app: &mut App, key: KeyEvent) {
    let Some(mut place) = app.place.take() else {
        app.mode = Mode::Navigate;
        return;
    };
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);
    let lane_count = app.lane_geometry().lane_count;

    match key.code {
        KeyCode::Esc => {
            app.mode = Mode::Navigate;
            return;
        }
        KeyCode::Enter => {
            app.mode = Mode::Navigate;
            let layer_id = app
                .visible_layers()
                .get(place.lane)
                .map(|layer| layer.id.clone());
            let Some(layer_id) = layer_id else {
                app.toast_error("no visible lane to drop on");
                return;
            };
            let spot = DropSpot {
                start: place.start,
                layer_id,
                lane: place.lane,
            };
            app.commit_drop(place.source, spot);
            return;
        }

        // Time nudges: quarter hour, shifted to a full hour
        KeyCode::Char('h') => place.start -= Duration::minutes(15),
        KeyCode::Char('l') => place.start += Duration::minutes(15),
        KeyCode::Char('H') => place.start -= Duration::hours(1),
        KeyCode::Char('L') => place.start += Duration::hours(1),
        KeyCode::Left => {
            place.start -= if shift {
                Duration::hours(1)
            } else {
                Duration::minutes(15)
            }
        }
        KeyCode::Right => {
            place.start += if shift {
                Duration::hours(1)
            } else {
                Duration::minutes(15)
            }
        }
        KeyCode::Char('[') => place.start -= Duration::days(1),
        KeyCode::Char(']') => place.start += Duration::days(1),

        // Lane nudges
        KeyCode::Char('k') | KeyCode::Up => place.lane = place.lane.saturating_sub(1),
        KeyCode::Char('j') | KeyCode::Down => {
            if place.lane + 1 < lane_count {
                place.lane += 1;
            }
        }
        _ => {}
    }

    app.place = Some(place);
}
