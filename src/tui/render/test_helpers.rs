use std::rc::Rc;

use chrono::{DateTime, TimeZone, Utc};
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;
use tempfile::TempDir;

use crate::engine::clock::ManualClock;
use crate::model::item::NewItem;
use crate::model::tray::NewTrayTask;
use crate::store::{JsonStore, Store};
use crate::tui::app::App;

pub const TERM_W: u16 = 80;
pub const TERM_H: u16 = 24;

/// Render into an in-memory buffer and return plain text (no styles).
pub fn render_to_string<F>(w: u16, h: u16, f: F) -> String
where
    F: FnOnce(&mut ratatui::Frame, Rect),
{
    let backend = TestBackend::new(w, h);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            f(frame, area);
        })
        .unwrap();

    let buf = terminal.backend().buffer().clone();
    let w = buf.area.width as usize;
    let lines: Vec<String> = buf
        .content
        .chunks(w)
        .map(|row| {
            let s: String = row.iter().map(|cell| cell.symbol()).collect();
            s.trim_end().to_string()
        })
        .collect();

    // Trim trailing blank lines
    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(0, |i| i + 1);
    lines[..end].join("\n")
}

/// Monday noon, so weekly math and hour ticks land on round numbers.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap()
}

/// A small board with two layers, two items near `fixed_now`, and one
/// tray task. The clock handle lets tests crank time forward.
pub fn sample_app() -> (App, Rc<ManualClock>, TempDir) {
    let dir = TempDir::new().unwrap();
    let mut store = JsonStore::init(dir.path(), "Sample").unwrap();

    let work_id = store.board().layers[0].id.clone();
    store.rename_layer(&work_id, "Work").unwrap();
    let home = store.create_layer("Home", "#52C47B").unwrap();

    let standup_start = Utc.with_ymd_and_hms(2024, 6, 3, 12, 30, 0).unwrap();
    store
        .create_item(NewItem::block("Standup", &work_id, standup_start, 30))
        .unwrap();
    let review_start = Utc.with_ymd_and_hms(2024, 6, 3, 14, 0, 0).unwrap();
    store
        .create_item(NewItem::block("Review", &home.id, review_start, 60))
        .unwrap();
    store
        .create_tray_task(NewTrayTask::plain("Email sweep", 30))
        .unwrap();

    let clock = Rc::new(ManualClock::starting_at(fixed_now()));
    let app = App::new(store, Box::new(clock.clone()));
    (app, clock, dir)
}
