pub mod help_overlay;
pub mod status_row;
pub mod timeline;
pub mod tray_panel;

#[cfg(test)]
pub mod test_helpers;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::widgets::Block;

use super::app::App;

/// Rows the tray panel takes, top border included.
const TRAY_PANEL_ROWS: u16 = 7;

/// Main render function — dispatches to sub-renderers
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Background fill
    let bg_style = Style::default().bg(app.theme.background);
    frame.render_widget(Block::default().style(bg_style), area);

    // Layout: timeline canvas | optional tray panel | status row
    let constraints = if app.show_tray {
        vec![
            Constraint::Min(1),
            Constraint::Length(TRAY_PANEL_ROWS),
            Constraint::Length(1),
        ]
    } else {
        vec![Constraint::Min(1), Constraint::Length(1)]
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    // Mouse handlers translate through the rects drawn this frame
    app.timeline_area = chunks[0];
    app.tray_area = if app.show_tray { Some(chunks[1]) } else { None };

    timeline::render_timeline(frame, app, chunks[0]);
    if app.show_tray {
        tray_panel::render_tray_panel(frame, app, chunks[1]);
    }
    status_row::render_status_row(frame, app, chunks[chunks.len() - 1]);

    // Help overlay (rendered on top of everything)
    if app.show_help {
        help_overlay::render_help_overlay(frame, app, frame.area());
    }
}
