use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::store::Store;
use crate::tui::app::{App, Focus};
use crate::util::{display_width, format_duration, truncate_to_width};

/// Render the tray: unscheduled tasks waiting below the timeline.
pub fn render_tray_panel(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let bg = theme.background;
    let tray = &app.store.board().tray;

    let border_style = if app.focus == Focus::Tray {
        Style::default().fg(theme.highlight).bg(bg)
    } else {
        Style::default().fg(theme.grid).bg(bg)
    };
    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(border_style)
        .title(Span::styled(
            format!(" Tray ({}) ", tray.len()),
            Style::default().fg(theme.text_bright).bg(bg),
        ))
        .style(Style::default().bg(bg));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let width = inner.width as usize;
    let visible = inner.height as usize;
    let start = app.tray_scroll(visible);

    let mut lines: Vec<Line> = Vec::new();
    if tray.is_empty() {
        lines.push(Line::from(Span::styled(
            "  nothing waiting; press a to add a task",
            Style::default().fg(theme.dim).bg(bg),
        )));
    }

    for (i, task) in tray.iter().enumerate().skip(start).take(visible) {
        let selected = app.focus == Focus::Tray && i == app.tray_cursor;
        let cursor = if selected { "❯ " } else { "  " };

        let mut markers = String::new();
        if task.recurrence.is_some() {
            markers.push_str("↻ ");
        }
        if task.is_meeting {
            markers.push_str("◆ ");
        }
        if task.is_template {
            markers.push_str("⊕ ");
        }
        let right = format!("{}{}", markers, format_duration(task.duration_minutes));

        let style = if selected {
            Style::default()
                .fg(theme.selection)
                .bg(bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.text).bg(bg)
        };
        let right_style = Style::default().fg(theme.dim).bg(bg);

        let right_width = display_width(&right);
        let left_max = width.saturating_sub(right_width + 1);
        let left = truncate_to_width(&format!("{}{}", cursor, task.title), left_max);
        let gap = width
            .saturating_sub(display_width(&left))
            .saturating_sub(right_width);

        lines.push(Line::from(vec![
            Span::styled(left, style),
            Span::styled(" ".repeat(gap), Style::default().bg(bg)),
            Span::styled(right, right_style),
        ]));
    }

    frame.render_widget(Paragraph::new(lines).style(Style::default().bg(bg)), inner);
}
