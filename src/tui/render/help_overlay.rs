use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::tui::app::{App, Focus};

/// Render the help overlay (toggled with ?)
pub fn render_help_overlay(frame: &mut Frame, app: &App, area: Rect) {
    // Center the overlay, leaving some margin
    let overlay_area = centered_rect(60, 80, area);

    // Clear the area behind the overlay
    frame.render_widget(Clear, overlay_area);

    let bg = app.theme.background;
    let text_color = app.theme.text;
    let bright = app.theme.text_bright;
    let highlight = app.theme.highlight;
    let dim = app.theme.dim;

    let key_style = Style::default()
        .fg(highlight)
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    let desc_style = Style::default().fg(text_color).bg(bg);
    let header_style = Style::default()
        .fg(bright)
        .bg(bg)
        .add_modifier(Modifier::BOLD);

    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(Span::styled(" Key Bindings", header_style)));
    lines.push(Line::from(""));

    // Context-sensitive help
    match app.focus {
        Focus::Timeline => {
            lines.push(Line::from(Span::styled(" Timeline", header_style)));
            add_binding(
                &mut lines,
                " h/l \u{2190}\u{2192}",
                "Pan one hour (Shift: one day)",
                key_style,
                desc_style,
            );
            add_binding(&mut lines, " H/L", "Pan one day", key_style, desc_style);
            add_binding(
                &mut lines,
                " j/k",
                "Select next/previous item",
                key_style,
                desc_style,
            );
            add_binding(&mut lines, " n", "Lock onto now", key_style, desc_style);
            add_binding(&mut lines, " +/-", "Zoom in/out", key_style, desc_style);
            add_binding(
                &mut lines,
                " >/<",
                "Taller/shorter lanes",
                key_style,
                desc_style,
            );
            lines.push(Line::from(""));

            lines.push(Line::from(Span::styled(" Selected item", header_style)));
            add_binding(
                &mut lines,
                " g/Enter",
                "Grab and reschedule",
                key_style,
                desc_style,
            );
            add_binding(&mut lines, " x", "Toggle completed", key_style, desc_style);
            add_binding(&mut lines, " p", "Toggle parked", key_style, desc_style);
            add_binding(&mut lines, " r", "Rename", key_style, desc_style);
            add_binding(&mut lines, " d", "Delete", key_style, desc_style);
            add_binding(
                &mut lines,
                " D",
                "Delete rest of series",
                key_style,
                desc_style,
            );
            lines.push(Line::from(""));
        }
        Focus::Tray => {
            lines.push(Line::from(Span::styled(" Tray", header_style)));
            add_binding(
                &mut lines,
                " \u{2191}\u{2193}/jk",
                "Move cursor",
                key_style,
                desc_style,
            );
            add_binding(
                &mut lines,
                " g/Enter",
                "Grab and place on timeline",
                key_style,
                desc_style,
            );
            add_binding(&mut lines, " d", "Delete task", key_style, desc_style);
            lines.push(Line::from(""));
        }
    }

    lines.push(Line::from(Span::styled(" While placing", header_style)));
    add_binding(
        &mut lines,
        " h/l \u{2190}\u{2192}",
        "Nudge 15 minutes (Shift: 1 hour)",
        key_style,
        desc_style,
    );
    add_binding(&mut lines, " H/L", "Nudge one hour", key_style, desc_style);
    add_binding(&mut lines, " [/]", "Nudge one day", key_style, desc_style);
    add_binding(&mut lines, " j/k", "Change lane", key_style, desc_style);
    add_binding(&mut lines, " Enter", "Drop here", key_style, desc_style);
    add_binding(&mut lines, " Esc", "Cancel", key_style, desc_style);
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled(" Views", header_style)));
    add_binding(
        &mut lines,
        " m",
        "Cycle day/week/month/year",
        key_style,
        desc_style,
    );
    add_binding(&mut lines, " 1-4", "Jump to view mode", key_style, desc_style);
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled(" Mouse", header_style)));
    add_binding(
        &mut lines,
        " Drag",
        "Move an item or place a tray task",
        key_style,
        desc_style,
    );
    add_binding(&mut lines, " Wheel", "Pan the timeline", key_style, desc_style);
    add_binding(&mut lines, " Ctrl+Wheel", "Zoom", key_style, desc_style);
    lines.push(Line::from(""));

    // Global keys
    lines.push(Line::from(Span::styled(" Global", header_style)));
    add_binding(&mut lines, " ?", "Toggle this help", key_style, desc_style);
    add_binding(&mut lines, " Tab", "Switch focus", key_style, desc_style);
    add_binding(&mut lines, " t", "Show/hide tray", key_style, desc_style);
    add_binding(&mut lines, " a", "Add a tray task", key_style, desc_style);
    add_binding(&mut lines, " q", "Quit", key_style, desc_style);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(dim).bg(bg))
        .style(Style::default().bg(bg));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .style(Style::default().bg(bg))
        .scroll((app.help_scroll, 0));

    frame.render_widget(paragraph, overlay_area);
}

fn add_binding<'a>(
    lines: &mut Vec<Line<'a>>,
    key: &'a str,
    desc: &'a str,
    key_style: Style,
    desc_style: Style,
) {
    let key_width = 16;
    let padded_key = format!("{:<width$}", key, width = key_width);
    lines.push(Line::from(vec![
        Span::styled(padded_key, key_style),
        Span::styled(desc, desc_style),
    ]));
}

/// Create a centered rectangle of the given percentage of the parent
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
