use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::store::Store;
use crate::tui::app::{App, EditPrompt, Mode, ToastKind, format_stamp};

/// Render the status row (bottom of screen)
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;

    let mut spans: Vec<Span> = Vec::new();
    match app.mode {
        Mode::Edit => push_edit_prompt(app, &mut spans),
        Mode::Confirm => {
            if let Some(confirm) = &app.confirm {
                spans.push(Span::styled(
                    format!(" {} ", confirm.message),
                    Style::default().fg(app.theme.text_bright).bg(bg),
                ));
                spans.push(Span::styled(
                    "y/n",
                    Style::default()
                        .fg(app.theme.highlight)
                        .bg(bg)
                        .add_modifier(Modifier::BOLD),
                ));
            }
        }
        Mode::Place => {
            if let Some(place) = &app.place {
                spans.push(Span::styled(
                    format!(" drop at {} ", format_stamp(place.start)),
                    Style::default().fg(app.theme.selection).bg(bg),
                ));
                spans.push(Span::styled(
                    "←→ 15m  shift ±1h  [ ] day  ↑↓ lane  ⏎ drop  esc cancel",
                    Style::default().fg(app.theme.dim).bg(bg),
                ));
            }
        }
        Mode::Navigate => {
            if let Some(toast) = app.current_toast() {
                let color = match toast.kind {
                    ToastKind::Info => app.theme.toast_info,
                    ToastKind::Error => app.theme.toast_error,
                };
                spans.push(Span::styled(
                    format!(" {}", toast.text),
                    Style::default().fg(color).bg(bg),
                ));
            } else if let Some(item) = app.selected() {
                spans.push(Span::styled(
                    format!(" {} ", item.title),
                    Style::default().fg(app.theme.text_bright).bg(bg),
                ));
                spans.push(Span::styled(
                    format!(
                        "{}  {}  {}",
                        format_stamp(item.start_time),
                        crate::util::format_duration(item.duration_minutes),
                        item.status
                    ),
                    Style::default().fg(app.theme.dim).bg(bg),
                ));
            } else {
                spans.push(Span::styled(
                    format!(" {}", app.store.board().name),
                    Style::default().fg(app.theme.dim).bg(bg),
                ));
            }
        }
    }

    // Right segment: lock state, view mode and zoom, pending switch
    let right = right_segment(app);
    let content_width: usize = spans.iter().map(|s| s.content.chars().count()).sum();
    let right_width = right.chars().count();
    if content_width + right_width < width {
        let padding = width - content_width - right_width;
        spans.push(Span::styled(" ".repeat(padding), Style::default().bg(bg)));
        let right_color = if app.settings.is_locked {
            app.theme.now_line
        } else {
            app.theme.dim
        };
        spans.push(Span::styled(
            right,
            Style::default().fg(right_color).bg(bg),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}

fn push_edit_prompt<'a>(app: &'a App, spans: &mut Vec<Span<'a>>) {
    let bg = app.theme.background;
    let Some(edit) = &app.edit else {
        return;
    };
    let label = match &edit.prompt {
        EditPrompt::AddTrayTask => " add task (title, optional 45m/1h30m): ",
        EditPrompt::RenameItem { .. } => " rename: ",
    };
    spans.push(Span::styled(
        label,
        Style::default().fg(app.theme.highlight).bg(bg),
    ));
    let (before, after) = edit.input.split_at(edit.cursor);
    spans.push(Span::styled(
        before,
        Style::default().fg(app.theme.text_bright).bg(bg),
    ));
    spans.push(Span::styled(
        "\u{258C}",
        Style::default().fg(app.theme.highlight).bg(bg),
    ));
    spans.push(Span::styled(
        after,
        Style::default().fg(app.theme.text_bright).bg(bg),
    ));
}

fn right_segment(app: &App) -> String {
    let lock = if app.settings.is_locked {
        "● now"
    } else {
        "○ free"
    };
    let mode = match app.mode_switcher.pending_mode() {
        Some(pending) => format!("→ {}", pending),
        None => format!(
            "{} {:.0}%",
            app.settings.view_mode, app.settings.zoom_horizontal
        ),
    };
    format!("{}  {}  ", lock, mode)
}
