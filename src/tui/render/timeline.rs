use std::collections::HashMap;

use chrono::{DateTime, Datelike, Timelike, Utc};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::engine::{LaneGeometry, Viewport, is_active, snap_to_quarter_hour};
use crate::store::Store;
use crate::model::{ItemStatus, Layer, TimelineItem};
use crate::tui::app::{App, GrabSource, Mode};
use crate::tui::theme::{Theme, contrast_text};
use crate::util::truncate_to_width;

/// Render the timeline canvas: time axis, lane bands, item bars, the now
/// line and any placement ghost.
pub fn render_timeline(frame: &mut Frame, app: &App, area: Rect) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    let view = app.viewport(area.width);
    let lanes = app.lane_geometry();
    let layers: Vec<Layer> = app.visible_layers().into_iter().cloned().collect();
    let items = app.window_items(area.width);
    let now = app.clock.now();

    let mut grid = Grid::new(area.width as usize, area.height as usize, app.theme.background);

    draw_time_axis(&mut grid, &view, &app.theme);
    draw_now_line(&mut grid, &view, now, &app.theme);
    draw_lane_labels(&mut grid, &lanes, &layers, &app.theme);
    draw_items(&mut grid, app, &view, &lanes, &layers, &items, now);
    draw_ghost(&mut grid, app, &view, &lanes);

    // Re-assert the marker so a bar cannot swallow the tip
    let now_x = view.x_of(now).round();
    if now_x >= 0.0 && now_x < grid.width as f64 {
        grid.put(
            now_x as usize,
            0,
            "▼",
            Style::default()
                .fg(app.theme.now_line)
                .bg(app.theme.background),
        );
    }

    let paragraph = Paragraph::new(grid.into_lines());
    frame.render_widget(paragraph, area);
}

// ---------------------------------------------------------------------------
// Axis and chrome

/// Smallest hour step whose labels do not collide, if any fits.
fn hour_step(cols_per_hour: f64) -> Option<i64> {
    [1, 3, 6, 12, 24]
        .into_iter()
        .find(|step| *step as f64 * cols_per_hour >= 5.0)
}

fn draw_time_axis(grid: &mut Grid, view: &Viewport, theme: &Theme) {
    let bg = theme.background;
    let dim = Style::default().fg(theme.dim).bg(bg);
    let grid_style = Style::default().fg(theme.grid).bg(bg);
    let width = grid.width;

    let from = view.time_at(0.0);
    let to = view.time_at(width as f64);
    let day_cols = 24.0 * view.cols_per_hour;

    // Hour ticks on the second axis row
    if let Some(step) = hour_step(view.cols_per_hour) {
        let step_secs = step * 3600;
        let mut ts = from.timestamp().div_euclid(step_secs) * step_secs;
        while ts <= to.timestamp() {
            if let Some(t) = DateTime::<Utc>::from_timestamp(ts, 0) {
                let x = view.x_of(t).round();
                if x >= 0.0 && x < width as f64 {
                    grid.text(x as usize, 1, &format!("{:02}", t.hour()), dim);
                }
            }
            ts += step_secs;
        }
    }

    // Midnight separators below the axis, plus date labels on the top row
    let day_secs = 86_400;
    let mut ts = from.timestamp().div_euclid(day_secs) * day_secs;
    while ts <= to.timestamp() {
        let Some(t) = DateTime::<Utc>::from_timestamp(ts, 0) else {
            break;
        };
        let x = view.x_of(t).round();
        if x >= 0.0 && x < width as f64 {
            let x = x as usize;
            for y in 1..grid.height {
                grid.put(x, y, "·", grid_style);
            }
            let label = if day_cols >= 12.0 {
                Some(t.format("%a %d %b").to_string())
            } else if day_cols >= 3.0 && t.weekday() == chrono::Weekday::Mon {
                Some(t.format("%d %b").to_string())
            } else if t.day() == 1 {
                Some(t.format("%b %Y").to_string())
            } else {
                None
            };
            if let Some(label) = label {
                grid.text(x, 0, &label, dim);
            }
        }
        ts += day_secs;
    }
}

fn draw_now_line(grid: &mut Grid, view: &Viewport, now: DateTime<Utc>, theme: &Theme) {
    let x = view.x_of(now).round();
    if x < 0.0 || x >= grid.width as f64 {
        return;
    }
    let style = Style::default().fg(theme.now_line).bg(theme.background);
    let x = x as usize;
    grid.put(x, 0, "▼", style);
    for y in 1..grid.height {
        grid.put(x, y, "│", style);
    }
}

fn draw_lane_labels(grid: &mut Grid, lanes: &LaneGeometry, layers: &[Layer], theme: &Theme) {
    for (i, layer) in layers.iter().enumerate() {
        let row = lanes.lane_top(i) as usize;
        if row >= grid.height {
            break;
        }
        let color = crate::tui::theme::parse_hex_color(&layer.color).unwrap_or(theme.text);
        let style = Style::default().fg(color).bg(theme.background);
        grid.text(0, row, &format!("▏{}", layer.name), style);
    }
}

// ---------------------------------------------------------------------------
// Items

fn draw_items(
    grid: &mut Grid,
    app: &App,
    view: &Viewport,
    lanes: &LaneGeometry,
    layers: &[Layer],
    items: &[TimelineItem],
    now: DateTime<Utc>,
) {
    let lane_of: HashMap<&str, usize> = layers
        .iter()
        .enumerate()
        .map(|(i, l)| (l.id.as_str(), i))
        .collect();

    for item in items {
        let Some(&lane) = lane_of.get(item.layer_id.as_str()) else {
            continue;
        };
        let row = lanes.lane_top(lane) as usize;
        if row >= grid.height {
            continue;
        }

        let left = view.x_of(item.start_time).round() as i64;
        let cells = view.span_cols(item.duration_minutes).round().max(1.0) as i64;
        let x0 = left.max(0);
        let x1 = (left + cells).min(grid.width as i64);
        if x1 <= x0 {
            continue;
        }

        let selected = app.selected_item.as_deref() == Some(item.id.as_str());
        let style = bar_style(app, item, &layers[lane], now, selected);

        for x in x0..x1 {
            grid.put(x as usize, row, " ", style);
        }
        let label = bar_label(item, now);
        let avail = (x1 - x0) as usize;
        grid.text(x0 as usize, row, &truncate_to_width(&label, avail), style);

        // Roomy lanes get a second row with the exact window
        if selected && lanes.lane_rows >= 2 && row + 1 < grid.height {
            let times = format!(
                " {}-{}",
                item.start_time.format("%H:%M"),
                item.end_time().format("%H:%M")
            );
            let dim = Style::default().fg(app.theme.dim).bg(app.theme.background);
            grid.text(x0 as usize, row + 1, &truncate_to_width(&times, avail), dim);
        }
    }
}

fn bar_style(
    app: &App,
    item: &TimelineItem,
    layer: &Layer,
    now: DateTime<Utc>,
    selected: bool,
) -> Style {
    let theme = &app.theme;
    let mut style = match item.status {
        ItemStatus::Scheduled => {
            let bg = theme.bar_color(item.color.as_deref(), &layer.color);
            let mut s = Style::default().bg(bg).fg(contrast_text(bg));
            if is_active(item, now) {
                s = s.add_modifier(Modifier::BOLD);
            }
            s
        }
        ItemStatus::Logjam => Style::default()
            .bg(theme.logjam)
            .fg(contrast_text(theme.logjam)),
        ItemStatus::Completed => Style::default()
            .fg(theme.completed)
            .bg(theme.background)
            .add_modifier(Modifier::CROSSED_OUT),
        ItemStatus::Parked => Style::default()
            .fg(theme.parked)
            .bg(theme.background)
            .add_modifier(Modifier::ITALIC),
    };
    if selected {
        style = style.add_modifier(Modifier::REVERSED);
    }
    style
}

fn bar_label(item: &TimelineItem, now: DateTime<Utc>) -> String {
    let mut label = String::from(" ");
    match item.status {
        ItemStatus::Logjam => label.push_str("! "),
        ItemStatus::Completed => label.push_str("✓ "),
        ItemStatus::Parked => label.push_str("~ "),
        ItemStatus::Scheduled => {
            if is_active(item, now) {
                label.push_str("▶ ");
            }
        }
    }
    if item.is_meeting {
        label.push_str("◆ ");
    }
    label.push_str(&item.title);
    label
}

// ---------------------------------------------------------------------------
// Placement ghosts

fn draw_ghost(grid: &mut Grid, app: &App, view: &Viewport, lanes: &LaneGeometry) {
    let ghost = if app.mode == Mode::Place {
        app.place.as_ref().map(|place| {
            (
                place.start,
                place.lane,
                place.duration_minutes,
                place.title.clone(),
            )
        })
    } else {
        mouse_ghost(app, view, lanes)
    };
    let Some((start, lane, minutes, title)) = ghost else {
        return;
    };

    let row = lanes.lane_top(lane.min(lanes.lane_count.saturating_sub(1))) as usize;
    if row >= grid.height || lanes.lane_count == 0 {
        return;
    }
    let left = view.x_of(start).round() as i64;
    let cells = view.span_cols(minutes).round().max(1.0) as i64;
    let x0 = left.max(0);
    let x1 = (left + cells).min(grid.width as i64);
    if x1 <= x0 {
        return;
    }

    let style = Style::default()
        .fg(app.theme.selection)
        .bg(app.theme.background);
    for x in x0..x1 {
        grid.put(x as usize, row, "░", style);
    }
    let label = format!(" {} {}", start.format("%H:%M"), title);
    let avail = (x1 - x0) as usize;
    grid.text(x0 as usize, row, &truncate_to_width(&label, avail), style);
}

/// Ghost for a live mouse drag, once it has actually moved.
fn mouse_ghost(
    app: &App,
    view: &Viewport,
    lanes: &LaneGeometry,
) -> Option<(DateTime<Utc>, usize, i64, String)> {
    let drag = app.drag.as_ref()?;
    if !drag.moved {
        return None;
    }
    let area = app.timeline_area;
    if drag.col < area.x
        || drag.col >= area.x + area.width
        || drag.row < area.y
        || drag.row >= area.y + area.height
    {
        return None;
    }
    let x = (drag.col - area.x) as f64;
    let y = drag.row - area.y;
    let lane = lanes.lane_at(y)?;
    let start = snap_to_quarter_hour(view.time_at(x));

    let board = app.store.board();
    let (title, minutes) = match &drag.source {
        GrabSource::Item { item_id } => {
            let item = board.items.get(item_id)?;
            (item.title.clone(), item.duration_minutes)
        }
        GrabSource::Tray { task_id } => {
            let task = board.tray_task(task_id)?;
            (task.title.clone(), task.duration_minutes)
        }
    };
    Some((start, lane, minutes, title))
}

// ---------------------------------------------------------------------------
// Character grid

/// Canvas the timeline is composed into before becoming styled lines.
/// Wide graphemes own their cell and shadow the one to their right so
/// columns stay aligned under CJK titles.
struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

#[derive(Clone)]
struct Cell {
    symbol: String,
    style: Style,
}

impl Grid {
    fn new(width: usize, height: usize, bg: ratatui::style::Color) -> Self {
        let blank = Cell {
            symbol: " ".to_string(),
            style: Style::default().bg(bg),
        };
        Grid {
            width,
            height,
            cells: vec![blank; width * height],
        }
    }

    fn put(&mut self, x: usize, y: usize, symbol: &str, style: Style) {
        if x >= self.width || y >= self.height {
            return;
        }
        let w = symbol.width();
        self.cells[y * self.width + x] = Cell {
            symbol: symbol.to_string(),
            style,
        };
        if w == 2 && x + 1 < self.width {
            // Shadowed cell, skipped when lines are assembled
            self.cells[y * self.width + x + 1] = Cell {
                symbol: String::new(),
                style,
            };
        }
    }

    fn text(&mut self, x: usize, y: usize, s: &str, style: Style) {
        let mut cx = x;
        for g in s.graphemes(true) {
            let w = g.width().max(1);
            if cx + w > self.width {
                break;
            }
            self.put(cx, y, g, style);
            cx += w;
        }
    }

    fn into_lines(self) -> Vec<Line<'static>> {
        let mut lines = Vec::with_capacity(self.height);
        for row in self.cells.chunks(self.width) {
            let mut spans: Vec<Span> = Vec::new();
            let mut run = String::new();
            let mut run_style = Style::default();
            for cell in row {
                if cell.symbol.is_empty() {
                    continue;
                }
                if run.is_empty() {
                    run_style = cell.style;
                } else if cell.style != run_style {
                    spans.push(Span::styled(std::mem::take(&mut run), run_style));
                    run_style = cell.style;
                }
                run.push_str(&cell.symbol);
            }
            if !run.is_empty() {
                spans.push(Span::styled(run, run_style));
            }
            lines.push(Line::from(spans));
        }
        lines
    }
}
