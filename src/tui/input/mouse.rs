use crossterm::event::{KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::engine::resolve_drop;
use crate::model::Layer;
use crate::store::Store;
use crate::tui::app::{App, DragState, Focus, GrabSource, Mode};

/// Handle a mouse event. Drags and clicks only act in navigate mode;
/// prompts and keyboard placement keep the mouse out of the way.
pub fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if app.mode != Mode::Navigate {
        return;
    }

    let ctrl = mouse.modifiers.contains(KeyModifiers::CONTROL);
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => on_left_down(app, mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) => {
            if let Some(drag) = &mut app.drag {
                if drag.col != mouse.column || drag.row != mouse.row {
                    drag.moved = true;
                }
                drag.col = mouse.column;
                drag.row = mouse.row;
            }
        }
        MouseEventKind::Up(MouseButton::Left) => on_left_up(app, mouse.column, mouse.row),

        // Wheel: pan through time, zoom while Ctrl is held
        MouseEventKind::ScrollUp => {
            if ctrl {
                app.zoom_in();
            } else {
                app.pan_hours(-1.0);
            }
        }
        MouseEventKind::ScrollDown => {
            if ctrl {
                app.zoom_out();
            } else {
                app.pan_hours(1.0);
            }
        }
        MouseEventKind::ScrollLeft => app.pan_hours(-1.0),
        MouseEventKind::ScrollRight => app.pan_hours(1.0),
        _ => {}
    }
}

fn contains(area: Rect, col: u16, row: u16) -> bool {
    col >= area.x && col < area.x + area.width && row >= area.y && row < area.y + area.height
}

fn on_left_down(app: &mut App, col: u16, row: u16) {
    // Tray rows sit below the panel's top border
    if let Some(tray) = app.tray_area
        && contains(tray, col, row)
    {
        app.focus = Focus::Tray;
        let Some(offset) = (row - tray.y).checked_sub(1) else {
            return;
        };
        let visible = tray.height.saturating_sub(1) as usize;
        let index = app.tray_scroll(visible) + offset as usize;
        let task_id = app.store.board().tray.get(index).map(|t| t.id.clone());
        if let Some(task_id) = task_id {
            app.tray_cursor = index;
            app.drag = Some(DragState {
                source: GrabSource::Tray { task_id },
                col,
                row,
                moved: false,
            });
        }
        return;
    }

    if contains(app.timeline_area, col, row) {
        app.focus = Focus::Timeline;
        let x = col - app.timeline_area.x;
        let y = row - app.timeline_area.y;
        match item_at(app, x, y) {
            Some(item_id) => {
                app.selected_item = Some(item_id.clone());
                app.drag = Some(DragState {
                    source: GrabSource::Item { item_id },
                    col,
                    row,
                    moved: false,
                });
            }
            None => app.selected_item = None,
        }
    }
}

fn on_left_up(app: &mut App, col: u16, row: u16) {
    let Some(drag) = app.drag.take() else {
        return;
    };
    // A click without movement already did its work on the way down
    if !drag.moved {
        return;
    }
    if !contains(app.timeline_area, col, row) {
        return;
    }

    let x = (col - app.timeline_area.x) as f64;
    let y = row - app.timeline_area.y;
    let view = app.viewport(app.timeline_area.width);
    let lanes = app.lane_geometry();
    let layers: Vec<Layer> = app.visible_layers().into_iter().cloned().collect();
    let refs: Vec<&Layer> = layers.iter().collect();

    // A drop with no visible lane lands nowhere
    if let Ok(spot) = resolve_drop(&view, &lanes, &refs, x, y) {
        app.commit_drop(drag.source, spot);
    }
}

/// Hit-test a canvas cell against the rendered bars. The whole lane band
/// counts for a bar's vertical extent, horizontal bounds mirror the
/// rounding the renderer uses.
fn item_at(app: &App, x: u16, y: u16) -> Option<String> {
    let width = app.timeline_area.width;
    let view = app.viewport(width);
    let lanes = app.lane_geometry();
    if y < lanes.header_rows {
        return None;
    }
    let lane = lanes.lane_at(y)?;
    let layer_id = app.visible_layers().get(lane)?.id.clone();

    for item in app.window_items(width) {
        if item.layer_id != layer_id {
            continue;
        }
        let left = view.x_of(item.start_time).round() as i64;
        let cells = view.span_cols(item.duration_minutes).round().max(1.0) as i64;
        let col = x as i64;
        if col >= left && col < left + cells {
            return Some(item.id);
        }
    }
    None
}
