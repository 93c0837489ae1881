//! Raw pointer input to map events.
//!
//! A left press released within a few pixels is a click; anything larger is
//! a drag that pans the map. Two clicks close together in time and space make
//! a double click, reported instead of the second click. Clicks on an
//! interactive marker are swallowed.

use bevy::input::mouse::{MouseScrollUnit, MouseWheel};
use bevy::math::DVec2;
use bevy::prelude::*;
use bevy_egui::EguiContexts;

use super::camera::{is_cursor_over_ui, CameraParams};
use super::view::{MapEventKind, MapView, OverlayId};
use super::MapCanvas;
use crate::constants::{
    CLICK_DRAG_TOLERANCE_PX, DOUBLE_CLICK_RADIUS_PX, DOUBLE_CLICK_WINDOW_SECS,
    MARKER_HIT_RADIUS_PX, WHEEL_PIXELS_PER_ZOOM_LEVEL,
};
use crate::geo::Vertex;
use crate::ui::DialogState;

/// Map events produced by the pointer router.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub enum MapInput {
    Click { at: Vertex },
    DoubleClick { at: Vertex },
    /// Double click that landed on an interactive marker
    MarkerDoubleClick { marker: OverlayId, at: Vertex },
    Moved,
    ZoomEnd,
}

impl MapInput {
    pub fn kind(&self) -> MapEventKind {
        match self {
            MapInput::Click { .. } => MapEventKind::Click,
            MapInput::DoubleClick { .. } | MapInput::MarkerDoubleClick { .. } => {
                MapEventKind::DoubleClick
            }
            MapInput::Moved => MapEventKind::Move,
            MapInput::ZoomEnd => MapEventKind::ZoomEnd,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Press {
    button: MouseButton,
    start: Vec2,
    last: Vec2,
}

#[derive(Debug, Clone, Copy)]
struct LastClick {
    screen: Vec2,
    time: f64,
}

/// Pointer state carried between frames
#[derive(Resource, Debug, Default)]
pub struct PointerState {
    press: Option<Press>,
    dragging: bool,
    last_click: Option<LastClick>,
    wheel_pixels: f32,
}

impl PointerState {
    /// Record a finished click. Returns true when it completes a double click.
    pub fn register_click(&mut self, screen: Vec2, now: f64) -> bool {
        if let Some(last) = self.last_click.take()
            && now - last.time <= DOUBLE_CLICK_WINDOW_SECS
            && last.screen.distance(screen) <= DOUBLE_CLICK_RADIUS_PX
        {
            return true;
        }
        self.last_click = Some(LastClick { screen, time: now });
        false
    }

    /// Whole zoom levels for one wheel event. Pixel scrolling accumulates.
    pub fn wheel_steps(&mut self, unit: MouseScrollUnit, y: f32) -> f64 {
        match unit {
            MouseScrollUnit::Line => {
                if y == 0.0 {
                    0.0
                } else {
                    f64::from(y.signum())
                }
            }
            MouseScrollUnit::Pixel => {
                self.wheel_pixels += y;
                let steps = (self.wheel_pixels / WHEEL_PIXELS_PER_ZOOM_LEVEL).trunc();
                self.wheel_pixels -= steps * WHEEL_PIXELS_PER_ZOOM_LEVEL;
                f64::from(steps)
            }
        }
    }
}

/// Turn presses, drags and releases into clicks and pans
#[allow(clippy::too_many_arguments)]
pub fn handle_pointer_input(
    mouse_button: Res<ButtonInput<MouseButton>>,
    time: Res<Time>,
    camera: CameraParams,
    dialog_state: Res<DialogState>,
    mut contexts: EguiContexts,
    mut pointer: ResMut<PointerState>,
    mut canvas: ResMut<MapCanvas>,
    mut inputs: MessageWriter<MapInput>,
) {
    let Some(screen) = camera.cursor_screen_pos() else {
        return;
    };

    let Some(mut press) = pointer.press else {
        if dialog_state.any_modal_open || is_cursor_over_ui(&mut contexts) {
            return;
        }
        if let Some(button) = [MouseButton::Left, MouseButton::Middle]
            .into_iter()
            .find(|b| mouse_button.just_pressed(*b))
        {
            pointer.press = Some(Press {
                button,
                start: screen,
                last: screen,
            });
            pointer.dragging = false;
        }
        return;
    };

    if mouse_button.pressed(press.button) {
        if !pointer.dragging && press.start.distance(screen) > CLICK_DRAG_TOLERANCE_PX {
            pointer.dragging = true;
        }
        if pointer.dragging && screen != press.last {
            let delta = screen - press.last;
            canvas.pan_by_pixels(DVec2::new(f64::from(delta.x), f64::from(delta.y)));
            inputs.write(MapInput::Moved);
        }
        press.last = screen;
        pointer.press = Some(press);
        return;
    }

    // Released
    pointer.press = None;
    if std::mem::take(&mut pointer.dragging) || press.button != MouseButton::Left {
        return;
    }

    let Some(world) = camera.cursor_world_pos() else {
        return;
    };
    let at = canvas.viewport.from_world(world);
    let marker = canvas.interactive_marker_at(world, MARKER_HIT_RADIUS_PX);

    if pointer.register_click(screen, time.elapsed_secs_f64()) {
        inputs.write(match marker {
            Some(marker) => MapInput::MarkerDoubleClick { marker, at },
            None => MapInput::DoubleClick { at },
        });
    } else if marker.is_none() {
        inputs.write(MapInput::Click { at });
    }
}

/// Zoom by whole levels around the cursor
#[allow(clippy::too_many_arguments)]
pub fn handle_wheel_zoom(
    mut scroll_events: MessageReader<MouseWheel>,
    camera: CameraParams,
    dialog_state: Res<DialogState>,
    mut contexts: EguiContexts,
    mut pointer: ResMut<PointerState>,
    mut canvas: ResMut<MapCanvas>,
    mut inputs: MessageWriter<MapInput>,
) {
    if dialog_state.any_modal_open || is_cursor_over_ui(&mut contexts) {
        scroll_events.clear();
        return;
    }

    let steps: f64 = scroll_events
        .read()
        .map(|event| pointer.wheel_steps(event.unit, event.y))
        .sum();
    if steps == 0.0 {
        return;
    }

    let anchor = camera
        .cursor_world_pos()
        .map(|world| canvas.viewport.from_world(world))
        .unwrap_or_else(|| canvas.center());

    if canvas.zoom_around(anchor, steps) {
        inputs.write(MapInput::Moved);
        inputs.write(MapInput::ZoomEnd);
    }
}

/// The map's own double-click zoom, when enabled
pub fn native_double_click_zoom(
    mut inputs: MessageReader<MapInput>,
    mut canvas: ResMut<MapCanvas>,
) {
    for input in inputs.read() {
        if let MapInput::DoubleClick { at } = *input
            && canvas.double_click_zoom()
        {
            canvas.zoom_around(at, 1.0);
        }
    }
}
