mod camera;
mod canvas;
mod fill;
mod host;
mod input;
mod rendering;
pub mod view;

pub use camera::is_cursor_over_ui;
pub use canvas::MapCanvas;
pub use host::{CenterSelection, HostEnvironment, ResetViewRequest};
pub use input::MapInput;
pub use view::OverlayId;

use bevy::prelude::*;
use bevy_egui::EguiPrimaryContextPass;

use crate::config::ConfigLoaded;
use crate::theme;

/// Systems that turn raw input into [`MapInput`] messages
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct MapInputSet;

/// Startup set after which [`HostEnvironment`] exists
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostDetected;

pub struct MapPlugin;

impl Plugin for MapPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ClearColor(theme::MAP_BACKGROUND))
            .init_resource::<MapCanvas>()
            .init_resource::<input::PointerState>()
            .init_resource::<CenterSelection>()
            .init_gizmo_group::<rendering::OverlayGizmoGroup>()
            .add_message::<MapInput>()
            .add_message::<host::CenterDoubleTap>()
            .add_message::<ResetViewRequest>()
            .add_systems(
                Startup,
                (
                    camera::spawn_camera,
                    rendering::configure_overlay_gizmos,
                    host::detect_host_environment
                        .after(ConfigLoaded)
                        .in_set(HostDetected),
                ),
            )
            .add_systems(
                Update,
                (
                    camera::sync_viewport_size,
                    input::handle_pointer_input,
                    input::handle_wheel_zoom,
                    host::reset_view_system.run_if(on_message::<ResetViewRequest>),
                )
                    .chain()
                    .in_set(MapInputSet),
            )
            .add_systems(
                Update,
                (
                    input::native_double_click_zoom,
                    host::host_center_double_action.run_if(host::host_is_embedded),
                    host::log_center_double_taps,
                    host::update_center_selection,
                )
                    .chain()
                    .after(MapInputSet),
            )
            .add_systems(
                Update,
                (
                    rendering::draw_graticule,
                    rendering::draw_overlays,
                    rendering::draw_center_crosshair,
                    fill::sync_polygon_fills,
                )
                    .after(MapInputSet),
            )
            .add_systems(EguiPrimaryContextPass, rendering::draw_overlay_labels);
    }
}
