use bevy::ecs::system::SystemParam;
use bevy::math::DVec2;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::EguiContexts;

use super::MapCanvas;

/// The map camera never moves: overlays are positioned relative to the
/// viewport center, which always sits at the world origin.
#[derive(Component)]
pub struct MapCamera;

pub fn spawn_camera(mut commands: Commands) {
    commands.spawn((
        Camera2d,
        MapCamera,
        Transform::from_translation(Vec3::new(0.0, 0.0, 1000.0)),
    ));
}

/// Bundled camera and window queries for cursor-to-world calculations
#[derive(SystemParam)]
pub struct CameraParams<'w, 's> {
    pub window: Query<'w, 's, &'static Window, With<PrimaryWindow>>,
    pub camera: Query<'w, 's, (&'static Camera, &'static GlobalTransform), With<MapCamera>>,
}

impl CameraParams<'_, '_> {
    /// Cursor position in window pixels (origin top-left)
    pub fn cursor_screen_pos(&self) -> Option<Vec2> {
        self.window.single().ok()?.cursor_position()
    }

    /// Get the world position of the cursor, if available
    pub fn cursor_world_pos(&self) -> Option<Vec2> {
        let window = self.window.single().ok()?;
        let (camera, transform) = self.camera.single().ok()?;
        let cursor_pos = window.cursor_position()?;
        camera.viewport_to_world_2d(transform, cursor_pos).ok()
    }

    /// Screen position of a world point
    pub fn world_to_screen(&self, world: Vec2) -> Option<Vec2> {
        let (camera, transform) = self.camera.single().ok()?;
        camera
            .world_to_viewport(transform, world.extend(0.0))
            .ok()
    }
}

/// Check if the cursor is over egui UI
pub fn is_cursor_over_ui(contexts: &mut EguiContexts) -> bool {
    contexts
        .ctx_mut()
        .map(|ctx| ctx.is_pointer_over_area())
        .unwrap_or(false)
}

/// Keep the viewport size in step with the window
pub fn sync_viewport_size(
    window: Query<&Window, With<PrimaryWindow>>,
    mut canvas: ResMut<MapCanvas>,
) {
    let Ok(window) = window.single() else {
        return;
    };
    let size = DVec2::new(f64::from(window.width()), f64::from(window.height()));
    if canvas.viewport.size != size {
        canvas.viewport.size = size;
    }
}
