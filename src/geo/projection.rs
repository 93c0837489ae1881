//! Spherical Web Mercator projection and the screen viewport.
//!
//! All projection math runs in `f64`. Overlays are expressed relative to the
//! viewport center before being narrowed to `f32`, so a camera parked at the
//! origin keeps sub-pixel precision at street-level zoom.

use bevy::math::{DVec2, Vec2};
use std::f64::consts::PI;

use super::Vertex;

/// Pixel size of the whole world at zoom 0
pub const TILE_SIZE: f64 = 256.0;

/// Latitude limit of the square Web Mercator world
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_6;

/// Pixel size of the whole world at the given zoom level.
pub fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * 2f64.powf(zoom)
}

/// Project a coordinate to world pixels (origin top-left, y down).
pub fn project(vertex: Vertex, zoom: f64) -> DVec2 {
    let size = world_size(zoom);
    let lat = vertex.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (vertex.lng + 180.0) / 360.0 * size;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * size;
    DVec2::new(x, y)
}

/// Inverse of [`project`].
pub fn unproject(point: DVec2, zoom: f64) -> Vertex {
    let size = world_size(zoom);
    let lng = point.x / size * 360.0 - 180.0;
    let n = PI * (1.0 - 2.0 * point.y / size);
    Vertex::new(n.sinh().atan().to_degrees(), lng)
}

/// What part of the world is on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: Vertex,
    pub zoom: f64,
    /// Logical window size in pixels
    pub size: DVec2,
}

impl Viewport {
    pub fn new(center: Vertex, zoom: f64, size: DVec2) -> Self {
        Self { center, zoom, size }
    }

    /// Offset of `vertex` from the viewport center, in screen pixels (y down)
    fn offset(&self, vertex: Vertex) -> DVec2 {
        project(vertex, self.zoom) - project(self.center, self.zoom)
    }

    /// Position in Bevy world space for a camera sitting at the origin (y up).
    pub fn to_world(&self, vertex: Vertex) -> Vec2 {
        let d = self.offset(vertex);
        Vec2::new(d.x as f32, -d.y as f32)
    }

    /// Inverse of [`Viewport::to_world`].
    pub fn from_world(&self, point: Vec2) -> Vertex {
        let origin = project(self.center, self.zoom);
        let world = origin + DVec2::new(f64::from(point.x), -f64::from(point.y));
        unproject(world, self.zoom)
    }

    /// Pixel position relative to the top-left corner of the map container.
    pub fn container_point(&self, vertex: Vertex) -> DVec2 {
        self.offset(vertex) + self.size / 2.0
    }

    /// Drag the map content by `delta` screen pixels (y down).
    pub fn pan_by_pixels(&mut self, delta: DVec2) {
        let origin = project(self.center, self.zoom);
        let mut center = unproject(origin - delta, self.zoom);
        center.lat = center.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
        self.center = center;
    }

    /// Change zoom around the current center. Returns true if the zoom changed.
    pub fn zoom_by(&mut self, delta: f64, min_zoom: f64, max_zoom: f64) -> bool {
        let zoom = (self.zoom + delta).clamp(min_zoom, max_zoom);
        let changed = zoom != self.zoom;
        self.zoom = zoom;
        changed
    }

    /// Change zoom while keeping `anchor` under the same screen pixel.
    pub fn zoom_around(&mut self, anchor: Vertex, delta: f64, min_zoom: f64, max_zoom: f64) -> bool {
        let before = self.offset(anchor);
        if !self.zoom_by(delta, min_zoom, max_zoom) {
            return false;
        }
        let anchor_px = project(anchor, self.zoom);
        self.center = unproject(anchor_px - before, self.zoom);
        true
    }
}
