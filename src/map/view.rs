//! The map surface the drawing session and the gateway talk to.
//!
//! [`MapView`] covers exactly what a capture session needs from a slippy map:
//! the current center, projection to container pixels, distance, overlay
//! primitives and event subscriptions. [`super::MapCanvas`] implements it for
//! the Bevy window; tests use the same canvas without a window.

use bevy::math::DVec2;
use bevy::prelude::Color;

use crate::geo::Vertex;

/// Handle to an overlay added through [`MapView`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayId(pub u64);

/// Overlays are grouped so a whole group can be cleared at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayLayer {
    /// In-progress polyline, first-vertex marker and closed-ring preview
    Drawing,
    /// Refuges loaded from the store
    SavedRefuges,
    /// Reference lines loaded from the store
    Pathlines,
}

/// Map events a session can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapEventKind {
    Click,
    Move,
    ZoomEnd,
    DoubleClick,
}

/// Stroke and fill for an overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    pub stroke: Color,
    pub fill: Option<Color>,
    /// Dash and gap length in pixels
    pub dash: Option<(f32, f32)>,
    /// Marker radius in pixels
    pub radius: f32,
}

impl OverlayStyle {
    pub const fn stroke(color: Color) -> Self {
        Self {
            stroke: color,
            fill: None,
            dash: None,
            radius: 0.0,
        }
    }

    pub const fn with_fill(mut self, fill: Color) -> Self {
        self.fill = Some(fill);
        self
    }

    pub const fn dashed(mut self, dash: f32, gap: f32) -> Self {
        self.dash = Some((dash, gap));
        self
    }

    pub const fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }
}

/// What an overlay draws.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayShape {
    Polyline(Vec<Vertex>),
    Polygon {
        points: Vec<Vertex>,
        label: Option<String>,
    },
    Marker {
        at: Vertex,
        /// Interactive markers swallow clicks and report double clicks
        interactive: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub layer: OverlayLayer,
    pub shape: OverlayShape,
    pub style: OverlayStyle,
}

/// Slippy map operations used by the drawing session and the gateway.
pub trait MapView {
    /// Geographic coordinate at the center of the view
    fn center(&self) -> Vertex;

    /// Pixel position of `vertex` relative to the top-left of the map container
    fn latlng_to_container_point(&self, vertex: Vertex) -> DVec2;

    /// Great-circle distance in meters
    fn distance(&self, a: Vertex, b: Vertex) -> f64 {
        a.distance_to(b)
    }

    fn subscribe(&mut self, kind: MapEventKind);
    fn unsubscribe(&mut self, kind: MapEventKind);

    fn add_polyline(
        &mut self,
        layer: OverlayLayer,
        points: &[Vertex],
        style: OverlayStyle,
    ) -> OverlayId;

    /// Replace the points of an existing polyline or polygon
    fn set_points(&mut self, id: OverlayId, points: &[Vertex]);

    fn add_polygon(
        &mut self,
        layer: OverlayLayer,
        points: &[Vertex],
        style: OverlayStyle,
        label: Option<String>,
    ) -> OverlayId;

    fn add_marker(
        &mut self,
        layer: OverlayLayer,
        at: Vertex,
        style: OverlayStyle,
        interactive: bool,
    ) -> OverlayId;

    /// Remove an overlay. Unknown ids are ignored.
    fn remove(&mut self, id: OverlayId);

    fn clear_layer(&mut self, layer: OverlayLayer);

    /// Whether double clicking zooms the map
    fn double_click_zoom(&self) -> bool;
    fn set_double_click_zoom(&mut self, enabled: bool);
}
