use bevy::math::{DVec2, Vec2};
use bevy::prelude::*;
use std::collections::{BTreeMap, HashSet};

use super::view::{MapEventKind, MapView, Overlay, OverlayId, OverlayLayer, OverlayShape, OverlayStyle};
use crate::constants::{
    DEFAULT_HOME_LAT, DEFAULT_HOME_LNG, DEFAULT_HOME_ZOOM, DEFAULT_WINDOW_HEIGHT,
    DEFAULT_WINDOW_WIDTH, MAX_ZOOM, MIN_ZOOM,
};
use crate::geo::{Vertex, Viewport};

/// The slippy map shown in the primary window.
///
/// Holds the viewport, every overlay (keyed in insertion order so later
/// overlays draw on top) and the session's event subscriptions. Rendering
/// and input systems read it; nothing here touches the ECS world, so tests
/// drive it directly.
#[derive(Resource, Debug, Clone)]
pub struct MapCanvas {
    pub viewport: Viewport,
    overlays: BTreeMap<OverlayId, Overlay>,
    next_id: u64,
    subscriptions: HashSet<MapEventKind>,
    double_click_zoom: bool,
}

impl Default for MapCanvas {
    fn default() -> Self {
        Self::new(Viewport::new(
            Vertex::new(DEFAULT_HOME_LAT, DEFAULT_HOME_LNG),
            DEFAULT_HOME_ZOOM,
            DVec2::new(
                f64::from(DEFAULT_WINDOW_WIDTH),
                f64::from(DEFAULT_WINDOW_HEIGHT),
            ),
        ))
    }
}

impl MapCanvas {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            overlays: BTreeMap::new(),
            next_id: 0,
            subscriptions: HashSet::new(),
            double_click_zoom: true,
        }
    }

    fn insert(&mut self, layer: OverlayLayer, shape: OverlayShape, style: OverlayStyle) -> OverlayId {
        self.next_id += 1;
        let id = OverlayId(self.next_id);
        self.overlays.insert(id, Overlay { layer, shape, style });
        id
    }

    pub fn overlays(&self) -> impl Iterator<Item = (OverlayId, &Overlay)> {
        self.overlays.iter().map(|(id, overlay)| (*id, overlay))
    }

    pub fn overlay(&self, id: OverlayId) -> Option<&Overlay> {
        self.overlays.get(&id)
    }

    pub fn layer_len(&self, layer: OverlayLayer) -> usize {
        self.overlays.values().filter(|o| o.layer == layer).count()
    }

    pub fn is_subscribed(&self, kind: MapEventKind) -> bool {
        self.subscriptions.contains(&kind)
    }

    /// Topmost interactive marker within `radius` pixels of `world`.
    pub fn interactive_marker_at(&self, world: Vec2, radius: f32) -> Option<OverlayId> {
        self.overlays
            .iter()
            .rev()
            .find_map(|(id, overlay)| match overlay.shape {
                OverlayShape::Marker {
                    at,
                    interactive: true,
                } => {
                    let reach = radius.max(overlay.style.radius);
                    (self.viewport.to_world(at).distance(world) <= reach).then_some(*id)
                }
                _ => None,
            })
    }

    pub fn pan_by_pixels(&mut self, delta: DVec2) {
        self.viewport.pan_by_pixels(delta);
    }

    /// Zoom keeping `anchor` fixed on screen. Returns true if the zoom changed.
    pub fn zoom_around(&mut self, anchor: Vertex, delta: f64) -> bool {
        self.viewport.zoom_around(anchor, delta, MIN_ZOOM, MAX_ZOOM)
    }

    /// Zoom around the current center. Returns true if the zoom changed.
    pub fn zoom_by(&mut self, delta: f64) -> bool {
        self.viewport.zoom_by(delta, MIN_ZOOM, MAX_ZOOM)
    }

    pub fn set_view(&mut self, center: Vertex, zoom: f64) {
        self.viewport.center = center;
        self.viewport.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }
}

impl MapView for MapCanvas {
    fn center(&self) -> Vertex {
        self.viewport.center
    }

    fn latlng_to_container_point(&self, vertex: Vertex) -> DVec2 {
        self.viewport.container_point(vertex)
    }

    fn subscribe(&mut self, kind: MapEventKind) {
        self.subscriptions.insert(kind);
    }

    fn unsubscribe(&mut self, kind: MapEventKind) {
        self.subscriptions.remove(&kind);
    }

    fn add_polyline(
        &mut self,
        layer: OverlayLayer,
        points: &[Vertex],
        style: OverlayStyle,
    ) -> OverlayId {
        self.insert(layer, OverlayShape::Polyline(points.to_vec()), style)
    }

    fn set_points(&mut self, id: OverlayId, new_points: &[Vertex]) {
        match self.overlays.get_mut(&id).map(|o| &mut o.shape) {
            Some(OverlayShape::Polyline(points)) | Some(OverlayShape::Polygon { points, .. }) => {
                *points = new_points.to_vec();
            }
            Some(OverlayShape::Marker { .. }) => {
                warn!("set_points called on marker {:?}", id);
            }
            None => {}
        }
    }

    fn add_polygon(
        &mut self,
        layer: OverlayLayer,
        points: &[Vertex],
        style: OverlayStyle,
        label: Option<String>,
    ) -> OverlayId {
        self.insert(
            layer,
            OverlayShape::Polygon {
                points: points.to_vec(),
                label,
            },
            style,
        )
    }

    fn add_marker(
        &mut self,
        layer: OverlayLayer,
        at: Vertex,
        style: OverlayStyle,
        interactive: bool,
    ) -> OverlayId {
        self.insert(layer, OverlayShape::Marker { at, interactive }, style)
    }

    fn remove(&mut self, id: OverlayId) {
        self.overlays.remove(&id);
    }

    fn clear_layer(&mut self, layer: OverlayLayer) {
        self.overlays.retain(|_, overlay| overlay.layer != layer);
    }

    fn double_click_zoom(&self) -> bool {
        self.double_click_zoom
    }

    fn set_double_click_zoom(&mut self, enabled: bool) {
        self.double_click_zoom = enabled;
    }
}
