//! Gizmo rendering of overlay outlines, the graticule and the center
//! crosshair, plus egui labels for saved refuges.

use bevy::gizmos::config::{GizmoConfigGroup, GizmoConfigStore};
use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use super::camera::CameraParams;
use super::view::{Overlay, OverlayShape};
use super::MapCanvas;
use crate::drawing::DrawingStateMachine;
use crate::geo::{Vertex, Viewport};
use crate::theme;

/// Overlay line width in pixels
const OVERLAY_LINE_WIDTH: f32 = 3.0;

/// Minimum on-screen distance between graticule lines
const GRATICULE_MIN_SPACING_PX: f64 = 80.0;

/// Graticule steps in degrees, coarse to fine
const GRATICULE_STEPS: [f64; 14] = [
    30.0, 10.0, 5.0, 2.0, 1.0, 0.5, 0.2, 0.1, 0.05, 0.02, 0.01, 0.005, 0.002, 0.001,
];

const CROSSHAIR_ARM: f32 = 12.0;

/// Gizmo group for map overlays (thicker than the graticule)
#[derive(Default, Reflect, GizmoConfigGroup)]
pub struct OverlayGizmoGroup;

pub fn configure_overlay_gizmos(mut config_store: ResMut<GizmoConfigStore>) {
    let (config, _) = config_store.config_mut::<OverlayGizmoGroup>();
    config.line.width = OVERLAY_LINE_WIDTH;
}

/// Split a segment into dashes. The pattern restarts at each segment.
pub fn dashed_segments(a: Vec2, b: Vec2, dash: f32, gap: f32) -> Vec<(Vec2, Vec2)> {
    let length = a.distance(b);
    if length == 0.0 || dash <= 0.0 {
        return Vec::new();
    }

    let dir = (b - a) / length;
    let mut segments = Vec::new();
    let mut t = 0.0;
    while t < length {
        let end = (t + dash).min(length);
        segments.push((a + dir * t, a + dir * end));
        t += dash + gap.max(0.0);
    }
    segments
}

/// Degree step that keeps graticule lines at least a minimum distance apart
pub fn graticule_spacing(zoom: f64) -> f64 {
    let pixels_per_degree = crate::geo::projection::world_size(zoom) / 360.0;
    GRATICULE_STEPS
        .iter()
        .rev()
        .copied()
        .find(|step| step * pixels_per_degree >= GRATICULE_MIN_SPACING_PX)
        .unwrap_or(GRATICULE_STEPS[0])
}

/// Point inside the label area of a ring (vertex average)
pub fn label_anchor(points: &[Vertex]) -> Option<Vertex> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (lat, lng) = points
        .iter()
        .fold((0.0, 0.0), |(lat, lng), v| (lat + v.lat, lng + v.lng));
    Some(Vertex::new(lat / n, lng / n))
}

fn draw_polyline(gizmos: &mut Gizmos<OverlayGizmoGroup>, points: &[Vec2], overlay: &Overlay) {
    for pair in points.windows(2) {
        match overlay.style.dash {
            Some((dash, gap)) => {
                for (a, b) in dashed_segments(pair[0], pair[1], dash, gap) {
                    gizmos.line_2d(a, b, overlay.style.stroke);
                }
            }
            None => gizmos.line_2d(pair[0], pair[1], overlay.style.stroke),
        }
    }
}

pub fn draw_overlays(mut gizmos: Gizmos<OverlayGizmoGroup>, canvas: Res<MapCanvas>) {
    let viewport = &canvas.viewport;
    let to_world = |points: &[Vertex]| -> Vec<Vec2> {
        points.iter().map(|v| viewport.to_world(*v)).collect()
    };

    for (_, overlay) in canvas.overlays() {
        match &overlay.shape {
            OverlayShape::Polyline(points) => {
                draw_polyline(&mut gizmos, &to_world(points), overlay);
            }
            OverlayShape::Polygon { points, .. } => {
                // interiors are meshes, see `fill`
                let mut ring = to_world(points);
                if let Some(first) = ring.first().copied() {
                    ring.push(first);
                }
                draw_polyline(&mut gizmos, &ring, overlay);
            }
            OverlayShape::Marker { at, .. } => {
                let center = viewport.to_world(*at);
                let radius = overlay.style.radius;
                if let Some(fill) = overlay.style.fill {
                    let mut r = radius - 1.0;
                    while r > 0.0 {
                        gizmos.circle_2d(center, r, fill);
                        r -= 1.5;
                    }
                }
                gizmos.circle_2d(center, radius, overlay.style.stroke);
            }
        }
    }
}

/// Latitude/longitude lines, adapted to the zoom level
pub fn draw_graticule(mut gizmos: Gizmos, canvas: Res<MapCanvas>) {
    let viewport: &Viewport = &canvas.viewport;
    let half = (viewport.size / 2.0).as_vec2();
    let north_west = viewport.from_world(Vec2::new(-half.x, half.y));
    let south_east = viewport.from_world(Vec2::new(half.x, -half.y));

    let step = graticule_spacing(viewport.zoom);

    let first_lng = (north_west.lng / step).floor() as i64;
    let last_lng = (south_east.lng / step).ceil() as i64;
    for i in first_lng..=last_lng {
        let lng = i as f64 * step;
        if !(-180.0..=180.0).contains(&lng) {
            continue;
        }
        let x = viewport.to_world(Vertex::new(viewport.center.lat, lng)).x;
        let color = if i == 0 {
            theme::GRATICULE_MAJOR_COLOR
        } else {
            theme::GRATICULE_COLOR
        };
        gizmos.line_2d(Vec2::new(x, -half.y), Vec2::new(x, half.y), color);
    }

    let first_lat = (south_east.lat / step).floor() as i64;
    let last_lat = (north_west.lat / step).ceil() as i64;
    for i in first_lat..=last_lat {
        let lat = i as f64 * step;
        if !(-85.0..=85.0).contains(&lat) {
            continue;
        }
        let y = viewport.to_world(Vertex::new(lat, viewport.center.lng)).y;
        let color = if i == 0 {
            theme::GRATICULE_MAJOR_COLOR
        } else {
            theme::GRATICULE_COLOR
        };
        gizmos.line_2d(Vec2::new(-half.x, y), Vec2::new(half.x, y), color);
    }
}

/// Fixed crosshair marking the placement target in center-follow mode
pub fn draw_center_crosshair(mut gizmos: Gizmos, machine: Option<Res<DrawingStateMachine>>) {
    if !machine.is_some_and(|m| m.input_mode().follows_center()) {
        return;
    }
    let color = theme::CROSSHAIR_COLOR;
    gizmos.line_2d(Vec2::new(-CROSSHAIR_ARM, 0.0), Vec2::new(CROSSHAIR_ARM, 0.0), color);
    gizmos.line_2d(Vec2::new(0.0, -CROSSHAIR_ARM), Vec2::new(0.0, CROSSHAIR_ARM), color);
}

/// Name labels for polygons that carry one
pub fn draw_overlay_labels(
    mut contexts: EguiContexts,
    camera: CameraParams,
    canvas: Res<MapCanvas>,
) -> Result {
    let ctx = contexts.ctx_mut()?;

    for (id, overlay) in canvas.overlays() {
        let OverlayShape::Polygon {
            points,
            label: Some(label),
        } = &overlay.shape
        else {
            continue;
        };
        let Some(anchor) = label_anchor(points) else {
            continue;
        };
        let Some(screen_pos) = camera.world_to_screen(canvas.viewport.to_world(anchor)) else {
            continue;
        };

        egui::Area::new(egui::Id::new(("refuge_label", id.0)))
            .fixed_pos(egui::pos2(screen_pos.x, screen_pos.y))
            .pivot(egui::Align2::CENTER_CENTER)
            .order(egui::Order::Background)
            .interactable(false)
            .show(ctx, |ui| {
                egui::Frame::new()
                    .fill(theme::ui::LABEL_BACKGROUND)
                    .inner_margin(egui::Margin::symmetric(6, 2))
                    .corner_radius(3.0)
                    .show(ui, |ui| {
                        ui.label(
                            egui::RichText::new(label)
                                .color(theme::bevy_to_egui(theme::SAVED_REFUGE_OUTLINE))
                                .size(12.0),
                        );
                    });
            });
    }

    Ok(())
}
