//! Polygon interiors as triangulated 2D meshes.
//!
//! A ring is triangulated once, in zoom-0 Web Mercator pixels relative to its
//! first vertex. Projection scales with `2^zoom`, so following pans and zooms
//! only rewrites the entity transform.

use bevy::asset::RenderAssetUsages;
use bevy::math::DVec2;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;
use earcutr::earcut;
use std::collections::HashSet;

use super::view::{Overlay, OverlayId, OverlayLayer, OverlayShape};
use super::MapCanvas;
use crate::geo::projection::project;
use crate::geo::{Vertex, Viewport};

/// Saved refuges sit below the drawing preview
const SAVED_FILL_Z: f32 = 1.0;
const DRAWING_FILL_Z: f32 = 2.0;

/// Triangle indices for a simple ring. A closing duplicate of the first
/// point is ignored. `None` when nothing can be triangulated.
pub fn triangulate_ring(points: &[DVec2]) -> Option<Vec<u32>> {
    let ring = match points {
        [first, .., last] if first == last => &points[..points.len() - 1],
        _ => points,
    };
    if ring.len() < 3 {
        return None;
    }

    let coords: Vec<f64> = ring.iter().flat_map(|p| [p.x, p.y]).collect();
    let indices = earcut(&coords, &[], 2).ok()?;
    if indices.len() < 3 || indices.len() % 3 != 0 {
        return None;
    }
    indices.into_iter().map(|i| u32::try_from(i).ok()).collect()
}

/// Triangulated ring in zoom-0 pixels around `anchor` (y up)
#[derive(Debug, Clone, PartialEq)]
pub struct RingMesh {
    pub anchor: Vertex,
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl RingMesh {
    pub fn from_ring(points: &[Vertex]) -> Option<Self> {
        let anchor = *points.first()?;
        let origin = project(anchor, 0.0);
        let local: Vec<DVec2> = points.iter().map(|v| project(*v, 0.0) - origin).collect();
        let indices = triangulate_ring(&local)?;
        let positions = local
            .iter()
            .map(|p| [p.x as f32, -p.y as f32, 0.0])
            .collect();
        Some(Self {
            anchor,
            positions,
            indices,
        })
    }

    pub fn into_mesh(self) -> Mesh {
        Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::RENDER_WORLD | RenderAssetUsages::MAIN_WORLD,
        )
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, self.positions)
        .with_inserted_indices(Indices::U32(self.indices))
    }
}

/// Placement of a zoom-0 ring mesh in the current view
pub fn fill_transform(viewport: &Viewport, anchor: Vertex, z: f32) -> Transform {
    let scale = 2f64.powf(viewport.zoom) as f32;
    Transform::from_translation(viewport.to_world(anchor).extend(z))
        .with_scale(Vec3::new(scale, scale, 1.0))
}

/// Mesh entity filling one polygon overlay
#[derive(Component, Debug)]
pub struct PolygonFill {
    overlay: OverlayId,
    points: Vec<Vertex>,
    color: Color,
    anchor: Vertex,
    z: f32,
}

impl PolygonFill {
    /// Whether this fill still matches the overlay it was built from
    fn matches(&self, overlay: &Overlay) -> bool {
        match (&overlay.shape, overlay.style.fill) {
            (OverlayShape::Polygon { points, .. }, Some(color)) => {
                *points == self.points && color == self.color
            }
            _ => false,
        }
    }
}

/// Keep one fill mesh per filled polygon overlay and follow the view.
pub fn sync_polygon_fills(
    mut commands: Commands,
    canvas: Res<MapCanvas>,
    mut fills: Query<(Entity, &PolygonFill, &mut Transform)>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    let viewport = &canvas.viewport;
    let mut current = HashSet::new();

    for (entity, fill, mut transform) in &mut fills {
        if !canvas.overlay(fill.overlay).is_some_and(|o| fill.matches(o)) {
            commands.entity(entity).despawn();
            continue;
        }
        *transform = fill_transform(viewport, fill.anchor, fill.z);
        current.insert(fill.overlay);
    }

    for (id, overlay) in canvas.overlays() {
        if current.contains(&id) {
            continue;
        }
        let (OverlayShape::Polygon { points, .. }, Some(color)) =
            (&overlay.shape, overlay.style.fill)
        else {
            continue;
        };
        let Some(ring) = RingMesh::from_ring(points) else {
            debug!("Polygon overlay {:?} has no fillable area", id);
            continue;
        };

        let z = match overlay.layer {
            OverlayLayer::Drawing => DRAWING_FILL_Z,
            _ => SAVED_FILL_Z,
        };
        let anchor = ring.anchor;
        commands.spawn((
            PolygonFill {
                overlay: id,
                points: points.clone(),
                color,
                anchor,
                z,
            },
            Mesh2d(meshes.add(ring.into_mesh())),
            MeshMaterial2d(materials.add(color)),
            fill_transform(viewport, anchor, z),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_is_two_triangles() {
        let square = [
            DVec2::new(0.0, 0.0),
            DVec2::new(10.0, 0.0),
            DVec2::new(10.0, 10.0),
            DVec2::new(0.0, 10.0),
        ];
        let indices = triangulate_ring(&square).unwrap();
        assert_eq!(indices.len(), 6);
        assert!(indices.iter().all(|&i| i < 4));
    }

    #[test]
    fn test_closing_point_is_not_a_vertex() {
        let closed = [
            DVec2::new(0.0, 0.0),
            DVec2::new(10.0, 0.0),
            DVec2::new(10.0, 10.0),
            DVec2::new(0.0, 0.0),
        ];
        let indices = triangulate_ring(&closed).unwrap();
        assert_eq!(indices.len(), 3);
        assert!(indices.iter().all(|&i| i < 3));
    }

    #[test]
    fn test_short_ring_has_no_fill() {
        assert_eq!(triangulate_ring(&[DVec2::ZERO, DVec2::ONE]), None);
        assert_eq!(RingMesh::from_ring(&[]), None);
    }

    #[test]
    fn test_ring_mesh_is_anchored_on_first_vertex() {
        let ring = RingMesh::from_ring(&[
            Vertex::new(10.0, 10.0),
            Vertex::new(10.0, 10.01),
            Vertex::new(10.01, 10.0),
        ])
        .unwrap();
        assert_eq!(ring.anchor, Vertex::new(10.0, 10.0));
        assert_eq!(ring.positions[0], [0.0, 0.0, 0.0]);
        // east is +x, north is +y
        assert!(ring.positions[1][0] > 0.0);
        assert!(ring.positions[2][1] > 0.0);
    }

    #[test]
    fn test_transform_scales_zoom_zero_mesh_to_view() {
        let viewport = Viewport::new(Vertex::new(10.0, 10.0), 12.0, DVec2::new(800.0, 600.0));
        let ring = RingMesh::from_ring(&[
            Vertex::new(10.0, 10.0),
            Vertex::new(10.0, 10.01),
            Vertex::new(10.01, 10.0),
        ])
        .unwrap();
        let transform = fill_transform(&viewport, ring.anchor, 1.0);

        let east = transform.transform_point(Vec3::from(ring.positions[1])).truncate();
        let expected = viewport.to_world(Vertex::new(10.0, 10.01));
        assert!(east.distance(expected) < 0.5);
    }

    #[test]
    fn test_distant_polygon_at_high_zoom_is_cheap() {
        // A view parked far north at street level with a refuge far south
        let viewport = Viewport::new(Vertex::new(80.0, 0.0), 19.0, DVec2::new(800.0, 600.0));
        let ring = RingMesh::from_ring(&[
            Vertex::new(-45.0, 170.0),
            Vertex::new(-45.0, 170.001),
            Vertex::new(-45.001, 170.0),
        ])
        .unwrap();
        assert_eq!(ring.indices.len(), 3);

        let transform = fill_transform(&viewport, ring.anchor, 1.0);
        assert!(transform.translation.is_finite());
        assert!(transform.translation.y < 0.0);
    }

    #[test]
    fn test_fill_entities_follow_overlays() {
        use crate::map::view::{MapView, OverlayStyle};

        let mut app = App::new();
        app.init_resource::<MapCanvas>()
            .init_resource::<Assets<Mesh>>()
            .init_resource::<Assets<ColorMaterial>>()
            .add_systems(Update, sync_polygon_fills);

        let style = OverlayStyle::stroke(Color::WHITE).with_fill(Color::BLACK);
        let ring = [
            Vertex::new(10.0, 10.0),
            Vertex::new(10.0, 10.01),
            Vertex::new(10.01, 10.0),
        ];
        let id = app
            .world_mut()
            .resource_mut::<MapCanvas>()
            .add_polygon(OverlayLayer::SavedRefuges, &ring, style, None);
        app.world_mut().resource_mut::<MapCanvas>().add_polygon(
            OverlayLayer::SavedRefuges,
            &ring,
            OverlayStyle::stroke(Color::WHITE),
            None,
        );
        app.update();

        let mut fills = app.world_mut().query::<&PolygonFill>();
        assert_eq!(fills.iter(app.world()).count(), 1);

        app.world_mut().resource_mut::<MapCanvas>().remove(id);
        app.update();
        assert_eq!(fills.iter(app.world()).count(), 0);
    }
}
