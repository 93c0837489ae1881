use crate::geo::Vertex;
use crate::map::view::{MapView, OverlayId, OverlayLayer, OverlayStyle};
use crate::theme;

const LINE_DASH: (f32, f32) = (6.0, 6.0);
const MARKER_RADIUS: f32 = 7.0;

fn line_style() -> OverlayStyle {
    OverlayStyle::stroke(theme::DRAWING_LINE).dashed(LINE_DASH.0, LINE_DASH.1)
}

fn marker_style() -> OverlayStyle {
    OverlayStyle::stroke(theme::FIRST_VERTEX_RIM)
        .with_fill(theme::FIRST_VERTEX_MARKER)
        .with_radius(MARKER_RADIUS)
}

fn preview_style() -> OverlayStyle {
    OverlayStyle::stroke(theme::DRAWING_LINE).with_fill(theme::DRAWING_PREVIEW_FILL)
}

/// Overlays owned by one drawing session.
#[derive(Debug, Default)]
pub struct LiveRenderer {
    line: Option<OverlayId>,
    first_vertex_marker: Option<OverlayId>,
    preview: Option<OverlayId>,
}

impl LiveRenderer {
    pub fn line(&self) -> Option<OverlayId> {
        self.line
    }

    pub fn first_vertex_marker(&self) -> Option<OverlayId> {
        self.first_vertex_marker
    }

    pub fn preview(&self) -> Option<OverlayId> {
        self.preview
    }

    /// Bring the in-progress line up to date.
    ///
    /// The line runs through `vertices` and then `aim` when given. The first
    /// vertex gets an interactive marker the first time there is one.
    pub fn redraw(&mut self, map: &mut dyn MapView, vertices: &[Vertex], aim: Option<Vertex>) {
        let Some(first) = vertices.first() else {
            return;
        };

        let mut points = vertices.to_vec();
        points.extend(aim);

        match self.line {
            Some(id) => map.set_points(id, &points),
            None => {
                self.line = Some(map.add_polyline(OverlayLayer::Drawing, &points, line_style()));
            }
        }

        if self.first_vertex_marker.is_none() {
            self.first_vertex_marker =
                Some(map.add_marker(OverlayLayer::Drawing, *first, marker_style(), true));
        }
    }

    /// Swap the open line for a filled preview of the closed ring.
    pub fn show_preview(&mut self, map: &mut dyn MapView, vertices: &[Vertex]) {
        if let Some(id) = self.line.take() {
            map.remove(id);
        }
        self.clear_preview(map);
        self.preview = Some(map.add_polygon(OverlayLayer::Drawing, vertices, preview_style(), None));
    }

    pub fn clear_preview(&mut self, map: &mut dyn MapView) {
        if let Some(id) = self.preview.take() {
            map.remove(id);
        }
    }

    /// Remove every overlay this renderer added.
    pub fn clear(&mut self, map: &mut dyn MapView) {
        for id in [
            self.line.take(),
            self.first_vertex_marker.take(),
            self.preview.take(),
        ]
        .into_iter()
        .flatten()
        {
            map.remove(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::view::OverlayShape;
    use crate::map::MapCanvas;

    fn vertices() -> Vec<Vertex> {
        vec![
            Vertex::new(10.0, 20.0),
            Vertex::new(10.0, 20.01),
            Vertex::new(10.01, 20.01),
        ]
    }

    #[test]
    fn test_redraw_without_vertices_adds_nothing() {
        let mut map = MapCanvas::default();
        let mut renderer = LiveRenderer::default();
        let center = map.center();
        renderer.redraw(&mut map, &[], Some(center));
        assert_eq!(map.overlays().count(), 0);
    }

    #[test]
    fn test_redraw_reuses_line_and_marker() {
        let mut map = MapCanvas::default();
        let mut renderer = LiveRenderer::default();
        let v = vertices();

        renderer.redraw(&mut map, &v[..1], None);
        let line = renderer.line().unwrap();
        let marker = renderer.first_vertex_marker().unwrap();

        renderer.redraw(&mut map, &v, None);
        assert_eq!(renderer.line(), Some(line));
        assert_eq!(renderer.first_vertex_marker(), Some(marker));
        assert_eq!(map.overlays().count(), 2);
        assert_eq!(
            map.overlay(line).map(|o| &o.shape),
            Some(&OverlayShape::Polyline(v.clone()))
        );
    }

    #[test]
    fn test_aim_point_trails_the_line() {
        let mut map = MapCanvas::default();
        let mut renderer = LiveRenderer::default();
        let v = vertices();
        let aim = Vertex::new(11.0, 21.0);

        renderer.redraw(&mut map, &v, Some(aim));
        let Some(OverlayShape::Polyline(points)) =
            renderer.line().and_then(|id| map.overlay(id)).map(|o| &o.shape)
        else {
            panic!("expected polyline");
        };
        assert_eq!(points.len(), 4);
        assert_eq!(points[3], aim);
    }

    #[test]
    fn test_marker_is_interactive_at_first_vertex() {
        let mut map = MapCanvas::default();
        let mut renderer = LiveRenderer::default();
        renderer.redraw(&mut map, &vertices(), None);

        let marker = renderer.first_vertex_marker().and_then(|id| map.overlay(id));
        assert_eq!(
            marker.map(|o| &o.shape),
            Some(&OverlayShape::Marker {
                at: vertices()[0],
                interactive: true
            })
        );
    }

    #[test]
    fn test_preview_replaces_line() {
        let mut map = MapCanvas::default();
        let mut renderer = LiveRenderer::default();
        renderer.redraw(&mut map, &vertices(), None);
        renderer.show_preview(&mut map, &vertices());

        assert!(renderer.line().is_none());
        assert!(renderer.preview().is_some());
        assert_eq!(map.layer_len(OverlayLayer::Drawing), 2);
    }

    #[test]
    fn test_clear_removes_everything() {
        let mut map = MapCanvas::default();
        let mut renderer = LiveRenderer::default();
        renderer.redraw(&mut map, &vertices(), None);
        renderer.show_preview(&mut map, &vertices());
        renderer.clear(&mut map);

        assert_eq!(map.overlays().count(), 0);
        assert!(renderer.first_vertex_marker().is_none());
    }
}
