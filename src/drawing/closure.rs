use crate::geo::{Vertex, MIN_RING_VERTICES};
use crate::map::view::MapView;

/// How the operator asked to close the ring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CloseGesture {
    /// Double click on the first-vertex marker: closes regardless of distance
    FirstVertexMarker,
    /// Double click on the map; closes only near the first vertex
    Proximity { target: Vertex },
}

/// What to do with a close gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseDecision {
    Commit,
    /// Too far from the first vertex: treat it as another vertex
    PlaceVertex,
    /// Not enough vertices for a ring
    Ignore,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosureDetector {
    threshold_meters: f64,
}

impl ClosureDetector {
    pub fn new(threshold_meters: f64) -> Self {
        Self { threshold_meters }
    }

    pub fn threshold_meters(&self) -> f64 {
        self.threshold_meters
    }

    /// At least three vertices and `target` within the threshold of the first.
    pub fn is_near_first_vertex(&self, vertices: &[Vertex], target: Vertex, map: &dyn MapView) -> bool {
        match vertices.first() {
            Some(first) if vertices.len() >= MIN_RING_VERTICES => {
                map.distance(*first, target) <= self.threshold_meters
            }
            _ => false,
        }
    }

    pub fn classify(&self, vertices: &[Vertex], gesture: CloseGesture, map: &dyn MapView) -> CloseDecision {
        if vertices.len() < MIN_RING_VERTICES {
            return CloseDecision::Ignore;
        }
        match gesture {
            CloseGesture::FirstVertexMarker => CloseDecision::Commit,
            CloseGesture::Proximity { target } if self.is_near_first_vertex(vertices, target, map) => {
                CloseDecision::Commit
            }
            CloseGesture::Proximity { .. } => CloseDecision::PlaceVertex,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::MapCanvas;

    /// About 111 m per 0.001 degrees of latitude
    fn offset_north(v: Vertex, meters: f64) -> Vertex {
        Vertex::new(v.lat + meters / 111_195.0, v.lng)
    }

    fn ring() -> Vec<Vertex> {
        vec![
            Vertex::new(10.0, 20.0),
            Vertex::new(10.0, 20.01),
            Vertex::new(10.01, 20.01),
        ]
    }

    #[test]
    fn test_marker_commits_with_three_vertices() {
        let map = MapCanvas::default();
        let detector = ClosureDetector::new(25.0);
        assert_eq!(
            detector.classify(&ring(), CloseGesture::FirstVertexMarker, &map),
            CloseDecision::Commit
        );
    }

    #[test]
    fn test_fewer_than_three_vertices_is_ignored() {
        let map = MapCanvas::default();
        let detector = ClosureDetector::new(25.0);
        let two = &ring()[..2];
        assert_eq!(
            detector.classify(two, CloseGesture::FirstVertexMarker, &map),
            CloseDecision::Ignore
        );
        assert_eq!(
            detector.classify(two, CloseGesture::Proximity { target: two[0] }, &map),
            CloseDecision::Ignore
        );
    }

    #[test]
    fn test_proximity_threshold() {
        let map = MapCanvas::default();
        let detector = ClosureDetector::new(25.0);
        let first = ring()[0];

        let near = CloseGesture::Proximity {
            target: offset_north(first, 24.0),
        };
        let far = CloseGesture::Proximity {
            target: offset_north(first, 26.0),
        };
        assert_eq!(detector.classify(&ring(), near, &map), CloseDecision::Commit);
        assert_eq!(detector.classify(&ring(), far, &map), CloseDecision::PlaceVertex);
    }

    #[test]
    fn test_exactly_on_first_vertex_is_near() {
        let map = MapCanvas::default();
        let detector = ClosureDetector::new(25.0);
        assert!(detector.is_near_first_vertex(&ring(), ring()[0], &map));
    }
}
