use crate::geo::Vertex;
use crate::map::view::MapEventKind;

/// Where new vertices come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Vertices land where the operator clicks
    #[default]
    Tap,
    /// Vertices land at the map center; the in-progress line follows it
    CenterFollow,
}

impl InputMode {
    /// Map events a session in this mode listens to
    pub fn subscriptions(self) -> &'static [MapEventKind] {
        match self {
            InputMode::Tap => &[MapEventKind::Click, MapEventKind::DoubleClick],
            InputMode::CenterFollow => &[
                MapEventKind::Click,
                MapEventKind::Move,
                MapEventKind::DoubleClick,
            ],
        }
    }

    pub fn follows_center(self) -> bool {
        self == InputMode::CenterFollow
    }

    pub fn display_name(self) -> &'static str {
        match self {
            InputMode::Tap => "tap",
            InputMode::CenterFollow => "center crosshair",
        }
    }
}

/// Ordered vertices of the refuge being drawn.
#[derive(Debug, Clone, Default)]
pub struct VertexCollector {
    mode: InputMode,
    vertices: Vec<Vertex>,
}

impl VertexCollector {
    pub fn new(mode: InputMode) -> Self {
        Self {
            mode,
            vertices: Vec::new(),
        }
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// The point a new vertex or a proximity check refers to.
    ///
    /// Tap mode uses the tapped coordinate and falls back to `center` when the
    /// event carried none.
    pub fn current_target(&self, tapped: Option<Vertex>, center: Vertex) -> Vertex {
        match self.mode {
            InputMode::Tap => tapped.unwrap_or(center),
            InputMode::CenterFollow => center,
        }
    }

    /// Append the current target and return it.
    pub fn place_vertex_at_current_target(&mut self, tapped: Option<Vertex>, center: Vertex) -> Vertex {
        let vertex = self.current_target(tapped, center);
        self.vertices.push(vertex);
        vertex
    }

    /// Trailing point of the in-progress line: the live center in center-follow mode
    pub fn aim_point(&self, center: Vertex) -> Option<Vertex> {
        self.mode.follows_center().then_some(center)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CENTER: Vertex = Vertex::new(20.0, 78.0);
    const TAP: Vertex = Vertex::new(21.0, 79.0);

    #[test]
    fn test_tap_mode_uses_tapped_point() {
        let mut collector = VertexCollector::new(InputMode::Tap);
        assert_eq!(collector.place_vertex_at_current_target(Some(TAP), CENTER), TAP);
        assert_eq!(collector.vertices(), &[TAP]);
    }

    #[test]
    fn test_tap_mode_falls_back_to_center() {
        let collector = VertexCollector::new(InputMode::Tap);
        assert_eq!(collector.current_target(None, CENTER), CENTER);
    }

    #[test]
    fn test_center_follow_ignores_tapped_point() {
        let mut collector = VertexCollector::new(InputMode::CenterFollow);
        assert_eq!(collector.place_vertex_at_current_target(Some(TAP), CENTER), CENTER);
        assert_eq!(collector.aim_point(CENTER), Some(CENTER));
    }

    #[test]
    fn test_tap_mode_has_no_aim_point() {
        let collector = VertexCollector::new(InputMode::Tap);
        assert_eq!(collector.aim_point(CENTER), None);
    }

    #[test]
    fn test_vertices_keep_insertion_order() {
        let mut collector = VertexCollector::new(InputMode::Tap);
        for i in 0..4 {
            collector.place_vertex_at_current_target(Some(Vertex::new(i as f64, 0.0)), CENTER);
        }
        let lats: Vec<f64> = collector.vertices().iter().map(|v| v.lat).collect();
        assert_eq!(lats, vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(collector.len(), 4);
    }

    #[test]
    fn test_subscriptions_per_mode() {
        assert!(!InputMode::Tap.subscriptions().contains(&MapEventKind::Move));
        assert!(InputMode::CenterFollow.subscriptions().contains(&MapEventKind::Move));
    }
}
