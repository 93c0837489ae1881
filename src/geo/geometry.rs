//! Closed-ring polygon encoding.
//!
//! A finished vertex sequence is stored as a single-ring GeoJSON polygon:
//! `{"type":"Polygon","coordinates":[[[lng,lat],...,[lng0,lat0]]]}`. The ring is
//! explicitly closed (first position repeated at the end); the in-progress
//! vertex list never carries that duplicate.
//!
//! Pathlines come back from the store as GeoJSON `LineString`s and are only
//! ever decoded.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Vertex;

/// `[longitude, latitude]`
pub type Position = [f64; 2];

/// A triangle is the smallest ring that can be committed
pub const MIN_RING_VERTICES: usize = 3;

#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("a polygon needs at least {MIN_RING_VERTICES} vertices, got {count}")]
    TooFewVertices { count: usize },
    #[error("record has no geometry")]
    MissingGeometry,
    #[error("geometry is not a Polygon")]
    NotAPolygon,
    #[error("geometry is not a LineString")]
    NotALineString,
    #[error("polygon has no outer ring")]
    EmptyRing,
    #[error("malformed geometry: {0}")]
    Malformed(String),
}

/// Single-ring polygon in GeoJSON shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "GeoJsonGeometry", try_from = "GeoJsonGeometry")]
pub struct PolygonGeometry {
    pub coordinates: Vec<Vec<Position>>,
}

/// Open path in GeoJSON shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "GeoJsonGeometry", try_from = "GeoJsonGeometry")]
pub struct LineStringGeometry {
    pub coordinates: Vec<Position>,
}

/// Wire shape of any GeoJSON geometry; polygons and line strings are understood.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
enum GeoJsonGeometry {
    Polygon { coordinates: Vec<Vec<Position>> },
    LineString { coordinates: Vec<Position> },
    #[serde(other)]
    Unsupported,
}

impl From<PolygonGeometry> for GeoJsonGeometry {
    fn from(polygon: PolygonGeometry) -> Self {
        GeoJsonGeometry::Polygon {
            coordinates: polygon.coordinates,
        }
    }
}

impl TryFrom<GeoJsonGeometry> for PolygonGeometry {
    type Error = GeometryError;

    fn try_from(geometry: GeoJsonGeometry) -> Result<Self, Self::Error> {
        match geometry {
            GeoJsonGeometry::Polygon { coordinates } if coordinates.is_empty() => {
                Err(GeometryError::EmptyRing)
            }
            GeoJsonGeometry::Polygon { coordinates } => Ok(PolygonGeometry { coordinates }),
            _ => Err(GeometryError::NotAPolygon),
        }
    }
}

impl From<LineStringGeometry> for GeoJsonGeometry {
    fn from(line: LineStringGeometry) -> Self {
        GeoJsonGeometry::LineString {
            coordinates: line.coordinates,
        }
    }
}

impl TryFrom<GeoJsonGeometry> for LineStringGeometry {
    type Error = GeometryError;

    fn try_from(geometry: GeoJsonGeometry) -> Result<Self, Self::Error> {
        match geometry {
            GeoJsonGeometry::LineString { coordinates } => Ok(LineStringGeometry { coordinates }),
            _ => Err(GeometryError::NotALineString),
        }
    }
}

impl LineStringGeometry {
    pub fn from_geojson_str(text: &str) -> Result<Self, GeometryError> {
        serde_json::from_str(text).map_err(|e| GeometryError::Malformed(e.to_string()))
    }

    pub fn from_json_value(value: &serde_json::Value) -> Result<Self, GeometryError> {
        Self::deserialize(value).map_err(|e| GeometryError::Malformed(e.to_string()))
    }

    /// Positions as vertices, in order
    pub fn vertices(&self) -> Vec<Vertex> {
        self.coordinates
            .iter()
            .copied()
            .map(Vertex::from_position)
            .collect()
    }
}

impl PolygonGeometry {
    /// The outer (and only) ring.
    pub fn outer_ring(&self) -> &[Position] {
        self.coordinates.first().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Parse a GeoJSON text column (e.g. the output of `ST_AsGeoJSON`).
    pub fn from_geojson_str(text: &str) -> Result<Self, GeometryError> {
        serde_json::from_str(text).map_err(|e| GeometryError::Malformed(e.to_string()))
    }

    /// Parse a raw JSON column holding the same shape.
    pub fn from_json_value(value: &serde_json::Value) -> Result<Self, GeometryError> {
        Self::deserialize(value).map_err(|e| GeometryError::Malformed(e.to_string()))
    }
}

/// Turn an open vertex sequence into a closed single-ring polygon.
pub fn encode_closed_polygon(vertices: &[Vertex]) -> Result<PolygonGeometry, GeometryError> {
    if vertices.len() < MIN_RING_VERTICES {
        return Err(GeometryError::TooFewVertices {
            count: vertices.len(),
        });
    }

    let mut ring: Vec<Position> = vertices.iter().map(|v| v.to_position()).collect();
    ring.push(ring[0]);

    Ok(PolygonGeometry {
        coordinates: vec![ring],
    })
}

/// Vertices of the outer ring for drawing. The closing duplicate is dropped
/// because the polygon primitive closes rings on its own.
pub fn decode_for_render(geometry: &PolygonGeometry) -> Vec<Vertex> {
    let mut vertices: Vec<Vertex> = geometry
        .outer_ring()
        .iter()
        .copied()
        .map(Vertex::from_position)
        .collect();

    if vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }

    vertices
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn triangle() -> Vec<Vertex> {
        vec![
            Vertex::new(10.0, 20.0),
            Vertex::new(10.0, 21.0),
            Vertex::new(11.0, 21.0),
        ]
    }

    #[test]
    fn test_encode_triangle() {
        let geometry = encode_closed_polygon(&triangle()).unwrap();
        assert_eq!(
            geometry.coordinates,
            vec![vec![[20.0, 10.0], [21.0, 10.0], [21.0, 11.0], [20.0, 10.0]]]
        );
    }

    #[test]
    fn test_encode_closes_ring() {
        let vertices = vec![
            Vertex::new(1.0, 1.0),
            Vertex::new(1.0, 2.0),
            Vertex::new(2.0, 2.0),
            Vertex::new(2.5, 1.5),
            Vertex::new(2.0, 1.0),
        ];
        let geometry = encode_closed_polygon(&vertices).unwrap();
        let ring = geometry.outer_ring();
        assert_eq!(ring.len(), vertices.len() + 1);
        assert_eq!(ring.first(), ring.last());
    }

    #[test]
    fn test_encode_keeps_duplicate_vertices() {
        let vertices = vec![
            Vertex::new(1.0, 1.0),
            Vertex::new(1.0, 1.0),
            Vertex::new(2.0, 2.0),
        ];
        let geometry = encode_closed_polygon(&vertices).unwrap();
        assert_eq!(geometry.outer_ring().len(), 4);
    }

    #[test]
    fn test_encode_rejects_short_sequences() {
        for count in 0..MIN_RING_VERTICES {
            let vertices = vec![Vertex::new(1.0, 1.0); count];
            assert_eq!(
                encode_closed_polygon(&vertices),
                Err(GeometryError::TooFewVertices { count })
            );
        }
    }

    #[test]
    fn test_serialized_shape() {
        let geometry = encode_closed_polygon(&triangle()).unwrap();
        let value = serde_json::to_value(&geometry).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "Polygon",
                "coordinates": [[[20.0, 10.0], [21.0, 10.0], [21.0, 11.0], [20.0, 10.0]]]
            })
        );
    }

    #[test]
    fn test_decode_drops_closing_duplicate() {
        let geometry = encode_closed_polygon(&triangle()).unwrap();
        assert_eq!(decode_for_render(&geometry), triangle());
    }

    #[test]
    fn test_decode_keeps_open_ring() {
        let geometry = PolygonGeometry {
            coordinates: vec![vec![[20.0, 10.0], [21.0, 10.0], [21.0, 11.0]]],
        };
        assert_eq!(decode_for_render(&geometry).len(), 3);
    }

    #[test]
    fn test_decode_ignores_holes() {
        let geometry = PolygonGeometry {
            coordinates: vec![
                vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 0.0]],
                vec![[1.0, 1.0], [2.0, 1.0], [2.0, 2.0], [1.0, 1.0]],
            ],
        };
        assert_eq!(decode_for_render(&geometry).len(), 3);
    }

    #[test]
    fn test_roundtrip_law() {
        let stored = PolygonGeometry::from_geojson_str(
            r#"{"type":"Polygon","coordinates":[[[78.1,20.2],[78.4,20.2],[78.4,20.6],[78.0,20.5],[78.1,20.2]]]}"#,
        )
        .unwrap();
        let reencoded = encode_closed_polygon(&decode_for_render(&stored)).unwrap();
        assert_eq!(reencoded, stored);
    }

    #[test]
    fn test_parse_rejects_line_string() {
        let result = PolygonGeometry::from_geojson_str(
            r#"{"type":"LineString","coordinates":[[78.1,20.2],[78.4,20.2]]}"#,
        );
        assert!(matches!(result, Err(GeometryError::Malformed(_))));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(PolygonGeometry::from_geojson_str("not json").is_err());
        assert!(PolygonGeometry::from_geojson_str(r#"{"type":"Polygon"}"#).is_err());
        assert!(
            PolygonGeometry::from_geojson_str(r#"{"type":"Polygon","coordinates":[]}"#).is_err()
        );
    }

    #[test]
    fn test_line_string_decodes_to_lat_lng() {
        let line = LineStringGeometry::from_geojson_str(
            r#"{"type":"LineString","coordinates":[[78.1,20.2],[78.4,20.3],[78.5,20.6]]}"#,
        )
        .unwrap();
        assert_eq!(
            line.vertices(),
            vec![
                Vertex::new(20.2, 78.1),
                Vertex::new(20.3, 78.4),
                Vertex::new(20.6, 78.5),
            ]
        );
    }

    #[test]
    fn test_line_string_rejects_polygon() {
        let value = json!({
            "type": "Polygon",
            "coordinates": [[[1.0, 2.0], [3.0, 2.0], [3.0, 4.0], [1.0, 2.0]]]
        });
        assert!(LineStringGeometry::from_json_value(&value).is_err());
        assert!(LineStringGeometry::from_geojson_str(r#"{"type":"LineString"}"#).is_err());
    }

    #[test]
    fn test_from_json_value() {
        let value = json!({
            "type": "Polygon",
            "coordinates": [[[1.0, 2.0], [3.0, 2.0], [3.0, 4.0], [1.0, 2.0]]]
        });
        let geometry = PolygonGeometry::from_json_value(&value).unwrap();
        assert_eq!(geometry.outer_ring().len(), 4);
    }
}
