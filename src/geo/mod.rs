//! Geographic primitives shared by the drawing session, the map canvas and the store.
//!
//! ## Module Structure
//!
//! - [`vertex`] - `Vertex` (lat/lng pair) and great-circle distance
//! - [`projection`] - Spherical Web Mercator and the screen viewport
//! - [`geometry`] - Closed-ring polygon encoding and decoding, pathline decoding

pub mod geometry;
pub mod projection;
pub mod vertex;

pub use geometry::{
    decode_for_render, encode_closed_polygon, GeometryError, LineStringGeometry, PolygonGeometry,
    Position, MIN_RING_VERTICES,
};
pub use projection::Viewport;
pub use vertex::Vertex;
