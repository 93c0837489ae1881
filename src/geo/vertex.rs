//! Geographic coordinate pair used for every placed vertex.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters (same sphere the map library measures on)
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A latitude/longitude pair in degrees. No altitude.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vertex {
    pub lat: f64,
    pub lng: f64,
}

impl Vertex {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle (haversine) distance in meters.
    pub fn distance_to(&self, other: Vertex) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let sin_dlat = ((other.lat - self.lat).to_radians() / 2.0).sin();
        let sin_dlng = ((other.lng - self.lng).to_radians() / 2.0).sin();

        let a = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlng * sin_dlng;
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_METERS * c
    }

    /// Round both components to `precision` decimal places.
    pub fn rounded(&self, precision: i32) -> Vertex {
        let factor = 10f64.powi(precision);
        Vertex::new(
            (self.lat * factor).round() / factor,
            (self.lng * factor).round() / factor,
        )
    }

    /// GeoJSON position order: `[longitude, latitude]`.
    pub fn to_position(self) -> [f64; 2] {
        [self.lng, self.lat]
    }

    pub fn from_position(position: [f64; 2]) -> Self {
        Self::new(position[1], position[0])
    }
}

impl std::fmt::Display for Vertex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lng)
    }
}
