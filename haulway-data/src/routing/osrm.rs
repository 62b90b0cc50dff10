//! OSRM API response types for the Route service.
//!
//! See: <http://project-osrm.org/docs/v5.24.0/api/#route-service>

use serde::Deserialize;

/// OSRM Route API response.
///
/// The `code` field indicates the response status; `routes` is present on
/// success and ordered best first.
#[derive(Debug, Deserialize)]
pub struct RouteResponse {
    /// Status code from OSRM.
    ///
    /// Common values:
    /// - `"Ok"` - Request was successful
    /// - `"NoRoute"` - No route found between the coordinates
    /// - `"InvalidQuery"` - Invalid query parameters
    pub code: String,

    /// Optional error message when `code` is not `"Ok"`.
    pub message: Option<String>,

    /// Primary route followed by alternatives.
    pub routes: Option<Vec<OsrmRoute>>,
}

impl RouteResponse {
    /// Check if the response indicates success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.code == "Ok"
    }
}

/// A single route requested with `geometries=geojson`.
#[derive(Debug, Deserialize)]
pub struct OsrmRoute {
    /// Length in metres.
    pub distance: f64,
    /// Travel time in seconds.
    pub duration: f64,
    /// Full-overview route line.
    pub geometry: OsrmGeometry,
}

/// GeoJSON `LineString` geometry with `[lon, lat]` positions.
#[derive(Debug, Deserialize)]
pub struct OsrmGeometry {
    /// Vertex positions.
    pub coordinates: Vec<[f64; 2]>,
}
