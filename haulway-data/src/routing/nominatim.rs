//! Nominatim search response types.
//!
//! See: <https://nominatim.org/release-docs/latest/api/Search/>

use serde::Deserialize;

/// One search hit from `/search?format=json`.
///
/// Nominatim encodes coordinates as decimal strings.
#[derive(Debug, Deserialize)]
pub struct Place {
    /// Latitude in degrees.
    pub lat: String,
    /// Longitude in degrees.
    pub lon: String,
    /// Human-readable label.
    #[serde(default)]
    pub display_name: Option<String>,
}
