//! Geographic coordinates in `(latitude, longitude)` order.
//!
//! Everything inside the engine stores latitude first. Serialisation formats
//! that use `(longitude, latitude)`, such as GeoJSON, convert at the edge via
//! [`Coordinate::from_lon_lat`].

use geo::Coord;
use thiserror::Error;

/// A WGS-84 position in decimal degrees.
///
/// # Examples
/// ```
/// use haulway_core::Coordinate;
///
/// let moscow = Coordinate::try_new(55.75, 37.62)?;
/// assert_eq!(moscow.lat, 55.75);
/// assert_eq!(moscow.to_geo().x, 37.62);
/// # Ok::<(), haulway_core::CoordinateError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coordinate {
    /// Latitude in degrees, positive north.
    pub lat: f64,
    /// Longitude in degrees, positive east.
    pub lon: f64,
}

/// An ordered, open sequence of coordinates.
///
/// Routes and line geometries are only meaningful with at least two points;
/// shorter polylines are accepted and treated as "no geometry" by the
/// distance functions.
pub type Polyline = Vec<Coordinate>;

/// Errors returned by [`Coordinate::try_new`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoordinateError {
    /// A component was NaN or infinite.
    #[error("coordinate ({lat}, {lon}) has a non-finite component")]
    NonFinite {
        /// Supplied latitude.
        lat: f64,
        /// Supplied longitude.
        lon: f64,
    },
    /// Latitude fell outside `[-90, 90]`.
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    /// Longitude fell outside `[-180, 180]`.
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

impl Coordinate {
    /// Construct a coordinate without validation.
    ///
    /// Prefer [`Coordinate::try_new`] for untrusted input; unchecked values
    /// that turn out to be non-finite make the distance functions return
    /// infinity rather than panic.
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Validate and construct a coordinate.
    pub fn try_new(lat: f64, lon: f64) -> Result<Self, CoordinateError> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(CoordinateError::NonFinite { lat, lon });
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::LatitudeOutOfRange(lat));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(CoordinateError::LongitudeOutOfRange(lon));
        }
        Ok(Self { lat, lon })
    }

    /// Validate a `(longitude, latitude)` pair as found in GeoJSON.
    pub fn from_lon_lat(lon: f64, lat: f64) -> Result<Self, CoordinateError> {
        Self::try_new(lat, lon)
    }

    /// Whether both components are finite and inside the WGS-84 range.
    pub fn is_valid(&self) -> bool {
        Self::try_new(self.lat, self.lon).is_ok()
    }

    /// Whether both components are finite, regardless of range.
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }

    /// Convert into a `geo` coordinate (`x = longitude`, `y = latitude`).
    pub const fn to_geo(self) -> Coord<f64> {
        Coord {
            x: self.lon,
            y: self.lat,
        }
    }
}

impl From<Coordinate> for Coord<f64> {
    fn from(value: Coordinate) -> Self {
        value.to_geo()
    }
}

impl From<Coord<f64>> for Coordinate {
    fn from(value: Coord<f64>) -> Self {
        Self::new(value.y, value.x)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// Drop invalid coordinates from a polyline, keeping the order of the rest.
///
/// Invalid points are an input error that is absorbed here: they are logged
/// once per call and excluded.
///
/// # Examples
/// ```
/// use haulway_core::{Coordinate, sanitize_polyline};
///
/// let cleaned = sanitize_polyline([
///     Coordinate::new(55.0, 37.0),
///     Coordinate::new(f64::NAN, 37.0),
///     Coordinate::new(95.0, 37.0),
///     Coordinate::new(55.1, 37.1),
/// ]);
/// assert_eq!(cleaned.len(), 2);
/// ```
pub fn sanitize_polyline<I>(points: I) -> Polyline
where
    I: IntoIterator<Item = Coordinate>,
{
    let mut dropped = 0_usize;
    let cleaned: Polyline = points
        .into_iter()
        .filter(|point| {
            let valid = point.is_valid();
            if !valid {
                dropped += 1;
            }
            valid
        })
        .collect();
    if dropped > 0 {
        log::warn!("Dropped {dropped} invalid coordinates from polyline");
    }
    cleaned
}
