//! R\*-tree entries and conservative query envelopes.
//!
//! Envelopes live in degree space with axis order (longitude, latitude).
//! Metric buffers are widened into degrees generously enough that the tree
//! never drops a feature the exact distance test would keep; the exact test
//! always runs afterwards.

use geo::{BoundingRect, LineString, Rect};
use rstar::{AABB, RTreeObject};

use crate::Coordinate;
use crate::geomath::HAVERSINE_RADIUS_M;

/// Metres per degree of latitude on the smaller of the two Earth radii.
const METRES_PER_DEGREE: f64 = HAVERSINE_RADIUS_M * std::f64::consts::PI / 180.0;

/// Extra slack applied on top of the metre-to-degree conversion.
const MARGIN_SAFETY: f64 = 1.5;

/// Below this cosine the longitude margin spans the whole globe.
const MIN_COS_LAT: f64 = 1e-6;

/// Slot of a feature in the index, keyed by its bounding box.
#[derive(Debug, Clone)]
pub(crate) struct IndexedFeature {
    pub(crate) slot: usize,
    envelope: AABB<[f64; 2]>,
}

impl IndexedFeature {
    pub(crate) fn new(slot: usize, vertices: &[Coordinate]) -> Option<Self> {
        let rect = bounds(vertices)?;
        Some(Self {
            slot,
            envelope: to_aabb(rect),
        })
    }
}

impl RTreeObject for IndexedFeature {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Bounding rectangle of the finite coordinates in `points`.
pub(crate) fn bounds(points: &[Coordinate]) -> Option<Rect<f64>> {
    points
        .iter()
        .filter(|point| point.is_finite())
        .map(|point| point.to_geo())
        .collect::<LineString<f64>>()
        .bounding_rect()
}

/// Widen `rect` by `metres` in every direction.
///
/// Returns `None` when the margin cannot be expressed in degrees (negative,
/// NaN or infinite), in which case callers fall back to a full scan.
pub(crate) fn widened(rect: Rect<f64>, metres: f64) -> Option<AABB<[f64; 2]>> {
    if !metres.is_finite() || metres < 0.0 {
        return None;
    }
    let min = rect.min();
    let max = rect.max();
    let lat_margin = metres / METRES_PER_DEGREE * MARGIN_SAFETY;
    let extreme_lat = (min.y.abs().max(max.y.abs()) + lat_margin).min(90.0);
    let cos_lat = extreme_lat.to_radians().cos();
    let lon_margin = if cos_lat > MIN_COS_LAT {
        lat_margin / cos_lat
    } else {
        360.0
    };
    Some(AABB::from_corners(
        [min.x - lon_margin, min.y - lat_margin],
        [max.x + lon_margin, max.y + lat_margin],
    ))
}

fn to_aabb(rect: Rect<f64>) -> AABB<[f64; 2]> {
    let min = rect.min();
    let max = rect.max();
    AABB::from_corners([min.x, min.y], [max.x, max.y])
}
