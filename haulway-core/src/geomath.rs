//! Spherical distance primitives.
//!
//! Two Earth radii are in play on purpose. Great-circle distances use the
//! mean radius of 6 371 000 m. Point-to-segment distances project into a flat
//! equirectangular frame centred on the segment's midpoint latitude and use
//! the equatorial radius of 6 378 137 m; the projection is only accurate for
//! short segments.
//!
//! All functions are total: malformed input (NaN or infinite components,
//! polylines with fewer than two points) yields [`f64::INFINITY`] or `false`
//! rather than an error.

use crate::Coordinate;

/// Mean Earth radius used by [`distance`].
pub const HAVERSINE_RADIUS_M: f64 = 6_371_000.0;

/// Equatorial Earth radius used by the local projection in
/// [`distance_to_segment`].
pub const PROJECTION_RADIUS_M: f64 = 6_378_137.0;

/// Great-circle distance between two coordinates in metres.
///
/// # Examples
/// ```
/// use haulway_core::{Coordinate, geomath::distance};
///
/// let a = Coordinate::new(55.0, 37.0);
/// assert_eq!(distance(a, a), 0.0);
/// assert!(distance(a, Coordinate::new(55.0, 37.1)) > 6_000.0);
/// ```
pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
    if !a.is_finite() || !b.is_finite() {
        return f64::INFINITY;
    }
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let half_dlat = (b.lat - a.lat).to_radians() / 2.0;
    let half_dlon = (b.lon - a.lon).to_radians() / 2.0;
    let sin_lat = half_dlat.sin();
    let sin_lon = half_dlon.sin();
    let h = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lon * sin_lon;
    2.0 * HAVERSINE_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Distance in metres from `point` to the closest point of the segment
/// `[start, end]`.
///
/// The projection parameter is clamped to `[0, 1]`, so the closest point is
/// always on the segment rather than on its infinite extension. A degenerate
/// segment falls back to [`distance`].
pub fn distance_to_segment(point: Coordinate, start: Coordinate, end: Coordinate) -> f64 {
    if !point.is_finite() || !start.is_finite() || !end.is_finite() {
        return f64::INFINITY;
    }
    if start == end {
        return distance(point, start);
    }

    let frame = LocalFrame::centred_on(start, end);
    let (px, py) = frame.project(point);
    let (ax, ay) = frame.project(start);
    let (bx, by) = frame.project(end);

    let abx = bx - ax;
    let aby = by - ay;
    let denom = abx * abx + aby * aby;
    let t = if denom > 0.0 {
        (((px - ax) * abx + (py - ay) * aby) / denom).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let nearest_x = ax + abx * t;
    let nearest_y = ay + aby * t;
    (px - nearest_x).hypot(py - nearest_y)
}

/// Minimum distance in metres from `point` to any segment of `line`.
///
/// Returns infinity for lines with fewer than two points.
pub fn distance_to_polyline(point: Coordinate, line: &[Coordinate]) -> f64 {
    line.windows(2)
        .filter_map(|pair| match pair {
            [start, end] => Some(distance_to_segment(point, *start, *end)),
            _ => None,
        })
        .fold(f64::INFINITY, f64::min)
}

/// Like [`distance_to_polyline`] but stops at the first segment whose
/// distance is at most `threshold`.
///
/// The returned value is then an upper bound at or below `threshold`, not
/// necessarily the minimum. Callers may only rely on the comparison with
/// `threshold`.
pub fn distance_to_polyline_within(point: Coordinate, line: &[Coordinate], threshold: f64) -> f64 {
    let mut best = f64::INFINITY;
    for pair in line.windows(2) {
        if let [start, end] = pair {
            let dist = distance_to_segment(point, *start, *end);
            if dist < best {
                best = dist;
                if best <= threshold {
                    return best;
                }
            }
        }
    }
    best
}

/// Even-odd ray-casting containment test.
///
/// The ring is treated as closed whether or not it repeats its first vertex.
/// Rings with fewer than three points never contain anything.
///
/// # Examples
/// ```
/// use haulway_core::{Coordinate, geomath::point_in_polygon};
///
/// let ring = [
///     Coordinate::new(0.0, 0.0),
///     Coordinate::new(0.0, 1.0),
///     Coordinate::new(1.0, 1.0),
///     Coordinate::new(1.0, 0.0),
/// ];
/// assert!(point_in_polygon(Coordinate::new(0.5, 0.5), &ring));
/// assert!(!point_in_polygon(Coordinate::new(5.0, 5.0), &ring));
/// ```
pub fn point_in_polygon(point: Coordinate, ring: &[Coordinate]) -> bool {
    if ring.len() < 3 || !point.is_finite() {
        return false;
    }
    let previous = ring.iter().cycle().skip(ring.len() - 1);
    ring.iter()
        .zip(previous)
        .filter(|(current, prev)| crosses(point, current, prev))
        .count()
        % 2
        == 1
}

/// Whether a ray cast east from `point` crosses the edge `[a, b]`.
fn crosses(point: Coordinate, a: &Coordinate, b: &Coordinate) -> bool {
    if (a.lat > point.lat) == (b.lat > point.lat) {
        return false;
    }
    let intersect_lon = (b.lon - a.lon) * (point.lat - a.lat) / (b.lat - a.lat) + a.lon;
    point.lon < intersect_lon
}

/// Flat projection valid in the neighbourhood of one segment.
struct LocalFrame {
    lon_scale: f64,
}

impl LocalFrame {
    fn centred_on(start: Coordinate, end: Coordinate) -> Self {
        let mid_lat = ((start.lat + end.lat) / 2.0).to_radians();
        Self {
            lon_scale: PROJECTION_RADIUS_M * mid_lat.cos(),
        }
    }

    fn project(&self, point: Coordinate) -> (f64, f64) {
        (
            self.lon_scale * point.lon.to_radians(),
            PROJECTION_RADIUS_M * point.lat.to_radians(),
        )
    }
}
