//! Loosely-typed GeoJSON shapes as found in published layers.
//!
//! Positions stay as raw JSON values until conversion so that a single bad
//! vertex does not reject the whole document.

use haulway_core::{Coordinate, FeatureError, FeatureGeometry, GeometryKind};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Deserialize)]
pub(super) struct RawCollection {
    #[serde(rename = "type")]
    pub(super) kind: String,
    #[serde(default)]
    pub(super) features: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawFeature {
    #[serde(default)]
    pub(super) id: Option<Value>,
    #[serde(default)]
    pub(super) properties: Option<Map<String, Value>>,
    #[serde(default)]
    pub(super) geometry: Option<RawGeometry>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub(super) enum RawGeometry {
    Point { coordinates: Value },
    MultiPoint { coordinates: Vec<Value> },
    LineString { coordinates: Vec<Value> },
    MultiLineString { coordinates: Vec<Vec<Value>> },
    Polygon { coordinates: Vec<Vec<Value>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Value>>> },
    #[serde(other)]
    Unsupported,
}

/// Why a single feature was left out of a layer.
#[derive(Debug, Error)]
pub(super) enum SkipReason {
    #[error("not a feature object: {0}")]
    Shape(#[source] serde_json::Error),
    #[error("feature has no geometry")]
    MissingGeometry,
    #[error("unsupported geometry type")]
    UnsupportedGeometry,
    #[error("point position is not a valid [lon, lat] pair")]
    InvalidPosition,
    #[error("multi-geometry has no usable members")]
    EmptyMulti,
    #[error(transparent)]
    Invalid(#[from] FeatureError),
}

/// Decode a `[lon, lat, ...]` position, rejecting out-of-range values.
pub(super) fn position(value: &Value) -> Option<Coordinate> {
    let pair = value.as_array()?;
    let lon = pair.first()?.as_f64()?;
    let lat = pair.get(1)?.as_f64()?;
    Coordinate::from_lon_lat(lon, lat).ok()
}

fn point(value: &Value) -> Result<FeatureGeometry, SkipReason> {
    let coordinate = position(value).ok_or(SkipReason::InvalidPosition)?;
    Ok(FeatureGeometry::point(coordinate)?)
}

fn line(positions: &[Value]) -> Result<FeatureGeometry, SkipReason> {
    Ok(FeatureGeometry::line_string(positions.iter().filter_map(position))?)
}

fn polygon(rings: &[Vec<Value>]) -> Result<FeatureGeometry, SkipReason> {
    let Some(outer) = rings.first() else {
        return Err(FeatureError::TooFewVertices {
            kind: GeometryKind::Polygon,
            required: 3,
            found: 0,
        }
        .into());
    };
    Ok(FeatureGeometry::polygon(outer.iter().filter_map(position))?)
}

/// A decoded geometry, either whole or split into numbered members.
#[derive(Debug)]
pub(super) enum Parts {
    Single(FeatureGeometry),
    /// Usable members paired with their position in the source array.
    Members(Vec<(usize, FeatureGeometry)>),
}

fn members<T, F>(items: &[T], convert: F) -> Result<Parts, SkipReason>
where
    F: Fn(&T) -> Result<FeatureGeometry, SkipReason>,
{
    let mut parts = Vec::with_capacity(items.len());
    for (member, item) in items.iter().enumerate() {
        match convert(item) {
            Ok(part) => parts.push((member, part)),
            Err(reason) => log::debug!("Dropping multi-geometry member {member}: {reason}"),
        }
    }
    if parts.is_empty() {
        return Err(SkipReason::EmptyMulti);
    }
    Ok(Parts::Members(parts))
}

impl RawGeometry {
    /// Validated geometry; multi-geometries keep the source index of each
    /// usable member.
    pub(super) fn into_parts(self) -> Result<Parts, SkipReason> {
        match self {
            Self::Point { coordinates } => Ok(Parts::Single(point(&coordinates)?)),
            Self::LineString { coordinates } => Ok(Parts::Single(line(&coordinates)?)),
            Self::Polygon { coordinates } => Ok(Parts::Single(polygon(&coordinates)?)),
            Self::MultiPoint { coordinates } => members(&coordinates, point),
            Self::MultiLineString { coordinates } => members(&coordinates, |part| line(part)),
            Self::MultiPolygon { coordinates } => members(&coordinates, |part| polygon(part)),
            Self::Unsupported => Err(SkipReason::UnsupportedGeometry),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!([37.6, 55.7]), Some(Coordinate::new(55.7, 37.6)))]
    #[case(json!([37.6, 55.7, 120.0]), Some(Coordinate::new(55.7, 37.6)))]
    #[case(json!([37.6]), None)]
    #[case(json!(["37.6", 55.7]), None)]
    #[case(json!([37.6, 95.0]), None)]
    #[case(json!({"lon": 37.6, "lat": 55.7}), None)]
    fn decodes_positions(#[case] value: Value, #[case] expected: Option<Coordinate>) {
        assert_eq!(position(&value), expected);
    }

    #[rstest]
    fn line_drops_bad_vertices() {
        let raw: RawGeometry = serde_json::from_value(json!({
            "type": "LineString",
            "coordinates": [[37.0, 55.0], null, [37.1, 55.1], [400.0, 55.2]]
        }))
        .expect("geometry should decode");
        let Ok(Parts::Single(line)) = raw.into_parts() else {
            panic!("line should be usable");
        };
        assert_eq!(line.vertices().len(), 2);
    }

    #[rstest]
    fn polygon_keeps_outer_ring_only() {
        let raw: RawGeometry = serde_json::from_value(json!({
            "type": "Polygon",
            "coordinates": [
                [[37.0, 55.0], [37.2, 55.0], [37.2, 55.2], [37.0, 55.2], [37.0, 55.0]],
                [[37.05, 55.05], [37.1, 55.05], [37.1, 55.1], [37.05, 55.05]]
            ]
        }))
        .expect("geometry should decode");
        let Ok(Parts::Single(polygon)) = raw.into_parts() else {
            panic!("polygon should be usable");
        };
        assert_eq!(polygon.kind(), GeometryKind::Polygon);
        assert_eq!(polygon.vertices().len(), 5);
    }

    #[rstest]
    fn multi_point_skips_unusable_members() {
        let raw: RawGeometry = serde_json::from_value(json!({
            "type": "MultiPoint",
            "coordinates": [[37.0, 55.0], [37.0], [37.1, 55.1]]
        }))
        .expect("geometry should decode");
        let Ok(Parts::Members(parts)) = raw.into_parts() else {
            panic!("multi-point should have usable members");
        };
        let indices: Vec<usize> = parts.iter().map(|(member, _)| *member).collect();
        assert_eq!(indices, vec![0, 2]);
    }

    #[rstest]
    fn single_member_multi_stays_a_member() {
        let raw: RawGeometry = serde_json::from_value(json!({
            "type": "MultiPoint",
            "coordinates": [[37.0, 55.0]]
        }))
        .expect("geometry should decode");
        assert!(matches!(raw.into_parts(), Ok(Parts::Members(parts)) if parts.len() == 1));
    }

    #[rstest]
    fn unknown_geometry_types_are_unsupported() {
        let raw: RawGeometry = serde_json::from_value(json!({
            "type": "GeometryCollection",
            "geometries": []
        }))
        .expect("geometry should decode");
        assert!(matches!(
            raw.into_parts(),
            Err(SkipReason::UnsupportedGeometry)
        ));
    }
}
