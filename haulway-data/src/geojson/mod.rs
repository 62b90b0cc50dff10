//! GeoJSON decoding for layers and routes.
//!
//! Layers are published as `FeatureCollection` documents. Decoding is
//! tolerant: a feature with an unusable geometry is skipped with a warning
//! and the rest of the layer still loads. Multi-geometries are split into one
//! feature per usable member, with ids suffixed by the member's index in the
//! source array (`#0`, `#1`, and so on), even when only one member survives.
//!
//! # Example
//!
//! ```
//! use haulway_core::Layer;
//! use haulway_data::parse_layer;
//!
//! let json = r#"{
//!     "type": "FeatureCollection",
//!     "features": [
//!         {"type": "Feature", "id": 7,
//!          "geometry": {"type": "Point", "coordinates": [37.6, 55.7]},
//!          "properties": {"name": "North gate"}}
//!     ]
//! }"#;
//! let frames = parse_layer(json, Layer::Frames)?;
//! assert_eq!(frames.len(), 1);
//! assert!(frames.contains(&"frame-7".into()));
//! # Ok::<(), haulway_data::GeoJsonError>(())
//! ```

mod ids;
mod raw;

use haulway_core::{Feature, FeatureCollection, Layer, Polyline};
use serde_json::Value;
use thiserror::Error;

use self::ids::{flatten_tags, normalise_id};
use self::raw::{Parts, RawCollection, RawFeature, SkipReason, position};

const FEATURE_COLLECTION: &str = "FeatureCollection";

/// Errors raised when a whole GeoJSON document is unusable.
#[derive(Debug, Error)]
pub enum GeoJsonError {
    /// The document is not valid JSON or lacks a `type` member.
    #[error("invalid GeoJSON document: {0}")]
    Json(#[from] serde_json::Error),
    /// The top-level object is not a `FeatureCollection`.
    #[error("expected a FeatureCollection, found {found:?}")]
    NotACollection {
        /// Value of the top-level `type` member.
        found: String,
    },
    /// The collection has no `features` array.
    #[error("FeatureCollection has no features array")]
    MissingFeatures,
    /// No `LineString` geometry was found for a route.
    #[error("document contains no LineString geometry")]
    NoLineString,
    /// The route line has fewer than two valid positions.
    #[error("route needs at least two valid positions, found {found}")]
    TooFewRoutePoints {
        /// Number of valid positions.
        found: usize,
    },
}

/// Decode a published layer.
///
/// # Errors
///
/// Returns [`GeoJsonError`] when the document itself is unusable. Individual
/// malformed features are skipped and logged instead.
pub fn parse_layer(json: &str, layer: Layer) -> Result<FeatureCollection, GeoJsonError> {
    let raw: RawCollection = serde_json::from_str(json)?;
    if raw.kind != FEATURE_COLLECTION {
        return Err(GeoJsonError::NotACollection { found: raw.kind });
    }
    let features = raw.features.ok_or(GeoJsonError::MissingFeatures)?;

    let total = features.len();
    let mut collection = FeatureCollection::new();
    let mut skipped = 0_usize;
    for (index, value) in features.into_iter().enumerate() {
        let decoded = match decode_feature(value, layer, index) {
            Ok(decoded) => decoded,
            Err(reason) => {
                log::warn!("Skipping {layer} feature #{index}: {reason}");
                skipped += 1;
                continue;
            }
        };
        for feature in decoded {
            if let Err(err) = collection.insert(feature) {
                log::warn!("Skipping {layer} feature #{index}: {err}");
                skipped += 1;
            }
        }
    }

    log::debug!(
        "Decoded layer {layer}: {} features from {total} entries, {skipped} skipped",
        collection.len()
    );
    if collection.is_empty() {
        log::warn!("Layer {layer} contains no usable features");
    }
    Ok(collection)
}

fn decode_feature(value: Value, layer: Layer, index: usize) -> Result<Vec<Feature>, SkipReason> {
    let raw: RawFeature = serde_json::from_value(value).map_err(SkipReason::Shape)?;
    let properties = raw.properties.unwrap_or_default();
    let id = normalise_id(raw.id.as_ref(), &properties, layer.id_prefix(), index);
    let parts = raw
        .geometry
        .ok_or(SkipReason::MissingGeometry)?
        .into_parts()?;
    let tags = flatten_tags(properties);

    match parts {
        Parts::Single(geometry) => Ok(vec![Feature::new(id, geometry, tags)]),
        Parts::Members(members) => Ok(members
            .into_iter()
            .map(|(member, geometry)| {
                Feature::new(format!("{id}#{member}"), geometry, tags.clone())
            })
            .collect()),
    }
}

/// Decode a route line.
///
/// Accepts a bare `LineString` geometry, a `Feature` wrapping one, or a
/// `FeatureCollection` whose first `LineString` feature is used. Invalid
/// positions are dropped.
///
/// # Errors
///
/// Returns [`GeoJsonError::NoLineString`] when no line is present and
/// [`GeoJsonError::TooFewRoutePoints`] when fewer than two positions survive.
pub fn parse_route(json: &str) -> Result<Polyline, GeoJsonError> {
    let document: Value = serde_json::from_str(json)?;
    let positions = find_line(&document).ok_or(GeoJsonError::NoLineString)?;
    let route: Polyline = positions.iter().filter_map(position).collect();
    let dropped = positions.len() - route.len();
    if dropped > 0 {
        log::warn!("Dropped {dropped} invalid route positions");
    }
    if route.len() < 2 {
        return Err(GeoJsonError::TooFewRoutePoints { found: route.len() });
    }
    Ok(route)
}

fn find_line(document: &Value) -> Option<&Vec<Value>> {
    match type_of(document) {
        Some("Feature") => document.get("geometry").and_then(line_positions),
        Some(FEATURE_COLLECTION) => document
            .get("features")?
            .as_array()?
            .iter()
            .find_map(|feature| feature.get("geometry").and_then(line_positions)),
        _ => line_positions(document),
    }
}

fn line_positions(geometry: &Value) -> Option<&Vec<Value>> {
    if type_of(geometry) != Some("LineString") {
        return None;
    }
    geometry.get("coordinates")?.as_array()
}

fn type_of(value: &Value) -> Option<&str> {
    value.get("type").and_then(Value::as_str)
}
