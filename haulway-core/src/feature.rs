//! Validated map features.
//!
//! Raw, loosely-shaped geometry is checked once at ingestion and turned into
//! a [`FeatureGeometry`]. Everything downstream matches exhaustively on the
//! variant and never re-checks shape.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use geo::{Centroid, LineString, Polygon};
use thiserror::Error;

use crate::geomath::{distance, distance_to_polyline_within, point_in_polygon};
use crate::{Coordinate, Polyline};

/// Stable identifier of a feature within its collection.
///
/// Numeric identifiers from source data are namespaced with a layer prefix
/// (for example `frame-17`) so that ids never collide across layers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct FeatureId(String);

impl FeatureId {
    /// Wrap an identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Namespace a numeric identifier with a layer prefix.
    ///
    /// # Examples
    /// ```
    /// use haulway_core::FeatureId;
    ///
    /// assert_eq!(FeatureId::prefixed("frame", 17).as_str(), "frame-17");
    /// ```
    pub fn prefixed(prefix: &str, id: impl std::fmt::Display) -> Self {
        Self(format!("{prefix}-{id}"))
    }

    /// Borrow the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FeatureId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for FeatureId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Geometry variants understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GeometryKind {
    /// A single position.
    Point,
    /// An open polyline.
    LineString,
    /// The outer ring of a polygon.
    Polygon,
}

impl GeometryKind {
    /// GeoJSON type name of the variant.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Point => "Point",
            Self::LineString => "LineString",
            Self::Polygon => "Polygon",
        }
    }
}

impl std::fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while validating feature geometry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    /// A point geometry had an invalid coordinate.
    #[error("point coordinate {0} is invalid")]
    InvalidPoint(Coordinate),
    /// Too few valid vertices remained after dropping invalid ones.
    #[error("{kind} needs at least {required} valid vertices, found {found}")]
    TooFewVertices {
        /// Geometry being built.
        kind: GeometryKind,
        /// Minimum number of vertices for the kind.
        required: usize,
        /// Number of valid vertices supplied.
        found: usize,
    },
    /// A feature with the same id is already part of the collection.
    #[error("duplicate feature id {0}")]
    DuplicateId(FeatureId),
}

/// Tagged union over the supported geometries.
///
/// Polygons keep their outer ring only; holes are not modelled.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureGeometry {
    /// A single position.
    Point(Coordinate),
    /// An open line with at least two vertices.
    LineString(Polyline),
    /// An outer ring with at least three vertices; closure is optional.
    Polygon(Polyline),
}

impl FeatureGeometry {
    /// Validate a point geometry.
    pub fn point(coordinate: Coordinate) -> Result<Self, FeatureError> {
        if coordinate.is_valid() {
            Ok(Self::Point(coordinate))
        } else {
            Err(FeatureError::InvalidPoint(coordinate))
        }
    }

    /// Validate a line geometry, dropping invalid vertices.
    pub fn line_string<I>(vertices: I) -> Result<Self, FeatureError>
    where
        I: IntoIterator<Item = Coordinate>,
    {
        let kept = Self::valid_vertices(vertices, GeometryKind::LineString, 2)?;
        Ok(Self::LineString(kept))
    }

    /// Validate a polygon outer ring, dropping invalid vertices.
    pub fn polygon<I>(ring: I) -> Result<Self, FeatureError>
    where
        I: IntoIterator<Item = Coordinate>,
    {
        let kept = Self::valid_vertices(ring, GeometryKind::Polygon, 3)?;
        Ok(Self::Polygon(kept))
    }

    fn valid_vertices<I>(
        vertices: I,
        kind: GeometryKind,
        required: usize,
    ) -> Result<Polyline, FeatureError>
    where
        I: IntoIterator<Item = Coordinate>,
    {
        let kept: Polyline = vertices.into_iter().filter(Coordinate::is_valid).collect();
        if kept.len() < required {
            return Err(FeatureError::TooFewVertices {
                kind,
                required,
                found: kept.len(),
            });
        }
        Ok(kept)
    }

    /// Variant of this geometry.
    pub const fn kind(&self) -> GeometryKind {
        match self {
            Self::Point(_) => GeometryKind::Point,
            Self::LineString(_) => GeometryKind::LineString,
            Self::Polygon(_) => GeometryKind::Polygon,
        }
    }

    /// All vertices of the geometry; a point yields itself.
    pub fn vertices(&self) -> &[Coordinate] {
        match self {
            Self::Point(point) => std::slice::from_ref(point),
            Self::LineString(line) => line,
            Self::Polygon(ring) => ring,
        }
    }

    /// Representative distance from this geometry to a route, in metres.
    ///
    /// Points measure their own distance to the route. Lines and polygons
    /// take the minimum over their vertices, so a route crossing a polygon's
    /// interior without passing near a vertex is not detected.
    ///
    /// Evaluation may stop once a vertex within `threshold` is found; only
    /// the comparison with `threshold` is meaningful in that case.
    pub fn distance_to_route(&self, route: &[Coordinate], threshold: f64) -> f64 {
        let mut best = f64::INFINITY;
        for vertex in self.vertices() {
            best = best.min(distance_to_polyline_within(*vertex, route, threshold));
            if best <= threshold {
                break;
            }
        }
        best
    }

    /// Distance from `point` to this geometry in metres.
    ///
    /// Lines and polygons measure to their nearest vertex, mirroring
    /// [`FeatureGeometry::distance_to_route`]; a point beside the middle of a
    /// long segment is not close to it. Containment is a separate question
    /// answered by [`FeatureGeometry::contains`].
    pub fn distance_to_point(&self, point: Coordinate) -> f64 {
        self.vertices()
            .iter()
            .map(|vertex| distance(point, *vertex))
            .fold(f64::INFINITY, f64::min)
    }

    /// Whether `point` lies inside a polygon's outer ring. Always `false`
    /// for points and lines.
    pub fn contains(&self, point: Coordinate) -> bool {
        match self {
            Self::Polygon(ring) => point_in_polygon(point, ring),
            Self::Point(_) | Self::LineString(_) => false,
        }
    }

    /// A single coordinate standing in for the whole geometry.
    ///
    /// Lines and polygons use their planar centroid in degree space, falling
    /// back to the first vertex when the centroid is undefined.
    pub fn representative(&self) -> Coordinate {
        let centroid = match self {
            Self::Point(point) => return *point,
            Self::LineString(line) => to_line_string(line).centroid(),
            Self::Polygon(ring) => Polygon::new(to_line_string(ring), Vec::new()).centroid(),
        };
        centroid
            .map(|point| Coordinate::from(point.0))
            .filter(Coordinate::is_valid)
            .or_else(|| self.vertices().first().copied())
            .unwrap_or(Coordinate::new(f64::NAN, f64::NAN))
    }
}

fn to_line_string(points: &[Coordinate]) -> LineString<f64> {
    points.iter().map(|point| point.to_geo()).collect()
}

/// A map feature with display metadata.
///
/// # Examples
/// ```
/// use std::collections::HashMap;
/// use haulway_core::{Coordinate, Feature, FeatureGeometry};
///
/// let geometry = FeatureGeometry::point(Coordinate::new(55.0, 37.0))?;
/// let frame = Feature::new("frame-1", geometry, HashMap::new());
/// assert_eq!(frame.id.as_str(), "frame-1");
/// # Ok::<(), haulway_core::FeatureError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Identifier, unique within a collection.
    pub id: FeatureId,
    /// Validated geometry.
    pub geometry: FeatureGeometry,
    /// Opaque key/value metadata used only for display.
    pub tags: HashMap<String, String>,
}

impl Feature {
    /// Construct a feature.
    pub fn new(
        id: impl Into<FeatureId>,
        geometry: FeatureGeometry,
        tags: HashMap<String, String>,
    ) -> Self {
        Self {
            id: id.into(),
            geometry,
            tags,
        }
    }
}

/// A set of features, unique by id.
///
/// Features are reference-counted so indexes and derived results can share
/// them without copying. The collection is immutable once built apart from
/// [`FeatureCollection::insert`].
#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    features: Vec<Arc<Feature>>,
    ids: HashSet<FeatureId>,
}

impl FeatureCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a feature, rejecting duplicate ids.
    pub fn insert(&mut self, feature: Feature) -> Result<(), FeatureError> {
        if self.ids.contains(&feature.id) {
            return Err(FeatureError::DuplicateId(feature.id));
        }
        self.ids.insert(feature.id.clone());
        self.features.push(Arc::new(feature));
        Ok(())
    }

    /// Build a collection, skipping features whose id was already seen.
    pub fn from_features<I>(features: I) -> Self
    where
        I: IntoIterator<Item = Feature>,
    {
        let mut collection = Self::new();
        for feature in features {
            if let Err(err) = collection.insert(feature) {
                log::warn!("Skipping feature: {err}");
            }
        }
        collection
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the collection has no features.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Whether a feature with `id` exists.
    pub fn contains(&self, id: &FeatureId) -> bool {
        self.ids.contains(id)
    }

    /// Iterate over the features.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Feature>> {
        self.features.iter()
    }

    /// Count features per geometry kind.
    pub fn kind_counts(&self) -> std::collections::BTreeMap<GeometryKind, usize> {
        let mut counts = std::collections::BTreeMap::new();
        for feature in &self.features {
            *counts.entry(feature.geometry.kind()).or_insert(0) += 1;
        }
        counts
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<T: IntoIterator<Item = Feature>>(iter: T) -> Self {
        Self::from_features(iter)
    }
}
