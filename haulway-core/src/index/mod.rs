//! Proximity queries over a feature collection.
//!
//! [`FeatureIndex`] answers the three questions the corridor, restriction and
//! bypass stages ask of a layer:
//!
//! - which features lie within a buffer of a route;
//! - whether a point is covered by any feature;
//! - which feature vertex is nearest to a point.
//!
//! An R\*-tree over feature bounding boxes prunes candidates before the exact
//! distance test, so results match an exhaustive scan.

mod envelope;

use std::collections::BTreeSet;
use std::sync::Arc;

use rstar::{AABB, RTree};

use crate::geomath::distance;
use crate::{Coordinate, Feature, FeatureCollection, FeatureId};

use envelope::{IndexedFeature, bounds, widened};

/// Read-only spatial index over a [`FeatureCollection`].
///
/// The index shares the collection's features and never mutates them.
///
/// # Examples
/// ```
/// use std::collections::HashMap;
/// use haulway_core::{Coordinate, Feature, FeatureCollection, FeatureGeometry, FeatureIndex};
///
/// let frame = Feature::new(
///     "frame-1",
///     FeatureGeometry::point(Coordinate::new(55.05, 37.05))?,
///     HashMap::new(),
/// );
/// let index = FeatureIndex::new(&FeatureCollection::from_features([frame]));
/// let route = [Coordinate::new(55.0, 37.0), Coordinate::new(55.1, 37.1)];
///
/// let ids = index.features_within_buffer(&route, 100.0);
/// assert_eq!(ids.len(), 1);
/// # Ok::<(), haulway_core::FeatureError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct FeatureIndex {
    features: Vec<Arc<Feature>>,
    tree: RTree<IndexedFeature>,
}

impl FeatureIndex {
    /// Index every feature of `collection`.
    pub fn new(collection: &FeatureCollection) -> Self {
        let features: Vec<Arc<Feature>> = collection.iter().cloned().collect();
        let entries = features
            .iter()
            .enumerate()
            .filter_map(|(slot, feature)| IndexedFeature::new(slot, feature.geometry.vertices()))
            .collect();
        Self {
            features,
            tree: RTree::bulk_load(entries),
        }
    }

    /// An index with no features.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of indexed features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the index holds no features.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// All indexed features in collection order.
    pub fn features(&self) -> &[Arc<Feature>] {
        &self.features
    }

    /// Features whose representative distance to `route` is at most
    /// `buffer_m`, ordered by id.
    ///
    /// See [`FeatureGeometry::distance_to_route`](crate::FeatureGeometry::distance_to_route)
    /// for the per-geometry rule. Routes with fewer than two points match
    /// nothing.
    pub fn within_buffer(&self, route: &[Coordinate], buffer_m: f64) -> Vec<Arc<Feature>> {
        if route.len() < 2 {
            return Vec::new();
        }
        let Some(route_bounds) = bounds(route) else {
            return Vec::new();
        };
        let mut matched: Vec<Arc<Feature>> = self
            .candidates(widened(route_bounds, buffer_m))
            .filter(|feature| feature.geometry.distance_to_route(route, buffer_m) <= buffer_m)
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.id.cmp(&b.id));
        matched
    }

    /// Identifiers of the features within `buffer_m` of `route`.
    pub fn features_within_buffer(
        &self,
        route: &[Coordinate],
        buffer_m: f64,
    ) -> BTreeSet<FeatureId> {
        self.within_buffer(route, buffer_m)
            .into_iter()
            .map(|feature| feature.id.clone())
            .collect()
    }

    /// Whether `point` is inside any polygon or within `tolerance_m` of any
    /// feature.
    ///
    /// Distances follow the same per-geometry rule as
    /// [`within_buffer`](Self::within_buffer): lines and polygons count from
    /// their vertices. Polygon containment wins regardless of that distance.
    pub fn is_point_covered(&self, point: Coordinate, tolerance_m: f64) -> bool {
        if !point.is_finite() {
            return false;
        }
        let query =
            bounds(std::slice::from_ref(&point)).and_then(|rect| widened(rect, tolerance_m));
        self.candidates(query).any(|feature| {
            feature.geometry.contains(point)
                || feature.geometry.distance_to_point(point) <= tolerance_m
        })
    }

    /// The feature vertex closest to `point` by great-circle distance.
    ///
    /// This scans vertices only; the true nearest point may lie on a segment
    /// between two vertices. Returns `None` for an empty index.
    pub fn nearest_covered_point(&self, point: Coordinate) -> Option<Coordinate> {
        self.features
            .iter()
            .flat_map(|feature| feature.geometry.vertices().iter().copied())
            .map(|vertex| (distance(point, vertex), vertex))
            .filter(|(dist, _)| !dist.is_nan())
            .fold(None, |best: Option<(f64, Coordinate)>, candidate| match best {
                Some(current) if current.0 <= candidate.0 => Some(current),
                _ => Some(candidate),
            })
            .map(|(_, vertex)| vertex)
    }

    /// Features whose envelope intersects `query`, or every feature when no
    /// query envelope could be built.
    fn candidates(
        &self,
        query: Option<AABB<[f64; 2]>>,
    ) -> Box<dyn Iterator<Item = &Arc<Feature>> + '_> {
        match query {
            Some(envelope) => {
                let mut slots: Vec<usize> = self
                    .tree
                    .locate_in_envelope_intersecting(&envelope)
                    .map(|entry| entry.slot)
                    .collect();
                slots.sort_unstable();
                Box::new(slots.into_iter().filter_map(|slot| self.features.get(slot)))
            }
            None => Box::new(self.features.iter()),
        }
    }
}

impl From<&FeatureCollection> for FeatureIndex {
    fn from(collection: &FeatureCollection) -> Self {
        Self::new(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FeatureGeometry;
    use crate::test_support::{bbox_ring, line_feature, point_feature, polygon_feature};
    use proptest::prelude::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn route() -> Vec<Coordinate> {
        vec![Coordinate::new(55.0, 37.0), Coordinate::new(55.1, 37.1)]
    }

    #[rstest]
    fn on_path_frame_is_within_buffer(route: Vec<Coordinate>) {
        let index = FeatureIndex::new(&FeatureCollection::from_features([point_feature(
            "frame-1", 55.05, 37.05,
        )]));
        let ids = index.features_within_buffer(&route, 100.0);
        assert!(ids.contains(&FeatureId::from("frame-1")));
    }

    #[rstest]
    fn distant_frame_is_excluded(route: Vec<Coordinate>) {
        let index = FeatureIndex::new(&FeatureCollection::from_features([point_feature(
            "frame-1", 55.5, 38.5,
        )]));
        assert!(index.features_within_buffer(&route, 100.0).is_empty());
    }

    #[rstest]
    fn zero_buffer_keeps_a_feature_on_a_vertex(route: Vec<Coordinate>) {
        let index = FeatureIndex::new(&FeatureCollection::from_features([point_feature(
            "frame-1", 55.0, 37.0,
        )]));
        assert_eq!(index.features_within_buffer(&route, 0.0).len(), 1);
    }

    #[rstest]
    fn feature_one_kilometre_away_is_outside_a_hundred_metre_buffer(route: Vec<Coordinate>) {
        // Roughly 1 km north of the route's first vertex, beyond its start.
        let index = FeatureIndex::new(&FeatureCollection::from_features([point_feature(
            "frame-1", 54.991, 37.0,
        )]));
        assert!(index.features_within_buffer(&route, 100.0).is_empty());
        assert_eq!(index.features_within_buffer(&route, 1_100.0).len(), 1);
    }

    #[rstest]
    fn line_features_match_on_any_vertex(route: Vec<Coordinate>) {
        let index = FeatureIndex::new(&FeatureCollection::from_features([line_feature(
            "federal-1",
            &[(56.0, 39.0), (55.05, 37.05)],
        )]));
        assert_eq!(index.features_within_buffer(&route, 100.0).len(), 1);
    }

    #[rstest]
    fn short_routes_match_nothing() {
        let index = FeatureIndex::new(&FeatureCollection::from_features([point_feature(
            "frame-1", 55.0, 37.0,
        )]));
        assert!(
            index
                .features_within_buffer(&[Coordinate::new(55.0, 37.0)], 100.0)
                .is_empty()
        );
    }

    #[rstest]
    fn polygon_interior_counts_as_covered() {
        let index = FeatureIndex::new(&FeatureCollection::from_features([polygon_feature(
            "zone-1",
            &bbox_ring(55.0, 37.0, 55.2, 37.2),
        )]));
        assert!(index.is_point_covered(Coordinate::new(55.1, 37.1), 0.0));
        assert!(!index.is_point_covered(Coordinate::new(56.0, 38.0), 120.0));
    }

    #[rstest]
    fn line_coverage_is_measured_to_vertices() {
        let index = FeatureIndex::new(&FeatureCollection::from_features([line_feature(
            "road-1",
            &[(55.0, 37.0), (55.0, 37.1)],
        )]));
        // About 55 m north of the middle of the segment, 3.2 km from either end.
        let beside_middle = Coordinate::new(55.0005, 37.05);
        assert!(!index.is_point_covered(beside_middle, 120.0));
        // About 55 m north of the western vertex.
        let beside_vertex = Coordinate::new(55.0005, 37.0);
        assert!(index.is_point_covered(beside_vertex, 120.0));
        assert!(!index.is_point_covered(beside_vertex, 10.0));
    }

    #[rstest]
    fn polygon_edges_do_not_cover_outside_points_far_from_vertices() {
        let index = FeatureIndex::new(&FeatureCollection::from_features([polygon_feature(
            "zone-1",
            &bbox_ring(55.0, 37.0, 55.2, 37.2),
        )]));
        // Just south of the southern edge, midway along it.
        assert!(!index.is_point_covered(Coordinate::new(54.9995, 37.1), 150.0));
        // Just south of the south-west corner.
        assert!(index.is_point_covered(Coordinate::new(54.9995, 37.0), 150.0));
    }

    #[rstest]
    fn nearest_point_is_a_vertex() {
        let index = FeatureIndex::new(&FeatureCollection::from_features([
            line_feature("road-1", &[(55.0, 37.0), (55.0, 38.0)]),
            point_feature("p", 56.0, 37.0),
        ]));
        // The segment passes right by the probe, but only vertices qualify.
        let nearest = index
            .nearest_covered_point(Coordinate::new(55.01, 37.5))
            .expect("index is not empty");
        assert!(nearest == Coordinate::new(55.0, 37.0) || nearest == Coordinate::new(55.0, 38.0));
    }

    #[rstest]
    fn empty_index_has_no_nearest_point() {
        assert!(
            FeatureIndex::empty()
                .nearest_covered_point(Coordinate::new(0.0, 0.0))
                .is_none()
        );
    }

    #[rstest]
    fn index_leaves_the_collection_untouched() {
        let collection = FeatureCollection::from_features([point_feature("a", 55.0, 37.0)]);
        let index = FeatureIndex::new(&collection);
        let _ = index.features_within_buffer(
            &[Coordinate::new(55.0, 37.0), Coordinate::new(55.1, 37.1)],
            100.0,
        );
        assert_eq!(collection.len(), 1);
        assert_eq!(
            collection.iter().next().map(|f| &f.geometry),
            Some(&FeatureGeometry::Point(Coordinate::new(55.0, 37.0)))
        );
    }

    fn exhaustive(
        collection: &FeatureCollection,
        route: &[Coordinate],
        buffer: f64,
    ) -> BTreeSet<FeatureId> {
        collection
            .iter()
            .filter(|feature| feature.geometry.distance_to_route(route, buffer) <= buffer)
            .map(|feature| feature.id.clone())
            .collect()
    }

    proptest! {
        #[test]
        fn tree_pruning_matches_an_exhaustive_scan(
            origin_lat in -70.0_f64..70.0,
            origin_lon in -170.0_f64..170.0,
            offsets in proptest::collection::vec((-0.02_f64..0.02, -0.02_f64..0.02), 1..40),
            buffer in 0.0_f64..800.0,
        ) {
            let features = offsets.iter().enumerate().map(|(i, (dlat, dlon))| {
                point_feature(&format!("f-{i}"), origin_lat + dlat, origin_lon + dlon)
            });
            let collection = FeatureCollection::from_features(features);
            let index = FeatureIndex::new(&collection);
            let route = [
                Coordinate::new(origin_lat, origin_lon),
                Coordinate::new(origin_lat + 0.01, origin_lon + 0.01),
            ];
            prop_assert_eq!(
                index.features_within_buffer(&route, buffer),
                exhaustive(&collection, &route, buffer)
            );
        }
    }
}
