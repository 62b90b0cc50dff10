//! Visible subset of a layer along the active route.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::{Coordinate, Feature, FeatureId, FeatureIndex, VehicleProfile};

/// Width of the corridor around a route, in metres.
pub const CORRIDOR_BUFFER_M: f64 = 100.0;

/// Features of one layer that fall inside the corridor of a route.
///
/// Features are ordered by id. `generation` names the route build the result
/// was computed for; zero means "not tied to a build".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorridorResult {
    /// Build generation the result belongs to.
    pub generation: u64,
    features: Vec<Arc<Feature>>,
    ids: BTreeSet<FeatureId>,
}

impl CorridorResult {
    /// A result with no features.
    pub fn empty() -> Self {
        Self::default()
    }

    fn from_features(features: Vec<Arc<Feature>>) -> Self {
        let ids = features.iter().map(|feature| feature.id.clone()).collect();
        Self {
            generation: 0,
            features,
            ids,
        }
    }

    /// Tag the result with a build generation.
    #[must_use]
    pub fn for_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    /// Identifiers of the visible features.
    pub fn ids(&self) -> &BTreeSet<FeatureId> {
        &self.ids
    }

    /// Visible features, ordered by id.
    pub fn features(&self) -> &[Arc<Feature>] {
        &self.features
    }

    /// Number of visible features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether nothing is visible.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Whether `id` is visible.
    pub fn contains(&self, id: &FeatureId) -> bool {
        self.ids.contains(id)
    }

    /// Consume the result and return the id set.
    pub fn into_ids(self) -> BTreeSet<FeatureId> {
        self.ids
    }
}

/// Applies a [`FeatureIndex`] to the active route.
///
/// # Examples
/// ```
/// use std::collections::HashMap;
/// use haulway_core::{
///     Coordinate, CorridorFilter, Feature, FeatureCollection, FeatureGeometry, FeatureIndex,
///     VehicleProfile,
/// };
///
/// let frame = Feature::new(
///     "frame-1",
///     FeatureGeometry::point(Coordinate::new(55.05, 37.05))?,
///     HashMap::new(),
/// );
/// let index = FeatureIndex::new(&FeatureCollection::from_features([frame]));
/// let route = [Coordinate::new(55.0, 37.0), Coordinate::new(55.1, 37.1)];
///
/// let filter = CorridorFilter::default();
/// assert_eq!(filter.apply(Some(&route), VehicleProfile::TruckLight, &index).len(), 1);
/// assert!(filter.apply(Some(&route), VehicleProfile::Auto, &index).is_empty());
/// # Ok::<(), haulway_core::FeatureError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorridorFilter {
    buffer_m: f64,
}

impl Default for CorridorFilter {
    fn default() -> Self {
        Self {
            buffer_m: CORRIDOR_BUFFER_M,
        }
    }
}

impl CorridorFilter {
    /// Filter with a custom buffer width.
    pub fn with_buffer(buffer_m: f64) -> Self {
        Self { buffer_m }
    }

    /// Buffer width in metres.
    pub fn buffer_m(&self) -> f64 {
        self.buffer_m
    }

    /// Features of `index` inside the corridor of `route`.
    ///
    /// Exempt profiles, a missing route and routes with fewer than two
    /// points all produce an empty result.
    pub fn apply(
        &self,
        route: Option<&[Coordinate]>,
        profile: VehicleProfile,
        index: &FeatureIndex,
    ) -> CorridorResult {
        if profile.is_exempt() {
            return CorridorResult::empty();
        }
        match route {
            Some(route) if route.len() >= 2 => {
                CorridorResult::from_features(index.within_buffer(route, self.buffer_m))
            }
            _ => CorridorResult::empty(),
        }
    }
}
