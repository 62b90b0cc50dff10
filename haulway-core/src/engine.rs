//! Per-build controller tying the stages together.
//!
//! [`CorridorEngine`] owns the layer cache, the generation counter and the
//! results derived for the current route. Every route build advances the
//! generation; derived results are tagged with the generation and route they
//! were computed for and are recomputed once either changes.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::bypass::{BypassJob, BypassOutcome, BypassPlan, BypassSynthesizer};
use crate::{
    BuildTicket, Coordinate, CorridorFilter, CorridorResult, FeatureId, FeatureIndex,
    FeatureSource, GenerationCounter, Layer, LayerCache, Polyline, RestrictionChecker,
    RestrictionReport, RouteBuildError, RouteOptions, Router, StaleResult, VehicleProfile,
    sanitize_polyline,
};

/// Phase of the current route build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildState {
    /// No build in progress.
    #[default]
    Idle,
    /// A route was requested from the router.
    RouteRequested,
    /// The route geometry is available.
    RouteReady,
    /// Corridor features are being selected.
    CorridorComputing,
    /// Route samples are being checked against zones.
    RestrictionChecking,
    /// Detours are being routed.
    BypassSynthesizing,
}

/// Kind of external failure reported to the user at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FailureCategory {
    /// A layer could not be loaded.
    LayerUnavailable(Layer),
    /// The primary route could not be built.
    RouteBuild,
    /// At least one detour could not be routed.
    Bypass,
}

impl std::fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LayerUnavailable(layer) => write!(f, "layer {layer} is unavailable"),
            Self::RouteBuild => f.write_str("route could not be built"),
            Self::Bypass => f.write_str("some bypasses could not be built"),
        }
    }
}

#[derive(Debug, Clone)]
struct Derived<T> {
    generation: u64,
    profile: VehicleProfile,
    route: Polyline,
    value: T,
}

impl<T> Derived<T> {
    fn matches(&self, generation: u64, profile: VehicleProfile, route: &[Coordinate]) -> bool {
        self.generation == generation && self.profile == profile && self.route == route
    }
}

/// Controller for route builds and the analyses derived from them.
///
/// # Examples
/// ```
/// use haulway_core::test_support::{point_feature, straight_route};
/// use haulway_core::{CorridorEngine, FeatureCollection, Layer, LayerCache, VehicleProfile};
///
/// let mut layers = LayerCache::new();
/// layers.insert(
///     Layer::Frames,
///     &FeatureCollection::from_features([point_feature("frame-1", 55.05, 37.05)]),
/// );
/// let mut engine = CorridorEngine::new(layers);
/// let route = straight_route();
/// let ticket = engine.begin_build(route.clone(), VehicleProfile::TruckLight);
/// engine.complete_build(&ticket, route.clone())?;
///
/// let ids = engine.compute_corridor(&route, Layer::Frames);
/// assert_eq!(ids.len(), 1);
/// # Ok::<(), haulway_core::StaleResult>(())
/// ```
#[derive(Debug, Default)]
pub struct CorridorEngine {
    layers: LayerCache,
    generations: GenerationCounter,
    state: BuildState,
    profile: VehicleProfile,
    waypoints: Vec<Coordinate>,
    route: Option<Polyline>,
    filter: CorridorFilter,
    checker: RestrictionChecker,
    synthesizer: BypassSynthesizer,
    corridors: HashMap<Layer, Derived<CorridorResult>>,
    restrictions: Option<Derived<RestrictionReport>>,
    bypasses: Vec<BypassPlan>,
    notices: BTreeSet<FailureCategory>,
}

impl CorridorEngine {
    /// Engine over an existing layer cache.
    pub fn new(layers: LayerCache) -> Self {
        Self {
            layers,
            ..Self::default()
        }
    }

    /// Replace the corridor filter.
    #[must_use]
    pub fn with_filter(mut self, filter: CorridorFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Replace the restriction checker.
    #[must_use]
    pub fn with_checker(mut self, checker: RestrictionChecker) -> Self {
        self.checker = checker;
        self
    }

    /// Layer cache backing the analyses.
    pub fn layers(&self) -> &LayerCache {
        &self.layers
    }

    /// Mutable access to the layer cache, for explicit invalidation.
    ///
    /// Derived results are dropped since they may refer to replaced layers.
    pub fn layers_mut(&mut self) -> &mut LayerCache {
        self.clear_derived();
        &mut self.layers
    }

    /// Current build phase.
    pub fn state(&self) -> BuildState {
        self.state
    }

    /// Current build generation.
    pub fn generation(&self) -> u64 {
        self.generations.current()
    }

    /// Ticket for the current build.
    pub fn ticket(&self) -> BuildTicket {
        self.generations.ticket()
    }

    /// Profile of the current build.
    pub fn profile(&self) -> VehicleProfile {
        self.profile
    }

    /// Waypoints of the current build.
    pub fn waypoints(&self) -> &[Coordinate] {
        &self.waypoints
    }

    /// Geometry of the current route, once ready.
    pub fn route(&self) -> Option<&[Coordinate]> {
        self.route.as_deref()
    }

    /// Detours applied for the current build.
    pub fn bypasses(&self) -> &[BypassPlan] {
        &self.bypasses
    }

    /// Failure categories reported since the last [`take_notices`](Self::take_notices).
    pub fn notices(&self) -> &BTreeSet<FailureCategory> {
        &self.notices
    }

    /// Drain the reported failure categories.
    pub fn take_notices(&mut self) -> BTreeSet<FailureCategory> {
        std::mem::take(&mut self.notices)
    }

    fn notify(&mut self, category: FailureCategory) {
        if self.notices.insert(category) {
            log::warn!("{category}");
        }
    }

    fn clear_derived(&mut self) {
        self.corridors.clear();
        self.restrictions = None;
        self.bypasses.clear();
    }

    /// Load `layer` from `source` unless cached.
    ///
    /// A failed load leaves the layer unavailable, in which case analyses
    /// treat it as empty.
    pub async fn ensure_layer<S>(&mut self, source: &S, layer: Layer) -> Option<Arc<FeatureIndex>>
    where
        S: FeatureSource + ?Sized,
    {
        let was_cached = self.layers.contains(layer);
        match self.layers.load(source, layer).await {
            Ok(index) => {
                if !was_cached {
                    self.clear_derived();
                }
                Some(index)
            }
            Err(err) => {
                log::debug!("{err}");
                self.notify(FailureCategory::LayerUnavailable(layer));
                None
            }
        }
    }

    /// Load every known layer from `source`, returning how many are
    /// available.
    pub async fn load_layers<S>(&mut self, source: &S) -> usize
    where
        S: FeatureSource + ?Sized,
    {
        let mut available = 0;
        for layer in Layer::ALL {
            if self.ensure_layer(source, layer).await.is_some() {
                available += 1;
            }
        }
        available
    }

    /// Start a new build, invalidating everything derived from the previous
    /// one.
    pub fn begin_build(
        &mut self,
        waypoints: Vec<Coordinate>,
        profile: VehicleProfile,
    ) -> BuildTicket {
        let ticket = self.generations.advance();
        log::debug!("Starting build generation {}", ticket.generation());
        self.state = BuildState::RouteRequested;
        self.profile = profile;
        self.waypoints = waypoints;
        self.route = None;
        self.clear_derived();
        ticket
    }

    /// Record the route geometry of the build identified by `ticket`.
    ///
    /// Invalid vertices are dropped.
    pub fn complete_build(
        &mut self,
        ticket: &BuildTicket,
        route: Polyline,
    ) -> Result<(), StaleResult> {
        ticket.ensure_current()?;
        self.route = Some(sanitize_polyline(route));
        self.state = BuildState::RouteReady;
        Ok(())
    }

    /// Build a route through `waypoints` with the router and make it
    /// current.
    pub async fn build_route<R>(
        &mut self,
        router: &R,
        waypoints: Vec<Coordinate>,
        profile: VehicleProfile,
    ) -> Result<BuildTicket, RouteBuildError>
    where
        R: Router + ?Sized,
    {
        let ticket = self.begin_build(waypoints, profile);
        let options = RouteOptions::for_profile(profile);
        match router.build(&self.waypoints, &options).await {
            Ok(build) => {
                if let Err(stale) = self.complete_build(&ticket, build.primary) {
                    log::debug!("Discarding route: {stale}");
                }
                Ok(ticket)
            }
            Err(err) => {
                self.state = BuildState::Idle;
                self.notify(FailureCategory::RouteBuild);
                Err(err)
            }
        }
    }

    /// Identifiers of `layer` features inside the corridor of `route`, for
    /// the current profile.
    pub fn compute_corridor(&mut self, route: &[Coordinate], layer: Layer) -> BTreeSet<FeatureId> {
        self.corridor(route, layer, self.profile).ids().clone()
    }

    fn corridor(
        &mut self,
        route: &[Coordinate],
        layer: Layer,
        profile: VehicleProfile,
    ) -> CorridorResult {
        let generation = self.generation();
        if let Some(cached) = self.corridors.get(&layer) {
            if cached.matches(generation, profile, route) {
                return cached.value.clone();
            }
        }
        self.state = BuildState::CorridorComputing;
        let index = self.layers.get_or_empty(layer);
        let result = self
            .filter
            .apply(Some(route), profile, &index)
            .for_generation(generation);
        log::debug!("Corridor of {layer}: {} features", result.len());
        self.corridors.insert(
            layer,
            Derived {
                generation,
                profile,
                route: route.to_vec(),
                value: result.clone(),
            },
        );
        result
    }

    /// Samples of `route` outside the zones permitted for `profile`.
    pub fn compute_restrictions(
        &mut self,
        route: &[Coordinate],
        profile: VehicleProfile,
    ) -> RestrictionReport {
        let generation = self.generation();
        if let Some(cached) = &self.restrictions {
            if cached.matches(generation, profile, route) {
                return cached.value.clone();
            }
        }
        self.state = BuildState::RestrictionChecking;
        let allowed = self.layers.get_or_empty(Layer::HgvAllowed);
        let conditional = self.layers.get_or_empty(Layer::HgvConditional);
        let report = self.checker.check(route, profile, &allowed, &conditional);
        log::debug!("{}", report.summary());
        self.restrictions = Some(Derived {
            generation,
            profile,
            route: route.to_vec(),
            value: report.clone(),
        });
        report
    }

    /// Prepare the detour candidates for `route` under the current build.
    ///
    /// Candidates cover the first corridor frames in id order, then the
    /// first restricted sample. The returned job owns everything it needs,
    /// so it can be driven while the engine starts a newer build.
    pub fn prepare_bypasses(&mut self, route: &[Coordinate], profile: VehicleProfile) -> BypassJob {
        let corridor = self.corridor(route, Layer::Frames, profile);
        let report = self.compute_restrictions(route, profile);
        self.state = BuildState::BypassSynthesizing;

        let waypoints = if self.waypoints.len() >= 2 {
            self.waypoints.clone()
        } else {
            route.first().into_iter().chain(route.last()).copied().collect()
        };
        let allowed = self.layers.get_or_empty(Layer::HgvAllowed);
        let synthesizer = &self.synthesizer;
        let frames = corridor.features();
        let mut candidates = synthesizer.corridor_candidates(&waypoints, route, frames);
        candidates.extend(synthesizer.restriction_candidate(&waypoints, &report, &allowed));
        BypassJob::new(self.ticket(), profile, candidates)
    }

    /// Store the detours routed for `ticket`.
    ///
    /// Returns `false`, leaving the engine untouched, when a newer build has
    /// started since the ticket was issued.
    pub fn apply_bypasses(&mut self, ticket: &BuildTicket, outcome: BypassOutcome) -> bool {
        if let Err(stale) = ticket.ensure_current() {
            log::debug!("Discarding bypasses: {stale}");
            return false;
        }
        if !outcome.failures.is_empty() {
            self.notify(FailureCategory::Bypass);
        }
        self.bypasses = outcome.plans;
        self.state = BuildState::Idle;
        true
    }

    /// Route detours for `route` and apply them to the current build.
    ///
    /// Detours the router cannot build are omitted. An empty list is also
    /// returned when the build went stale while routing.
    pub async fn compute_bypasses<R>(
        &mut self,
        router: &R,
        route: &[Coordinate],
        profile: VehicleProfile,
    ) -> Vec<BypassPlan>
    where
        R: Router + ?Sized,
    {
        let job = self.prepare_bypasses(route, profile);
        let ticket = job.ticket().clone();
        match job.run(router).await {
            Ok(outcome) => {
                if self.apply_bypasses(&ticket, outcome) {
                    self.bypasses.clone()
                } else {
                    Vec::new()
                }
            }
            Err(stale) => {
                log::debug!("Discarding bypasses: {stale}");
                Vec::new()
            }
        }
    }

    /// Return to [`BuildState::Idle`] without routing detours.
    pub fn finish(&mut self) {
        self.state = BuildState::Idle;
    }
}
