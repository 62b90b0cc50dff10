//! Corridor analysis and restriction engine.
//!
//! Given a route polyline and restriction layers, the engine answers three
//! questions:
//!
//! - which features of a layer lie within the corridor of the route
//!   ([`CorridorFilter`]);
//! - which route samples fall outside the zones a vehicle profile may use
//!   ([`RestrictionChecker`]);
//! - which detours route around nearby frames or restricted samples
//!   ([`bypass`]).
//!
//! [`CorridorEngine`] ties the stages to the current route build and drops
//! results that belong to superseded builds. Routing and layer loading are
//! delegated to the [`Router`] and [`FeatureSource`] traits.

pub mod bypass;
mod cache;
mod coordinate;
mod corridor;
mod engine;
mod feature;
mod generation;
pub mod geomath;
mod index;
mod layer;
mod profile;
pub mod restriction;
mod router;
mod source;

#[cfg(any(test, feature = "test-support"))]
#[doc(hidden)]
pub mod test_support;

pub use bypass::{
    BypassCandidate, BypassFailure, BypassJob, BypassKind, BypassOutcome, BypassPlan,
    BypassSynthesizer,
};
pub use cache::LayerCache;
pub use coordinate::{Coordinate, CoordinateError, Polyline, sanitize_polyline};
pub use corridor::{CORRIDOR_BUFFER_M, CorridorFilter, CorridorResult};
pub use engine::{BuildState, CorridorEngine, FailureCategory};
pub use feature::{
    Feature, FeatureCollection, FeatureError, FeatureGeometry, FeatureId, GeometryKind,
};
pub use generation::{BuildTicket, GenerationCounter, StaleResult};
pub use index::FeatureIndex;
pub use layer::{Layer, LayerParseError};
pub use profile::{
    HEAVY_TRUCK_TOLERANCE_M, LIGHT_TRUCK_TOLERANCE_M, ProfileParseError, VehicleProfile,
};
pub use restriction::{MAX_SAMPLES, RestrictionChecker, RestrictionReport, Violation};
pub use router::{
    DEFAULT_ALTERNATIVES, GeocodeError, RouteBuild, RouteBuildError, RouteOptions, Router,
    VehicleDimensions,
};
pub use source::{FeatureSource, LayerLoadError};
