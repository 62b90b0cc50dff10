//! Facade crate for the Haulway corridor engine.
//!
//! This crate re-exports the core analysis types and, behind the `data`
//! feature, the GeoJSON, layer source and HTTP routing adapters.

#![forbid(unsafe_code)]

pub use haulway_core::{
    BuildState, BuildTicket, BypassKind, BypassPlan, CORRIDOR_BUFFER_M, Coordinate,
    CorridorEngine, CorridorFilter, CorridorResult, FailureCategory, Feature, FeatureCollection,
    FeatureGeometry, FeatureId, FeatureIndex, FeatureSource, GeocodeError, Layer, LayerCache,
    LayerLoadError, Polyline, RestrictionChecker, RestrictionReport, RouteBuild, RouteBuildError,
    RouteOptions, Router, StaleResult, VehicleProfile, Violation,
};

#[cfg(feature = "data")]
pub use haulway_data::{
    FsFeatureSource, GeoJsonError, HttpFeatureSource, HttpRouter, HttpRouterConfig, parse_layer,
    parse_route,
};
