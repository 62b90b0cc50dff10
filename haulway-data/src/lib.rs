//! Data access for the Haulway corridor engine.
//!
//! Responsibilities:
//! - Decode published GeoJSON layers and route files into validated
//!   [`haulway_core::FeatureCollection`]s and polylines.
//! - Provide [`haulway_core::FeatureSource`] adapters for local directories
//!   and HTTP hosts.
//! - Provide a [`haulway_core::Router`] backed by OSRM and Nominatim.
//!
//! Boundaries:
//! - Do not encode corridor or restriction rules (live in `haulway-core`).
//! - Keep blocking I/O off async executors.
//!
//! Invariants:
//! - Malformed individual features are skipped with a warning; only a
//!   malformed document fails a load.
//! - No global mutable state.

pub mod geojson;
pub mod routing;
pub mod source;

pub use geojson::{GeoJsonError, parse_layer, parse_route};
pub use routing::{HttpRouter, HttpRouterConfig, RouterBuildError};
pub use source::{FsFeatureSource, HttpFeatureSource, HttpFeatureSourceConfig};
