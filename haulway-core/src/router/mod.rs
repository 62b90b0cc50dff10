//! Contract with the external routing service.
//!
//! The [`Router`] trait abstracts geocoding and route building. The engine
//! never computes paths itself; it prepares waypoint lists and hands them to
//! a router, keeping only the geometry, distance and duration it returns.
//!
//! Errors are typed per call so the controller can decide how to surface
//! them: a failed primary build is reported, a failed bypass build is simply
//! omitted.

mod error;
mod provider;

pub use error::{GeocodeError, RouteBuildError};
pub use provider::{DEFAULT_ALTERNATIVES, RouteBuild, RouteOptions, Router, VehicleDimensions};
