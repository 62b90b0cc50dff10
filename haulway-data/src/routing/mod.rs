//! HTTP routing and geocoding.
//!
//! This module provides [`HttpRouter`], an implementation of
//! [`haulway_core::Router`] that builds routes with an OSRM server's Route
//! API and resolves addresses with a Nominatim instance.
//!
//! # Example
//!
//! ```no_run
//! use haulway_core::{Coordinate, RouteOptions, Router, VehicleProfile};
//! use haulway_data::routing::{HttpRouter, HttpRouterConfig};
//! use std::time::Duration;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HttpRouterConfig::new("http://localhost:5000")
//!     .with_timeout(Duration::from_secs(10))
//!     .with_user_agent("my-app/1.0");
//! let router = HttpRouter::with_config(config)?;
//!
//! let waypoints = [Coordinate::new(55.75, 37.61), Coordinate::new(55.80, 37.70)];
//! let options = RouteOptions::for_profile(VehicleProfile::TruckHeavy);
//! let route = router.build(&waypoints, &options).await?;
//! println!("{:.0} m", route.distance_m);
//! # Ok(())
//! # }
//! ```

mod nominatim;
mod osrm;
mod provider;

pub use provider::{
    DEFAULT_GEOCODER_URL, DEFAULT_USER_AGENT, HttpRouter, HttpRouterConfig, RouterBuildError,
};
