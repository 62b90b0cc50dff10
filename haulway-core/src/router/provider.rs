//! Router trait, request options and the route it returns.

use async_trait::async_trait;

use crate::{Coordinate, Polyline, VehicleProfile};

use super::error::{GeocodeError, RouteBuildError};

/// Number of alternatives requested for a primary route build.
pub const DEFAULT_ALTERNATIVES: u8 = 3;

/// Vehicle dimensions in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleDimensions {
    /// Height in metres.
    pub height_m: f64,
    /// Width in metres.
    pub width_m: f64,
    /// Length in metres.
    pub length_m: f64,
}

/// Constraints passed to [`Router::build`].
///
/// # Examples
/// ```
/// use haulway_core::{RouteOptions, VehicleProfile};
///
/// let options = RouteOptions::for_profile(VehicleProfile::TruckHeavy).with_alternatives(1);
/// assert_eq!(options.weight_kg, Some(60_000));
/// assert_eq!(options.alternatives, 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteOptions {
    /// Vehicle class being routed.
    pub profile: VehicleProfile,
    /// Gross weight in kilograms.
    pub weight_kg: Option<u32>,
    /// Number of axles.
    pub axle_count: Option<u8>,
    /// Outer dimensions.
    pub dimensions: Option<VehicleDimensions>,
    /// How many alternative routes to request besides the primary one.
    pub alternatives: u8,
}

impl RouteOptions {
    /// Preset constraints for a vehicle profile.
    ///
    /// Cars carry no constraints. Light trucks default to 40 t on four axles
    /// at 4.0 × 2.55 × 16 m; heavy trucks to 60 t on five axles at
    /// 4.5 × 2.6 × 20 m.
    pub fn for_profile(profile: VehicleProfile) -> Self {
        let (weight_kg, axle_count, dimensions) = match profile {
            VehicleProfile::Auto => (None, None, None),
            VehicleProfile::TruckLight => (
                Some(40_000),
                Some(4),
                Some(VehicleDimensions {
                    height_m: 4.0,
                    width_m: 2.55,
                    length_m: 16.0,
                }),
            ),
            VehicleProfile::TruckHeavy => (
                Some(60_000),
                Some(5),
                Some(VehicleDimensions {
                    height_m: 4.5,
                    width_m: 2.6,
                    length_m: 20.0,
                }),
            ),
        };
        Self {
            profile,
            weight_kg,
            axle_count,
            dimensions,
            alternatives: DEFAULT_ALTERNATIVES,
        }
    }

    /// Set the number of alternatives.
    #[must_use]
    pub fn with_alternatives(mut self, alternatives: u8) -> Self {
        self.alternatives = alternatives;
        self
    }

    /// Override the vehicle weight.
    #[must_use]
    pub fn with_weight_kg(mut self, weight_kg: u32) -> Self {
        self.weight_kg = Some(weight_kg);
        self
    }
}

/// A route computed by the external router.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteBuild {
    /// Geometry of the recommended route.
    pub primary: Polyline,
    /// Geometries of alternative routes, best first.
    pub alternatives: Vec<Polyline>,
    /// Length of the primary route in metres.
    pub distance_m: f64,
    /// Travel time of the primary route in seconds.
    pub duration_s: f64,
}

/// External routing and geocoding collaborator.
///
/// Path-finding is not part of the engine: every route geometry comes from
/// an implementation of this trait. Calls are the engine's suspension points,
/// so implementations should not block the executor.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use haulway_core::{
///     Coordinate, GeocodeError, RouteBuild, RouteBuildError, RouteOptions, Router,
/// };
///
/// struct StraightLine;
///
/// #[async_trait]
/// impl Router for StraightLine {
///     async fn geocode(&self, address: &str) -> Result<Coordinate, GeocodeError> {
///         Err(GeocodeError::NoMatch { address: address.to_owned() })
///     }
///
///     async fn build(
///         &self,
///         waypoints: &[Coordinate],
///         _options: &RouteOptions,
///     ) -> Result<RouteBuild, RouteBuildError> {
///         if waypoints.len() < 2 {
///             return Err(RouteBuildError::TooFewWaypoints(waypoints.len()));
///         }
///         Ok(RouteBuild {
///             primary: waypoints.to_vec(),
///             alternatives: Vec::new(),
///             distance_m: 0.0,
///             duration_s: 0.0,
///         })
///     }
/// }
/// ```
#[async_trait]
pub trait Router: Send + Sync {
    /// Resolve a free-form address to a coordinate.
    async fn geocode(&self, address: &str) -> Result<Coordinate, GeocodeError>;

    /// Compute a route through `waypoints` in order.
    ///
    /// Implementations must return `Err(RouteBuildError::TooFewWaypoints)`
    /// when fewer than two waypoints are supplied.
    async fn build(
        &self,
        waypoints: &[Coordinate],
        options: &RouteOptions,
    ) -> Result<RouteBuild, RouteBuildError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StubRouter;
    use rstest::rstest;

    #[rstest]
    fn cars_carry_no_constraints() {
        let options = RouteOptions::for_profile(VehicleProfile::Auto);
        assert!(options.weight_kg.is_none());
        assert!(options.dimensions.is_none());
        assert_eq!(options.alternatives, DEFAULT_ALTERNATIVES);
    }

    #[rstest]
    fn light_truck_preset() {
        let options = RouteOptions::for_profile(VehicleProfile::TruckLight);
        assert_eq!(options.weight_kg, Some(40_000));
        assert_eq!(options.axle_count, Some(4));
    }

    #[tokio::test]
    async fn stub_router_rejects_single_waypoint() {
        let router = StubRouter::straight_line();
        let err = router
            .build(
                &[Coordinate::new(55.0, 37.0)],
                &RouteOptions::for_profile(VehicleProfile::TruckLight),
            )
            .await
            .expect_err("one waypoint is not a route");
        assert_eq!(err, RouteBuildError::TooFewWaypoints(1));
    }

    #[tokio::test]
    async fn stub_router_connects_waypoints() {
        let router = StubRouter::straight_line();
        let waypoints = [Coordinate::new(55.0, 37.0), Coordinate::new(55.1, 37.1)];
        let route = router
            .build(&waypoints, &RouteOptions::for_profile(VehicleProfile::TruckLight))
            .await
            .expect("straight line");
        assert_eq!(route.primary, waypoints.to_vec());
        assert!(route.distance_m > 0.0);
    }
}
