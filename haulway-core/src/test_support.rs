//! In-memory collaborators and feature builders used by unit and behaviour
//! tests. Gated behind the `test-support` feature (and `cfg(test)`).
//!
//! Builders construct geometry variants directly and skip validation, so
//! tests can also exercise malformed input.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::geomath::distance;
use crate::{
    Coordinate, Feature, FeatureCollection, FeatureGeometry, FeatureSource, GeocodeError, Layer,
    LayerLoadError, RouteBuild, RouteBuildError, RouteOptions, Router,
};

/// Average speed used by [`StubRouter`] to derive durations, in m/s.
const STUB_SPEED_MPS: f64 = 20.0;

fn coordinates(pairs: &[(f64, f64)]) -> Vec<Coordinate> {
    pairs
        .iter()
        .map(|&(lat, lon)| Coordinate::new(lat, lon))
        .collect()
}

/// A point feature without tags.
pub fn point_feature(id: &str, lat: f64, lon: f64) -> Feature {
    Feature::new(
        id,
        FeatureGeometry::Point(Coordinate::new(lat, lon)),
        HashMap::new(),
    )
}

/// A line feature through `(lat, lon)` pairs.
pub fn line_feature(id: &str, vertices: &[(f64, f64)]) -> Feature {
    Feature::new(
        id,
        FeatureGeometry::LineString(coordinates(vertices)),
        HashMap::new(),
    )
}

/// A polygon feature with the given outer ring of `(lat, lon)` pairs.
pub fn polygon_feature(id: &str, ring: &[(f64, f64)]) -> Feature {
    Feature::new(id, FeatureGeometry::Polygon(coordinates(ring)), HashMap::new())
}

/// Open counter-clockwise ring around a bounding box.
pub fn bbox_ring(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Vec<(f64, f64)> {
    vec![
        (min_lat, min_lon),
        (min_lat, max_lon),
        (max_lat, max_lon),
        (max_lat, min_lon),
    ]
}

/// The two-point route `[55.0, 37.0] -> [55.1, 37.1]`.
pub fn straight_route() -> Vec<Coordinate> {
    vec![Coordinate::new(55.0, 37.0), Coordinate::new(55.1, 37.1)]
}

#[derive(Debug, Clone)]
enum StubRoutes {
    StraightLine,
    Fixed(RouteBuild),
    Failing(RouteBuildError),
}

/// Deterministic [`Router`] that records every build request.
///
/// By default the returned geometry is the waypoint list itself, with the
/// distance summed along it.
#[derive(Debug)]
pub struct StubRouter {
    routes: StubRoutes,
    failing_calls: HashSet<usize>,
    addresses: HashMap<String, Coordinate>,
    calls: Mutex<Vec<(Vec<Coordinate>, RouteOptions)>>,
}

impl StubRouter {
    fn with_routes(routes: StubRoutes) -> Self {
        Self {
            routes,
            failing_calls: HashSet::new(),
            addresses: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Route straight through the waypoints.
    pub fn straight_line() -> Self {
        Self::with_routes(StubRoutes::StraightLine)
    }

    /// Always return `route`.
    pub fn with_route(route: RouteBuild) -> Self {
        Self::with_routes(StubRoutes::Fixed(route))
    }

    /// Always fail with `error`.
    pub fn failing(error: RouteBuildError) -> Self {
        Self::with_routes(StubRoutes::Failing(error))
    }

    /// Fail the build calls with the given zero-based ordinals.
    #[must_use]
    pub fn failing_calls<I>(mut self, calls: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        self.failing_calls.extend(calls);
        self
    }

    /// Resolve `address` to `location`.
    #[must_use]
    pub fn with_address(mut self, address: &str, location: Coordinate) -> Self {
        self.addresses.insert(address.to_owned(), location);
        self
    }

    /// Waypoint lists received so far, in call order.
    pub fn calls(&self) -> Vec<Vec<Coordinate>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(waypoints, _)| waypoints.clone())
            .collect()
    }

    /// Options of the most recent build call.
    pub fn last_options(&self) -> Option<RouteOptions> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .map(|(_, options)| options.clone())
    }

    fn record(&self, waypoints: &[Coordinate], options: &RouteOptions) -> usize {
        let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        calls.push((waypoints.to_vec(), options.clone()));
        calls.len() - 1
    }
}

#[async_trait]
impl Router for StubRouter {
    async fn geocode(&self, address: &str) -> Result<Coordinate, GeocodeError> {
        self.addresses
            .get(address)
            .copied()
            .ok_or_else(|| GeocodeError::NoMatch {
                address: address.to_owned(),
            })
    }

    async fn build(
        &self,
        waypoints: &[Coordinate],
        options: &RouteOptions,
    ) -> Result<RouteBuild, RouteBuildError> {
        let call = self.record(waypoints, options);
        if waypoints.len() < 2 {
            return Err(RouteBuildError::TooFewWaypoints(waypoints.len()));
        }
        if self.failing_calls.contains(&call) {
            return Err(RouteBuildError::NoRoute {
                code: "NoRoute".to_owned(),
                message: format!("stub failure on call {call}"),
            });
        }
        match &self.routes {
            StubRoutes::StraightLine => {
                let distance_m: f64 = waypoints.windows(2).map(|w| distance(w[0], w[1])).sum();
                Ok(RouteBuild {
                    primary: waypoints.to_vec(),
                    alternatives: Vec::new(),
                    distance_m,
                    duration_s: distance_m / STUB_SPEED_MPS,
                })
            }
            StubRoutes::Fixed(route) => Ok(route.clone()),
            StubRoutes::Failing(error) => Err(error.clone()),
        }
    }
}

/// [`FeatureSource`] serving prebuilt collections.
#[derive(Debug, Default)]
pub struct MemoryFeatureSource {
    layers: HashMap<Layer, FeatureCollection>,
    loads: AtomicUsize,
}

impl MemoryFeatureSource {
    /// Serve `collection` for `layer`.
    #[must_use]
    pub fn with_layer(mut self, layer: Layer, collection: FeatureCollection) -> Self {
        self.layers.insert(layer, collection);
        self
    }

    /// Number of successful loads served.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl FeatureSource for MemoryFeatureSource {
    async fn load(&self, layer: Layer) -> Result<FeatureCollection, LayerLoadError> {
        let collection = self
            .layers
            .get(&layer)
            .cloned()
            .ok_or_else(|| LayerLoadError::NotFound {
                layer,
                tried: vec![format!("memory:{layer}")],
            })?;
        self.loads.fetch_add(1, Ordering::Relaxed);
        Ok(collection)
    }
}
