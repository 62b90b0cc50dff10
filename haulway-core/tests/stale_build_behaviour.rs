//! Behavioural tests for discarding results of superseded builds.

use std::cell::RefCell;

use async_trait::async_trait;
use haulway_core::test_support::{StubRouter, point_feature};
use haulway_core::{
    BypassOutcome, Coordinate, CorridorEngine, FeatureCollection, GeocodeError, Layer,
    LayerCache, RouteBuild, RouteBuildError, RouteOptions, Router, StaleResult, VehicleProfile,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tokio::runtime::{Builder, Runtime};
use tokio::sync::Notify;

/// Router that holds each build until released.
struct GatedRouter {
    gate: Notify,
    inner: StubRouter,
}

#[async_trait]
impl Router for GatedRouter {
    async fn geocode(&self, address: &str) -> Result<Coordinate, GeocodeError> {
        self.inner.geocode(address).await
    }

    async fn build(
        &self,
        waypoints: &[Coordinate],
        options: &RouteOptions,
    ) -> Result<RouteBuild, RouteBuildError> {
        self.gate.notified().await;
        self.inner.build(waypoints, options).await
    }
}

struct StaleWorld {
    runtime: Runtime,
    engine: RefCell<CorridorEngine>,
    route: Vec<Coordinate>,
    result: RefCell<Option<Result<BypassOutcome, StaleResult>>>,
    applied: RefCell<bool>,
}

fn eastbound() -> Vec<Coordinate> {
    (0..=20)
        .map(|i| Coordinate::new(55.0, 37.0 + f64::from(i) * 0.001))
        .collect()
}

#[fixture]
fn world() -> StaleWorld {
    StaleWorld {
        runtime: Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("tokio runtime"),
        engine: RefCell::new(CorridorEngine::default()),
        route: eastbound(),
        result: RefCell::new(None),
        applied: RefCell::new(false),
    }
}

#[given("a ready build with a frame next to the route")]
fn given_ready_build(world: &StaleWorld) {
    let mut layers = LayerCache::new();
    layers.insert(
        Layer::Frames,
        &FeatureCollection::from_features([point_feature("frame-1", 55.0, 37.01)]),
    );
    let mut engine = CorridorEngine::new(layers);
    let ticket = engine.begin_build(
        vec![world.route[0], world.route[20]],
        VehicleProfile::TruckLight,
    );
    engine
        .complete_build(&ticket, world.route.clone())
        .expect("ticket is current");
    world.engine.replace(engine);
}

#[when("a new build starts while the first build's bypass is routing")]
fn when_superseded(world: &StaleWorld) {
    let router = GatedRouter {
        gate: Notify::new(),
        inner: StubRouter::straight_line(),
    };
    let mut engine = world.engine.borrow_mut();
    let job = engine.prepare_bypasses(&world.route, VehicleProfile::TruckLight);
    let ticket = job.ticket().clone();
    let result = world.runtime.block_on(async {
        let (result, _) = tokio::join!(job.run(&router), async {
            engine.begin_build(world.route.clone(), VehicleProfile::TruckLight);
            router.gate.notify_one();
        });
        result
    });
    let outcome = result.clone().unwrap_or_default();
    world.applied.replace(engine.apply_bypasses(&ticket, outcome));
    world.result.replace(Some(result));
}

#[when("the bypasses are routed without interruption")]
fn when_uninterrupted(world: &StaleWorld) {
    let router = StubRouter::straight_line();
    let mut engine = world.engine.borrow_mut();
    let plans = world.runtime.block_on(engine.compute_bypasses(
        &router,
        &world.route,
        VehicleProfile::TruckLight,
    ));
    world.applied.replace(!plans.is_empty());
}

#[then("the first build's bypass result is stale")]
fn then_stale(world: &StaleWorld) {
    let result = world.result.borrow();
    let stale = result
        .as_ref()
        .expect("bypass job ran")
        .as_ref()
        .expect_err("a newer build started");
    assert_eq!(stale.ticket, 1);
    assert_eq!(stale.current, 2);
}

#[then("no bypass plans are applied")]
fn then_nothing_applied(world: &StaleWorld) {
    assert!(!*world.applied.borrow());
    assert!(world.engine.borrow().bypasses().is_empty());
}

#[then("one bypass plan is applied")]
fn then_one_plan(world: &StaleWorld) {
    assert!(*world.applied.borrow());
    assert_eq!(world.engine.borrow().bypasses().len(), 1);
}

#[scenario(path = "tests/features/stale_build.feature", index = 0)]
fn superseded_bypass(world: StaleWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/stale_build.feature", index = 1)]
fn current_bypass(world: StaleWorld) {
    let _ = world;
}
