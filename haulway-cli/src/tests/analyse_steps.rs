//! Behaviour-driven step definitions driving the analyse CLI scenarios.

use super::helpers::{eastbound_route, frames_layer, write_layer, write_utf8, zone_layer};
use super::*;
use crate::analyse::{AnalyseConfig, AnalyseRouterBuilder, AnalysisReport, run_analyse_with};
use camino::Utf8PathBuf;
use haulway_core::test_support::StubRouter;
use haulway_core::{BypassKind, FeatureId, Layer, Router};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;
use tempfile::TempDir;

#[derive(Debug)]
struct AnalyseWorld {
    _tmp: TempDir,
    route_path: Utf8PathBuf,
    layers_dir: Utf8PathBuf,
    cli_args: RefCell<Vec<String>>,
    stdout: RefCell<Vec<u8>>,
    result: RefCell<Option<Result<(), CliError>>>,
}

impl AnalyseWorld {
    fn new() -> Self {
        let tmp = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
        let layers_dir = root.join("layers");
        std::fs::create_dir_all(&layers_dir).expect("layers directory");
        Self {
            route_path: root.join("route.geojson"),
            layers_dir,
            _tmp: tmp,
            cli_args: RefCell::new(Vec::new()),
            stdout: RefCell::new(Vec::new()),
            result: RefCell::new(None),
        }
    }

    fn build_command_line(&self) -> Vec<String> {
        let mut argv = vec![
            "haulway".to_owned(),
            "analyse".to_owned(),
            format!("--{ARG_ROUTE}"),
            self.route_path.as_str().to_owned(),
            format!("--{ARG_LAYERS_DIR}"),
            self.layers_dir.as_str().to_owned(),
        ];
        argv.extend(self.cli_args.borrow().iter().cloned());
        argv
    }

    fn push_args(&self, args: &[&str]) {
        self.cli_args
            .borrow_mut()
            .extend(args.iter().map(|arg| (*arg).to_owned()));
    }

    fn report(&self) -> AnalysisReport {
        let borrowed = self.result.borrow();
        let result = borrowed.as_ref().expect("result recorded");
        if let Err(err) = result {
            panic!("expected success, found {err:?}");
        }
        let stdout = String::from_utf8(self.stdout.borrow().clone()).expect("stdout utf-8");
        serde_json::from_str(&stdout).expect("output should be a JSON report")
    }

    fn error(&self) -> std::cell::Ref<'_, CliError> {
        std::cell::Ref::map(self.result.borrow(), |result| {
            result
                .as_ref()
                .expect("result recorded")
                .as_ref()
                .expect_err("expected error")
        })
    }
}

#[fixture]
fn world() -> AnalyseWorld {
    AnalyseWorld::new()
}

/// Routes detours in a straight line whenever `--bypass` is set.
struct StubRouterBuilder;

impl AnalyseRouterBuilder for StubRouterBuilder {
    fn build(&self, config: &AnalyseConfig) -> Result<Option<Box<dyn Router>>, CliError> {
        Ok(config
            .bypass
            .then(|| Box::new(StubRouter::straight_line()) as Box<dyn Router>))
    }
}

#[given("a route file running east along latitude 55")]
fn route_file(#[from(world)] world: &AnalyseWorld) {
    let payload = serde_json::to_vec_pretty(&eastbound_route()).expect("serialize route");
    write_utf8(&world.route_path, &payload);
}

#[given("a frames layer with one frame beside the route and one far away")]
fn frames_beside_route(#[from(world)] world: &AnalyseWorld) {
    write_layer(&world.layers_dir, Layer::Frames, &frames_layer());
}

#[given("an allowed zone covering the route")]
fn allowed_zone_covering(#[from(world)] world: &AnalyseWorld) {
    write_layer(
        &world.layers_dir,
        Layer::HgvAllowed,
        &zone_layer(54.9, 36.9, 55.1, 37.1),
    );
}

#[given("an allowed zone far from the route")]
fn allowed_zone_far(#[from(world)] world: &AnalyseWorld) {
    write_layer(
        &world.layers_dir,
        Layer::HgvAllowed,
        &zone_layer(56.0, 38.0, 56.2, 38.2),
    );
}

#[given("I select the heavy truck profile")]
fn heavy_profile(#[from(world)] world: &AnalyseWorld) {
    world.push_args(&["--profile", "truckHeavy"]);
}

#[given("I select the tractor profile")]
fn unknown_profile(#[from(world)] world: &AnalyseWorld) {
    world.push_args(&["--profile", "tractor"]);
}

#[given("I request bypasses from a router")]
fn request_bypasses(#[from(world)] world: &AnalyseWorld) {
    world.push_args(&["--router-url", "http://localhost:5000", "--bypass"]);
}

#[when("I run the analyse command")]
fn run_analyse_command(#[from(world)] world: &AnalyseWorld) {
    let invocation = world.build_command_line();
    let parsed = Cli::try_parse_from(invocation).map_err(CliError::from);
    let outcome = parsed.and_then(|cli| match cli.command {
        Command::Analyse(args) => {
            let mut buffer = world.stdout.borrow_mut();
            run_analyse_with(args, &StubRouterBuilder, &mut *buffer)
        }
    });
    world.result.replace(Some(outcome));
}

#[then("the report lists only the nearby frame in the frames corridor")]
fn nearby_frame_listed(#[from(world)] world: &AnalyseWorld) {
    let report = world.report();
    let frames = report.corridor.get(&Layer::Frames).expect("frames corridor");
    assert_eq!(frames, &vec![FeatureId::new("frame-1")]);
}

#[then("the report has no restricted samples")]
fn no_restricted_samples(#[from(world)] world: &AnalyseWorld) {
    let report = world.report();
    assert!(report.restrictions.is_clear(), "{}", report.restrictions);
    assert!(report.restrictions.samples_taken > 0);
}

#[then("every route sample is reported as restricted")]
fn every_sample_restricted(#[from(world)] world: &AnalyseWorld) {
    let report = world.report();
    assert_eq!(report.restrictions.samples_taken, 21);
    assert_eq!(report.restrictions.violations.len(), 21);
}

#[then("the report contains a bypass around the nearby frame")]
fn bypass_around_frame(#[from(world)] world: &AnalyseWorld) {
    let report = world.report();
    assert_eq!(report.bypasses.len(), 1, "{:?}", report.bypasses);
    assert_eq!(
        report.bypasses[0].kind,
        BypassKind::Corridor {
            feature_id: FeatureId::new("frame-1"),
        }
    );
}

#[then("the report contains no bypasses")]
fn no_bypasses(#[from(world)] world: &AnalyseWorld) {
    assert!(world.report().bypasses.is_empty());
}

#[then("the report notes that the missing layers are unavailable")]
fn missing_layers_noted(#[from(world)] world: &AnalyseWorld) {
    let report = world.report();
    assert_eq!(report.layers_loaded, vec![Layer::Frames]);
    assert!(
        report
            .notices
            .iter()
            .any(|notice| notice == "layer hgvAllowed is unavailable"),
        "notices: {:?}",
        report.notices
    );
}

#[then("the command fails because the route file is missing")]
fn fails_missing_route(#[from(world)] world: &AnalyseWorld) {
    match &*world.error() {
        CliError::MissingSourceFile { field, .. } => assert_eq!(*field, ARG_ROUTE),
        other => panic!("expected MissingSourceFile, found {other:?}"),
    }
}

#[then("the command fails because the profile is unknown")]
fn fails_unknown_profile(#[from(world)] world: &AnalyseWorld) {
    let error = world.error();
    assert!(
        matches!(&*error, CliError::InvalidProfile(_)),
        "expected InvalidProfile, found {error:?}"
    );
}

macro_rules! register_analyse_scenario {
    ($fn_name:ident, $scenario_title:literal) => {
        #[scenario(path = "tests/features/analyse_command.feature", name = $scenario_title)]
        fn $fn_name(world: AnalyseWorld) {
            let _ = world;
        }
    };
}

register_analyse_scenario!(
    reports_corridor_frames,
    "Frames beside the route are reported"
);
register_analyse_scenario!(
    reports_restricted_samples,
    "Heavy trucks outside allowed zones are restricted"
);
register_analyse_scenario!(reports_bypasses, "Bypasses are routed on request");
register_analyse_scenario!(
    skips_bypasses_by_default,
    "Bypasses are not routed by default"
);
register_analyse_scenario!(
    notes_missing_layers,
    "Missing layers are noted without failing"
);
register_analyse_scenario!(
    rejects_missing_route,
    "A missing route file fails the command"
);
register_analyse_scenario!(rejects_unknown_profile, "An unknown profile fails the command");
