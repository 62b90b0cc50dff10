//! Focused unit tests covering analyse CLI configuration and inputs.

use super::helpers::{eastbound_route, write_utf8};
use crate::analyse::{
    AnalyseArgs, AnalyseConfig, AnalyseRouterBuilder, DefaultRouterBuilder, load_route,
};
use crate::{ARG_LAYERS_DIR, ARG_ROUTE, Cli, CliError, ENV_LAYERS_DIR, ENV_ROUTE};
use camino::Utf8PathBuf;
use clap::Parser;
use clap::error::ErrorKind;
use haulway_core::VehicleProfile;
use rstest::{fixture, rstest};
use tempfile::TempDir;

#[fixture]
fn workspace() -> (TempDir, Utf8PathBuf) {
    let tmp = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
    (tmp, root)
}

fn complete_args() -> AnalyseArgs {
    AnalyseArgs {
        route: Some(Utf8PathBuf::from("route.geojson")),
        layers_dir: Some(Utf8PathBuf::from("data")),
        ..AnalyseArgs::default()
    }
}

fn config_at(route: Utf8PathBuf, layers_dir: Utf8PathBuf) -> AnalyseConfig {
    AnalyseConfig {
        route,
        layers_dir,
        profile: VehicleProfile::TruckHeavy,
        router_url: None,
        bypass: false,
    }
}

#[rstest]
#[case(None, Some("data"), ARG_ROUTE, ENV_ROUTE)]
#[case(Some("route.geojson"), None, ARG_LAYERS_DIR, ENV_LAYERS_DIR)]
fn converting_without_required_fields_errors(
    #[case] route: Option<&str>,
    #[case] layers_dir: Option<&str>,
    #[case] field: &'static str,
    #[case] env_var: &'static str,
) {
    let args = AnalyseArgs {
        route: route.map(Utf8PathBuf::from),
        layers_dir: layers_dir.map(Utf8PathBuf::from),
        ..AnalyseArgs::default()
    };
    let err = AnalyseConfig::try_from(args).expect_err("missing field should error");
    match err {
        CliError::MissingArgument {
            field: missing,
            env,
        } => {
            assert_eq!(missing, field);
            assert_eq!(env, env_var);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn conversion_defaults_to_light_trucks_without_detours() {
    let config = AnalyseConfig::try_from(complete_args()).expect("config should build");
    assert_eq!(config.profile, VehicleProfile::TruckLight);
    assert!(!config.bypass);
    assert_eq!(config.router_url, None);
}

#[rstest]
#[case("auto", VehicleProfile::Auto)]
#[case("truckHeavy", VehicleProfile::TruckHeavy)]
fn conversion_parses_profiles(#[case] name: &str, #[case] expected: VehicleProfile) {
    let args = AnalyseArgs {
        profile: Some(name.to_owned()),
        ..complete_args()
    };
    let config = AnalyseConfig::try_from(args).expect("config should build");
    assert_eq!(config.profile, expected);
}

#[rstest]
fn conversion_rejects_unknown_profiles() {
    let args = AnalyseArgs {
        profile: Some("tractor".to_owned()),
        ..complete_args()
    };
    let err = AnalyseConfig::try_from(args).expect_err("unknown profile");
    assert!(matches!(err, CliError::InvalidProfile(_)), "found {err:?}");
}

#[rstest]
fn validate_sources_reports_missing_route(workspace: (TempDir, Utf8PathBuf)) {
    let (_tmp, root) = workspace;
    let config = config_at(root.join("missing.geojson"), root.clone());
    let err = config.validate_sources().expect_err("expected failure");
    match err {
        CliError::MissingSourceFile { field, .. } => assert_eq!(field, ARG_ROUTE),
        other => panic!("expected MissingSourceFile, found {other:?}"),
    }
}

#[rstest]
fn validate_sources_rejects_route_directories(workspace: (TempDir, Utf8PathBuf)) {
    let (_tmp, root) = workspace;
    let route = root.join("route.geojson");
    std::fs::create_dir(&route).expect("route directory");
    let err = config_at(route, root.clone())
        .validate_sources()
        .expect_err("expected failure");
    assert!(
        matches!(err, CliError::SourcePathNotFile { .. }),
        "found {err:?}"
    );
}

#[rstest]
fn validate_sources_requires_a_layers_directory(workspace: (TempDir, Utf8PathBuf)) {
    let (_tmp, root) = workspace;
    let route = root.join("route.geojson");
    write_utf8(&route, b"{}");
    let err = config_at(route, root.join("no-such-dir"))
        .validate_sources()
        .expect_err("expected failure");
    assert!(
        matches!(err, CliError::LayersDirNotDirectory { .. }),
        "found {err:?}"
    );
}

#[rstest]
fn load_route_reads_feature_lines(workspace: (TempDir, Utf8PathBuf)) {
    let (_tmp, root) = workspace;
    let path = root.join("route.geojson");
    let payload = serde_json::to_vec(&eastbound_route()).expect("serialize route");
    write_utf8(&path, &payload);

    let route = load_route(&path).expect("route should load");
    assert_eq!(route.len(), 21);
}

#[rstest]
fn load_route_reports_unusable_documents(workspace: (TempDir, Utf8PathBuf)) {
    let (_tmp, root) = workspace;
    let path = root.join("route.geojson");
    write_utf8(&path, br#"{"type": "Point", "coordinates": [37.0, 55.0]}"#);

    let err = load_route(&path).expect_err("a point is not a route");
    assert!(matches!(err, CliError::ParseRoute { .. }), "found {err:?}");
}

#[rstest]
#[case(false, Some("http://localhost:5000"), false)]
#[case(true, None, false)]
#[case(true, Some("http://localhost:5000"), true)]
fn default_router_builder_needs_flag_and_url(
    #[case] bypass: bool,
    #[case] router_url: Option<&str>,
    #[case] expect_router: bool,
) {
    let config = AnalyseConfig {
        router_url: router_url.map(str::to_owned),
        bypass,
        ..config_at(Utf8PathBuf::from("route.geojson"), Utf8PathBuf::from("data"))
    };
    let router = DefaultRouterBuilder
        .build(&config)
        .expect("router construction should succeed");
    assert_eq!(router.is_some(), expect_router);
}

#[rstest]
fn analyse_rejects_a_geocoder_url() {
    let parsed = Cli::try_parse_from([
        "haulway",
        "analyse",
        "--route",
        "route.geojson",
        "--geocoder-url",
        "http://geo.example.com",
    ]);
    let err = parsed.expect_err("analyse never geocodes");
    assert_eq!(err.kind(), ErrorKind::UnknownArgument);
}

#[rstest]
fn analyse_accepts_its_documented_flags() {
    let parsed = Cli::try_parse_from([
        "haulway",
        "analyse",
        "--route",
        "route.geojson",
        "--layers-dir",
        "data",
        "--router-url",
        "http://localhost:5000",
        "--bypass",
    ]);
    assert!(parsed.is_ok(), "found {parsed:?}");
}
