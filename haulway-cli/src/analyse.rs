//! `analyse` command: corridor, restriction and bypass report for a route.

use std::collections::BTreeMap;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use haulway_core::{
    BypassPlan, Coordinate, CorridorEngine, FeatureId, Layer, Polyline, RestrictionReport,
    Router, VehicleProfile,
};
use haulway_data::{FsFeatureSource, HttpRouter, HttpRouterConfig, parse_route};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::fs::{dir_exists, file_is_file, read_utf8_file};
use crate::{
    ARG_LAYERS_DIR, ARG_PROFILE, ARG_ROUTE, ARG_ROUTER_URL, CliError, ENV_LAYERS_DIR, ENV_ROUTE,
};

/// CLI arguments for the `analyse` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Analyse a route against the published restriction layers. \
                 Frames within the corridor, samples outside permitted zones \
                 and (with --bypass and a router URL) detour routes are \
                 printed as a JSON report.",
    about = "Analyse a route against restriction layers"
)]
#[ortho_config(prefix = "HAULWAY")]
pub(crate) struct AnalyseArgs {
    /// Path to a GeoJSON file holding the route line.
    #[arg(long = ARG_ROUTE, value_name = "path")]
    #[serde(default)]
    pub(crate) route: Option<Utf8PathBuf>,
    /// Directory containing the published layer artefacts.
    #[arg(long = ARG_LAYERS_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) layers_dir: Option<Utf8PathBuf>,
    /// Vehicle profile: auto, truckLight or truckHeavy.
    #[arg(long = ARG_PROFILE, value_name = "name")]
    #[serde(default)]
    pub(crate) profile: Option<String>,
    /// Base URL for the OSRM server used to route detours.
    #[arg(long = ARG_ROUTER_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) router_url: Option<String>,
    /// Route detours around frames and restricted samples.
    #[arg(
        long,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_name = "bool"
    )]
    #[serde(default)]
    pub(crate) bypass: Option<bool>,
}

impl AnalyseArgs {
    pub(crate) fn into_config(self) -> Result<AnalyseConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        AnalyseConfig::try_from(merged)
    }
}

/// Resolved `analyse` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AnalyseConfig {
    pub(crate) route: Utf8PathBuf,
    pub(crate) layers_dir: Utf8PathBuf,
    pub(crate) profile: VehicleProfile,
    pub(crate) router_url: Option<String>,
    pub(crate) bypass: bool,
}

impl AnalyseConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        match file_is_file(&self.route) {
            Ok(true) => {}
            Ok(false) => {
                return Err(CliError::SourcePathNotFile {
                    field: ARG_ROUTE,
                    path: self.route.clone(),
                });
            }
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                return Err(CliError::MissingSourceFile {
                    field: ARG_ROUTE,
                    path: self.route.clone(),
                });
            }
            Err(source) => {
                return Err(CliError::InspectSourcePath {
                    field: ARG_ROUTE,
                    path: self.route.clone(),
                    source,
                });
            }
        }
        if !dir_exists(&self.layers_dir) {
            return Err(CliError::LayersDirNotDirectory {
                path: self.layers_dir.clone(),
            });
        }
        Ok(())
    }
}

impl TryFrom<AnalyseArgs> for AnalyseConfig {
    type Error = CliError;

    fn try_from(args: AnalyseArgs) -> Result<Self, Self::Error> {
        let route = args.route.ok_or(CliError::MissingArgument {
            field: ARG_ROUTE,
            env: ENV_ROUTE,
        })?;
        let layers_dir = args.layers_dir.ok_or(CliError::MissingArgument {
            field: ARG_LAYERS_DIR,
            env: ENV_LAYERS_DIR,
        })?;
        let profile = match args.profile {
            Some(name) => name.parse()?,
            None => VehicleProfile::default(),
        };

        Ok(Self {
            route,
            layers_dir,
            profile,
            router_url: args.router_url,
            bypass: args.bypass.unwrap_or(false),
        })
    }
}

/// JSON document printed by `analyse`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AnalysisReport {
    pub(crate) profile: VehicleProfile,
    pub(crate) route_points: usize,
    pub(crate) layers_loaded: Vec<Layer>,
    pub(crate) corridor: BTreeMap<Layer, Vec<FeatureId>>,
    pub(crate) restrictions: RestrictionReport,
    pub(crate) bypasses: Vec<BypassPlan>,
    pub(crate) notices: Vec<String>,
}

/// Builds the router used for detours, if any.
pub(crate) trait AnalyseRouterBuilder {
    fn build(&self, config: &AnalyseConfig) -> Result<Option<Box<dyn Router>>, CliError>;
}

pub(crate) struct DefaultRouterBuilder;

impl AnalyseRouterBuilder for DefaultRouterBuilder {
    fn build(&self, config: &AnalyseConfig) -> Result<Option<Box<dyn Router>>, CliError> {
        if !config.bypass {
            return Ok(None);
        }
        let Some(base_url) = &config.router_url else {
            log::warn!("--bypass needs --{ARG_ROUTER_URL}; skipping detours");
            return Ok(None);
        };
        let router_config = HttpRouterConfig::new(base_url.clone());
        let router =
            HttpRouter::with_config(router_config).map_err(|source| CliError::BuildRouter {
                base_url: base_url.clone(),
                source,
            })?;
        Ok(Some(Box::new(router)))
    }
}

pub(crate) fn run_analyse(args: AnalyseArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_analyse_with(args, &DefaultRouterBuilder, &mut stdout)
}

pub(crate) fn run_analyse_with(
    args: AnalyseArgs,
    builder: &dyn AnalyseRouterBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    let report = execute_analyse(&config, builder)?;
    write_report(writer, &report)
}

fn execute_analyse(
    config: &AnalyseConfig,
    builder: &dyn AnalyseRouterBuilder,
) -> Result<AnalysisReport, CliError> {
    let route = load_route(&config.route)?;
    let router = builder.build(config)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    runtime.block_on(analyse(config, route, router.as_deref()))
}

/// Loads the route line from a GeoJSON file.
pub(crate) fn load_route(path: &Utf8Path) -> Result<Polyline, CliError> {
    let text = read_utf8_file(path).map_err(|source| CliError::ReadRoute {
        path: path.to_path_buf(),
        source,
    })?;
    parse_route(&text).map_err(|source| CliError::ParseRoute {
        path: path.to_path_buf(),
        source,
    })
}

async fn analyse(
    config: &AnalyseConfig,
    route: Polyline,
    router: Option<&dyn Router>,
) -> Result<AnalysisReport, CliError> {
    let source = FsFeatureSource::new(config.layers_dir.clone());
    let mut engine = CorridorEngine::default();
    let loaded = engine.load_layers(&source).await;
    log::info!("Loaded {loaded} of {} layers", Layer::ALL.len());

    let ticket = engine.begin_build(endpoints(&route), config.profile);
    engine.complete_build(&ticket, route)?;
    let route = engine.route().map(<[Coordinate]>::to_vec).unwrap_or_default();

    let layers_loaded: Vec<Layer> = Layer::ALL
        .into_iter()
        .filter(|layer| engine.layers().contains(*layer))
        .collect();
    let mut corridor = BTreeMap::new();
    for layer in &layers_loaded {
        let ids = engine.compute_corridor(&route, *layer);
        corridor.insert(*layer, ids.into_iter().collect());
    }
    let restrictions = engine.compute_restrictions(&route, config.profile);
    let bypasses = match router {
        Some(router) => engine.compute_bypasses(router, &route, config.profile).await,
        None => {
            engine.finish();
            Vec::new()
        }
    };
    let notices = engine
        .take_notices()
        .iter()
        .map(ToString::to_string)
        .collect();

    Ok(AnalysisReport {
        profile: config.profile,
        route_points: route.len(),
        layers_loaded,
        corridor,
        restrictions,
        bypasses,
        notices,
    })
}

fn endpoints(route: &[Coordinate]) -> Vec<Coordinate> {
    match (route.first(), route.last()) {
        (Some(first), Some(last)) => vec![*first, *last],
        _ => Vec::new(),
    }
}

fn write_report(writer: &mut dyn Write, report: &AnalysisReport) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(report).map_err(CliError::SerialiseReport)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteReport)?;
    writer.write_all(b"\n").map_err(CliError::WriteReport)?;
    Ok(())
}
