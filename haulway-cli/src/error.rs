//! Error types emitted by the Haulway CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use haulway_core::{ProfileParseError, StaleResult};
use haulway_data::{GeoJsonError, RouterBuildError};
use thiserror::Error;

/// Errors emitted by the Haulway CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// The vehicle profile name is not recognised.
    #[error("invalid --profile: {0}")]
    InvalidProfile(#[from] ProfileParseError),
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// The layers directory does not exist or is not a directory.
    #[error("layers directory {path:?} does not exist or is not a directory")]
    LayersDirNotDirectory { path: Utf8PathBuf },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Reading the route file failed.
    #[error("failed to read route at {path:?}: {source}")]
    ReadRoute {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The route file is not a usable GeoJSON line.
    #[error("failed to parse route at {path:?}: {source}")]
    ParseRoute {
        path: Utf8PathBuf,
        #[source]
        source: GeoJsonError,
    },
    /// Constructing the router failed.
    #[error("failed to build router for {base_url:?}: {source}")]
    BuildRouter {
        base_url: String,
        #[source]
        source: RouterBuildError,
    },
    /// Starting the async runtime failed.
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// The analysed build was superseded before it completed.
    #[error(transparent)]
    StaleBuild(#[from] StaleResult),
    /// Serializing the report failed.
    #[error("failed to serialize analysis report: {0}")]
    SerialiseReport(#[source] serde_json::Error),
    /// Writing the report failed.
    #[error("failed to write analysis report: {0}")]
    WriteReport(#[source] std::io::Error),
}
