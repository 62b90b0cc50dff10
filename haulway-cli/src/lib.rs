//! Command-line interface for Haulway corridor analysis.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod analyse;
mod error;
mod fs;

pub use error::CliError;

use analyse::{AnalyseArgs, run_analyse};

const ARG_ROUTE: &str = "route";
const ARG_LAYERS_DIR: &str = "layers-dir";
const ARG_PROFILE: &str = "profile";
const ARG_ROUTER_URL: &str = "router-url";
const ENV_ROUTE: &str = "HAULWAY_CMDS_ANALYSE_ROUTE";
const ENV_LAYERS_DIR: &str = "HAULWAY_CMDS_ANALYSE_LAYERS_DIR";

/// Run the Haulway CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns [`CliError`] when arguments are invalid, inputs cannot be read or
/// the report cannot be written.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Analyse(args) => run_analyse(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "haulway",
    about = "Corridor and restriction analysis for truck routes",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Report frames near a route, restricted samples and detours.
    Analyse(AnalyseArgs),
}

#[cfg(test)]
mod tests;
