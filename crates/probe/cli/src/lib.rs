//! Probe Explorer CLI - terminal front end for the probe history engine
//!
//! This CLI lets telemetry engineers:
//! - Search probes by lifecycle state, version and text
//! - Chart how many probes were recorded, new or expired per version
//! - Inspect a single probe with its dashboards and dataset columns
//! - List the versions known for each channel

#![deny(unsafe_code)]

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod error;
mod loader;
mod output;

use commands::{info, search, show, stats, versions};
pub use config::CliConfig;
pub use error::{CliError, CliResult};
pub use loader::load_dataset;

/// Probe Explorer CLI application
#[derive(Parser)]
#[command(name = "probe-explorer")]
#[command(about = "Probe Explorer - query telemetry probe histories", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding revisions.json, all_probes.json and friends
    #[arg(short, long, env = "PROBE_EXPLORER_DATA")]
    data_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(long, env = "PROBE_EXPLORER_CONFIG")]
    config: Option<PathBuf>,

    /// Output format (table, json, yaml)
    #[arg(short, long, default_value = "table")]
    output: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Search probes
    #[command(alias = "find")]
    Search(search::SearchArgs),

    /// Probe counts per version
    Stats(stats::StatsArgs),

    /// Show one probe in detail
    Show(show::ShowArgs),

    /// List known versions
    Versions(versions::VersionsArgs),

    /// Show dataset freshness and size
    Info,
}

/// Run using the current process arguments.
pub fn run() -> CliResult<()> {
    run_with_args(std::env::args_os())
}

/// Run using the provided argument iterator.
pub fn run_with_args<I, T>(args: I) -> CliResult<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    // Logs go to stderr so structured output stays parseable.
    let filter = if cli.verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .try_init();

    let config = CliConfig::load(cli.config.as_deref())?;
    let data_dir = cli.data_dir.or(config.data_dir).ok_or_else(|| {
        CliError::InvalidInput(
            "no data directory, pass --data-dir or set PROBE_EXPLORER_DATA".to_string(),
        )
    })?;
    let dataset = load_dataset(&data_dir, config.explorer)?;

    match cli.command {
        Commands::Search(args) => search::execute(args, &dataset, cli.output),
        Commands::Stats(args) => stats::execute(args, &dataset, cli.output),
        Commands::Show(args) => show::execute(args, &dataset, cli.output),
        Commands::Versions(args) => versions::execute(args, &dataset, cli.output),
        Commands::Info => info::execute(&dataset, cli.output),
    }
}
