//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Geoglyph - multi-scale archaeological discovery from satellite imagery.
#[derive(Debug, Parser)]
#[command(name = "geoglyph")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "GEOGLYPH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output directory (overrides the configuration)
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the region registry
    Regions(RegionsArgs),

    /// Run the discovery pipeline
    Run(RunArgs),

    /// Compare two submissions for reproducibility
    Verify(VerifyArgs),

    /// Print the effective configuration
    Config,
}

/// Arguments for the regions command.
#[derive(Debug, Parser)]
pub struct RegionsArgs {
    /// Only regions with this priority (high, medium, low)
    #[arg(short, long)]
    pub priority: Option<String>,

    /// Only regions in this country
    #[arg(long)]
    pub country: Option<String>,
}

/// Arguments for the run command.
#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Region identifiers to analyze, in order
    #[arg(short, long, value_delimiter = ',')]
    pub regions: Vec<String>,

    /// Maximum number of regions when none are named
    #[arg(short, long)]
    pub max_regions: Option<usize>,

    /// Continue the run recorded in the progress marker
    #[arg(long)]
    pub resume: bool,

    /// Use synthetic imagery and the mock inference provider
    #[arg(long)]
    pub offline: bool,
}

/// Arguments for the verify command.
#[derive(Debug, Parser)]
pub struct VerifyArgs {
    /// Submission of the first run
    pub first: PathBuf,

    /// Submission of the repeat run
    pub second: PathBuf,

    /// Match tolerance in metres
    #[arg(short, long)]
    pub tolerance: Option<f64>,
}
