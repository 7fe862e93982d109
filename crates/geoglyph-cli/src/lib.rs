//! Geoglyph CLI library.
//!
//! This library provides the core functionality for the `geoglyph` command-line
//! interface: configuration management, the sequential region pipeline, the
//! resumable progress marker, command execution, and output formatting.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

pub use cli::{Cli, CliFormat, Command};
pub use config::{Config, OutputFormat};
pub use error::{CliError, Result};
pub use output::Formatter;
pub use pipeline::{offline_provider, run_pipeline, RunContext};
pub use progress::{CompletedRegion, ProgressMarker, PROGRESS_FILE};

impl From<CliFormat> for OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => OutputFormat::Table,
            CliFormat::Json => OutputFormat::Json,
        }
    }
}
