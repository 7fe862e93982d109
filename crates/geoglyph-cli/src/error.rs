//! Error types for the CLI application.

use geoglyph_analyzer::AnalyzerError;
use geoglyph_domain::DomainError;
use geoglyph_imagery::ImageryError;
use geoglyph_llm::LlmError;
use geoglyph_processor::ProcessorError;
use geoglyph_results::ResultsError;
use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Region registry error
    #[error("Region error: {0}")]
    Domain(#[from] DomainError),

    /// Imagery adapter error
    #[error("Imagery error: {0}")]
    Imagery(#[from] ImageryError),

    /// Inference provider error
    #[error("Inference error: {0}")]
    Llm(#[from] LlmError),

    /// Processing error
    #[error("Processing error: {0}")]
    Processor(#[from] ProcessorError),

    /// Analysis error
    #[error("Analysis error: {0}")]
    Analyzer(#[from] AnalyzerError),

    /// Results error
    #[error("Results error: {0}")]
    Results(#[from] ResultsError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Second run did not reproduce the first
    #[error("{missing} of {total} discoveries were not reproduced")]
    NotReproduced {
        /// Discoveries without a match
        missing: usize,
        /// Discoveries compared
        total: usize,
    },
}
