//! Error types for the analyzer

use geoglyph_domain::Recoverability;
use thiserror::Error;

/// Errors that can occur during analysis
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyzerError {
    /// Inference provider error
    #[error("Inference error: {message}")]
    Inference {
        /// Provider error message
        message: String,
        /// Whether the provider reported it as fatal
        fatal: bool,
    },

    /// Response is not usable JSON
    #[error("Invalid response format: {0}")]
    InvalidFormat(String),

    /// Response tag does not match the requested analysis
    #[error("Expected analysis_type '{expected}', got '{actual}'")]
    TagMismatch {
        /// Tag of the requested analysis
        expected: String,
        /// Tag found in the response
        actual: String,
    },

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AnalyzerError {
    /// Whether the run has to stop
    pub fn is_fatal(&self) -> bool {
        match self {
            AnalyzerError::Inference { fatal, .. } => *fatal,
            AnalyzerError::Config(_) => true,
            _ => false,
        }
    }
}

impl Recoverability for AnalyzerError {
    fn is_fatal(&self) -> bool {
        AnalyzerError::is_fatal(self)
    }
}

impl From<serde_json::Error> for AnalyzerError {
    fn from(e: serde_json::Error) -> Self {
        AnalyzerError::JsonParse(e.to_string())
    }
}
