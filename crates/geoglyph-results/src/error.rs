//! Results error types

use geoglyph_domain::Recoverability;
use thiserror::Error;

/// Errors that can occur while building or writing results
#[derive(Error, Debug)]
pub enum ResultsError {
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Package JSON could not be read or written
    #[error("JSON error: {0}")]
    Json(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ResultsError {
    /// Whether the run has to stop
    ///
    /// Failing to write results loses the run, so everything here is fatal.
    pub fn is_fatal(&self) -> bool {
        true
    }
}

impl Recoverability for ResultsError {
    fn is_fatal(&self) -> bool {
        ResultsError::is_fatal(self)
    }
}

impl From<serde_json::Error> for ResultsError {
    fn from(e: serde_json::Error) -> Self {
        ResultsError::Json(e.to_string())
    }
}
