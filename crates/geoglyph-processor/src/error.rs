//! Error types for the processor

use geoglyph_domain::{DomainError, Recoverability};
use thiserror::Error;

/// Errors that can occur while building composites
#[derive(Error, Debug)]
pub enum ProcessorError {
    /// Imagery source failure
    #[error("Imagery error: {message}")]
    Imagery {
        /// Source error message
        message: String,
        /// Whether the source reported it as fatal
        fatal: bool,
    },

    /// Raster does not have the expected shape or bands
    #[error("Invalid raster: {0}")]
    Raster(#[from] DomainError),

    /// A required band is missing
    #[error("Missing band '{band}' in {dataset_id}")]
    MissingBand {
        /// Dataset the band should come from
        dataset_id: String,
        /// Band name
        band: String,
    },

    /// PNG encoding failed
    #[error("Image encoding error: {0}")]
    Encode(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProcessorError {
    /// Whether the run has to stop
    pub fn is_fatal(&self) -> bool {
        match self {
            ProcessorError::Imagery { fatal, .. } => *fatal,
            ProcessorError::Config(_) => true,
            _ => false,
        }
    }
}

impl Recoverability for ProcessorError {
    fn is_fatal(&self) -> bool {
        ProcessorError::is_fatal(self)
    }
}

impl From<image::ImageError> for ProcessorError {
    fn from(e: image::ImageError) -> Self {
        ProcessorError::Encode(e.to_string())
    }
}
