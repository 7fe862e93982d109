//! Geoglyph Imagery Acquisition Layer
//!
//! Implementations of the `ImagerySource` trait from `geoglyph-domain`.
//!
//! # Sources
//!
//! - `HttpImagerySource`: remote raster service (`POST /v1/rasters`)
//! - `SyntheticImagery`: deterministic generated scenes for offline runs
//! - `MockImagery`: uniform rasters and scripted failures for tests

#![warn(missing_docs)]

pub mod http;
pub mod mock;
pub mod synthetic;

use geoglyph_domain::traits::Recoverability;
use thiserror::Error;

pub use http::HttpImagerySource;
pub use mock::MockImagery;
pub use synthetic::{synthetic_datasets, SyntheticImagery};

/// Errors that can occur while acquiring imagery
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImageryError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Service returned data that does not match the request
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Credentials rejected by the service
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Source is misconfigured
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ImageryError {
    /// Whether the run has to stop
    pub fn is_fatal(&self) -> bool {
        matches!(self, ImageryError::Authentication(_) | ImageryError::Configuration(_))
    }
}

impl Recoverability for ImageryError {
    fn is_fatal(&self) -> bool {
        ImageryError::is_fatal(self)
    }
}

impl From<serde_json::Error> for ImageryError {
    fn from(e: serde_json::Error) -> Self {
        ImageryError::InvalidResponse(e.to_string())
    }
}
