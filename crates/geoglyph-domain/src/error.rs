//! Domain error types

use thiserror::Error;

/// Errors raised while constructing or loading domain records
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Coordinate outside the valid latitude/longitude range
    #[error("Invalid coordinate: ({lat}, {lon})")]
    InvalidCoordinate {
        /// Latitude in decimal degrees
        lat: f64,
        /// Longitude in decimal degrees
        lon: f64,
    },

    /// Region entry failed validation
    #[error("Invalid region '{id}': {reason}")]
    InvalidRegion {
        /// Region identifier
        id: String,
        /// Description of the problem
        reason: String,
    },

    /// Region identifier not present in the registry
    #[error("Unknown region: {0}")]
    UnknownRegion(String),

    /// Region configuration could not be parsed
    #[error("Region configuration error: {0}")]
    RegionConfig(String),

    /// Band length does not match the raster dimensions
    #[error("Band '{band}' has {actual} values, expected {expected}")]
    RasterShape {
        /// Band name
        band: String,
        /// Expected number of values (width * height)
        expected: usize,
        /// Actual number of values
        actual: usize,
    },

    /// Date range start is after its end
    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),
}
