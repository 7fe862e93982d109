//! Geoglyph Domain Layer
//!
//! Core records and trait interfaces shared by every stage of the discovery
//! pipeline. Infrastructure (HTTP clients, disk layout, CLI) lives in other
//! crates and depends on the types defined here.
//!
//! ## Key Concepts
//!
//! - **Region**: a named area of interest with a center coordinate and priority
//! - **ScaleWindow**: one of three nested bounding boxes (regional, zone, site)
//! - **CompositeImage**: two independent source rasters plus a derived index
//! - **Discovery**: a candidate site produced from an AI interpretation
//!
//! ## Architecture
//!
//! - Pure data and geometry only, no I/O beyond parsing configuration text
//! - Trait definitions for the two external collaborators (imagery, inference)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod discovery;
pub mod error;
pub mod geo;
pub mod raster;
pub mod region;
pub mod registry;
pub mod run;
pub mod scale;
pub mod traits;

// Re-exports for convenience
pub use discovery::{AnalysisPass, Discovery, PromptRecord, PromptStatus, Provenance};
pub use error::DomainError;
pub use geo::{BoundingBox, Coordinate};
pub use raster::{CompositeImage, DateRange, Hotspot, IndexStats, Raster, INDEX_BAND};
pub use region::{Priority, Region};
pub use registry::RegionRegistry;
pub use run::RunId;
pub use scale::{Scale, ScaleWindow};
pub use traits::{ImageryRequest, ImageryResponse, ImagerySource, InferenceProvider, Recoverability};

/// Dataset identifier of the optical source (Sentinel-2 surface reflectance)
pub const OPTICAL_DATASET: &str = "COPERNICUS/S2_SR_HARMONIZED";

/// Dataset identifier of the radar source (Sentinel-1 ground range detected)
pub const RADAR_DATASET: &str = "COPERNICUS/S1_GRD";

/// Optical bands used by the index (blue, green, red, near infrared)
pub const OPTICAL_BANDS: [&str; 4] = ["B2", "B3", "B4", "B8"];

/// Radar polarisations (backscatter in dB)
pub const RADAR_BANDS: [&str; 2] = ["VV", "VH"];

/// Bands delivered for a dataset, empty for unknown datasets
pub fn bands_for(dataset_id: &str) -> &'static [&'static str] {
    match dataset_id {
        OPTICAL_DATASET => &OPTICAL_BANDS,
        RADAR_DATASET => &RADAR_BANDS,
        _ => &[],
    }
}

/// Distance below which two discoveries are treated as the same candidate
pub const DEDUP_TOLERANCE_METERS: f64 = 50.0;
