//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the pipeline and the two
//! external services it depends on. Implementations live in other crates.

use crate::geo::BoundingBox;
use crate::raster::{DateRange, Raster};
use std::collections::BTreeMap;

/// Request for source rasters covering one window
#[derive(Debug, Clone, PartialEq)]
pub struct ImageryRequest {
    /// Area to cover
    pub bounds: BoundingBox,

    /// Datasets to fetch, one raster each
    pub dataset_ids: Vec<String>,

    /// Acquisition date range
    pub date_range: DateRange,

    /// Target resolution in metres per pixel
    pub resolution_m: f64,

    /// Pixel dimensions (width, height)
    pub dimensions: (u32, u32),
}

/// Outcome of an imagery request
#[derive(Debug, Clone, PartialEq)]
pub enum ImageryResponse {
    /// One raster per requested dataset, keyed by dataset identifier
    Rasters(BTreeMap<String, Raster>),

    /// A dataset has no usable acquisitions for the window/date range
    CoverageMiss {
        /// Dataset lacking coverage
        dataset_id: String,
    },
}

/// Classification of errors for pipeline control flow
///
/// Fatal errors (authentication, configuration) abort the run; everything
/// else is recorded and the pipeline moves on.
pub trait Recoverability {
    /// Whether the run must stop
    fn is_fatal(&self) -> bool;
}

/// Trait for fetching satellite imagery
///
/// Implemented by the infrastructure layer (geoglyph-imagery)
pub trait ImagerySource {
    /// Error type for imagery operations
    type Error;

    /// Fetch rasters for every dataset in the request
    fn fetch(&self, request: &ImageryRequest) -> Result<ImageryResponse, Self::Error>;
}

/// Trait for inference provider operations
///
/// Implemented by the infrastructure layer (geoglyph-llm)
pub trait InferenceProvider {
    /// Error type for inference operations
    type Error;

    /// Generate a JSON reply constrained by a JSON schema
    fn generate_structured(&self, prompt: &str, schema: &str) -> Result<String, Self::Error>;

    /// Generate with an attached PNG image
    ///
    /// Providers without vision support ignore the image.
    fn generate_with_image(
        &self,
        prompt: &str,
        schema: &str,
        _png: &[u8],
    ) -> Result<String, Self::Error> {
        self.generate_structured(prompt, schema)
    }

    /// Model identifier recorded in run metadata
    fn model_name(&self) -> &str;
}
