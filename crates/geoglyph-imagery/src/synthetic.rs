//! Deterministic generated scenes
//!
//! Produces forest-like reflectance with scattered bare clearings and
//! matching radar backscatter. Values depend only on the ground position of
//! each pixel, so overlapping windows at different scales agree.

use crate::ImageryError;
use geoglyph_domain::traits::{ImageryRequest, ImageryResponse, ImagerySource};
use geoglyph_domain::{Coordinate, Raster, OPTICAL_DATASET, RADAR_DATASET};
use std::collections::BTreeMap;
use tracing::debug;

/// Size of a clearing cell in degrees (about 550 m)
const CELL_DEG: f64 = 0.005;

/// Share of cells that contain a clearing
const CLEARING_RATE: f64 = 0.06;

/// Offline imagery source with reproducible output
#[derive(Debug, Clone, Default)]
pub struct SyntheticImagery {
    seed: u64,
    unavailable: Vec<String>,
}

impl SyntheticImagery {
    /// Create a source with the given seed
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            unavailable: Vec::new(),
        }
    }

    /// Report a coverage miss whenever `dataset_id` is requested
    pub fn without(mut self, dataset_id: impl Into<String>) -> Self {
        self.unavailable.push(dataset_id.into());
        self
    }

    /// How open the ground is at a point, 0 (forest) to 1 (bare)
    fn openness(&self, point: &Coordinate) -> f32 {
        let cell_lat = (point.lat / CELL_DEG).floor();
        let cell_lon = (point.lon / CELL_DEG).floor();
        let key = mix(self.seed ^ (cell_lat as i64 as u64).wrapping_mul(0x9E37_79B9) ^ (cell_lon as i64 as u64));

        if unit(key) >= CLEARING_RATE {
            return 0.0;
        }

        // Round clearing centred in the cell, radius a third of the cell
        let center_lat = (cell_lat + 0.5) * CELL_DEG;
        let center_lon = (cell_lon + 0.5) * CELL_DEG;
        let dy = (point.lat - center_lat) / CELL_DEG;
        let dx = (point.lon - center_lon) / CELL_DEG;
        let r = (dx * dx + dy * dy).sqrt();
        (1.0 - r / 0.33).clamp(0.0, 1.0) as f32
    }
}

fn mix(mut x: u64) -> u64 {
    // splitmix64 finalizer
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

fn unit(x: u64) -> f64 {
    (x >> 11) as f64 / (1u64 << 53) as f64
}

fn noise(seed: u64, row: u32, col: u32) -> f32 {
    (unit(mix(seed ^ (u64::from(row) << 32 | u64::from(col)))) as f32) - 0.5
}

impl ImagerySource for SyntheticImagery {
    type Error = ImageryError;

    fn fetch(&self, request: &ImageryRequest) -> Result<ImageryResponse, Self::Error> {
        if let Some(missing) = request
            .dataset_ids
            .iter()
            .find(|id| self.unavailable.contains(id))
        {
            return Ok(ImageryResponse::CoverageMiss {
                dataset_id: missing.clone(),
            });
        }

        let (width, height) = request.dimensions;
        let count = width as usize * height as usize;
        let mut band_data: BTreeMap<&str, Vec<f32>> = BTreeMap::new();

        for row in 0..height {
            for col in 0..width {
                let point = request.bounds.pixel_center(row, col, width, height);
                let open = self.openness(&point);
                let n = noise(self.seed, row, col);

                // Surface reflectance scaled by 10000
                let values = [
                    ("B2", 350.0 + 900.0 * open + 40.0 * n),
                    ("B3", 600.0 + 900.0 * open + 40.0 * n),
                    ("B4", 400.0 + 1500.0 * open + 60.0 * n),
                    ("B8", 3200.0 - 1000.0 * open + 120.0 * n),
                    // Backscatter in dB: canopy is rough, clearings smoother and darker
                    ("VV", -7.5 - 6.0 * open + 1.5 * n),
                    ("VH", -13.0 - 7.0 * open + 1.5 * n),
                ];
                for (band, value) in values {
                    band_data
                        .entry(band)
                        .or_insert_with(|| Vec::with_capacity(count))
                        .push(value);
                }
            }
        }

        let mut rasters = BTreeMap::new();
        for dataset_id in &request.dataset_ids {
            let bands = geoglyph_domain::bands_for(dataset_id);
            if bands.is_empty() {
                return Err(ImageryError::Configuration(format!(
                    "Synthetic source has no dataset '{}'",
                    dataset_id
                )));
            }
            let mut raster = Raster::new(width, height);
            for band in bands {
                let values = band_data.get(band).cloned().unwrap_or_default();
                raster
                    .insert_band(*band, values)
                    .map_err(|e| ImageryError::InvalidResponse(e.to_string()))?;
            }
            rasters.insert(dataset_id.clone(), raster);
        }

        debug!(width, height, datasets = rasters.len(), "Generated synthetic rasters");
        Ok(ImageryResponse::Rasters(rasters))
    }
}

/// Dataset identifiers the synthetic source can produce
pub fn synthetic_datasets() -> [&'static str; 2] {
    [OPTICAL_DATASET, RADAR_DATASET]
}
