//! Mock imagery source for deterministic testing

use crate::ImageryError;
use geoglyph_domain::traits::{ImageryRequest, ImageryResponse, ImagerySource};
use geoglyph_domain::{bands_for, Raster};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

/// Imagery source returning uniform rasters at the requested dimensions
///
/// Band values default to a vegetated scene and can be overridden per band.
/// Requests at selected resolutions can be scripted to miss coverage, and a
/// failure can be injected for every request.
///
/// # Examples
///
/// ```
/// use geoglyph_imagery::MockImagery;
///
/// let source = MockImagery::new()
///     .with_band_value("B4", 1200.0)
///     .with_miss_at_resolution(10.0);
/// assert_eq!(source.request_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MockImagery {
    band_values: HashMap<String, f32>,
    miss_resolutions: Vec<f64>,
    failure: Option<ImageryError>,
    requests: Arc<Mutex<Vec<ImageryRequest>>>,
}

impl MockImagery {
    /// Create a mock with default band values
    pub fn new() -> Self {
        let band_values = [
            ("B2", 450.0),
            ("B3", 700.0),
            ("B4", 600.0),
            ("B8", 2800.0),
            ("VV", -11.0),
            ("VH", -17.5),
        ]
        .into_iter()
        .map(|(band, value)| (band.to_string(), value))
        .collect();

        Self {
            band_values,
            miss_resolutions: Vec::new(),
            failure: None,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Override the uniform value of a band
    pub fn with_band_value(mut self, band: impl Into<String>, value: f32) -> Self {
        self.band_values.insert(band.into(), value);
        self
    }

    /// Report a coverage miss for requests at this resolution
    pub fn with_miss_at_resolution(mut self, resolution_m: f64) -> Self {
        self.miss_resolutions.push(resolution_m);
        self
    }

    /// Fail every request with `error`
    pub fn with_failure(mut self, error: ImageryError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Requests received so far, in call order
    pub fn requests(&self) -> Vec<ImageryRequest> {
        lock(&self.requests).clone()
    }
}

impl Default for MockImagery {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ImagerySource for MockImagery {
    type Error = ImageryError;

    fn fetch(&self, request: &ImageryRequest) -> Result<ImageryResponse, Self::Error> {
        lock(&self.requests).push(request.clone());

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        if self
            .miss_resolutions
            .iter()
            .any(|r| (r - request.resolution_m).abs() < f64::EPSILON)
        {
            let dataset_id = request.dataset_ids.first().cloned().unwrap_or_default();
            return Ok(ImageryResponse::CoverageMiss { dataset_id });
        }

        let (width, height) = request.dimensions;
        let mut rasters = BTreeMap::new();
        for dataset_id in &request.dataset_ids {
            let mut raster = Raster::new(width, height);
            for band in bands_for(dataset_id) {
                let value = self.band_values.get(*band).copied().unwrap_or(0.0);
                raster
                    .insert_band(*band, vec![value; raster.pixel_count()])
                    .map_err(|e| ImageryError::InvalidResponse(e.to_string()))?;
            }
            rasters.insert(dataset_id.clone(), raster);
        }

        Ok(ImageryResponse::Rasters(rasters))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoglyph_domain::{BoundingBox, Coordinate, DateRange, OPTICAL_DATASET, RADAR_DATASET};

    fn request(resolution_m: f64) -> ImageryRequest {
        ImageryRequest {
            bounds: BoundingBox::around(Coordinate::new(0.0, 0.0), 1.0),
            dataset_ids: vec![OPTICAL_DATASET.to_string(), RADAR_DATASET.to_string()],
            date_range: DateRange::parse("2023-01-01", "2023-12-31").unwrap(),
            resolution_m,
            dimensions: (3, 2),
        }
    }

    #[test]
    fn test_uniform_rasters() {
        let source = MockImagery::new().with_band_value("VV", -8.0);
        let ImageryResponse::Rasters(rasters) = source.fetch(&request(30.0)).unwrap() else {
            panic!("Expected rasters");
        };

        let optical = &rasters[OPTICAL_DATASET];
        assert_eq!(optical.bands.len(), 4);
        assert_eq!(optical.band("B8").unwrap().len(), 6);

        let radar = &rasters[RADAR_DATASET];
        assert!(radar.band("VV").unwrap().iter().all(|v| *v == -8.0));
        assert_eq!(source.request_count(), 1);
    }

    #[test]
    fn test_scripted_miss() {
        let source = MockImagery::new().with_miss_at_resolution(10.0);
        assert!(matches!(
            source.fetch(&request(10.0)).unwrap(),
            ImageryResponse::CoverageMiss { .. }
        ));
        assert!(matches!(
            source.fetch(&request(30.0)).unwrap(),
            ImageryResponse::Rasters(_)
        ));
    }

    #[test]
    fn test_injected_failure() {
        let source = MockImagery::new().with_failure(ImageryError::Authentication("401".to_string()));
        let err = source.fetch(&request(30.0)).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(source.requests().len(), 1);
    }
}
