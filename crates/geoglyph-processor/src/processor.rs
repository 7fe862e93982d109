//! Multi-scale processor implementation

use crate::config::ProcessorConfig;
use crate::error::ProcessorError;
use crate::index::{self, IndexInputs};
use geoglyph_domain::traits::{ImageryRequest, ImageryResponse, ImagerySource, Recoverability};
use geoglyph_domain::{
    CompositeImage, Raster, Region, Scale, ScaleWindow, INDEX_BAND, OPTICAL_DATASET, RADAR_DATASET,
};
use std::fmt::Display;
use tracing::{debug, info, warn};

/// A window that produced no composite
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedWindow {
    /// Scale of the skipped window
    pub scale: Scale,

    /// Why it was skipped
    pub reason: String,
}

/// Result of processing one window
#[derive(Debug, Clone)]
pub enum WindowOutcome {
    /// Both sources were available
    Composite(Box<CompositeImage>),

    /// Coverage miss or recoverable source error
    Skipped(SkippedWindow),
}

/// Composites of one region, coarsest scale first
#[derive(Debug, Clone, Default)]
pub struct RegionImagery {
    /// Composites that were built
    pub composites: Vec<CompositeImage>,

    /// Windows without a composite
    pub skipped: Vec<SkippedWindow>,
}

/// Builds composite images for the three scale windows of a region
///
/// # Examples
///
/// ```
/// use geoglyph_imagery::MockImagery;
/// use geoglyph_processor::{MultiScaleProcessor, ProcessorConfig};
///
/// let processor = MultiScaleProcessor::new(MockImagery::new(), ProcessorConfig::default()).unwrap();
/// assert_eq!(processor.config().max_hotspots, 5);
/// ```
pub struct MultiScaleProcessor<S> {
    source: S,
    config: ProcessorConfig,
}

impl<S> MultiScaleProcessor<S>
where
    S: ImagerySource,
    S::Error: Recoverability + Display,
{
    /// Create a processor, validating the configuration
    pub fn new(source: S, config: ProcessorConfig) -> Result<Self, ProcessorError> {
        config.validate().map_err(ProcessorError::Config)?;
        Ok(Self { source, config })
    }

    /// Active configuration
    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Imagery source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The three windows of a region, coarsest first, sharing its center
    pub fn windows(&self, region: &Region) -> Vec<ScaleWindow> {
        Scale::ALL
            .iter()
            .map(|&scale| {
                let settings = self.config.settings(scale);
                ScaleWindow::new(region.center, scale, settings.span_km, settings.resolution_m)
            })
            .collect()
    }

    /// Process every window of a region
    ///
    /// Coverage misses, recoverable source errors and malformed rasters skip
    /// the window; fatal errors abort.
    pub fn process_region(&self, region: &Region) -> Result<RegionImagery, ProcessorError> {
        info!(region = %region.id, "Processing region imagery");

        let mut imagery = RegionImagery::default();
        for window in self.windows(region) {
            let outcome = match self.process_window(region, &window) {
                Ok(outcome) => outcome,
                Err(e) if e.is_fatal() => return Err(e),
                // Malformed rasters only cost this window
                Err(e) => WindowOutcome::Skipped(SkippedWindow {
                    scale: window.scale,
                    reason: e.to_string(),
                }),
            };
            match outcome {
                WindowOutcome::Composite(composite) => imagery.composites.push(*composite),
                WindowOutcome::Skipped(skipped) => {
                    warn!(region = %region.id, scale = %skipped.scale, reason = %skipped.reason, "Window skipped");
                    imagery.skipped.push(skipped);
                }
            }
        }

        info!(
            region = %region.id,
            composites = imagery.composites.len(),
            skipped = imagery.skipped.len(),
            "Region imagery processed"
        );
        Ok(imagery)
    }

    /// Fetch both sources for a window and build its composite
    pub fn process_window(&self, region: &Region, window: &ScaleWindow) -> Result<WindowOutcome, ProcessorError> {
        let date_range = self.config.date_range()?;
        let dataset_ids = vec![OPTICAL_DATASET.to_string(), RADAR_DATASET.to_string()];
        let request = ImageryRequest {
            bounds: window.bounds,
            dataset_ids: dataset_ids.clone(),
            date_range,
            resolution_m: window.resolution_m,
            dimensions: window.dimensions(),
        };

        debug!(region = %region.id, scale = %window.scale, dims = ?request.dimensions, "Fetching imagery");

        let rasters = match self.source.fetch(&request) {
            Ok(ImageryResponse::Rasters(rasters)) => rasters,
            Ok(ImageryResponse::CoverageMiss { dataset_id }) => {
                return Ok(WindowOutcome::Skipped(SkippedWindow {
                    scale: window.scale,
                    reason: format!("no coverage for {}", dataset_id),
                }));
            }
            Err(e) if e.is_fatal() => {
                return Err(ProcessorError::Imagery {
                    message: e.to_string(),
                    fatal: true,
                });
            }
            Err(e) => {
                return Ok(WindowOutcome::Skipped(SkippedWindow {
                    scale: window.scale,
                    reason: e.to_string(),
                }));
            }
        };

        let (width, height) = request.dimensions;
        let mut sources = Raster::new(width, height);
        for dataset_id in &dataset_ids {
            let Some(raster) = rasters.get(dataset_id) else {
                return Ok(WindowOutcome::Skipped(SkippedWindow {
                    scale: window.scale,
                    reason: format!("no coverage for {}", dataset_id),
                }));
            };
            for (band, values) in &raster.bands {
                sources.insert_band(band.clone(), values.clone())?;
            }
        }

        let band = |dataset_id: &str, name: &str| {
            sources.band(name).ok_or_else(|| ProcessorError::MissingBand {
                dataset_id: dataset_id.to_string(),
                band: name.to_string(),
            })
        };

        let inputs = IndexInputs {
            b2: band(OPTICAL_DATASET, "B2")?,
            b3: band(OPTICAL_DATASET, "B3")?,
            b4: band(OPTICAL_DATASET, "B4")?,
            b8: band(OPTICAL_DATASET, "B8")?,
            vv: band(RADAR_DATASET, "VV")?,
            width,
            height,
            texture_radius: self.config.texture_radius,
            smoothness_radius: self.config.smoothness_radius,
        };

        let values = index::archaeological_index(&inputs);
        let stats = index::stats(
            &values,
            width,
            height,
            &window.bounds,
            self.config.hotspot_threshold,
            self.config.max_hotspots,
        );
        let heatmap = Raster::new(width, height).with_band(INDEX_BAND, values)?;

        debug!(
            region = %region.id,
            scale = %window.scale,
            mean = stats.mean,
            hotspots = stats.hotspots.len(),
            "Composite built"
        );

        Ok(WindowOutcome::Composite(Box::new(CompositeImage {
            region_id: region.id.clone(),
            window: *window,
            sources,
            heatmap,
            stats,
            dataset_ids,
            date_range,
            reference: format!("{}_{}_composite", region.id, window.scale),
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoglyph_domain::{Coordinate, Priority};
    use geoglyph_imagery::{ImageryError, MockImagery, SyntheticImagery};

    fn region() -> Region {
        Region {
            id: "brazil_xingu".to_string(),
            name: "Upper Xingu Basin".to_string(),
            center: Coordinate::new(-12.5, -53.0),
            priority: Priority::High,
            known_sites: true,
            country: "Brazil".to_string(),
            note: String::new(),
        }
    }

    fn small_config() -> ProcessorConfig {
        let mut config = ProcessorConfig::default();
        // Keep test rasters small
        config.regional.resolution_m = 5000.0;
        config.zone.resolution_m = 1000.0;
        config.site.resolution_m = 200.0;
        config
    }

    #[test]
    fn test_windows_nested_and_centered() {
        let processor = MultiScaleProcessor::new(MockImagery::new(), ProcessorConfig::default()).unwrap();
        let windows = processor.windows(&region());

        assert_eq!(windows.len(), 3);
        let scales: Vec<Scale> = windows.iter().map(|w| w.scale).collect();
        assert_eq!(scales, Scale::ALL.to_vec());

        for w in &windows {
            let c = w.bounds.center();
            assert!((c.lat + 12.5).abs() < 1e-9);
            assert!((c.lon + 53.0).abs() < 1e-9);
        }
        assert!(windows[0].bounds.contains_box(&windows[1].bounds));
        assert!(windows[1].bounds.contains_box(&windows[2].bounds));
        assert!(windows[2].area_km2() < windows[1].area_km2());
        assert!(windows[1].area_km2() < windows[0].area_km2());
    }

    #[test]
    fn test_process_region_builds_three_composites() {
        let processor = MultiScaleProcessor::new(SyntheticImagery::new(3), small_config()).unwrap();
        let imagery = processor.process_region(&region()).unwrap();

        assert_eq!(imagery.composites.len(), 3);
        assert!(imagery.skipped.is_empty());

        let zone = &imagery.composites[1];
        assert_eq!(zone.window.scale, Scale::Zone);
        assert_eq!(zone.reference, "brazil_xingu_zone_composite");
        assert_eq!(zone.dataset_ids, vec![OPTICAL_DATASET, RADAR_DATASET]);
        assert_eq!(zone.sources.bands.len(), 6);
        assert_eq!(zone.index().len(), 100);
        assert!(zone.index().iter().all(|v| (0.0..=1.0).contains(v)));
        assert!(zone.stats.hotspots.len() <= 5);
        for spot in &zone.stats.hotspots {
            assert!(zone.window.bounds.contains(&spot.coordinate));
            assert!(spot.value >= 0.8);
        }
    }

    #[test]
    fn test_coverage_miss_skips_window() {
        let source = MockImagery::new().with_miss_at_resolution(200.0);
        let processor = MultiScaleProcessor::new(source, small_config()).unwrap();
        let imagery = processor.process_region(&region()).unwrap();

        assert_eq!(imagery.composites.len(), 2);
        assert_eq!(imagery.skipped.len(), 1);
        assert_eq!(imagery.skipped[0].scale, Scale::Site);
        assert_eq!(processor.source().request_count(), 3);
    }

    #[test]
    fn test_recoverable_error_skips_window() {
        let source = MockImagery::new().with_failure(ImageryError::Communication("reset".to_string()));
        let processor = MultiScaleProcessor::new(source, small_config()).unwrap();
        let imagery = processor.process_region(&region()).unwrap();
        assert!(imagery.composites.is_empty());
        assert_eq!(imagery.skipped.len(), 3);
    }

    /// Source that drops one band from the rasters at a given resolution
    struct DropsBand {
        inner: MockImagery,
        resolution_m: f64,
        band: &'static str,
    }

    impl ImagerySource for DropsBand {
        type Error = ImageryError;

        fn fetch(&self, request: &ImageryRequest) -> Result<ImageryResponse, ImageryError> {
            let mut response = self.inner.fetch(request)?;
            if (request.resolution_m - self.resolution_m).abs() < f64::EPSILON {
                if let ImageryResponse::Rasters(rasters) = &mut response {
                    for raster in rasters.values_mut() {
                        raster.bands.remove(self.band);
                    }
                }
            }
            Ok(response)
        }
    }

    #[test]
    fn test_missing_band_skips_only_that_window() {
        let source = DropsBand {
            inner: MockImagery::new(),
            resolution_m: 200.0,
            band: "VV",
        };
        let processor = MultiScaleProcessor::new(source, small_config()).unwrap();
        let imagery = processor.process_region(&region()).unwrap();

        let scales: Vec<Scale> = imagery.composites.iter().map(|c| c.window.scale).collect();
        assert_eq!(scales, vec![Scale::Regional, Scale::Zone]);
        assert_eq!(imagery.skipped.len(), 1);
        assert_eq!(imagery.skipped[0].scale, Scale::Site);
        assert!(imagery.skipped[0].reason.contains("VV"));
    }

    #[test]
    fn test_auth_error_is_fatal() {
        let source = MockImagery::new().with_failure(ImageryError::Authentication("401".to_string()));
        let processor = MultiScaleProcessor::new(source, small_config()).unwrap();
        let err = processor.process_region(&region()).unwrap_err();
        assert!(err.is_fatal());
        // Aborts on the first window
        assert_eq!(processor.source().request_count(), 1);
    }

    #[test]
    fn test_uniform_scene_has_flat_index() {
        let processor = MultiScaleProcessor::new(MockImagery::new(), small_config()).unwrap();
        let imagery = processor.process_region(&region()).unwrap();
        for composite in &imagery.composites {
            assert!(composite.index().iter().all(|v| *v == 0.0));
            assert!(composite.stats.hotspots.is_empty());
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = ProcessorConfig::default();
        config.texture_radius = 0;
        assert!(MultiScaleProcessor::new(MockImagery::new(), config).is_err());
    }
}
