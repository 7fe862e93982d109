//! Rasters and composite images

use crate::error::DomainError;
use crate::geo::Coordinate;
use crate::scale::ScaleWindow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Name of the derived index band
pub const INDEX_BAND: &str = "archaeological_index";

/// Grid of named `f32` bands in row-major order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Raster {
    /// Pixels per row
    pub width: u32,
    /// Number of rows
    pub height: u32,
    /// Band name to pixel values (`width * height` each)
    pub bands: BTreeMap<String, Vec<f32>>,
}

impl Raster {
    /// Empty raster with no bands
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bands: BTreeMap::new(),
        }
    }

    /// Number of pixels per band
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Add a band, checking its length against the dimensions
    pub fn with_band(mut self, name: impl Into<String>, values: Vec<f32>) -> Result<Self, DomainError> {
        self.insert_band(name, values)?;
        Ok(self)
    }

    /// Insert or replace a band, checking its length against the dimensions
    pub fn insert_band(&mut self, name: impl Into<String>, values: Vec<f32>) -> Result<(), DomainError> {
        let name = name.into();
        if values.len() != self.pixel_count() {
            return Err(DomainError::RasterShape {
                band: name,
                expected: self.pixel_count(),
                actual: values.len(),
            });
        }
        self.bands.insert(name, values);
        Ok(())
    }

    /// Values of a band
    pub fn band(&self, name: &str) -> Option<&[f32]> {
        self.bands.get(name).map(Vec::as_slice)
    }

    /// Verify every band matches the dimensions
    pub fn validate(&self) -> Result<(), DomainError> {
        for (name, values) in &self.bands {
            if values.len() != self.pixel_count() {
                return Err(DomainError::RasterShape {
                    band: name.clone(),
                    expected: self.pixel_count(),
                    actual: values.len(),
                });
            }
        }
        Ok(())
    }
}

/// Inclusive acquisition date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First day
    pub start: NaiveDate,
    /// Last day
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range, rejecting `start > end`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DomainError> {
        if start > end {
            return Err(DomainError::InvalidDateRange(format!("{} is after {}", start, end)));
        }
        Ok(Self { start, end })
    }

    /// Parse two `YYYY-MM-DD` dates
    pub fn parse(start: &str, end: &str) -> Result<Self, DomainError> {
        let parse = |s: &str| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|e| DomainError::InvalidDateRange(format!("'{}': {}", s, e)))
        };
        Self::new(parse(start)?, parse(end)?)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// High-index cell converted back to a coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    /// Pixel center
    pub coordinate: Coordinate,
    /// Normalized index value
    pub value: f32,
}

/// Summary of the index heatmap of one window
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IndexStats {
    /// Smallest value
    pub min: f32,
    /// Largest value
    pub max: f32,
    /// Mean value
    pub mean: f32,
    /// Strongest cells, descending
    pub hotspots: Vec<Hotspot>,
}

/// Two source rasters combined for one scale window
///
/// Produced by the processor and consumed by the analyzer within a single
/// pipeline pass.
#[derive(Debug, Clone)]
pub struct CompositeImage {
    /// Region the window belongs to
    pub region_id: String,

    /// Window the imagery covers
    pub window: ScaleWindow,

    /// Source bands of both datasets (optical and radar)
    pub sources: Raster,

    /// Single-band raster holding the normalized index in [0, 1]
    pub heatmap: Raster,

    /// Heatmap summary
    pub stats: IndexStats,

    /// Dataset identifiers the composite was derived from
    pub dataset_ids: Vec<String>,

    /// Acquisition date range
    pub date_range: DateRange,

    /// Textual reference used in prompts and file names
    pub reference: String,
}

impl CompositeImage {
    /// Index values of the heatmap
    pub fn index(&self) -> &[f32] {
        self.heatmap.band(INDEX_BAND).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_length_checked() {
        let raster = Raster::new(2, 2);
        assert!(raster.clone().with_band("B4", vec![0.0; 4]).is_ok());

        let err = raster.with_band("B4", vec![0.0; 3]).unwrap_err();
        assert_eq!(
            err,
            DomainError::RasterShape {
                band: "B4".to_string(),
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn test_validate_detects_bad_band() {
        let mut raster = Raster::new(1, 2);
        raster.bands.insert("VV".to_string(), vec![1.0]);
        assert!(raster.validate().is_err());
    }

    #[test]
    fn test_date_range() {
        let range = DateRange::parse("2023-01-01", "2023-12-31").unwrap();
        assert_eq!(range.to_string(), "2023-01-01 to 2023-12-31");

        assert!(DateRange::parse("2024-01-01", "2023-01-01").is_err());
        assert!(DateRange::parse("2023-13-01", "2023-12-31").is_err());
    }
}
