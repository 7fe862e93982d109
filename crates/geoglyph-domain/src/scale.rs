//! Analysis scales and the windows derived from them

use crate::geo::{BoundingBox, Coordinate};
use serde::{Deserialize, Serialize};

/// One of the three progressive analysis levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    /// Settlement networks (50 km)
    Regional,

    /// Individual sites (10 km)
    Zone,

    /// Detailed site mapping (2 km)
    Site,
}

impl Scale {
    /// All scales from coarsest to finest
    pub const ALL: [Scale; 3] = [Scale::Regional, Scale::Zone, Scale::Site];

    /// Get the scale name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Scale::Regional => "regional",
            Scale::Zone => "zone",
            Scale::Site => "site",
        }
    }

    /// Parse a scale from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "regional" => Some(Scale::Regional),
            "zone" => Some(Scale::Zone),
            "site" => Some(Scale::Site),
            _ => None,
        }
    }

    /// Default window span in kilometres
    pub fn default_span_km(&self) -> f64 {
        match self {
            Scale::Regional => 50.0,
            Scale::Zone => 10.0,
            Scale::Site => 2.0,
        }
    }

    /// Default target resolution in metres per pixel
    pub fn default_resolution_m(&self) -> f64 {
        match self {
            Scale::Regional => 100.0,
            Scale::Zone => 30.0,
            Scale::Site => 10.0,
        }
    }
}

impl std::fmt::Display for Scale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A square bounding box at one analysis scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleWindow {
    /// Scale tag
    pub scale: Scale,

    /// Shared center coordinate
    pub center: Coordinate,

    /// Extent of the window
    pub bounds: BoundingBox,

    /// Side length in kilometres
    pub span_km: f64,

    /// Target resolution in metres per pixel
    pub resolution_m: f64,
}

impl ScaleWindow {
    /// Create a window of `span_km` centered on `center`
    pub fn new(center: Coordinate, scale: Scale, span_km: f64, resolution_m: f64) -> Self {
        Self {
            scale,
            center,
            bounds: BoundingBox::around(center, span_km),
            span_km,
            resolution_m,
        }
    }

    /// Window with the default span and resolution for `scale`
    pub fn with_defaults(center: Coordinate, scale: Scale) -> Self {
        Self::new(center, scale, scale.default_span_km(), scale.default_resolution_m())
    }

    /// Pixel dimensions (width, height) at the target resolution
    pub fn dimensions(&self) -> (u32, u32) {
        let pixels = ((self.span_km * 1000.0) / self.resolution_m).ceil().max(1.0) as u32;
        (pixels, pixels)
    }

    /// Approximate area in square kilometres
    pub fn area_km2(&self) -> f64 {
        self.bounds.area_km2()
    }
}
