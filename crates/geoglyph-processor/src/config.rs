//! Configuration for the processor

use chrono::NaiveDate;
use geoglyph_domain::{DateRange, DomainError, Scale};
use serde::{Deserialize, Serialize};

/// Window geometry for one scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleSettings {
    /// Side length in kilometres
    pub span_km: f64,

    /// Target resolution in metres per pixel
    pub resolution_m: f64,
}

impl ScaleSettings {
    /// Settings matching the scale defaults
    pub fn for_scale(scale: Scale) -> Self {
        Self {
            span_km: scale.default_span_km(),
            resolution_m: scale.default_resolution_m(),
        }
    }
}

/// Configuration for the multi-scale processor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// First acquisition day
    pub date_start: NaiveDate,

    /// Last acquisition day
    pub date_end: NaiveDate,

    /// Regional window
    pub regional: ScaleSettings,

    /// Zone window
    pub zone: ScaleSettings,

    /// Site window
    pub site: ScaleSettings,

    /// Minimum normalized index value for a hotspot
    pub hotspot_threshold: f32,

    /// Maximum hotspots reported per window
    pub max_hotspots: usize,

    /// Neighbourhood radius (pixels) of the radar texture filter
    pub texture_radius: u32,

    /// Neighbourhood radius (pixels) of the radar smoothness filter
    pub smoothness_radius: u32,

    /// Write heatmap PNGs next to the results
    pub export_images: bool,
}

impl ProcessorConfig {
    /// Window settings for a scale
    pub fn settings(&self, scale: Scale) -> ScaleSettings {
        match scale {
            Scale::Regional => self.regional,
            Scale::Zone => self.zone,
            Scale::Site => self.site,
        }
    }

    /// Acquisition date range
    pub fn date_range(&self) -> Result<DateRange, DomainError> {
        DateRange::new(self.date_start, self.date_end)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.date_range().map_err(|e| e.to_string())?;

        for scale in Scale::ALL {
            let settings = self.settings(scale);
            if !settings.span_km.is_finite() || settings.span_km <= 0.0 {
                return Err(format!("{} span_km must be greater than 0", scale));
            }
            if !settings.resolution_m.is_finite() || settings.resolution_m <= 0.0 {
                return Err(format!("{} resolution_m must be greater than 0", scale));
            }
        }
        if self.zone.span_km > self.regional.span_km || self.site.span_km > self.zone.span_km {
            return Err("window spans must shrink from regional to zone to site".to_string());
        }
        if !(0.0..=1.0).contains(&self.hotspot_threshold) {
            return Err("hotspot_threshold must be between 0.0 and 1.0".to_string());
        }
        if self.texture_radius == 0 || self.smoothness_radius == 0 {
            return Err("filter radii must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            date_start: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
            date_end: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap_or_default(),
            regional: ScaleSettings::for_scale(Scale::Regional),
            zone: ScaleSettings::for_scale(Scale::Zone),
            site: ScaleSettings::for_scale(Scale::Site),
            hotspot_threshold: 0.8,
            max_hotspots: 5,
            texture_radius: 2,
            smoothness_radius: 3,
            export_images: false,
        }
    }
}
