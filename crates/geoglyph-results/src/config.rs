//! Configuration for the results manager

use crate::footprint::DEFAULT_FOOTPRINT_RADIUS_M;
use geoglyph_domain::DEDUP_TOLERANCE_METERS;
use serde::{Deserialize, Serialize};

/// Smallest number of discoveries a submission selects
pub const MIN_TOP_N: usize = 5;

/// Configuration for the results manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultsConfig {
    /// Discoveries selected into the package (raised to at least 5)
    pub top_n: usize,

    /// Distance below which two discoveries are the same candidate
    pub dedup_tolerance_m: f64,

    /// Also write the Markdown summary
    pub write_markdown: bool,

    /// Radius of the anomaly footprint around each selected discovery
    pub footprint_radius_m: f64,
}

impl Default for ResultsConfig {
    fn default() -> Self {
        Self {
            top_n: MIN_TOP_N,
            dedup_tolerance_m: DEDUP_TOLERANCE_METERS,
            write_markdown: true,
            footprint_radius_m: DEFAULT_FOOTPRINT_RADIUS_M,
        }
    }
}

impl ResultsConfig {
    /// Number of discoveries actually selected
    pub fn effective_top_n(&self) -> usize {
        self.top_n.max(MIN_TOP_N)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dedup_tolerance_m.is_finite() || self.dedup_tolerance_m <= 0.0 {
            return Err("dedup_tolerance_m must be greater than 0".to_string());
        }
        if !self.footprint_radius_m.is_finite() || self.footprint_radius_m <= 0.0 {
            return Err("footprint_radius_m must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize TOML: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_n_floor() {
        let config = ResultsConfig {
            top_n: 2,
            ..ResultsConfig::default()
        };
        assert_eq!(config.effective_top_n(), 5);

        let config = ResultsConfig {
            top_n: 12,
            ..ResultsConfig::default()
        };
        assert_eq!(config.effective_top_n(), 12);
    }

    #[test]
    fn test_validate() {
        assert!(ResultsConfig::default().validate().is_ok());

        let config = ResultsConfig {
            dedup_tolerance_m: 0.0,
            ..ResultsConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ResultsConfig {
            footprint_radius_m: -5.0,
            ..ResultsConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_partial() {
        let config = ResultsConfig::from_toml("top_n = 8").unwrap();
        assert_eq!(config.top_n, 8);
        assert_eq!(config.dedup_tolerance_m, 50.0);
        assert!(config.write_markdown);
        assert_eq!(config.footprint_radius_m, 100.0);

        let round = ResultsConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(round, config);
    }
}
