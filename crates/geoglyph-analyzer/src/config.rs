//! Configuration for the analyzer

use serde::{Deserialize, Serialize};

/// Configuration for the discovery analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Candidates below this confidence are dropped
    pub min_confidence: f64,

    /// Issue a leverage call after the scale analyses of each region
    pub leverage_enabled: bool,

    /// Number of prior discoveries the leverage prompt is seeded with
    pub leverage_seed_count: usize,

    /// Attach the heatmap PNG when the provider accepts images
    pub attach_images: bool,

    /// Maximum hotspots listed in a prompt
    pub prompt_hotspot_limit: usize,
}

impl AnalyzerConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err("min_confidence must be between 0.0 and 1.0".to_string());
        }
        if self.leverage_enabled && self.leverage_seed_count == 0 {
            return Err("leverage_seed_count must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Strict preset: only well-supported candidates
    pub fn strict() -> Self {
        Self {
            min_confidence: 0.6,
            ..Self::default()
        }
    }

    /// Exploratory preset: keep weak candidates, no leverage call
    pub fn exploratory() -> Self {
        Self {
            min_confidence: 0.1,
            leverage_enabled: false,
            ..Self::default()
        }
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

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.3,
            leverage_enabled: true,
            leverage_seed_count: 5,
            attach_images: true,
            prompt_hotspot_limit: 5,
        }
    }
}
