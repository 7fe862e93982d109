//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use geoglyph_analyzer::AnalyzerConfig;
use geoglyph_processor::ProcessorConfig;
use geoglyph_results::ResultsConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    /// Global settings
    #[serde(default)]
    pub settings: Settings,

    /// Imagery service
    #[serde(default)]
    pub imagery: ImageryConfig,

    /// Inference service
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Multi-scale processor
    #[serde(default)]
    pub processor: ProcessorConfig,

    /// Discovery analyzer
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    /// Results manager
    #[serde(default)]
    pub results: ResultsConfig,
}

/// Global CLI settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,

    /// Directory for submissions, images and the progress marker
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Region configuration JSON (built-in registry when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regions_file: Option<PathBuf>,

    /// Regions analyzed when none are named
    #[serde(default = "default_max_regions")]
    pub max_regions: usize,

    /// Seed of the synthetic imagery used by offline runs
    #[serde(default)]
    pub offline_seed: u64,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
}

/// Imagery service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageryConfig {
    /// Base URL of the raster service
    pub endpoint: String,

    /// Environment variable holding the bearer token
    pub token_env: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Inference service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Base URL of the OpenAI-compatible API
    pub endpoint: String,

    /// Model name
    pub model: String,

    /// API key; `OPENAI_API_KEY` is used when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Sampling temperature
    pub temperature: f32,

    /// Send heatmaps as images
    pub vision: bool,
}

impl Config {
    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".geoglyph").join("config.toml"))
    }

    /// Load configuration from the default path, or defaults when missing.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit file, which must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| CliError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let config = Self::from_toml(&contents)?;
        Ok(config)
    }

    /// Parse and validate configuration TOML.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.processor
            .validate()
            .map_err(|e| CliError::Config(format!("processor: {}", e)))?;
        self.analyzer
            .validate()
            .map_err(|e| CliError::Config(format!("analyzer: {}", e)))?;
        self.results
            .validate()
            .map_err(|e| CliError::Config(format!("results: {}", e)))?;
        if self.settings.max_regions == 0 {
            return Err(CliError::Config("settings: max_regions must be greater than 0".into()));
        }
        Ok(())
    }

    /// Config to print: the API key is never shown.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.inference.api_key.is_some() {
            config.inference.api_key = Some("********".to_string());
        }
        config
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
            output_dir: default_output_dir(),
            regions_file: None,
            max_regions: default_max_regions(),
            offline_seed: 0,
        }
    }
}

impl Default for ImageryConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8400".to_string(),
            token_env: "GEOGLYPH_IMAGERY_TOKEN".to_string(),
            timeout_secs: 300,
        }
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            endpoint: geoglyph_llm::openai::DEFAULT_ENDPOINT.to_string(),
            model: geoglyph_llm::openai::DEFAULT_MODEL.to_string(),
            api_key: None,
            timeout_secs: geoglyph_llm::openai::DEFAULT_TIMEOUT_SECS,
            temperature: 0.1,
            vision: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("geoglyph_output")
}

fn default_max_regions() -> usize {
    5
}
