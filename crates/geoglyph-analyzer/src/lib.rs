//! Geoglyph Analyzer
//!
//! Turns composite images into candidate discoveries through an inference
//! provider.
//!
//! # Architecture
//!
//! ```text
//! CompositeImage → PromptBuilder → InferenceProvider → parser → Discovery
//! ```
//!
//! Each scale has its own prompt template and response shape, tagged by
//! `analysis_type`. Replies with the wrong tag are discarded as a whole;
//! individual candidates that fail validation are quarantined. After the
//! three scales of a region, an optional leverage call is seeded with the
//! strongest discoveries so far.
//!
//! # Example Usage
//!
//! ```
//! use geoglyph_analyzer::{AnalyzerConfig, DiscoveryAnalyzer};
//! use geoglyph_llm::MockProvider;
//!
//! let provider = MockProvider::new(r#"{"analysis_type": "zone_site_detection", "sites_detected": []}"#);
//! let analyzer = DiscoveryAnalyzer::new(provider, AnalyzerConfig::default()).unwrap();
//! assert!(analyzer.config().leverage_enabled);
//! ```

#![warn(missing_docs)]

mod analyzer;
mod config;
mod error;
mod parser;
mod prompt;
mod schema;
mod types;

pub use analyzer::{select_seeds, DiscoveryAnalyzer};
pub use config::AnalyzerConfig;
pub use error::AnalyzerError;
pub use parser::{
    candidates, extract_json, parse_response, ParsedResponse, HIGH_PRIORITY_CONFIDENCE,
    MEDIUM_PRIORITY_CONFIDENCE,
};
pub use prompt::{PromptBuilder, JSON_ONLY_INSTRUCTION};
pub use schema::{
    AnalysisResponse, CoordinateValue, DetectedSite, FinalAssessment, LeverageDiscovery,
    PatternDiscovery, PriorityZone, RegionalNetwork, ResponseKind, SettlementCluster,
    SiteClassification, SiteDetailedMapping, ZoneSiteDetection,
};
pub use types::{AnalysisOutcome, Candidate, Quarantined};
