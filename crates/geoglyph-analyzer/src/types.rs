//! Request and result types for analysis

use geoglyph_domain::{Coordinate, Discovery, PromptRecord};
use serde::{Deserialize, Serialize};

/// A candidate rejected by validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quarantined {
    /// Position in the response (e.g. "sites_detected[2]")
    pub location: String,

    /// What was wrong with it
    pub reason: String,
}

/// A validated candidate before it becomes a discovery
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Site center
    pub coordinate: Coordinate,

    /// Confidence in [0, 1]
    pub confidence: f64,

    /// Site-type label
    pub site_type: String,

    /// Observed features
    pub features: Vec<String>,

    /// Identifier the model gave the candidate, if any
    pub model_id: Option<String>,
}

/// Result of one analysis call
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    /// The prompt and how the call ended
    pub record: PromptRecord,

    /// Discoveries emitted, in response order
    pub discoveries: Vec<Discovery>,

    /// Candidates rejected by validation
    pub quarantined: Vec<Quarantined>,

    /// Valid candidates dropped for low confidence
    pub below_threshold: usize,
}
