//! Discovery module - candidate archaeological site records

use crate::geo::{BoundingBox, Coordinate};
use crate::scale::Scale;
use serde::{Deserialize, Serialize};

/// Which analysis call produced a discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisPass {
    /// Per-scale analysis of a composite image
    Primary,

    /// Secondary call seeded with earlier high-confidence discoveries
    Leverage,
}

impl AnalysisPass {
    /// Get the pass name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisPass::Primary => "primary",
            AnalysisPass::Leverage => "leverage",
        }
    }
}

impl std::fmt::Display for AnalysisPass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a discovery came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    /// Prompt text sent to the inference API
    pub prompt: String,

    /// Source dataset identifiers the analysis was based on
    pub dataset_ids: Vec<String>,
}

/// How an inference call ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PromptStatus {
    /// Response parsed; counts of emitted and quarantined candidates
    Answered {
        /// Discoveries emitted
        discoveries: usize,
        /// Candidates rejected by validation
        quarantined: usize,
    },

    /// Response received but unusable (not JSON, wrong tag)
    Discarded {
        /// Why it was discarded
        reason: String,
    },

    /// Call failed before a response arrived
    Failed {
        /// Error message
        reason: String,
    },
}

/// A prompt issued during a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptRecord {
    /// Region the prompt was built for
    pub region_id: String,

    /// Window scale (regional for leverage prompts)
    pub scale: Scale,

    /// Analysis pass
    pub pass: AnalysisPass,

    /// Full prompt text
    pub prompt: String,

    /// Call outcome
    pub status: PromptStatus,
}

/// A candidate site interpreted from a composite image
///
/// Discoveries are immutable once created; the only later change is the
/// rank assigned by the results manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discovery {
    /// Unique identifier within a run (e.g. "brazil_xingu_zone_001")
    pub id: String,

    /// Region the discovery was found in
    pub region_id: String,

    /// Site center
    pub coordinate: Coordinate,

    /// Confidence in [0, 1]
    pub confidence: f64,

    /// Site-type label (e.g. "settlement_cluster", "secondary")
    pub site_type: String,

    /// Observed features
    #[serde(default)]
    pub features: Vec<String>,

    /// Scale of the window the discovery was found at
    pub scale: Scale,

    /// Analysis pass that produced it
    pub pass: AnalysisPass,

    /// Bounds of the window that was analyzed
    pub window: BoundingBox,

    /// Prompt and datasets used
    pub provenance: Provenance,

    /// Position in the final ranking (1-based)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
}

impl Discovery {
    /// Return the discovery with its rank set
    pub fn with_rank(mut self, rank: u32) -> Self {
        self.rank = Some(rank);
        self
    }

    /// Whether two discoveries describe the same candidate site
    ///
    /// True when they lie within `tolerance_m` of each other and the windows
    /// they were found in intersect.
    pub fn is_same_candidate(&self, other: &Discovery, tolerance_m: f64) -> bool {
        self.coordinate.distance_meters(&other.coordinate) < tolerance_m
            && self.window.intersects(&other.window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discovery(id: &str, lat: f64, lon: f64) -> Discovery {
        Discovery {
            id: id.to_string(),
            region_id: "brazil_xingu".to_string(),
            coordinate: Coordinate::new(lat, lon),
            confidence: 0.8,
            site_type: "secondary".to_string(),
            features: vec!["concentric_rings".to_string()],
            scale: Scale::Zone,
            pass: AnalysisPass::Primary,
            window: BoundingBox::around(Coordinate::new(lat, lon), 10.0),
            provenance: Provenance {
                prompt: "prompt".to_string(),
                dataset_ids: vec!["COPERNICUS/S1_GRD".to_string()],
            },
            rank: None,
        }
    }

    #[test]
    fn test_same_candidate_within_tolerance() {
        let a = discovery("a", -12.450779, -53.114006);
        let b = discovery("b", -12.450979, -53.114006); // ~22m south
        assert!(a.is_same_candidate(&b, 50.0));
    }

    #[test]
    fn test_not_same_candidate_one_km_apart() {
        let a = discovery("a", -12.450779, -53.114006);
        let mut b = a.clone();
        b.id = "b".to_string();
        b.coordinate = a.coordinate.offset_km(1.0, 0.0);
        assert!(!a.is_same_candidate(&b, 50.0));
    }

    #[test]
    fn test_not_same_candidate_disjoint_windows() {
        let a = discovery("a", -12.450779, -53.114006);
        let mut b = discovery("b", -12.450779, -53.114006);
        b.window = BoundingBox::around(Coordinate::new(10.0, 10.0), 2.0);
        assert!(!a.is_same_candidate(&b, 50.0));
    }

    #[test]
    fn test_rank_omitted_when_unset() {
        let json = serde_json::to_value(discovery("a", 0.0, 0.0)).unwrap();
        assert!(json.get("rank").is_none());

        let ranked = serde_json::to_value(discovery("a", 0.0, 0.0).with_rank(1)).unwrap();
        assert_eq!(ranked["rank"], 1);
    }
}
