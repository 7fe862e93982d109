//! Response types and the JSON schemas requested from the model
//!
//! Every response is a JSON object tagged with `analysis_type`. The schema
//! sent with a prompt is generated from the body type of the expected tag,
//! with the tag added as a `const` property.

use geoglyph_domain::{AnalysisPass, Coordinate, Scale};
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A coordinate as the model writes it: `"lat, lon"` or `[lat, lon]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum CoordinateValue {
    /// `[lat, lon]`
    Pair([f64; 2]),
    /// `"lat, lon"`
    Text(String),
}

impl CoordinateValue {
    /// Convert to a validated coordinate
    pub fn to_coordinate(&self) -> Result<Coordinate, String> {
        let coordinate = match self {
            CoordinateValue::Pair([lat, lon]) => Coordinate::new(*lat, *lon),
            CoordinateValue::Text(text) => {
                let parts: Vec<&str> = text.split(',').map(str::trim).collect();
                let [lat, lon] = parts.as_slice() else {
                    return Err(format!("expected 'lat, lon', got '{}'", text));
                };
                let parse = |s: &str| {
                    s.parse::<f64>()
                        .map_err(|_| format!("'{}' is not a number", s))
                };
                Coordinate::new(parse(*lat)?, parse(*lon)?)
            }
        };

        if coordinate.is_valid() {
            Ok(coordinate)
        } else {
            Err(format!("coordinate ({}, {}) is out of range", coordinate.lat, coordinate.lon))
        }
    }
}

/// Cluster of settlements seen at regional scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SettlementCluster {
    /// Cluster center
    pub center_coordinates: CoordinateValue,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Approximate extent
    #[serde(default)]
    pub cluster_size_km: Option<f64>,
    /// Number of sites the cluster is thought to contain
    #[serde(default)]
    pub site_count_estimate: Option<u32>,
}

/// Area recommended for closer inspection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PriorityZone {
    /// Zone center
    pub center_coordinates: CoordinateValue,
    /// "high", "medium" or "low"
    pub priority_level: String,
    /// Kind of site expected there
    #[serde(default)]
    pub expected_site_type: Option<String>,
    /// Free-text justification
    #[serde(default)]
    pub reasoning: Option<String>,
}

/// Body of a `regional_network` response
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct RegionalNetwork {
    /// Settlement clusters
    #[serde(default)]
    pub settlement_clusters: Vec<SettlementCluster>,
    /// Priority zones
    #[serde(default)]
    pub priority_zones: Vec<PriorityZone>,
}

/// Site detected at zone scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DetectedSite {
    /// Model-assigned identifier
    #[serde(default)]
    pub site_id: Option<String>,
    /// Site center
    pub center_coordinates: CoordinateValue,
    /// Site-type label
    pub site_type: String,
    /// Observed features
    #[serde(default)]
    pub features_detected: Vec<String>,
    /// Confidence in [0, 1]
    pub confidence_score: f64,
}

/// Body of a `zone_site_detection` response
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct ZoneSiteDetection {
    /// Detected sites
    #[serde(default)]
    pub sites_detected: Vec<DetectedSite>,
}

/// Site classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SiteClassification {
    /// Classification tier (e.g. "primary", "secondary")
    pub tier: String,
    /// Classification confidence
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Final assessment of a mapped site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FinalAssessment {
    /// Confidence in [0, 1] that the site is archaeological
    pub archaeological_confidence: f64,
}

/// Body of a `site_detailed_mapping` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SiteDetailedMapping {
    /// Model-assigned identifier
    #[serde(default)]
    pub site_id: Option<String>,
    /// Site center
    pub site_center: CoordinateValue,
    /// Classification
    pub site_classification: SiteClassification,
    /// Mapped features
    #[serde(default)]
    pub features_detected: Option<Vec<String>>,
    /// Overall verdict
    pub final_assessment: FinalAssessment,
}

/// Candidate predicted from earlier discoveries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PatternDiscovery {
    /// Model-assigned identifier
    #[serde(default)]
    pub discovery_id: Option<String>,
    /// Predicted center
    pub center_coordinates: CoordinateValue,
    /// Predicted site type
    pub predicted_type: String,
    /// Confidence in [0, 1]
    pub confidence_based_on_pattern: f64,
    /// Seed patterns the prediction is based on
    #[serde(default)]
    pub matching_patterns: Vec<String>,
}

/// Body of a `leverage_discovery` response
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct LeverageDiscovery {
    /// Predicted candidates
    #[serde(default)]
    pub pattern_based_discoveries: Vec<PatternDiscovery>,
}

/// A validated model response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "analysis_type", rename_all = "snake_case")]
pub enum AnalysisResponse {
    /// Regional overview
    RegionalNetwork(RegionalNetwork),
    /// Zone detection
    ZoneSiteDetection(ZoneSiteDetection),
    /// Site mapping
    SiteDetailedMapping(SiteDetailedMapping),
    /// Leverage pass
    LeverageDiscovery(LeverageDiscovery),
}

impl AnalysisResponse {
    /// Kind of the response
    pub fn kind(&self) -> ResponseKind {
        match self {
            AnalysisResponse::RegionalNetwork(_) => ResponseKind::RegionalNetwork,
            AnalysisResponse::ZoneSiteDetection(_) => ResponseKind::ZoneSiteDetection,
            AnalysisResponse::SiteDetailedMapping(_) => ResponseKind::SiteDetailedMapping,
            AnalysisResponse::LeverageDiscovery(_) => ResponseKind::LeverageDiscovery,
        }
    }
}

/// The four analysis calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseKind {
    /// `regional_network`
    RegionalNetwork,
    /// `zone_site_detection`
    ZoneSiteDetection,
    /// `site_detailed_mapping`
    SiteDetailedMapping,
    /// `leverage_discovery`
    LeverageDiscovery,
}

impl ResponseKind {
    /// All kinds
    pub const ALL: [ResponseKind; 4] = [
        ResponseKind::RegionalNetwork,
        ResponseKind::ZoneSiteDetection,
        ResponseKind::SiteDetailedMapping,
        ResponseKind::LeverageDiscovery,
    ];

    /// Kind requested for a primary analysis at `scale`
    pub fn for_scale(scale: Scale) -> Self {
        match scale {
            Scale::Regional => ResponseKind::RegionalNetwork,
            Scale::Zone => ResponseKind::ZoneSiteDetection,
            Scale::Site => ResponseKind::SiteDetailedMapping,
        }
    }

    /// Kind requested for a pass at `scale`
    pub fn for_pass(pass: AnalysisPass, scale: Scale) -> Self {
        match pass {
            AnalysisPass::Primary => Self::for_scale(scale),
            AnalysisPass::Leverage => ResponseKind::LeverageDiscovery,
        }
    }

    /// Value of `analysis_type`
    pub fn tag(&self) -> &'static str {
        match self {
            ResponseKind::RegionalNetwork => "regional_network",
            ResponseKind::ZoneSiteDetection => "zone_site_detection",
            ResponseKind::SiteDetailedMapping => "site_detailed_mapping",
            ResponseKind::LeverageDiscovery => "leverage_discovery",
        }
    }

    /// Parse a tag
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    /// JSON schema of the expected response
    pub fn schema_value(&self) -> Value {
        let root = match self {
            ResponseKind::RegionalNetwork => schema_for!(RegionalNetwork),
            ResponseKind::ZoneSiteDetection => schema_for!(ZoneSiteDetection),
            ResponseKind::SiteDetailedMapping => schema_for!(SiteDetailedMapping),
            ResponseKind::LeverageDiscovery => schema_for!(LeverageDiscovery),
        };
        let mut value = serde_json::to_value(root).unwrap_or_default();

        if let Value::Object(map) = &mut value {
            if let Some(Value::Object(props)) = map.get_mut("properties") {
                props.insert(
                    "analysis_type".to_string(),
                    serde_json::json!({ "type": "string", "const": self.tag() }),
                );
            }
            match map.get_mut("required") {
                Some(Value::Array(required)) => required.insert(0, Value::from("analysis_type")),
                _ => {
                    map.insert("required".to_string(), serde_json::json!(["analysis_type"]));
                }
            }
        }
        value
    }

    /// JSON schema as compact text
    pub fn schema(&self) -> String {
        self.schema_value().to_string()
    }
}

impl fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
