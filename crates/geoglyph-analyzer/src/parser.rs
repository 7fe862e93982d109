//! Parse model output into validated responses and candidates

use crate::error::AnalyzerError;
use crate::schema::{
    AnalysisResponse, CoordinateValue, LeverageDiscovery, RegionalNetwork, ResponseKind,
    SiteDetailedMapping, ZoneSiteDetection,
};
use crate::types::{Candidate, Quarantined};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;

/// Confidence assigned to high-priority zones
pub const HIGH_PRIORITY_CONFIDENCE: f64 = 0.7;

/// Confidence assigned to medium-priority zones
pub const MEDIUM_PRIORITY_CONFIDENCE: f64 = 0.5;

/// A response of the expected kind plus the items that failed to decode
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResponse {
    /// Decoded response
    pub response: AnalysisResponse,

    /// Items that did not match their schema
    pub quarantined: Vec<Quarantined>,
}

/// Parse a model reply, requiring the `analysis_type` of `expected`
///
/// The whole reply is rejected when it is not a JSON object or carries a
/// different tag. Individual list items that fail to decode are quarantined.
pub fn parse_response(response: &str, expected: ResponseKind) -> Result<ParsedResponse, AnalyzerError> {
    let json_str = extract_json(response)?;

    let json: Value = serde_json::from_str(json_str)
        .map_err(|e| AnalyzerError::InvalidFormat(format!("JSON parse error: {}", e)))?;

    let obj = json
        .as_object()
        .ok_or_else(|| AnalyzerError::InvalidFormat("Expected JSON object".to_string()))?;

    let tag = obj
        .get("analysis_type")
        .and_then(Value::as_str)
        .ok_or_else(|| AnalyzerError::InvalidFormat("Missing 'analysis_type'".to_string()))?;

    let Some(kind) = ResponseKind::from_tag(tag) else {
        return Err(AnalyzerError::InvalidFormat(format!("Unknown analysis_type '{}'", tag)));
    };
    if kind != expected {
        return Err(AnalyzerError::TagMismatch {
            expected: expected.tag().to_string(),
            actual: tag.to_string(),
        });
    }

    let mut quarantined = Vec::new();
    let response = match kind {
        ResponseKind::RegionalNetwork => AnalysisResponse::RegionalNetwork(RegionalNetwork {
            settlement_clusters: items(obj, "settlement_clusters", &mut quarantined),
            priority_zones: items(obj, "priority_zones", &mut quarantined),
        }),
        ResponseKind::ZoneSiteDetection => AnalysisResponse::ZoneSiteDetection(ZoneSiteDetection {
            sites_detected: items(obj, "sites_detected", &mut quarantined),
        }),
        ResponseKind::SiteDetailedMapping => {
            let mapping: SiteDetailedMapping = serde_json::from_value(json.clone())
                .map_err(|e| AnalyzerError::InvalidFormat(format!("site mapping: {}", e)))?;
            AnalysisResponse::SiteDetailedMapping(mapping)
        }
        ResponseKind::LeverageDiscovery => AnalysisResponse::LeverageDiscovery(LeverageDiscovery {
            pattern_based_discoveries: items(obj, "pattern_based_discoveries", &mut quarantined),
        }),
    };

    Ok(ParsedResponse { response, quarantined })
}

/// Extract JSON from a reply, handling markdown code blocks and stray prose
pub fn extract_json(response: &str) -> Result<&str, AnalyzerError> {
    let trimmed = response.trim();

    if trimmed.starts_with("```") {
        // Skip the opening fence line (```json or ```) and the closing fence
        let body = trimmed
            .split_once('\n')
            .map(|(_, rest)| rest)
            .ok_or_else(|| AnalyzerError::InvalidFormat("Empty code block".to_string()))?;
        let body = body.trim_end();
        let body = body.strip_suffix("```").unwrap_or(body);
        return Ok(body.trim());
    }

    if trimmed.starts_with('{') {
        return Ok(trimmed);
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => Ok(&trimmed[start..=end]),
        _ => Err(AnalyzerError::InvalidFormat("No JSON object in response".to_string())),
    }
}

/// Decode each element of `obj[field]`, quarantining the ones that fail
fn items<T: DeserializeOwned>(obj: &Map<String, Value>, field: &str, quarantined: &mut Vec<Quarantined>) -> Vec<T> {
    let Some(value) = obj.get(field) else {
        return Vec::new();
    };
    let Some(array) = value.as_array() else {
        quarantine(quarantined, field.to_string(), "expected an array".to_string());
        return Vec::new();
    };

    array
        .iter()
        .enumerate()
        .filter_map(|(idx, item)| match serde_json::from_value::<T>(item.clone()) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                quarantine(quarantined, format!("{}[{}]", field, idx), e.to_string());
                None
            }
        })
        .collect()
}

fn quarantine(quarantined: &mut Vec<Quarantined>, location: String, reason: String) {
    warn!(location = %location, reason = %reason, "Candidate quarantined");
    quarantined.push(Quarantined { location, reason });
}

fn check_confidence(value: f64) -> Result<f64, String> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("confidence {} is outside [0, 1]", value))
    }
}

/// Turn a response into validated candidates, in response order
///
/// Low-priority zones are skipped without quarantine.
pub fn candidates(response: &AnalysisResponse) -> (Vec<Candidate>, Vec<Quarantined>) {
    let mut accepted = Vec::new();
    let mut quarantined = Vec::new();

    let mut accept = |location: String,
                      coordinates: &CoordinateValue,
                      confidence: Result<f64, String>,
                      site_type: &str,
                      features: Vec<String>,
                      model_id: Option<String>| {
        let checked = coordinates
            .to_coordinate()
            .and_then(|coordinate| confidence.map(|confidence| (coordinate, confidence)));
        match checked {
            Ok((coordinate, confidence)) => accepted.push(Candidate {
                coordinate,
                confidence,
                site_type: site_type.to_string(),
                features,
                model_id,
            }),
            Err(reason) => quarantine(&mut quarantined, location, reason),
        }
    };

    match response {
        AnalysisResponse::RegionalNetwork(network) => {
            for (idx, cluster) in network.settlement_clusters.iter().enumerate() {
                let mut features = Vec::new();
                if let Some(size) = cluster.cluster_size_km {
                    features.push(format!("cluster_size_km: {}", size));
                }
                if let Some(count) = cluster.site_count_estimate {
                    features.push(format!("site_count_estimate: {}", count));
                }
                accept(
                    format!("settlement_clusters[{}]", idx),
                    &cluster.center_coordinates,
                    check_confidence(cluster.confidence),
                    "settlement_cluster",
                    features,
                    None,
                );
            }
            for (idx, zone) in network.priority_zones.iter().enumerate() {
                let location = format!("priority_zones[{}]", idx);
                let confidence = match zone.priority_level.to_lowercase().as_str() {
                    "high" => Ok(HIGH_PRIORITY_CONFIDENCE),
                    "medium" => Ok(MEDIUM_PRIORITY_CONFIDENCE),
                    "low" => continue,
                    other => Err(format!("unknown priority_level '{}'", other)),
                };
                let site_type = zone.expected_site_type.as_deref().unwrap_or("priority_zone");
                let features = zone.reasoning.iter().cloned().collect();
                accept(location, &zone.center_coordinates, confidence, site_type, features, None);
            }
        }
        AnalysisResponse::ZoneSiteDetection(zone) => {
            for (idx, site) in zone.sites_detected.iter().enumerate() {
                accept(
                    format!("sites_detected[{}]", idx),
                    &site.center_coordinates,
                    check_confidence(site.confidence_score),
                    &site.site_type,
                    site.features_detected.clone(),
                    site.site_id.clone(),
                );
            }
        }
        AnalysisResponse::SiteDetailedMapping(site) => {
            accept(
                "site_center".to_string(),
                &site.site_center,
                check_confidence(site.final_assessment.archaeological_confidence),
                &site.site_classification.tier,
                site.features_detected.clone().unwrap_or_default(),
                site.site_id.clone(),
            );
        }
        AnalysisResponse::LeverageDiscovery(leverage) => {
            for (idx, found) in leverage.pattern_based_discoveries.iter().enumerate() {
                accept(
                    format!("pattern_based_discoveries[{}]", idx),
                    &found.center_coordinates,
                    check_confidence(found.confidence_based_on_pattern),
                    &found.predicted_type,
                    found.matching_patterns.clone(),
                    found.discovery_id.clone(),
                );
            }
        }
    }

    (accepted, quarantined)
}
