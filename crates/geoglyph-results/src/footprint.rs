//! Anomaly footprints - the submission-facing view of selected discoveries

use geoglyph_domain::{BoundingBox, Coordinate, Discovery, Scale};
use serde::{Deserialize, Serialize};

/// Confidence above which a footprint is reported as confirmed
pub const CONFIRMED_CONFIDENCE: f64 = 0.7;

/// Footprint radius used when none is configured
pub const DEFAULT_FOOTPRINT_RADIUS_M: f64 = 100.0;

/// Whether a footprint is considered confirmed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    /// Confidence above 0.7
    Confirmed,
    /// Anything else
    Candidate,
}

impl ValidationStatus {
    /// Status for a confidence value
    pub fn for_confidence(confidence: f64) -> Self {
        if confidence > CONFIRMED_CONFIDENCE {
            ValidationStatus::Confirmed
        } else {
            ValidationStatus::Candidate
        }
    }
}

/// Circular area around a selected discovery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    /// Identifier of the discovery
    pub discovery_id: String,

    /// Position in the ranking
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,

    /// Center rounded to 6 decimals
    pub center: Coordinate,

    /// Center as `"lat, lon"` text
    pub center_lat_lon: String,

    /// Radius of the footprint
    pub radius_m: f64,

    /// Square enclosing the footprint circle
    pub bounding_box: BoundingBox,

    /// Confidence rounded to 3 decimals
    pub confidence: f64,

    /// Site-type label
    pub site_type: String,

    /// Scale the discovery was found at
    pub scale: Scale,

    /// Confirmed or candidate
    pub validation_status: ValidationStatus,
}

impl Footprint {
    /// Project a discovery onto a footprint of `radius_m`
    pub fn from_discovery(discovery: &Discovery, radius_m: f64) -> Self {
        let center = Coordinate::new(round_to(discovery.coordinate.lat, 6), round_to(discovery.coordinate.lon, 6));
        Self {
            discovery_id: discovery.id.clone(),
            rank: discovery.rank,
            center_lat_lon: format!("{:.6}, {:.6}", center.lat, center.lon),
            center,
            radius_m,
            bounding_box: BoundingBox::around(center, 2.0 * radius_m / 1000.0),
            confidence: round_to(discovery.confidence, 3),
            site_type: discovery.site_type.clone(),
            scale: discovery.scale,
            validation_status: ValidationStatus::for_confidence(discovery.confidence),
        }
    }
}

/// Footprints of the selected discoveries, in ranking order
pub fn footprints(discoveries: &[Discovery], radius_m: f64) -> Vec<Footprint> {
    discoveries
        .iter()
        .map(|d| Footprint::from_discovery(d, radius_m))
        .collect()
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
