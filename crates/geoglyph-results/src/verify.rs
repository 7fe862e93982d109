//! Reproducibility check between two submissions

use crate::package::SubmissionPackage;
use geoglyph_domain::Coordinate;
use serde::Serialize;

/// How one discovery of the first run was matched in the second
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveryMatch {
    /// Discovery identifier in the first run
    pub id: String,

    /// Its coordinate
    pub coordinate: Coordinate,

    /// Nearest discovery of the second run
    pub matched_id: Option<String>,

    /// Distance to the nearest discovery in metres
    pub offset_m: Option<f64>,

    /// Whether the nearest discovery lies within tolerance
    pub reproduced: bool,
}

/// Result of comparing two runs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReproducibilityReport {
    /// Tolerance used
    pub tolerance_m: f64,

    /// One entry per discovery of the first run, in rank order
    pub matches: Vec<DiscoveryMatch>,
}

impl ReproducibilityReport {
    /// Number of reproduced discoveries
    pub fn reproduced_count(&self) -> usize {
        self.matches.iter().filter(|m| m.reproduced).count()
    }

    /// Whether every discovery was reproduced
    pub fn passed(&self) -> bool {
        self.matches.iter().all(|m| m.reproduced)
    }
}

/// Match each discovery of `first` to the nearest one in `second`
pub fn compare(first: &SubmissionPackage, second: &SubmissionPackage, tolerance_m: f64) -> ReproducibilityReport {
    let matches = first
        .discoveries
        .iter()
        .map(|discovery| {
            let nearest = second
                .discoveries
                .iter()
                .map(|other| (other, discovery.coordinate.distance_meters(&other.coordinate)))
                .min_by(|(a, da), (b, db)| da.total_cmp(db).then_with(|| a.id.cmp(&b.id)));

            match nearest {
                Some((other, offset)) => DiscoveryMatch {
                    id: discovery.id.clone(),
                    coordinate: discovery.coordinate,
                    matched_id: Some(other.id.clone()),
                    offset_m: Some(offset),
                    reproduced: offset <= tolerance_m,
                },
                None => DiscoveryMatch {
                    id: discovery.id.clone(),
                    coordinate: discovery.coordinate,
                    matched_id: None,
                    offset_m: None,
                    reproduced: false,
                },
            }
        })
        .collect();

    ReproducibilityReport { tolerance_m, matches }
}
