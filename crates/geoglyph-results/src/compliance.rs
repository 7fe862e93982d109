//! Compliance checklist evaluated over a submission

use geoglyph_domain::{AnalysisPass, Discovery, PromptRecord};
use serde::{Deserialize, Serialize};

/// Selected discoveries required for `minimum_discoveries`
pub const MINIMUM_DISCOVERIES: usize = 5;

/// Distinct datasets required for `two_independent_sources`
pub const MINIMUM_SOURCES: usize = 2;

/// Outcome of each checklist requirement
///
/// Field order is the serialized key order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compliance {
    /// At least two distinct dataset identifiers were used
    pub two_independent_sources: bool,

    /// At least five discoveries were selected
    pub minimum_discoveries: bool,

    /// Prompts were recorded and every selected discovery's prompt is among them
    pub prompts_logged: bool,

    /// Every selected discovery has a valid coordinate
    pub coordinates_present: bool,

    /// A leverage call was issued (informational)
    pub leverage_demonstrated: bool,

    /// The four requirements above `leverage_demonstrated` all hold
    pub critical_requirements_met: bool,
}

impl Compliance {
    /// Evaluate the checklist
    pub fn evaluate(selected: &[Discovery], dataset_ids: &[String], prompts: &[PromptRecord]) -> Self {
        let mut distinct: Vec<&String> = dataset_ids.iter().collect();
        distinct.sort();
        distinct.dedup();
        let two_independent_sources = distinct.len() >= MINIMUM_SOURCES;

        let minimum_discoveries = selected.len() >= MINIMUM_DISCOVERIES;

        let prompts_logged = !prompts.is_empty()
            && selected
                .iter()
                .all(|d| prompts.iter().any(|p| p.prompt == d.provenance.prompt));

        let coordinates_present =
            !selected.is_empty() && selected.iter().all(|d| d.coordinate.is_valid());

        let leverage_demonstrated = prompts.iter().any(|p| p.pass == AnalysisPass::Leverage);

        Self {
            two_independent_sources,
            minimum_discoveries,
            prompts_logged,
            coordinates_present,
            leverage_demonstrated,
            critical_requirements_met: two_independent_sources
                && minimum_discoveries
                && prompts_logged
                && coordinates_present,
        }
    }

    /// Requirements in checklist order
    pub fn items(&self) -> [(&'static str, bool); 6] {
        [
            ("two_independent_sources", self.two_independent_sources),
            ("minimum_discoveries", self.minimum_discoveries),
            ("prompts_logged", self.prompts_logged),
            ("coordinates_present", self.coordinates_present),
            ("leverage_demonstrated", self.leverage_demonstrated),
            ("critical_requirements_met", self.critical_requirements_met),
        ]
    }

    /// Names of requirements that did not hold
    pub fn failed(&self) -> Vec<&'static str> {
        self.items()
            .into_iter()
            .filter(|(_, ok)| !ok)
            .map(|(name, _)| name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoglyph_domain::{BoundingBox, Coordinate, PromptStatus, Provenance, Scale};

    fn prompt(text: &str, pass: AnalysisPass) -> PromptRecord {
        PromptRecord {
            region_id: "brazil_xingu".to_string(),
            scale: Scale::Zone,
            pass,
            prompt: text.to_string(),
            status: PromptStatus::Answered {
                discoveries: 1,
                quarantined: 0,
            },
        }
    }

    fn discoveries(count: usize, prompt: &str) -> Vec<Discovery> {
        (0..count)
            .map(|i| Discovery {
                id: format!("brazil_xingu_zone_{:03}", i + 1),
                region_id: "brazil_xingu".to_string(),
                coordinate: Coordinate::new(-12.45 + i as f64 * 0.01, -53.1),
                confidence: 0.8,
                site_type: "secondary".to_string(),
                features: Vec::new(),
                scale: Scale::Zone,
                pass: AnalysisPass::Primary,
                window: BoundingBox::around(Coordinate::new(-12.5, -53.0), 10.0),
                provenance: Provenance {
                    prompt: prompt.to_string(),
                    dataset_ids: Vec::new(),
                },
                rank: None,
            })
            .collect()
    }

    fn datasets() -> Vec<String> {
        vec![
            "COPERNICUS/S1_GRD".to_string(),
            "COPERNICUS/S2_SR_HARMONIZED".to_string(),
        ]
    }

    #[test]
    fn test_minimum_discoveries_boundary() {
        let prompts = vec![prompt("zone prompt", AnalysisPass::Primary)];

        let four = Compliance::evaluate(&discoveries(4, "zone prompt"), &datasets(), &prompts);
        assert!(!four.minimum_discoveries);
        assert!(!four.critical_requirements_met);

        let five = Compliance::evaluate(&discoveries(5, "zone prompt"), &datasets(), &prompts);
        assert!(five.minimum_discoveries);
        assert!(five.critical_requirements_met);
        assert!(!five.leverage_demonstrated);
    }

    #[test]
    fn test_sources_counted_once() {
        let prompts = vec![prompt("p", AnalysisPass::Primary)];
        let same = vec!["COPERNICUS/S1_GRD".to_string(), "COPERNICUS/S1_GRD".to_string()];
        let result = Compliance::evaluate(&discoveries(5, "p"), &same, &prompts);
        assert!(!result.two_independent_sources);
        assert!(!result.critical_requirements_met);
    }

    #[test]
    fn test_unlogged_prompt_fails() {
        let prompts = vec![prompt("other prompt", AnalysisPass::Primary)];
        let result = Compliance::evaluate(&discoveries(5, "zone prompt"), &datasets(), &prompts);
        assert!(!result.prompts_logged);

        let none = Compliance::evaluate(&[], &datasets(), &[]);
        assert!(!none.prompts_logged);
        assert!(!none.coordinates_present);
    }

    #[test]
    fn test_leverage_is_informational() {
        let prompts = vec![
            prompt("p", AnalysisPass::Primary),
            prompt("lev", AnalysisPass::Leverage),
        ];
        let result = Compliance::evaluate(&discoveries(5, "p"), &datasets(), &prompts);
        assert!(result.leverage_demonstrated);
        assert!(result.critical_requirements_met);
        assert!(result.failed().is_empty());
    }

    #[test]
    fn test_serialized_key_order() {
        let result = Compliance::evaluate(&[], &[], &[]);
        let json = serde_json::to_string(&result).unwrap();
        let positions: Vec<usize> = result
            .items()
            .iter()
            .map(|(name, _)| json.find(name).unwrap())
            .collect();
        let mut sorted = positions.clone();
        sorted.sort();
        assert_eq!(positions, sorted);
    }
}
