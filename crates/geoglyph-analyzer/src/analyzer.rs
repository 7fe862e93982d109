//! Core analyzer implementation

use crate::config::AnalyzerConfig;
use crate::error::AnalyzerError;
use crate::parser::{candidates, parse_response};
use crate::prompt::PromptBuilder;
use crate::schema::ResponseKind;
use crate::types::{AnalysisOutcome, Quarantined};
use geoglyph_domain::{
    AnalysisPass, BoundingBox, CompositeImage, Discovery, InferenceProvider, PromptRecord,
    PromptStatus, Provenance, Recoverability, Region, Scale, ScaleWindow,
};
use geoglyph_processor::heatmap_png;
use std::fmt::Display;
use tracing::{debug, info, warn};

/// Everything one inference call needs besides the prompt
struct CallContext<'a> {
    region_id: &'a str,
    scale: Scale,
    pass: AnalysisPass,
    window: BoundingBox,
    dataset_ids: Vec<String>,
    /// Candidates outside these bounds are quarantined
    restrict_to: Option<BoundingBox>,
}

/// Interprets composites into discoveries through an inference provider
pub struct DiscoveryAnalyzer<L> {
    provider: L,
    config: AnalyzerConfig,
}

impl<L> DiscoveryAnalyzer<L>
where
    L: InferenceProvider,
    L::Error: Recoverability + Display,
{
    /// Create a new analyzer
    pub fn new(provider: L, config: AnalyzerConfig) -> Result<Self, AnalyzerError> {
        config.validate().map_err(AnalyzerError::Config)?;
        Ok(Self { provider, config })
    }

    /// Active configuration
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Underlying provider
    pub fn provider(&self) -> &L {
        &self.provider
    }

    /// Analyze one composite at its scale
    ///
    /// Recoverable failures are returned as a `Failed` or `Discarded` record
    /// with no discoveries. Only fatal provider errors are returned as `Err`.
    pub fn analyze(&self, region: &Region, composite: &CompositeImage) -> Result<AnalysisOutcome, AnalyzerError> {
        let scale = composite.window.scale;
        let prompt = PromptBuilder::new(region)
            .with_hotspot_limit(self.config.prompt_hotspot_limit)
            .build(composite);

        let image = if self.config.attach_images {
            match heatmap_png(&composite.heatmap) {
                Ok(png) => Some(png),
                Err(e) => {
                    warn!(region = %region.id, scale = %scale, error = %e, "Heatmap not attached");
                    None
                }
            }
        } else {
            None
        };

        let context = CallContext {
            region_id: &region.id,
            scale,
            pass: AnalysisPass::Primary,
            window: composite.window.bounds,
            dataset_ids: composite.dataset_ids.clone(),
            restrict_to: None,
        };

        self.call(context, prompt, ResponseKind::for_scale(scale), image.as_deref())
    }

    /// Issue the leverage call for a region
    ///
    /// Seeded with the strongest of `prior`; returns `None` when there is
    /// nothing to seed with or leverage is disabled. Predictions outside the
    /// regional window are quarantined.
    pub fn leverage(
        &self,
        region: &Region,
        window: &ScaleWindow,
        prior: &[Discovery],
    ) -> Result<Option<AnalysisOutcome>, AnalyzerError> {
        if !self.config.leverage_enabled {
            return Ok(None);
        }

        let seeds = select_seeds(prior, self.config.leverage_seed_count);
        if seeds.is_empty() {
            debug!(region = %region.id, "No discoveries to seed leverage call");
            return Ok(None);
        }

        let mut dataset_ids: Vec<String> = seeds
            .iter()
            .flat_map(|d| d.provenance.dataset_ids.iter().cloned())
            .collect();
        dataset_ids.sort();
        dataset_ids.dedup();

        let prompt = PromptBuilder::new(region).build_leverage(window, &seeds);
        info!(region = %region.id, seeds = seeds.len(), "Issuing leverage call");

        let context = CallContext {
            region_id: &region.id,
            scale: Scale::Regional,
            pass: AnalysisPass::Leverage,
            window: window.bounds,
            dataset_ids,
            restrict_to: Some(window.bounds),
        };

        self.call(context, prompt, ResponseKind::LeverageDiscovery, None).map(Some)
    }

    fn call(
        &self,
        context: CallContext<'_>,
        prompt: String,
        kind: ResponseKind,
        image: Option<&[u8]>,
    ) -> Result<AnalysisOutcome, AnalyzerError> {
        let schema = kind.schema();
        debug!("Prompt length: {} chars", prompt.len());

        let reply = match image {
            Some(png) => self.provider.generate_with_image(&prompt, &schema, png),
            None => self.provider.generate_structured(&prompt, &schema),
        };

        let record = |status| PromptRecord {
            region_id: context.region_id.to_string(),
            scale: context.scale,
            pass: context.pass,
            prompt: prompt.clone(),
            status,
        };
        let empty = |status| AnalysisOutcome {
            record: record(status),
            discoveries: Vec::new(),
            quarantined: Vec::new(),
            below_threshold: 0,
        };

        let text = match reply {
            Ok(text) => text,
            Err(e) if e.is_fatal() => {
                return Err(AnalyzerError::Inference {
                    message: e.to_string(),
                    fatal: true,
                });
            }
            Err(e) => {
                warn!(region = %context.region_id, analysis = %kind, error = %e, "Inference call failed");
                return Ok(empty(PromptStatus::Failed { reason: e.to_string() }));
            }
        };

        let parsed = match parse_response(&text, kind) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(region = %context.region_id, analysis = %kind, error = %e, "Response discarded");
                return Ok(empty(PromptStatus::Discarded { reason: e.to_string() }));
            }
        };

        let (accepted, rejected) = candidates(&parsed.response);
        let mut quarantined = parsed.quarantined;
        quarantined.extend(rejected);

        let prefix = match context.pass {
            AnalysisPass::Leverage => format!("{}_leverage", context.region_id),
            AnalysisPass::Primary => format!("{}_{}", context.region_id, context.scale),
        };

        let mut discoveries = Vec::new();
        let mut below_threshold = 0;
        for (idx, candidate) in accepted.into_iter().enumerate() {
            if let Some(bounds) = &context.restrict_to {
                if !bounds.contains(&candidate.coordinate) {
                    let entry = Quarantined {
                        location: format!("candidate[{}]", idx),
                        reason: format!("{} is outside the regional window", candidate.coordinate),
                    };
                    warn!(location = %entry.location, reason = %entry.reason, "Candidate quarantined");
                    quarantined.push(entry);
                    continue;
                }
            }
            if candidate.confidence < self.config.min_confidence {
                below_threshold += 1;
                continue;
            }

            discoveries.push(Discovery {
                id: format!("{}_{:03}", prefix, discoveries.len() + 1),
                region_id: context.region_id.to_string(),
                coordinate: candidate.coordinate,
                confidence: candidate.confidence,
                site_type: candidate.site_type,
                features: candidate.features,
                scale: context.scale,
                pass: context.pass,
                window: context.window,
                provenance: Provenance {
                    prompt: prompt.clone(),
                    dataset_ids: context.dataset_ids.clone(),
                },
                rank: None,
            });
        }

        info!(
            region = %context.region_id,
            analysis = %kind,
            discoveries = discoveries.len(),
            quarantined = quarantined.len(),
            below_threshold,
            "Analysis complete"
        );

        Ok(AnalysisOutcome {
            record: record(PromptStatus::Answered {
                discoveries: discoveries.len(),
                quarantined: quarantined.len(),
            }),
            discoveries,
            quarantined,
            below_threshold,
        })
    }
}

/// Strongest `count` discoveries, by confidence descending then id
pub fn select_seeds(prior: &[Discovery], count: usize) -> Vec<Discovery> {
    let mut seeds: Vec<Discovery> = prior.to_vec();
    seeds.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| a.id.cmp(&b.id))
    });
    seeds.truncate(count);
    seeds
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoglyph_domain::{Coordinate, DateRange, IndexStats, Priority, Raster, INDEX_BAND};
    use geoglyph_llm::{LlmError, MockProvider};

    const ZONE_REPLY: &str = r#"{"analysis_type": "zone_site_detection", "sites_detected": [
        {"center_coordinates": "-12.450779, -53.114006", "site_type": "secondary",
         "features_detected": ["ring_ditch"], "confidence_score": 1.0},
        {"center_coordinates": "-12.46, -53.10", "site_type": "mound",
         "features_detected": [], "confidence_score": 0.1},
        {"center_coordinates": "-12.47, -53.09", "site_type": "mound",
         "features_detected": [], "confidence_score": 0.6}
    ]}"#;

    fn region() -> Region {
        Region {
            id: "brazil_xingu".to_string(),
            name: "Upper Xingu Basin".to_string(),
            center: Coordinate::new(-12.5, -53.0),
            priority: Priority::High,
            known_sites: true,
            country: "Brazil".to_string(),
            note: String::new(),
        }
    }

    fn composite(scale: Scale) -> CompositeImage {
        let window = ScaleWindow::with_defaults(Coordinate::new(-12.5, -53.0), scale);
        CompositeImage {
            region_id: "brazil_xingu".to_string(),
            window,
            sources: Raster::new(2, 2),
            heatmap: Raster::new(2, 2).with_band(INDEX_BAND, vec![0.0, 0.5, 1.0, 0.25]).unwrap(),
            stats: IndexStats::default(),
            dataset_ids: vec![
                "COPERNICUS/S1_GRD".to_string(),
                "COPERNICUS/S2_SR_HARMONIZED".to_string(),
            ],
            date_range: DateRange::parse("2023-01-01", "2023-12-31").unwrap(),
            reference: format!("brazil_xingu_{}_composite", scale),
        }
    }

    fn analyzer(provider: MockProvider) -> DiscoveryAnalyzer<MockProvider> {
        DiscoveryAnalyzer::new(provider, AnalyzerConfig::default()).unwrap()
    }

    #[test]
    fn test_zone_analysis_emits_discoveries() {
        let mut provider = MockProvider::default();
        provider.add_response_containing("ZONE SITE DETECTION", ZONE_REPLY);
        let analyzer = analyzer(provider.clone());

        let outcome = analyzer.analyze(&region(), &composite(Scale::Zone)).unwrap();

        assert_eq!(outcome.discoveries.len(), 2);
        assert_eq!(outcome.below_threshold, 1);
        assert!(outcome.quarantined.is_empty());

        let first = &outcome.discoveries[0];
        assert_eq!(first.id, "brazil_xingu_zone_001");
        assert_eq!(first.coordinate, Coordinate::new(-12.450779, -53.114006));
        assert_eq!(first.pass, AnalysisPass::Primary);
        assert_eq!(first.scale, Scale::Zone);
        assert_eq!(first.provenance.prompt, outcome.record.prompt);
        assert_eq!(first.provenance.dataset_ids.len(), 2);
        // Ids are numbered over emitted discoveries
        assert_eq!(outcome.discoveries[1].id, "brazil_xingu_zone_002");

        assert_eq!(
            outcome.record.status,
            PromptStatus::Answered {
                discoveries: 2,
                quarantined: 0
            }
        );
        assert_eq!(provider.image_count(), 1);
    }

    #[test]
    fn test_images_not_attached_when_disabled() {
        let provider = MockProvider::default();
        let config = AnalyzerConfig {
            attach_images: false,
            ..AnalyzerConfig::default()
        };
        let analyzer = DiscoveryAnalyzer::new(provider.clone(), config).unwrap();
        analyzer.analyze(&region(), &composite(Scale::Zone)).unwrap();
        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.image_count(), 0);
    }

    #[test]
    fn test_mismatched_tag_discarded() {
        // Default mock reply is a zone response; a regional analysis rejects it
        let provider = MockProvider::new(ZONE_REPLY);
        let outcome = analyzer(provider).analyze(&region(), &composite(Scale::Regional)).unwrap();
        assert!(outcome.discoveries.is_empty());
        assert!(matches!(outcome.record.status, PromptStatus::Discarded { .. }));
    }

    #[test]
    fn test_non_json_discarded() {
        let provider = MockProvider::new("I see forest.");
        let outcome = analyzer(provider).analyze(&region(), &composite(Scale::Site)).unwrap();
        assert!(matches!(outcome.record.status, PromptStatus::Discarded { .. }));
        assert_eq!(outcome.record.scale, Scale::Site);
    }

    #[test]
    fn test_recoverable_error_recorded() {
        let mut provider = MockProvider::default();
        provider.add_error_containing(
            "ZONE SITE DETECTION",
            LlmError::Communication("connection reset".to_string()),
        );
        let outcome = analyzer(provider).analyze(&region(), &composite(Scale::Zone)).unwrap();
        assert_eq!(
            outcome.record.status,
            PromptStatus::Failed {
                reason: "Communication error: connection reset".to_string()
            }
        );
    }

    #[test]
    fn test_fatal_error_propagates() {
        let mut provider = MockProvider::default();
        provider.add_error_containing(
            "ZONE SITE DETECTION",
            LlmError::Authentication("invalid key".to_string()),
        );
        let err = analyzer(provider).analyze(&region(), &composite(Scale::Zone)).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_select_seeds_orders_by_confidence_then_id() {
        let mut provider = MockProvider::default();
        provider.add_response_containing("ZONE SITE DETECTION", ZONE_REPLY);
        let outcome = analyzer(provider).analyze(&region(), &composite(Scale::Zone)).unwrap();

        let mut prior = outcome.discoveries.clone();
        let mut tie = prior[1].clone();
        tie.id = "brazil_xingu_regional_001".to_string();
        prior.push(tie);

        let seeds = select_seeds(&prior, 2);
        let ids: Vec<_> = seeds.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["brazil_xingu_zone_001", "brazil_xingu_regional_001"]);
    }

    #[test]
    fn test_leverage_call() {
        let mut provider = MockProvider::default();
        provider.add_response_containing("ZONE SITE DETECTION", ZONE_REPLY);
        provider.add_response_containing(
            "LEVERAGE DISCOVERY",
            r#"{"analysis_type": "leverage_discovery", "pattern_based_discoveries": [
                {"center_coordinates": [-12.6, -53.2], "predicted_type": "ring_village",
                 "confidence_based_on_pattern": 0.7, "matching_patterns": ["ring_ditch"]},
                {"center_coordinates": [-14.0, -53.2], "predicted_type": "ring_village",
                 "confidence_based_on_pattern": 0.9, "matching_patterns": []}
            ]}"#,
        );
        let analyzer = analyzer(provider.clone());
        let region = region();
        let prior = analyzer.analyze(&region, &composite(Scale::Zone)).unwrap().discoveries;

        let window = ScaleWindow::with_defaults(region.center, Scale::Regional);
        let outcome = analyzer.leverage(&region, &window, &prior).unwrap().unwrap();

        assert_eq!(outcome.record.pass, AnalysisPass::Leverage);
        assert_eq!(outcome.record.scale, Scale::Regional);
        assert_eq!(outcome.discoveries.len(), 1);
        assert_eq!(outcome.discoveries[0].id, "brazil_xingu_leverage_001");
        assert_eq!(outcome.discoveries[0].window, window.bounds);
        // The second prediction lies ~165 km south of the window
        assert_eq!(outcome.quarantined.len(), 1);
        assert_eq!(
            outcome.discoveries[0].provenance.dataset_ids,
            vec!["COPERNICUS/S1_GRD", "COPERNICUS/S2_SR_HARMONIZED"]
        );
        // Leverage calls carry no image
        assert_eq!(provider.image_count(), 1);
    }

    #[test]
    fn test_leverage_skipped_without_seeds() {
        let provider = MockProvider::default();
        let analyzer = analyzer(provider.clone());
        let region = region();
        let window = ScaleWindow::with_defaults(region.center, Scale::Regional);
        assert!(analyzer.leverage(&region, &window, &[]).unwrap().is_none());
        assert_eq!(provider.call_count(), 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AnalyzerConfig {
            min_confidence: 1.5,
            ..AnalyzerConfig::default()
        };
        let result = DiscoveryAnalyzer::new(MockProvider::default(), config);
        assert!(matches!(result, Err(AnalyzerError::Config(_))));
    }
}
