//! Sequential region pipeline and its run context

use crate::error::{CliError, Result};
use crate::progress::{CompletedRegion, ProgressMarker, PROGRESS_FILE};
use chrono::Utc;
use geoglyph_analyzer::DiscoveryAnalyzer;
use geoglyph_domain::{
    Discovery, ImagerySource, InferenceProvider, Recoverability, Region, RunId, Scale,
};
use geoglyph_llm::MockProvider;
use geoglyph_processor::{export_heatmap, MultiScaleProcessor, RegionImagery};
use geoglyph_results::{ResultsConfig, ResultsManager, SubmissionPackage, WrittenFiles};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// State threaded through every stage of one run
pub struct RunContext {
    run_id: RunId,
    output_dir: PathBuf,
    results: ResultsManager,
    progress: ProgressMarker,
    export_images: bool,
}

impl RunContext {
    /// Start a fresh run writing into `output_dir`
    pub fn new(output_dir: impl Into<PathBuf>, config: ResultsConfig, export_images: bool) -> Result<Self> {
        let run_id = RunId::new();
        Ok(Self {
            run_id,
            output_dir: output_dir.into(),
            results: ResultsManager::new(config)?,
            progress: ProgressMarker::new(run_id),
            export_images,
        })
    }

    /// Continue the run recorded in the progress marker, or start fresh
    ///
    /// Discoveries, prompts and datasets of completed regions are restored.
    pub fn resume(output_dir: impl Into<PathBuf>, config: ResultsConfig, export_images: bool) -> Result<Self> {
        let output_dir = output_dir.into();
        let Some(marker) = ProgressMarker::load(&output_dir.join(PROGRESS_FILE))? else {
            info!("No progress marker found, starting a new run");
            return Self::new(output_dir, config, export_images);
        };

        let mut results = ResultsManager::new(config)?;
        for region in &marker.completed {
            results.record_region(&region.region_id);
            results.record_datasets(&region.dataset_ids);
            for prompt in &region.prompts {
                results.record_prompt(prompt.clone());
            }
            results.add_discoveries(region.discoveries.iter().cloned());
        }
        info!(
            run_id = %marker.run_id,
            completed = marker.completed.len(),
            "Resuming run"
        );

        Ok(Self {
            run_id: marker.run_id,
            output_dir,
            results,
            progress: marker,
            export_images,
        })
    }

    /// Identifier of the run
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Output directory
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Collected results
    pub fn results(&self) -> &ResultsManager {
        &self.results
    }

    /// Progress so far
    pub fn progress(&self) -> &ProgressMarker {
        &self.progress
    }

    /// Path of the progress marker
    pub fn marker_path(&self) -> PathBuf {
        self.output_dir.join(PROGRESS_FILE)
    }

    fn complete_region(&mut self, completed: CompletedRegion) -> Result<()> {
        self.results.record_region(&completed.region_id);
        self.results.record_datasets(&completed.dataset_ids);
        for prompt in &completed.prompts {
            self.results.record_prompt(prompt.clone());
        }
        self.results.add_discoveries(completed.discoveries.iter().cloned());

        self.progress.record(completed);
        self.progress.save(&self.marker_path())
    }

    /// Build the package and write the submission files
    pub fn finish(&self, model: &str) -> Result<(SubmissionPackage, WrittenFiles)> {
        let package = self.results.build(self.run_id, Utc::now(), model);
        let written = self.results.write(&package, &self.output_dir)?;
        Ok((package, written))
    }
}

/// Process, analyze and record each region in order
///
/// Regions already in the progress marker are skipped. A fatal imagery or
/// inference error stops the run; the marker keeps the regions finished so
/// far.
pub fn run_pipeline<S, L>(
    ctx: &mut RunContext,
    processor: &MultiScaleProcessor<S>,
    analyzer: &DiscoveryAnalyzer<L>,
    regions: &[Region],
) -> Result<()>
where
    S: ImagerySource,
    S::Error: Recoverability + Display,
    L: InferenceProvider,
    L::Error: Recoverability + Display,
{
    for (idx, region) in regions.iter().enumerate() {
        if ctx.progress.is_complete(&region.id) {
            info!(region = %region.id, "Region already completed, skipping");
            continue;
        }
        info!(region = %region.id, "Region {}/{}", idx + 1, regions.len());

        let completed = process_region(ctx, processor, analyzer, region)?;
        info!(
            region = %region.id,
            discoveries = completed.discoveries.len(),
            prompts = completed.prompts.len(),
            "Region completed"
        );
        ctx.complete_region(completed)?;
    }
    Ok(())
}

fn process_region<S, L>(
    ctx: &RunContext,
    processor: &MultiScaleProcessor<S>,
    analyzer: &DiscoveryAnalyzer<L>,
    region: &Region,
) -> Result<CompletedRegion>
where
    S: ImagerySource,
    S::Error: Recoverability + Display,
    L: InferenceProvider,
    L::Error: Recoverability + Display,
{
    let mut completed = CompletedRegion::new(&region.id);

    let imagery = match processor.process_region(region) {
        Ok(imagery) => imagery,
        Err(e) if e.is_fatal() => return Err(e.into()),
        Err(e) => {
            warn!(region = %region.id, error = %e, "Region imagery failed, continuing without composites");
            RegionImagery::default()
        }
    };
    completed.skipped_scales = imagery.skipped.iter().map(|s| s.scale).collect();

    for composite in &imagery.composites {
        completed.add_datasets(&composite.dataset_ids);

        if ctx.export_images {
            match export_heatmap(composite, &ctx.output_dir) {
                Ok(path) => info!(path = %path.display(), "Heatmap exported"),
                Err(e) => warn!(region = %region.id, error = %e, "Heatmap export failed"),
            }
        }

        let outcome = analyzer.analyze(region, composite)?;
        completed.absorb(outcome);
    }

    // Seeds come from the whole run, not only this region
    let prior: Vec<Discovery> = ctx
        .results
        .discoveries()
        .iter()
        .chain(completed.discoveries.iter())
        .cloned()
        .collect();

    if !prior.is_empty() {
        let regional = processor
            .windows(region)
            .into_iter()
            .find(|w| w.scale == Scale::Regional)
            .ok_or_else(|| CliError::Config("no regional window".to_string()))?;

        if let Some(outcome) = analyzer.leverage(region, &regional, &prior)? {
            completed.absorb(outcome);
        }
    }

    Ok(completed)
}

/// Empty replies served by the offline provider, keyed by prompt header
///
/// A site mapping has no empty form, so offline site analyses are discarded.
const OFFLINE_REPLIES: [(&str, &str); 3] = [
    (
        "REGIONAL NETWORK ANALYSIS",
        r#"{"analysis_type": "regional_network", "settlement_clusters": [], "priority_zones": []}"#,
    ),
    (
        "ZONE SITE DETECTION",
        r#"{"analysis_type": "zone_site_detection", "sites_detected": []}"#,
    ),
    (
        "LEVERAGE DISCOVERY",
        r#"{"analysis_type": "leverage_discovery", "pattern_based_discoveries": []}"#,
    ),
];

/// Mock provider for offline runs
pub fn offline_provider() -> MockProvider {
    let mut provider = MockProvider::new("{}");
    for (header, reply) in OFFLINE_REPLIES {
        provider.add_response_containing(header, reply);
    }
    provider
}
