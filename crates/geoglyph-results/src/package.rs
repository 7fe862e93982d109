//! Submission package and the manager that assembles it

use crate::compliance::Compliance;
use crate::config::ResultsConfig;
use crate::dedup::{deduplicate, rank};
use crate::error::ResultsError;
use crate::footprint::{footprints, Footprint};
use crate::io::write_atomic;
use crate::report::render_markdown;
use chrono::{DateTime, Utc};
use geoglyph_domain::{Discovery, PromptRecord, RunId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Final output of a run
///
/// Immutable once serialized. The same inputs always serialize to the same
/// JSON apart from `generated_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionPackage {
    /// Run that produced the package
    pub run_id: RunId,

    /// Generation time
    pub generated_at: DateTime<Utc>,

    /// Model identifier of the inference provider
    #[serde(default)]
    pub model: String,

    /// Regions analyzed, in run order
    pub regions: Vec<String>,

    /// Selected discoveries, ranked
    pub discoveries: Vec<Discovery>,

    /// Footprints of the selected discoveries, same order
    #[serde(default)]
    pub footprints: Vec<Footprint>,

    /// Unique candidates before selection
    pub total_candidates: usize,

    /// Dataset identifiers used, sorted
    pub dataset_ids: Vec<String>,

    /// Prompts in issue order
    pub prompts: Vec<PromptRecord>,

    /// Checklist outcome
    pub compliance: Compliance,
}

impl SubmissionPackage {
    /// Parse a package from JSON
    pub fn from_json(json: &str) -> Result<Self, ResultsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, ResultsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a package file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ResultsError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&contents)
    }

    /// File stem shared by the JSON and Markdown outputs
    pub fn file_stem(&self) -> String {
        self.generated_at.format("%Y%m%d_%H%M%S").to_string()
    }
}

/// Paths written for a package
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenFiles {
    /// Submission JSON
    pub json: PathBuf,

    /// Markdown summary, when enabled
    pub markdown: Option<PathBuf>,
}

/// Collects the output of a run and turns it into a package
#[derive(Debug, Clone)]
pub struct ResultsManager {
    config: ResultsConfig,
    regions: Vec<String>,
    discoveries: Vec<Discovery>,
    prompts: Vec<PromptRecord>,
    dataset_ids: BTreeSet<String>,
}

impl ResultsManager {
    /// Create an empty manager
    pub fn new(config: ResultsConfig) -> Result<Self, ResultsError> {
        config.validate().map_err(ResultsError::Config)?;
        Ok(Self {
            config,
            regions: Vec::new(),
            discoveries: Vec::new(),
            prompts: Vec::new(),
            dataset_ids: BTreeSet::new(),
        })
    }

    /// Active configuration
    pub fn config(&self) -> &ResultsConfig {
        &self.config
    }

    /// Mark a region as analyzed
    pub fn record_region(&mut self, region_id: impl Into<String>) {
        let region_id = region_id.into();
        if !self.regions.contains(&region_id) {
            self.regions.push(region_id);
        }
    }

    /// Record an issued prompt
    pub fn record_prompt(&mut self, record: PromptRecord) {
        self.prompts.push(record);
    }

    /// Record datasets that contributed imagery
    pub fn record_datasets<'a>(&mut self, dataset_ids: impl IntoIterator<Item = &'a String>) {
        self.dataset_ids.extend(dataset_ids.into_iter().cloned());
    }

    /// Add discoveries
    pub fn add_discoveries(&mut self, discoveries: impl IntoIterator<Item = Discovery>) {
        for discovery in discoveries {
            self.dataset_ids
                .extend(discovery.provenance.dataset_ids.iter().cloned());
            self.discoveries.push(discovery);
        }
    }

    /// Regions recorded so far
    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    /// All discoveries recorded so far
    pub fn discoveries(&self) -> &[Discovery] {
        &self.discoveries
    }

    /// Prompts recorded so far
    pub fn prompts(&self) -> &[PromptRecord] {
        &self.prompts
    }

    /// Build the package: deduplicate, rank, select and evaluate the checklist
    pub fn build(&self, run_id: RunId, generated_at: DateTime<Utc>, model: &str) -> SubmissionPackage {
        let unique = deduplicate(&self.discoveries, self.config.dedup_tolerance_m);
        let total_candidates = unique.len();
        debug!(
            recorded = self.discoveries.len(),
            unique = total_candidates,
            "Discoveries deduplicated"
        );

        let mut selected = rank(unique);
        selected.truncate(self.config.effective_top_n());

        let dataset_ids: Vec<String> = self.dataset_ids.iter().cloned().collect();
        let compliance = Compliance::evaluate(&selected, &dataset_ids, &self.prompts);

        info!(
            selected = selected.len(),
            critical_met = compliance.critical_requirements_met,
            "Submission package built"
        );

        SubmissionPackage {
            run_id,
            generated_at,
            model: model.to_string(),
            regions: self.regions.clone(),
            footprints: footprints(&selected, self.config.footprint_radius_m),
            discoveries: selected,
            total_candidates,
            dataset_ids,
            prompts: self.prompts.clone(),
            compliance,
        }
    }

    /// Write the package JSON and, if enabled, the Markdown summary into `dir`
    pub fn write(&self, package: &SubmissionPackage, dir: &Path) -> Result<WrittenFiles, ResultsError> {
        let stem = package.file_stem();

        let json = dir.join(format!("submission_{}.json", stem));
        write_atomic(&json, package.to_json()?.as_bytes())?;
        info!(path = %json.display(), "Submission written");

        let markdown = if self.config.write_markdown {
            let path = dir.join(format!("summary_{}.md", stem));
            write_atomic(&path, render_markdown(package).as_bytes())?;
            info!(path = %path.display(), "Summary written");
            Some(path)
        } else {
            None
        };

        Ok(WrittenFiles { json, markdown })
    }
}
