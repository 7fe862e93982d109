//! Resumable progress marker

use crate::error::Result;
use chrono::{DateTime, Utc};
use geoglyph_analyzer::AnalysisOutcome;
use geoglyph_domain::{Discovery, PromptRecord, RunId, Scale};
use geoglyph_results::write_atomic;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name of the marker inside the output directory
pub const PROGRESS_FILE: &str = "pipeline_progress.json";

/// Everything a finished region contributed to the run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedRegion {
    /// Region identifier
    pub region_id: String,

    /// Discoveries from all analyses of the region
    pub discoveries: Vec<Discovery>,

    /// Prompts issued for the region
    pub prompts: Vec<PromptRecord>,

    /// Datasets of the composites that were built
    pub dataset_ids: Vec<String>,

    /// Scales whose window was skipped
    #[serde(default)]
    pub skipped_scales: Vec<Scale>,

    /// Candidates rejected by validation
    #[serde(default)]
    pub quarantined: usize,
}

impl CompletedRegion {
    /// Empty record for a region
    pub fn new(region_id: impl Into<String>) -> Self {
        Self {
            region_id: region_id.into(),
            discoveries: Vec::new(),
            prompts: Vec::new(),
            dataset_ids: Vec::new(),
            skipped_scales: Vec::new(),
            quarantined: 0,
        }
    }

    /// Add the outcome of one analysis call
    pub fn absorb(&mut self, outcome: AnalysisOutcome) {
        self.quarantined += outcome.quarantined.len();
        self.prompts.push(outcome.record);
        self.discoveries.extend(outcome.discoveries);
    }

    /// Add datasets, keeping them sorted and unique
    pub fn add_datasets(&mut self, dataset_ids: &[String]) {
        self.dataset_ids.extend(dataset_ids.iter().cloned());
        self.dataset_ids.sort();
        self.dataset_ids.dedup();
    }
}

/// Regions completed so far in a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressMarker {
    /// Run the marker belongs to
    pub run_id: RunId,

    /// Last update
    pub updated_at: DateTime<Utc>,

    /// Completed regions, in run order
    pub completed: Vec<CompletedRegion>,
}

impl ProgressMarker {
    /// Empty marker for a run
    pub fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            updated_at: Utc::now(),
            completed: Vec::new(),
        }
    }

    /// Read the marker, `None` when the file does not exist
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    /// Write the marker atomically
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        write_atomic(path, json.as_bytes())?;
        Ok(())
    }

    /// Whether a region already finished
    pub fn is_complete(&self, region_id: &str) -> bool {
        self.completed.iter().any(|r| r.region_id == region_id)
    }

    /// Record a finished region
    pub fn record(&mut self, region: CompletedRegion) {
        self.completed.retain(|r| r.region_id != region.region_id);
        self.completed.push(region);
        self.updated_at = Utc::now();
    }
}
