//! Geoglyph Results
//!
//! Aggregates the discoveries of a run into a submission package.
//!
//! The manager:
//! - Deduplicates discoveries (50 m, intersecting windows)
//! - Ranks by confidence and selects the top N (at least 5)
//! - Evaluates the compliance checklist
//! - Writes the submission JSON and Markdown summary atomically
//!
//! A second module compares two submissions for reproducibility.
//!
//! # Examples
//!
//! ```
//! use chrono::Utc;
//! use geoglyph_domain::RunId;
//! use geoglyph_results::{ResultsConfig, ResultsManager};
//!
//! let manager = ResultsManager::new(ResultsConfig::default()).unwrap();
//! let package = manager.build(RunId::new(), Utc::now(), "mock");
//! assert!(!package.compliance.minimum_discoveries);
//! ```

#![warn(missing_docs)]

mod compliance;
mod config;
mod dedup;
mod error;
mod footprint;
mod io;
mod package;
mod report;
mod verify;

pub use compliance::{Compliance, MINIMUM_DISCOVERIES, MINIMUM_SOURCES};
pub use config::{ResultsConfig, MIN_TOP_N};
pub use dedup::{deduplicate, rank, ranking_order};
pub use error::ResultsError;
pub use footprint::{footprints, Footprint, ValidationStatus, CONFIRMED_CONFIDENCE, DEFAULT_FOOTPRINT_RADIUS_M};
pub use io::write_atomic;
pub use package::{ResultsManager, SubmissionPackage, WrittenFiles};
pub use report::render_markdown;
pub use verify::{compare, DiscoveryMatch, ReproducibilityReport};
