//! Geoglyph Multi-Scale Processor
//!
//! Turns a region into composite images: three nested windows around the
//! region center, two independent imagery sources per window, and an
//! archaeological index heatmap derived from band arithmetic.
//!
//! # Architecture
//!
//! ```text
//! Region → windows → ImagerySource::fetch → index → CompositeImage
//!                          ↓ coverage miss
//!                    window skipped (warn)
//! ```
//!
//! # Examples
//!
//! ```
//! use geoglyph_domain::{Coordinate, Priority, Region};
//! use geoglyph_imagery::SyntheticImagery;
//! use geoglyph_processor::{MultiScaleProcessor, ProcessorConfig};
//!
//! let region = Region {
//!     id: "brazil_xingu".to_string(),
//!     name: "Upper Xingu Basin".to_string(),
//!     center: Coordinate::new(-12.5, -53.0),
//!     priority: Priority::High,
//!     known_sites: true,
//!     country: "Brazil".to_string(),
//!     note: String::new(),
//! };
//!
//! let processor = MultiScaleProcessor::new(SyntheticImagery::new(1), ProcessorConfig::default()).unwrap();
//! let windows = processor.windows(&region);
//! assert_eq!(windows.len(), 3);
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod export;
pub mod index;
pub mod processor;

pub use config::{ProcessorConfig, ScaleSettings};
pub use error::ProcessorError;
pub use export::{export_heatmap, heatmap_png};
pub use processor::{MultiScaleProcessor, RegionImagery, SkippedWindow, WindowOutcome};
