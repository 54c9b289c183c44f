//! Warpage surface-measurement analysis pipeline.
//!
//! This crate provides tools for:
//! - Discovering and classifying instrument measurement files
//! - Parsing grid-shaped text and binary measurement data
//! - Cleaning sensor artifacts and zero border padding
//! - Per-file summary statistics and batch-wide color scaling
//! - Rendering comparable heatmaps across a whole batch
//!
//! # Example
//!
//! ```no_run
//! use warpage_pipeline::config::AnalysisConfig;
//! use warpage_pipeline::processors::batch::run_batch;
//!
//! let config = AnalysisConfig::default();
//! let session = run_batch(&config, None).unwrap();
//! println!("{} files on one color scale", session.records.len());
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod processors;
pub mod visualization;

pub use config::AnalysisConfig;
pub use core::{FileKind, GridDecoder, MeasurementGrid};
pub use processors::{AnalysisSession, ColorRange, FileRecord, SummaryStats};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
