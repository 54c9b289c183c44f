//! Processing stages: cleaning, statistics, color-range resolution, and the
//! batch orchestrator that ties them together.

pub mod batch;
pub mod cleaning;
pub mod color_range;
pub mod statistics;

pub use batch::{AnalysisSession, BatchError, FileRecord, RunSummary, SessionSlot};
pub use color_range::ColorRange;
pub use statistics::SummaryStats;
