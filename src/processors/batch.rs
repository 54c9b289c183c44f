//! Batch orchestration: drives discovery, parsing, cleaning, statistics,
//! and color-range resolution for a whole run.
//!
//! The run is a single sequential pass over the discovered files. Per-file
//! failures (read errors, malformed grids) and empty-after-cleaning skips
//! are recorded and the run continues; only batch-level conditions — no
//! matching files at all, or no usable data after processing — terminate
//! the run.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use log::{debug, info, warn};
use thiserror::Error;

use crate::config::AnalysisConfig;
use crate::core::discovery::{discover_files, DiscoveryError};
use crate::core::grid::MeasurementGrid;
use crate::core::loaders::{load_grid, GridDecoder};
use crate::processors::cleaning::clean_grid;
use crate::processors::color_range::{resolve_color_range, ColorRange};
use crate::processors::statistics::{summarize, SummaryStats};

/// Batch-level failures that terminate a run.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Discovery found nothing matching the selector.
    #[error(transparent)]
    NoFilesFound(#[from] DiscoveryError),

    /// Processing finished but zero files yielded usable statistics.
    #[error("no usable data: {discovered} files discovered, {failed} failed, {skipped} empty after cleaning")]
    NoData {
        discovered: usize,
        failed: usize,
        skipped: usize,
    },
}

/// One successfully processed measurement file.
///
/// Owned by the session that created it and immutable once built.
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// Full path of the source file.
    pub path: PathBuf,
    /// Sequence label ("01", "02", ...) assigned in discovery order over
    /// surviving files, independent of the filename.
    pub display_label: String,
    /// The grid as parsed, before cleaning.
    pub raw_grid: MeasurementGrid,
    /// The grid after artifact nullification, border trim, and center crop.
    pub cleaned_grid: MeasurementGrid,
    /// Statistics of the cleaned grid.
    pub stats: SummaryStats,
}

/// A per-file failure recorded during the run.
#[derive(Debug, Clone)]
pub struct FileFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Counts for the run-level report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Files discovery produced.
    pub discovered: usize,
    /// Files that produced usable statistics.
    pub processed: usize,
    /// Files whose cleaned grid was empty.
    pub skipped: usize,
    /// Files that failed to read or parse.
    pub failed: usize,
}

/// The result of one batch run: ordered records, the resolved color range,
/// the failure/skip lists, and the configuration that produced them.
#[derive(Debug, Clone)]
pub struct AnalysisSession {
    pub records: Vec<FileRecord>,
    pub color_range: ColorRange,
    pub failures: Vec<FileFailure>,
    pub skipped: Vec<PathBuf>,
    pub summary: RunSummary,
    pub config: AnalysisConfig,
}

/// Run the full pipeline for the configured folders.
///
/// `decoder` supplies the external binary format capability; pass `None`
/// when only text files are expected (binary files then fail per-file).
pub fn run_batch(
    config: &AnalysisConfig,
    decoder: Option<&dyn GridDecoder>,
) -> Result<AnalysisSession, BatchError> {
    info!(
        "discovering {} files under {} ({} folders)",
        config.data.file_type,
        config.data.base_path.display(),
        config.data.folders.len()
    );

    let discovered = discover_files(
        &config.data.base_path,
        &config.data.folders,
        config.data.file_type,
    )?;

    let mut records = Vec::with_capacity(discovered.len());
    let mut failures = Vec::new();
    let mut skipped = Vec::new();

    info!("parsing and cleaning {} files", discovered.len());

    for file in &discovered {
        let raw_grid = match load_grid(file, decoder) {
            Ok(grid) => grid,
            Err(e) => {
                warn!("skipping {}: {}", file.path.display(), e);
                failures.push(FileFailure {
                    path: file.path.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let cleaned_grid = clean_grid(&raw_grid, &config.cleaning);

        if cleaned_grid.is_empty() {
            debug!("{} is empty after cleaning", file.path.display());
            skipped.push(file.path.clone());
            continue;
        }

        let stats = summarize(&cleaned_grid);
        if !stats.is_defined() {
            debug!("{} has no finite cells", file.path.display());
            skipped.push(file.path.clone());
            continue;
        }

        records.push(FileRecord {
            path: file.path.clone(),
            display_label: String::new(), // assigned below over survivors
            raw_grid,
            cleaned_grid,
            stats,
        });
    }

    // Labels are sequential over surviving files, in discovery order.
    for (i, record) in records.iter_mut().enumerate() {
        record.display_label = format!("{:02}", i + 1);
    }

    let summary = RunSummary {
        discovered: discovered.len(),
        processed: records.len(),
        skipped: skipped.len(),
        failed: failures.len(),
    };

    info!(
        "aggregating: {} processed, {} skipped, {} failed",
        summary.processed, summary.skipped, summary.failed
    );

    let stats: Vec<SummaryStats> = records.iter().map(|r| r.stats).collect();
    let color_range = resolve_color_range(&stats, config.scale.vmin, config.scale.vmax)
        .map_err(|_| BatchError::NoData {
            discovered: summary.discovered,
            failed: summary.failed,
            skipped: summary.skipped,
        })?;

    info!(
        "resolved color range {:.6} to {:.6}",
        color_range.vmin, color_range.vmax
    );

    Ok(AnalysisSession {
        records,
        color_range,
        failures,
        skipped,
        summary,
        config: config.clone(),
    })
}

/// Holder for the most recent session of a hosting process.
///
/// The slot is replaced whole: writers swap in a finished, immutable
/// session and readers clone the `Arc` out, so a reader can never observe
/// a half-built session. The pipeline itself never uses this — each run
/// builds and returns its own `AnalysisSession`.
#[derive(Debug, Default)]
pub struct SessionSlot {
    inner: RwLock<Option<Arc<AnalysisSession>>>,
}

impl SessionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held session with a new one.
    pub fn replace(&self, session: AnalysisSession) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(Arc::new(session));
    }

    /// The most recently stored session, if any.
    pub fn latest(&self) -> Option<Arc<AnalysisSession>> {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        guard.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_grid_file(dir: &Path, name: &str, content: &str) {
        let mut file = File::create(dir.join(name)).unwrap();
        write!(file, "{}", content).unwrap();
    }

    fn config_for(base: &Path, folders: &[&str]) -> AnalysisConfig {
        let mut config = AnalysisConfig::default();
        config.data.base_path = base.to_path_buf();
        config.data.folders = folders.iter().map(|s| s.to_string()).collect();
        config
    }

    #[test]
    fn test_run_batch_labels_follow_discovery_order() {
        let temp_dir = TempDir::new().unwrap();
        let folder = temp_dir.path().join("run1");
        fs::create_dir_all(&folder).unwrap();
        write_grid_file(&folder, "c@_ORI.txt", "5 6\n7 8\n");
        write_grid_file(&folder, "a@_ORI.txt", "1 2\n3 4\n");
        write_grid_file(&folder, "b@_ORI.txt", "9 10\n11 12\n");

        let config = config_for(temp_dir.path(), &["run1"]);
        let session = run_batch(&config, None).unwrap();

        let labels: Vec<&str> = session
            .records
            .iter()
            .map(|r| r.display_label.as_str())
            .collect();
        assert_eq!(labels, vec!["01", "02", "03"]);

        // Lexicographic filename order within the folder.
        let names: Vec<&str> = session
            .records
            .iter()
            .map(|r| r.path.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a@_ORI.txt", "b@_ORI.txt", "c@_ORI.txt"]);
    }

    #[test]
    fn test_run_batch_skips_all_zero_file() {
        // Scenario: one real grid plus one all-zero grid that trims to
        // empty; the survivor keeps label "01" and the other is skipped.
        let temp_dir = TempDir::new().unwrap();
        let folder = temp_dir.path().join("run1");
        fs::create_dir_all(&folder).unwrap();
        write_grid_file(&folder, "real@_ORI.txt", "1 2\n3 4\n");
        write_grid_file(&folder, "zeros@_ORI.txt", "0 0\n0 0\n");

        let config = config_for(temp_dir.path(), &["run1"]);
        let session = run_batch(&config, None).unwrap();

        assert_eq!(session.records.len(), 1);
        assert_eq!(session.records[0].display_label, "01");
        assert_eq!(session.records[0].stats.min, 1.0);
        assert_eq!(session.records[0].stats.max, 4.0);
        assert_eq!(session.records[0].stats.mean, 2.5);
        assert_eq!(session.records[0].stats.range, 3.0);
        assert_eq!(session.summary.skipped, 1);
        assert_eq!(session.skipped.len(), 1);
    }

    #[test]
    fn test_run_batch_recovers_from_malformed_file() {
        // Scenario: a ragged third row fails that file only; the sibling
        // still produces a record.
        let temp_dir = TempDir::new().unwrap();
        let folder = temp_dir.path().join("run1");
        fs::create_dir_all(&folder).unwrap();
        write_grid_file(&folder, "bad@_ORI.txt", "1 2 3\n4 5 6\n7 8\n");
        write_grid_file(&folder, "good@_ORI.txt", "1 2\n3 4\n");

        let config = config_for(temp_dir.path(), &["run1"]);
        let session = run_batch(&config, None).unwrap();

        assert_eq!(session.records.len(), 1);
        assert_eq!(session.records[0].display_label, "01");
        assert_eq!(session.summary.failed, 1);
        assert!(session.failures[0].reason.contains("row 2"));
    }

    #[test]
    fn test_run_batch_no_matching_files() {
        let temp_dir = TempDir::new().unwrap();
        let folder = temp_dir.path().join("empty");
        fs::create_dir_all(&folder).unwrap();

        let config = config_for(temp_dir.path(), &["empty"]);

        assert!(matches!(
            run_batch(&config, None),
            Err(BatchError::NoFilesFound(_))
        ));
    }

    #[test]
    fn test_run_batch_no_usable_data() {
        let temp_dir = TempDir::new().unwrap();
        let folder = temp_dir.path().join("run1");
        fs::create_dir_all(&folder).unwrap();
        write_grid_file(&folder, "zeros@_ORI.txt", "0 0\n0 0\n");

        let config = config_for(temp_dir.path(), &["run1"]);

        match run_batch(&config, None) {
            Err(BatchError::NoData {
                discovered,
                skipped,
                failed,
            }) => {
                assert_eq!(discovered, 1);
                assert_eq!(skipped, 1);
                assert_eq!(failed, 0);
            }
            other => panic!("expected NoData, got {:?}", other),
        }
    }

    #[test]
    fn test_run_batch_color_range_covers_every_record() {
        let temp_dir = TempDir::new().unwrap();
        let folder = temp_dir.path().join("run1");
        fs::create_dir_all(&folder).unwrap();
        write_grid_file(&folder, "a@_ORI.txt", "-5 1\n2 3\n");
        write_grid_file(&folder, "b@_ORI.txt", "1 2\n3 40\n");

        let config = config_for(temp_dir.path(), &["run1"]);
        let session = run_batch(&config, None).unwrap();

        assert_eq!(session.color_range.vmin, -5.0);
        assert_eq!(session.color_range.vmax, 40.0);
        for record in &session.records {
            assert!(session.color_range.vmin <= record.stats.min);
            assert!(session.color_range.vmax >= record.stats.max);
        }
    }

    #[test]
    fn test_run_batch_folder_order_drives_labels() {
        let temp_dir = TempDir::new().unwrap();
        for folder in ["late", "early"] {
            let dir = temp_dir.path().join(folder);
            fs::create_dir_all(&dir).unwrap();
            write_grid_file(&dir, "scan@_ORI.txt", "1 2\n3 4\n");
        }

        let config = config_for(temp_dir.path(), &["late", "early"]);
        let session = run_batch(&config, None).unwrap();

        assert_eq!(session.records[0].display_label, "01");
        assert!(session.records[0].path.starts_with(temp_dir.path().join("late")));
        assert_eq!(session.records[1].display_label, "02");
        assert!(session.records[1].path.starts_with(temp_dir.path().join("early")));
    }

    #[test]
    fn test_run_batch_nullifies_border_and_interior_artifacts() {
        let temp_dir = TempDir::new().unwrap();
        let folder = temp_dir.path().join("run1");
        fs::create_dir_all(&folder).unwrap();
        // -4000 on the border trims away; -4000 in the interior stays as 0.
        write_grid_file(
            &folder,
            "scan@_ORI.txt",
            "-4000 -4000 -4000\n-4000 1 2\n-4000 -4000 3\n",
        );

        let config = config_for(temp_dir.path(), &["run1"]);
        let session = run_batch(&config, None).unwrap();

        let record = &session.records[0];
        assert_eq!(record.cleaned_grid.shape(), (2, 2));
        assert_eq!(record.cleaned_grid.get(1, 0), 0.0);
        assert_eq!(record.stats.min, 0.0);
        assert_eq!(record.stats.max, 3.0);
    }

    #[test]
    fn test_run_batch_applies_scale_overrides() {
        let temp_dir = TempDir::new().unwrap();
        let folder = temp_dir.path().join("run1");
        fs::create_dir_all(&folder).unwrap();
        write_grid_file(&folder, "scan@_ORI.txt", "1 2\n3 4\n");

        let mut config = config_for(temp_dir.path(), &["run1"]);
        config.scale.vmin = Some(-100.0);
        config.scale.vmax = Some(100.0);

        let session = run_batch(&config, None).unwrap();

        assert_eq!(session.color_range.vmin, -100.0);
        assert_eq!(session.color_range.vmax, 100.0);
    }

    #[test]
    fn test_session_slot_replace_whole_value() {
        let temp_dir = TempDir::new().unwrap();
        let folder = temp_dir.path().join("run1");
        fs::create_dir_all(&folder).unwrap();
        write_grid_file(&folder, "scan@_ORI.txt", "1 2\n3 4\n");

        let config = config_for(temp_dir.path(), &["run1"]);
        let slot = SessionSlot::new();
        assert!(slot.latest().is_none());

        let first = run_batch(&config, None).unwrap();
        slot.replace(first);
        let held = slot.latest().unwrap();
        assert_eq!(held.records.len(), 1);

        // A reader holding the old Arc keeps a consistent session even
        // after the slot is replaced.
        write_grid_file(&folder, "scan2@_ORI.txt", "5 6\n7 8\n");
        let second = run_batch(&config, None).unwrap();
        slot.replace(second);

        assert_eq!(held.records.len(), 1);
        assert_eq!(slot.latest().unwrap().records.len(), 2);
    }
}
