//! Export writers for batch results.
//!
//! Two outputs: the batch statistics table as CSV, and cleaned grids back
//! in the instrument text format (whitespace-separated rows) so they
//! round-trip through the text parser.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use super::grid::MeasurementGrid;
use crate::processors::batch::AnalysisSession;

/// Errors that can occur during write operations.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Failed to create parent directories.
    #[error("failed to create parent directories for '{path}': {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or open file for writing.
    #[error("failed to create file '{path}': {source}")]
    CreateFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write data to file.
    #[error("failed to write to file '{path}': {source}")]
    WriteFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV writing error.
    #[error("CSV write error for '{path}': {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
}

/// Result type for write operations.
pub type Result<T> = std::result::Result<T, WriteError>;

/// Creates parent directories for a file path if they don't exist.
fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| WriteError::CreateDirectory {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }
    Ok(())
}

/// Write the per-file statistics table of a session as CSV.
///
/// One row per surviving record: label, filename, shape, and the summary
/// statistics, in discovery order.
pub fn write_stats_csv(path: &Path, session: &AnalysisSession) -> Result<()> {
    ensure_parent_dirs(path)?;

    let path_str = path.display().to_string();
    let mut writer = csv::Writer::from_path(path).map_err(|e| WriteError::Csv {
        path: path_str.clone(),
        source: e,
    })?;

    writer
        .write_record([
            "label", "file", "rows", "cols", "min", "max", "mean", "std", "range",
        ])
        .map_err(|e| WriteError::Csv {
            path: path_str.clone(),
            source: e,
        })?;

    for record in &session.records {
        let filename = record
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let (rows, cols) = record.stats.shape;

        writer
            .write_record([
                record.display_label.clone(),
                filename,
                rows.to_string(),
                cols.to_string(),
                format!("{:.6}", record.stats.min),
                format!("{:.6}", record.stats.max),
                format!("{:.6}", record.stats.mean),
                format!("{:.6}", record.stats.std),
                format!("{:.6}", record.stats.range),
            ])
            .map_err(|e| WriteError::Csv {
                path: path_str.clone(),
                source: e,
            })?;
    }

    writer.flush().map_err(|e| WriteError::WriteFile {
        path: path_str,
        source: e,
    })?;

    Ok(())
}

/// Write a grid in the instrument text format: one row per line, values
/// separated by single spaces.
pub fn write_grid_txt(path: &Path, grid: &MeasurementGrid) -> Result<()> {
    ensure_parent_dirs(path)?;

    let path_str = path.display().to_string();
    let file = File::create(path).map_err(|e| WriteError::CreateFile {
        path: path_str.clone(),
        source: e,
    })?;
    let mut writer = BufWriter::new(file);

    for r in 0..grid.rows() {
        let line = grid
            .row(r)
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(writer, "{}", line).map_err(|e| WriteError::WriteFile {
            path: path_str.clone(),
            source: e,
        })?;
    }

    writer.flush().map_err(|e| WriteError::WriteFile {
        path: path_str,
        source: e,
    })?;

    Ok(())
}
