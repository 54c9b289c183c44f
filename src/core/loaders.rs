//! Grid parsers for measurement text and binary files.
//!
//! The text format is one row per line, columns separated by arbitrary
//! whitespace, real-number tokens. Binary files are produced by an external
//! converter tool; decoding is delegated to a [`GridDecoder`] and the loader
//! only normalizes the decoder's output into the same rectangular grid
//! representation as the text path.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::discovery::{DiscoveredFile, FileKind};
use super::grid::MeasurementGrid;

/// Errors that can occur while loading one measurement file.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// I/O failure opening or reading the file.
    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file's content did not form a rectangular numeric grid.
    /// `row` is the zero-based index of the offending row.
    #[error("malformed grid in '{path}' at row {row}: {reason}")]
    MalformedGrid {
        path: PathBuf,
        row: usize,
        reason: String,
    },

    /// The external binary decoder rejected the file.
    #[error("failed to decode '{path}': {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// A binary file was discovered but no decoder is available.
    #[error("no binary decoder configured for '{path}'")]
    NoDecoder { path: PathBuf },
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Capability interface for the external binary grid format.
///
/// Implementations return raw rows in whatever shape the converter produced;
/// the loader normalizes them exactly like text rows (rectangularity check
/// included), with no further semantic transformation.
pub trait GridDecoder {
    /// Decode raw file bytes into measurement rows.
    fn decode(&self, bytes: &[u8]) -> anyhow::Result<Vec<Vec<f64>>>;
}

/// Decoder for the converter tool's interchange dump: a little-endian
/// `u32` row count and `u32` column count, followed by `rows * cols`
/// little-endian `f64` cells in row-major order.
#[derive(Debug, Default)]
pub struct RawGridDecoder;

impl GridDecoder for RawGridDecoder {
    fn decode(&self, bytes: &[u8]) -> anyhow::Result<Vec<Vec<f64>>> {
        if bytes.len() < 8 {
            anyhow::bail!("truncated header: {} bytes", bytes.len());
        }

        let rows = u32::from_le_bytes(bytes[0..4].try_into().unwrap()) as usize;
        let cols = u32::from_le_bytes(bytes[4..8].try_into().unwrap()) as usize;

        let expected = 8 + rows * cols * 8;
        if bytes.len() != expected {
            anyhow::bail!(
                "payload size mismatch: expected {} bytes for {}x{} cells, got {}",
                expected,
                rows,
                cols,
                bytes.len()
            );
        }

        let mut out = Vec::with_capacity(rows);
        let mut offset = 8;
        for _ in 0..rows {
            let mut row = Vec::with_capacity(cols);
            for _ in 0..cols {
                let cell = f64::from_le_bytes(bytes[offset..offset + 8].try_into().unwrap());
                row.push(cell);
                offset += 8;
            }
            out.push(row);
        }

        Ok(out)
    }
}

/// Parse text content into a grid.
///
/// Surrounding blank lines are ignored; wholly empty content parses to the
/// empty grid. Every row must match the first row's column count, and every
/// token must parse as a real number; violations report the zero-based row
/// index.
fn parse_text(path: &Path, text: &str) -> Result<MeasurementGrid> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(MeasurementGrid::empty());
    }

    let mut rows: Vec<Vec<f64>> = Vec::new();
    let mut expected_cols: Option<usize> = None;

    for (i, line) in trimmed.lines().enumerate() {
        let mut row = Vec::with_capacity(expected_cols.unwrap_or(0));
        for token in line.split_whitespace() {
            let value = token.parse::<f64>().map_err(|_| LoaderError::MalformedGrid {
                path: path.to_path_buf(),
                row: i,
                reason: format!("'{}' is not a number", token),
            })?;
            row.push(value);
        }

        match expected_cols {
            None => expected_cols = Some(row.len()),
            Some(cols) if row.len() != cols => {
                return Err(LoaderError::MalformedGrid {
                    path: path.to_path_buf(),
                    row: i,
                    reason: format!("expected {} columns, found {}", cols, row.len()),
                });
            }
            Some(_) => {}
        }

        rows.push(row);
    }

    // Rectangularity was enforced row by row above.
    Ok(MeasurementGrid::from_rows(rows).unwrap_or_else(MeasurementGrid::empty))
}

/// Normalize decoder output into a grid, enforcing rectangularity.
fn normalize_rows(path: &Path, rows: Vec<Vec<f64>>) -> Result<MeasurementGrid> {
    let expected = rows.first().map(|r| r.len()).unwrap_or(0);
    if let Some(bad) = rows.iter().position(|r| r.len() != expected) {
        return Err(LoaderError::MalformedGrid {
            path: path.to_path_buf(),
            row: bad,
            reason: format!("expected {} columns, found {}", expected, rows[bad].len()),
        });
    }

    Ok(MeasurementGrid::from_rows(rows).unwrap_or_else(MeasurementGrid::empty))
}

/// Load a text measurement file.
pub fn load_text_grid(path: &Path) -> Result<MeasurementGrid> {
    let text = fs::read_to_string(path).map_err(|e| LoaderError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_text(path, &text)
}

/// Load a binary measurement file through the given decoder.
pub fn load_binary_grid(path: &Path, decoder: &dyn GridDecoder) -> Result<MeasurementGrid> {
    let bytes = fs::read(path).map_err(|e| LoaderError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;

    let rows = decoder.decode(&bytes).map_err(|e| LoaderError::Decode {
        path: path.to_path_buf(),
        source: e,
    })?;

    normalize_rows(path, rows)
}

/// Load one discovered file, dispatching on its classified kind.
///
/// Text kinds (original/corrected) share the text parser; binary files
/// require a decoder and fail per-file when none is supplied.
pub fn load_grid(
    file: &DiscoveredFile,
    decoder: Option<&dyn GridDecoder>,
) -> Result<MeasurementGrid> {
    match file.kind {
        FileKind::Original | FileKind::Corrected => load_text_grid(&file.path),
        FileKind::Binary => match decoder {
            Some(decoder) => load_binary_grid(&file.path, decoder),
            None => Err(LoaderError::NoDecoder {
                path: file.path.clone(),
            }),
        },
    }
}
