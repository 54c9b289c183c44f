//! Grid cleaning: artifact nullification, border padding trim, and optional
//! center-region extraction.
//!
//! Each stage is a pure function of the input grid and the cleaning
//! configuration, and the stages stay separate on purpose: sentinel values
//! are instrument fault codes, while the zero border is non-measured area.
//! Interior zeros are kept — they may be real measurements.

use rayon::prelude::*;

use crate::config::CleaningConfig;
use crate::core::grid::MeasurementGrid;

/// Instrument fault codes nullified by default.
pub const DEFAULT_SENTINELS: [f64; 5] = [-4000.0, 9999.0, -9999.0, 99999.0, -99999.0];

/// Default tolerance for sentinel equality. Zero selects exact matching.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Replace sentinel artifact values with `0`.
///
/// A cell is an artifact when its distance to any sentinel is at most
/// `tolerance`; with `tolerance = 0` only exact matches are replaced.
pub fn nullify_artifacts(
    grid: &MeasurementGrid,
    sentinels: &[f64],
    tolerance: f64,
) -> MeasurementGrid {
    let mut cleaned = grid.clone();

    cleaned.values_mut().par_iter_mut().for_each(|cell| {
        if sentinels.iter().any(|&s| (*cell - s).abs() <= tolerance) {
            *cell = 0.0;
        }
    });

    cleaned
}

/// Remove the contiguous all-zero border of the grid.
///
/// Keeps exactly the bounding box of non-zero cells, which makes the
/// operation idempotent and leaves interior all-zero rows and columns
/// untouched. An all-zero (or empty) grid trims to the empty grid.
pub fn trim_zero_padding(grid: &MeasurementGrid) -> MeasurementGrid {
    let (rows, cols) = grid.shape();

    let mut row_min = rows;
    let mut row_max = 0usize;
    let mut col_min = cols;
    let mut col_max = 0usize;

    for r in 0..rows {
        for (c, &value) in grid.row(r).iter().enumerate() {
            if value != 0.0 {
                row_min = row_min.min(r);
                row_max = row_max.max(r);
                col_min = col_min.min(c);
                col_max = col_max.max(c);
            }
        }
    }

    if row_min == rows {
        // No non-zero cell anywhere.
        return MeasurementGrid::empty();
    }

    grid.crop(row_min, row_max + 1, col_min, col_max + 1)
}

/// Keep a centered sub-grid of `round(rows * row_fraction)` rows and
/// `round(cols * col_fraction)` columns.
///
/// Both fractions are expected in `(0, 1]`; a fraction of `1` is an exact
/// identity. The kept extent is clamped to at least one cell and at most
/// the full dimension, so a requested size never exceeds what is available.
pub fn extract_center_region(
    grid: &MeasurementGrid,
    row_fraction: f64,
    col_fraction: f64,
) -> MeasurementGrid {
    if grid.is_empty() {
        return MeasurementGrid::empty();
    }

    let (rows, cols) = grid.shape();
    let keep_rows = centered_extent(rows, row_fraction);
    let keep_cols = centered_extent(cols, col_fraction);

    let row_start = (rows - keep_rows) / 2;
    let col_start = (cols - keep_cols) / 2;

    grid.crop(row_start, row_start + keep_rows, col_start, col_start + keep_cols)
}

fn centered_extent(dim: usize, fraction: f64) -> usize {
    let keep = (dim as f64 * fraction).round() as usize;
    keep.clamp(1, dim)
}

/// Run the full cleaning pass: nullify artifacts, trim the zero border,
/// then extract the configured center region.
pub fn clean_grid(grid: &MeasurementGrid, config: &CleaningConfig) -> MeasurementGrid {
    let nullified = nullify_artifacts(grid, &config.artifact_sentinels, config.artifact_tolerance);
    let trimmed = trim_zero_padding(&nullified);
    extract_center_region(&trimmed, config.row_fraction, config.col_fraction)
}
