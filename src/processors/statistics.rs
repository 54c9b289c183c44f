//! Per-grid summary statistics.
//!
//! Statistics are computed over every cell of a cleaned grid, interior
//! zeros included — only border padding was noise, and the cleaner already
//! removed it. Non-finite cells are excluded from the reductions; a grid
//! with nothing to reduce yields the undefined record instead of an error
//! so batch collection can skip it.

use rayon::prelude::*;

use crate::core::grid::MeasurementGrid;

/// Summary statistics of one cleaned grid.
///
/// `std` is the population standard deviation and `range = max - min`.
/// For an empty (or all-non-finite) grid every value field is NaN; use
/// [`SummaryStats::is_defined`] before aggregating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std: f64,
    pub range: f64,
    /// Shape (rows, cols) of the grid the statistics describe.
    pub shape: (usize, usize),
}

impl SummaryStats {
    /// The undefined record for grids with no usable cells.
    pub fn undefined(shape: (usize, usize)) -> Self {
        Self {
            min: f64::NAN,
            max: f64::NAN,
            mean: f64::NAN,
            std: f64::NAN,
            range: f64::NAN,
            shape,
        }
    }

    /// Whether the statistics describe actual data.
    pub fn is_defined(&self) -> bool {
        !self.min.is_nan()
    }
}

/// Compute summary statistics for a cleaned grid.
pub fn summarize(grid: &MeasurementGrid) -> SummaryStats {
    let shape = grid.shape();

    let finite: Vec<f64> = grid
        .values()
        .par_iter()
        .copied()
        .filter(|v| v.is_finite())
        .collect();

    if finite.is_empty() {
        return SummaryStats::undefined(shape);
    }

    let n = finite.len() as f64;

    let (min, max, sum) = finite
        .par_iter()
        .fold(
            || (f64::INFINITY, f64::NEG_INFINITY, 0.0),
            |(min, max, sum), &v| (min.min(v), max.max(v), sum + v),
        )
        .reduce(
            || (f64::INFINITY, f64::NEG_INFINITY, 0.0),
            |(min_a, max_a, sum_a), (min_b, max_b, sum_b)| {
                (min_a.min(min_b), max_a.max(max_b), sum_a + sum_b)
            },
        );

    let mean = sum / n;

    let sum_sq: f64 = finite.par_iter().map(|&v| (v - mean) * (v - mean)).sum();
    let std = (sum_sq / n).sqrt();

    SummaryStats {
        min,
        max,
        mean,
        std,
        range: max - min,
        shape,
    }
}
