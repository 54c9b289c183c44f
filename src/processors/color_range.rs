//! Cross-file color-range resolution.
//!
//! Every visualization in a batch shares one `(vmin, vmax)` mapping so that
//! the same color means the same measured value in every file. The resolved
//! bounds are a pure aggregate over the batch's per-file statistics:
//! permuting the files cannot change the result.

use thiserror::Error;

use super::statistics::SummaryStats;

/// Errors that can occur while resolving a color range.
#[derive(Debug, Error)]
pub enum ColorRangeError {
    /// The batch holds no file with defined statistics.
    #[error("no data to scale: every file in the batch was empty or failed")]
    NoData,
}

/// The value bounds used to map measurements to colors across a batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorRange {
    pub vmin: f64,
    pub vmax: f64,
}

impl ColorRange {
    /// Width of the range.
    pub fn span(&self) -> f64 {
        self.vmax - self.vmin
    }
}

/// Resolve the batch color range from per-file statistics.
///
/// `vmin` is the minimum of all defined per-file minima and `vmax` the
/// maximum of all defined maxima; an explicit override replaces its bound
/// unconditionally. Undefined (empty-grid) records are ignored. With zero
/// defined records there is nothing to scale, even when both overrides are
/// present, and resolution fails with [`ColorRangeError::NoData`].
pub fn resolve_color_range(
    stats: &[SummaryStats],
    vmin_override: Option<f64>,
    vmax_override: Option<f64>,
) -> Result<ColorRange, ColorRangeError> {
    let defined: Vec<&SummaryStats> = stats.iter().filter(|s| s.is_defined()).collect();

    if defined.is_empty() {
        return Err(ColorRangeError::NoData);
    }

    let auto_min = defined.iter().map(|s| s.min).fold(f64::INFINITY, f64::min);
    let auto_max = defined
        .iter()
        .map(|s| s.max)
        .fold(f64::NEG_INFINITY, f64::max);

    Ok(ColorRange {
        vmin: vmin_override.unwrap_or(auto_min),
        vmax: vmax_override.unwrap_or(auto_max),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::MeasurementGrid;
    use crate::processors::statistics::summarize;

    fn stats_for(rows: Vec<Vec<f64>>) -> SummaryStats {
        summarize(&MeasurementGrid::from_rows(rows).unwrap())
    }

    #[test]
    fn test_resolve_union_of_bounds() {
        let stats = vec![
            stats_for(vec![vec![1.0, 4.0]]),
            stats_for(vec![vec![-2.0, 3.0]]),
        ];

        let range = resolve_color_range(&stats, None, None).unwrap();

        assert_eq!(range.vmin, -2.0);
        assert_eq!(range.vmax, 4.0);
        assert_eq!(range.span(), 6.0);
    }

    #[test]
    fn test_resolve_is_order_independent() {
        let a = stats_for(vec![vec![1.0, 4.0]]);
        let b = stats_for(vec![vec![-2.0, 3.0]]);
        let c = stats_for(vec![vec![0.5, 10.0]]);

        let forward = resolve_color_range(&[a, b, c], None, None).unwrap();
        let reversed = resolve_color_range(&[c, b, a], None, None).unwrap();
        let shuffled = resolve_color_range(&[b, c, a], None, None).unwrap();

        assert_eq!(forward, reversed);
        assert_eq!(forward, shuffled);
    }

    #[test]
    fn test_overrides_win_unconditionally() {
        let stats = vec![stats_for(vec![vec![1.0, 4.0]])];

        // Overrides apply even when narrower than the data.
        let range = resolve_color_range(&stats, Some(2.0), Some(3.0)).unwrap();

        assert_eq!(range.vmin, 2.0);
        assert_eq!(range.vmax, 3.0);
    }

    #[test]
    fn test_single_override_keeps_other_bound_auto() {
        let stats = vec![stats_for(vec![vec![1.0, 4.0]])];

        let range = resolve_color_range(&stats, Some(-10.0), None).unwrap();

        assert_eq!(range.vmin, -10.0);
        assert_eq!(range.vmax, 4.0);
    }

    #[test]
    fn test_undefined_records_are_ignored() {
        let stats = vec![
            SummaryStats::undefined((0, 0)),
            stats_for(vec![vec![1.0, 2.0]]),
        ];

        let range = resolve_color_range(&stats, None, None).unwrap();

        assert_eq!(range.vmin, 1.0);
        assert_eq!(range.vmax, 2.0);
    }

    #[test]
    fn test_no_defined_records_is_no_data() {
        let stats = vec![SummaryStats::undefined((0, 0))];

        assert!(matches!(
            resolve_color_range(&stats, None, None),
            Err(ColorRangeError::NoData)
        ));
        // Overrides cannot rescue an empty batch.
        assert!(matches!(
            resolve_color_range(&stats, Some(0.0), Some(1.0)),
            Err(ColorRangeError::NoData)
        ));
    }

    #[test]
    fn test_coverage_of_every_file() {
        let stats = vec![
            stats_for(vec![vec![1.0, 4.0]]),
            stats_for(vec![vec![-2.0, 3.0]]),
            stats_for(vec![vec![0.0, 9.0]]),
        ];

        let range = resolve_color_range(&stats, None, None).unwrap();

        for s in &stats {
            assert!(range.vmin <= s.min);
            assert!(range.vmax >= s.max);
        }
    }
}
