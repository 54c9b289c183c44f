//! Heatmap rendering for cleaned measurement grids.
//!
//! A thin wrapper over plotters: each grid cell becomes a filled rectangle
//! colored through the batch's shared `ColorRange`, so every file in a run
//! is drawn on the same scale. No text is drawn (keeps the font stack out
//! of the build); labels belong to the consumer.

use std::path::Path;

use plotters::prelude::*;
use plotters_bitmap::BitMapBackend;
use thiserror::Error;

use crate::core::grid::MeasurementGrid;
use crate::processors::color_range::ColorRange;

/// Errors that can occur during rendering.
#[derive(Error, Debug)]
pub enum VisualizationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("plotting error: {0}")]
    Plotting(String),

    #[error("empty grid")]
    EmptyGrid,
}

/// Result type for rendering operations.
pub type Result<T> = std::result::Result<T, VisualizationError>;

/// Maximum output image width in pixels.
const MAX_WIDTH: u32 = 1600;

/// Maximum output image height in pixels.
const MAX_HEIGHT: u32 = 1200;

/// Map a measurement value to a jet-style color through the given range.
///
/// Values at `vmin` map to dark blue, the midpoint to green, and `vmax` to
/// dark red; out-of-range values clamp to the end colors. A degenerate
/// range (vmax <= vmin) maps everything to the midpoint color.
pub fn value_to_color(value: f64, range: &ColorRange) -> RGBColor {
    let t = if range.span() > 0.0 {
        ((value - range.vmin) / range.span()).clamp(0.0, 1.0)
    } else {
        0.5
    };

    // Piecewise-linear jet: blue -> cyan -> green -> yellow -> red.
    let (r, g, b) = if t < 0.125 {
        (0.0, 0.0, 0.5 + 4.0 * t)
    } else if t < 0.375 {
        (0.0, 4.0 * (t - 0.125), 1.0)
    } else if t < 0.625 {
        (4.0 * (t - 0.375), 1.0, 1.0 - 4.0 * (t - 0.375))
    } else if t < 0.875 {
        (1.0, 1.0 - 4.0 * (t - 0.625), 0.0)
    } else {
        (1.0 - 4.0 * (t - 0.875), 0.0, 0.0)
    };

    RGBColor(
        (r * 255.0).round().clamp(0.0, 255.0) as u8,
        (g * 255.0).round().clamp(0.0, 255.0) as u8,
        (b * 255.0).round().clamp(0.0, 255.0) as u8,
    )
}

/// Pick an output size that keeps cells square and the image bounded.
fn image_size(rows: usize, cols: usize) -> (u32, u32) {
    let scale = (MAX_WIDTH as f64 / cols as f64)
        .min(MAX_HEIGHT as f64 / rows as f64)
        .max(1.0)
        .floor() as u32;

    (
        (cols as u32 * scale).min(MAX_WIDTH),
        (rows as u32 * scale).min(MAX_HEIGHT),
    )
}

/// Render one grid as a heatmap PNG, colored through the shared range.
///
/// Row 0 is drawn at the top, matching how the instrument grids are read.
pub fn render_heatmap(
    output_path: &Path,
    grid: &MeasurementGrid,
    range: &ColorRange,
) -> Result<()> {
    if grid.is_empty() {
        return Err(VisualizationError::EmptyGrid);
    }

    let (rows, cols) = grid.shape();
    let (width, height) = image_size(rows, cols);

    let root = BitMapBackend::new(output_path, (width, height)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| VisualizationError::Plotting(e.to_string()))?;

    // Inverted y-range puts row 0 at the top.
    let mut chart = ChartBuilder::on(&root)
        .build_cartesian_2d(0f64..cols as f64, rows as f64..0f64)
        .map_err(|e| VisualizationError::Plotting(e.to_string()))?;

    chart
        .draw_series((0..rows).flat_map(|r| {
            (0..cols).map(move |c| {
                let color = value_to_color(grid.get(r, c), range);
                Rectangle::new(
                    [(c as f64, r as f64), (c as f64 + 1.0, r as f64 + 1.0)],
                    color.filled(),
                )
            })
        }))
        .map_err(|e| VisualizationError::Plotting(e.to_string()))?;

    root.present()
        .map_err(|e| VisualizationError::Plotting(e.to_string()))?;

    Ok(())
}
