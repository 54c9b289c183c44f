//! Command-line interface for the warpage analysis pipeline.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};

use crate::config::AnalysisConfig;
use crate::core::discovery::FileKind;
use crate::core::grid::MeasurementGrid;
use crate::core::loaders::{load_binary_grid, load_text_grid, GridDecoder, RawGridDecoder};
use crate::core::writers::{write_grid_txt, write_stats_csv};
use crate::processors::batch::{run_batch, AnalysisSession};
use crate::processors::cleaning::{clean_grid, DEFAULT_SENTINELS};
use crate::processors::statistics::summarize;
use crate::visualization::render_heatmap;

#[derive(Parser)]
#[command(name = "warpage-pipeline")]
#[command(about = "Warpage surface-measurement analysis pipeline", version)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full batch analysis over the configured folders
    Analyze {
        /// Base path containing the measurement folders
        #[arg(short, long)]
        base: Option<PathBuf>,

        /// Folders to analyze, in processing order
        #[arg(short, long, value_delimiter = ',')]
        folders: Vec<String>,

        /// File kind to select
        #[arg(long, value_enum)]
        file_type: Option<FileKind>,

        /// Minimum value for the color scale (auto when omitted)
        #[arg(long)]
        vmin: Option<f64>,

        /// Maximum value for the color scale (auto when omitted)
        #[arg(long)]
        vmax: Option<f64>,

        /// Fraction of rows to keep in the center, in (0, 1]
        #[arg(long)]
        row_fraction: Option<f64>,

        /// Fraction of columns to keep in the center, in (0, 1]
        #[arg(long)]
        col_fraction: Option<f64>,

        /// Output directory for the report files
        #[arg(short, long, default_value = "report")]
        output_dir: PathBuf,

        /// Render one heatmap PNG per file
        #[arg(long)]
        render: bool,
    },

    /// Print summary statistics for a single measurement file
    Stats {
        /// Measurement file (text or binary)
        file: PathBuf,

        /// Fraction of rows to keep in the center, in (0, 1]
        #[arg(long)]
        row_fraction: Option<f64>,

        /// Fraction of columns to keep in the center, in (0, 1]
        #[arg(long)]
        col_fraction: Option<f64>,
    },

    /// Generate synthetic sample measurement files
    Generate {
        /// Output directory for the generated files
        output_dir: PathBuf,

        /// Number of files to generate
        #[arg(long, default_value_t = 4)]
        files: usize,

        /// Rows per generated grid (before padding)
        #[arg(long, default_value_t = 80)]
        rows: usize,

        /// Columns per generated grid (before padding)
        #[arg(long, default_value_t = 100)]
        cols: usize,

        /// Zero-padding border width added around each grid
        #[arg(long, default_value_t = 2)]
        padding: usize,

        /// Sprinkle sentinel artifact values into the grids
        #[arg(long)]
        artifacts: bool,

        /// Seed for the deterministic generator
        #[arg(long, default_value_t = 12345)]
        seed: u64,
    },
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<62} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        let display_value = if value.len() > 39 {
            format!("{}...", &value[..36])
        } else {
            value.clone()
        };
        println!("║ {:<20}: {:<39} ║", key, display_value);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

pub fn run() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity (must come first)
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    // Load config
    let config = match &cli.config {
        Some(path) => match AnalysisConfig::from_yaml(path) {
            Ok(cfg) => {
                info!("Loaded config from: {}", path.display());
                cfg
            }
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}, using defaults",
                    path.display(),
                    e
                );
                AnalysisConfig::default()
            }
        },
        None => AnalysisConfig::default(),
    };

    match cli.command {
        Commands::Analyze {
            base,
            folders,
            file_type,
            vmin,
            vmax,
            row_fraction,
            col_fraction,
            output_dir,
            render,
        } => {
            let mut config = config;
            if let Some(base) = base {
                config.data.base_path = base;
            }
            if !folders.is_empty() {
                config.data.folders = folders;
            }
            if let Some(kind) = file_type {
                config.data.file_type = kind;
            }
            if vmin.is_some() {
                config.scale.vmin = vmin;
            }
            if vmax.is_some() {
                config.scale.vmax = vmax;
            }
            if let Some(f) = row_fraction {
                config.cleaning.row_fraction = f;
            }
            if let Some(f) = col_fraction {
                config.cleaning.col_fraction = f;
            }

            if let Err(e) = config.validate() {
                error!("Invalid configuration: {}", e);
                std::process::exit(1);
            }

            cmd_analyze(&config, &output_dir, render);
        }
        Commands::Stats {
            file,
            row_fraction,
            col_fraction,
        } => {
            let mut config = config;
            if let Some(f) = row_fraction {
                config.cleaning.row_fraction = f;
            }
            if let Some(f) = col_fraction {
                config.cleaning.col_fraction = f;
            }

            if let Err(e) = config.validate() {
                error!("Invalid configuration: {}", e);
                std::process::exit(1);
            }

            cmd_stats(&file, &config);
        }
        Commands::Generate {
            output_dir,
            files,
            rows,
            cols,
            padding,
            artifacts,
            seed,
        } => {
            cmd_generate(&output_dir, files, rows, cols, padding, artifacts, seed);
        }
    }
}

fn cmd_analyze(config: &AnalysisConfig, output_dir: &Path, render: bool) {
    let start = Instant::now();

    println!("Analyzing measurement folders...");
    println!("Base path: {}", config.data.base_path.display());
    println!("Folders: {}", config.data.folders.join(", "));
    println!("File type: {}", config.data.file_type);

    let spinner = create_spinner("Discovering and processing files...");

    let raw_decoder = RawGridDecoder;
    let decoder: Option<&dyn GridDecoder> = if config.data.file_type == FileKind::Binary {
        Some(&raw_decoder)
    } else {
        None
    };

    let session = match run_batch(config, decoder) {
        Ok(session) => session,
        Err(e) => {
            spinner.finish_and_clear();
            error!("Analysis failed: {}", e);
            std::process::exit(1);
        }
    };

    spinner.finish_and_clear();

    print_stats_table(&session);

    let csv_path = output_dir.join("warpage_stats.csv");
    match write_stats_csv(&csv_path, &session) {
        Ok(()) => println!("Statistics written to {}", csv_path.display()),
        Err(e) => error!("Failed to write statistics CSV: {}", e),
    }

    let mut rendered = 0usize;
    if render {
        let spinner = create_spinner("Rendering heatmaps...");
        for record in &session.records {
            let stem = record
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| record.display_label.clone());
            let png_path = output_dir.join(format!("{}_{}.png", record.display_label, stem));

            match render_heatmap(&png_path, &record.cleaned_grid, &session.color_range) {
                Ok(()) => rendered += 1,
                Err(e) => error!("Failed to render {}: {}", png_path.display(), e),
            }
        }
        spinner.finish_and_clear();
    }

    print_summary(
        "Analysis Complete",
        &[
            ("Files discovered", session.summary.discovered.to_string()),
            ("Files processed", session.summary.processed.to_string()),
            ("Files skipped", session.summary.skipped.to_string()),
            ("Files failed", session.summary.failed.to_string()),
            (
                "Color range",
                format!(
                    "{:.6} to {:.6}",
                    session.color_range.vmin, session.color_range.vmax
                ),
            ),
            ("Heatmaps rendered", rendered.to_string()),
            ("Output directory", output_dir.display().to_string()),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );

    if !session.failures.is_empty() {
        println!("Failed files:");
        for failure in &session.failures {
            println!("  - {}: {}", failure.path.display(), failure.reason);
        }
    }
}

/// Print the per-file statistical comparison table.
fn print_stats_table(session: &AnalysisSession) {
    println!();
    println!(
        "{:<8} {:<30} {:<12} {:<12} {:<12} {:<12} {:<12}",
        "Label", "File", "Mean", "Std", "Range", "Min", "Max"
    );
    println!("{}", "-".repeat(100));
    for record in &session.records {
        let filename = record
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        println!(
            "{:<8} {:<30} {:<12.6} {:<12.6} {:<12.6} {:<12.6} {:<12.6}",
            record.display_label,
            filename,
            record.stats.mean,
            record.stats.std,
            record.stats.range,
            record.stats.min,
            record.stats.max
        );
    }
}

fn cmd_stats(file: &Path, config: &AnalysisConfig) {
    let start = Instant::now();

    let raw = if FileKind::Binary.matches(file) {
        load_binary_grid(file, &RawGridDecoder)
    } else {
        load_text_grid(file)
    };

    let raw = match raw {
        Ok(grid) => grid,
        Err(e) => {
            error!("Failed to load {}: {}", file.display(), e);
            std::process::exit(1);
        }
    };

    let cleaned = clean_grid(&raw, &config.cleaning);

    if cleaned.is_empty() {
        println!(
            "{}: empty after cleaning (raw shape {}x{})",
            file.display(),
            raw.rows(),
            raw.cols()
        );
        return;
    }

    let stats = summarize(&cleaned);

    print_summary(
        "File Statistics",
        &[
            ("File", file.display().to_string()),
            ("Raw shape", format!("{}x{}", raw.rows(), raw.cols())),
            (
                "Cleaned shape",
                format!("{}x{}", cleaned.rows(), cleaned.cols()),
            ),
            ("Min", format!("{:.6}", stats.min)),
            ("Max", format!("{:.6}", stats.max)),
            ("Mean", format!("{:.6}", stats.mean)),
            ("Std", format!("{:.6}", stats.std)),
            ("Range", format!("{:.6}", stats.range)),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );
}

fn cmd_generate(
    output_dir: &Path,
    files: usize,
    rows: usize,
    cols: usize,
    padding: usize,
    artifacts: bool,
    seed: u64,
) {
    let start = Instant::now();

    println!("Generating {} synthetic measurement files...", files);

    let mut written = Vec::with_capacity(files);

    for i in 0..files {
        let grid = synthetic_grid(rows, cols, padding, artifacts, seed.wrapping_add(i as u64));
        let name = format!("synthetic_sample_{:03}@_ORI.txt", i + 1);
        let path = output_dir.join(&name);

        match write_grid_txt(&path, &grid) {
            Ok(()) => written.push(path),
            Err(e) => {
                error!("Failed to write {}: {}", path.display(), e);
                std::process::exit(1);
            }
        }
    }

    print_summary(
        "Generation Complete",
        &[
            ("Files written", written.len().to_string()),
            ("Grid shape", format!("{}x{}", rows, cols)),
            ("Padding border", padding.to_string()),
            ("Artifacts", artifacts.to_string()),
            ("Output directory", output_dir.display().to_string()),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );
}

/// Deterministic LCG step shared by the synthetic generator.
fn lcg_next(state: &mut u64) -> u64 {
    *state = state
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    *state
}

/// Uniform value in [0, 1) from the LCG.
fn lcg_unit(state: &mut u64) -> f64 {
    (lcg_next(state) >> 11) as f64 / (1u64 << 53) as f64
}

/// Build one synthetic warpage surface: a center bow with measurement
/// noise, an optional sprinkle of sentinel artifacts, and a zero border
/// standing in for the non-measured area around the board.
fn synthetic_grid(
    rows: usize,
    cols: usize,
    padding: usize,
    artifacts: bool,
    seed: u64,
) -> MeasurementGrid {
    let mut state = seed;
    let total_rows = rows + 2 * padding;
    let total_cols = cols + 2 * padding;

    let mut data = Vec::with_capacity(total_rows * total_cols);

    for r in 0..total_rows {
        for c in 0..total_cols {
            let inside = r >= padding && r < padding + rows && c >= padding && c < padding + cols;
            if !inside {
                data.push(0.0);
                continue;
            }

            // Center bow: deepest warpage at the board center.
            let y = (r - padding) as f64 / (rows.max(2) - 1) as f64;
            let x = (c - padding) as f64 / (cols.max(2) - 1) as f64;
            let r_squared = (x - 0.5).powi(2) + (y - 0.5).powi(2);
            let noise = (lcg_unit(&mut state) - 0.5) * 300.0;
            let mut value = -2000.0 * r_squared - 1000.0 + noise;

            if artifacts && lcg_unit(&mut state) < 0.001 {
                value = DEFAULT_SENTINELS[0];
            }

            data.push(value);
        }
    }

    MeasurementGrid::new(total_rows, total_cols, data)
}
