//! Configuration types for the analysis pipeline.
//!
//! The recognized options are fixed: data location and file-type selection,
//! cleaning parameters, and color-scale overrides. Values are validated at
//! construction (via [`AnalysisConfig::validate`]), not at point of use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::discovery::FileKind;
use crate::processors::cleaning::{DEFAULT_SENTINELS, DEFAULT_TOLERANCE};

/// Errors produced by configuration validation and file round-trips.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("folder list must not be empty")]
    EmptyFolderList,

    #[error("{name} must be in (0, 1], got {value}")]
    InvalidFraction { name: &'static str, value: f64 },

    #[error("artifact tolerance must be non-negative, got {0}")]
    InvalidTolerance(f64),

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Where to look for measurement files and which kind to pick up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Base path containing the measurement folders.
    #[serde(default = "default_base_path")]
    pub base_path: PathBuf,

    /// Folders to analyze, in the order they should be processed.
    #[serde(default = "default_folders")]
    pub folders: Vec<String>,

    /// Which file kind to select (original, corrected, or binary).
    #[serde(default = "default_file_type")]
    pub file_type: FileKind,
}

fn default_base_path() -> PathBuf {
    PathBuf::from("./data")
}

fn default_folders() -> Vec<String> {
    vec!["20250716".to_string()]
}

fn default_file_type() -> FileKind {
    FileKind::Original
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            folders: default_folders(),
            file_type: default_file_type(),
        }
    }
}

/// Cleaning parameters: sentinel artifact values and center-region fractions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningConfig {
    /// Instrument fault codes to nullify.
    #[serde(default = "default_sentinels")]
    pub artifact_sentinels: Vec<f64>,

    /// Equality tolerance for sentinel matching; zero means exact.
    #[serde(default = "default_tolerance")]
    pub artifact_tolerance: f64,

    /// Fraction of rows to keep in the center, in (0, 1].
    #[serde(default = "default_fraction")]
    pub row_fraction: f64,

    /// Fraction of columns to keep in the center, in (0, 1].
    #[serde(default = "default_fraction")]
    pub col_fraction: f64,
}

fn default_sentinels() -> Vec<f64> {
    DEFAULT_SENTINELS.to_vec()
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

fn default_fraction() -> f64 {
    1.0
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            artifact_sentinels: default_sentinels(),
            artifact_tolerance: default_tolerance(),
            row_fraction: default_fraction(),
            col_fraction: default_fraction(),
        }
    }
}

/// Optional explicit color-scale bounds. `None` means auto-resolved from
/// the batch statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScaleConfig {
    #[serde(default)]
    pub vmin: Option<f64>,

    #[serde(default)]
    pub vmax: Option<f64>,
}

/// Full pipeline configuration combining all sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub cleaning: CleaningConfig,

    #[serde(default)]
    pub scale: ScaleConfig,
}

impl AnalysisConfig {
    /// Load and validate configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: AnalysisConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check range constraints: non-empty folder list, fractions in (0, 1],
    /// non-negative tolerance.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data.folders.is_empty() {
            return Err(ConfigError::EmptyFolderList);
        }

        for (name, value) in [
            ("row_fraction", self.cleaning.row_fraction),
            ("col_fraction", self.cleaning.col_fraction),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::InvalidFraction { name, value });
            }
        }

        if self.cleaning.artifact_tolerance < 0.0 {
            return Err(ConfigError::InvalidTolerance(
                self.cleaning.artifact_tolerance,
            ));
        }

        Ok(())
    }
}
