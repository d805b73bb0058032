//! Configuration sections and their compiled defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which dissonance policy to run and any overrides of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Named preset: "wide" or "pitch-class".
    /// Default: wide
    #[serde(default = "AnalysisConfig::default_profile")]
    pub profile: String,

    /// Override the preset's time window, in beats.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_threshold: Option<f64>,

    /// Override the preset's dissonant interval set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intervals: Option<Vec<u32>>,
}

impl AnalysisConfig {
    fn default_profile() -> String {
        "wide".to_string()
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            profile: Self::default_profile(),
            time_threshold: None,
            intervals: None,
        }
    }
}

/// Batch run over a family of generated files, one per embedding dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Default: [64, 128, 256, 512, 1024]
    #[serde(default = "SweepConfig::default_dimensions")]
    pub dimensions: Vec<u32>,

    /// Input path with `{dim}` standing in for the dimension.
    #[serde(default = "SweepConfig::default_template")]
    pub template: String,
}

impl SweepConfig {
    fn default_dimensions() -> Vec<u32> {
        vec![64, 128, 256, 512, 1024]
    }

    fn default_template() -> String {
        "exp/sod/ape/dim{dim}/samples/json/0_4-beat-continuation.json".to_string()
    }

    /// Input path for one dimension.
    pub fn path_for(&self, dim: u32) -> PathBuf {
        PathBuf::from(self.template.replace("{dim}", &dim.to_string()))
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            dimensions: Self::default_dimensions(),
            template: Self::default_template(),
        }
    }
}

/// Where instrument tables and plots come from and go to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Encoding document with `program_instrument_map`.
    /// Default: mmt/encoding.json
    #[serde(default = "PathsConfig::default_encoding")]
    pub encoding: PathBuf,

    /// Directory for per-instrument CSV tables.
    /// Default: output
    #[serde(default = "PathsConfig::default_table_dir")]
    pub table_dir: PathBuf,

    /// Plot directory name, created next to the input's parent directory.
    /// Default: png-instrument
    #[serde(default = "PathsConfig::default_plot_dir_name")]
    pub plot_dir_name: String,
}

impl PathsConfig {
    fn default_encoding() -> PathBuf {
        PathBuf::from("mmt/encoding.json")
    }

    fn default_table_dir() -> PathBuf {
        PathBuf::from("output")
    }

    fn default_plot_dir_name() -> String {
        "png-instrument".to_string()
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            encoding: Self::default_encoding(),
            table_dir: Self::default_table_dir(),
            plot_dir_name: Self::default_plot_dir_name(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log filter (trace, debug, info, warn, error, or an EnvFilter directive).
    /// Default: info
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}
