//! Layered configuration for dissonance analysis.
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins, key by key):
//! 1. `/etc/dissonance/config.toml` (system)
//! 2. `~/.config/dissonance/config.toml` (user)
//! 3. `./dissonance.toml` (local override, replaced by an explicit path)
//! 4. Environment variables (`DISSONANCE_*`, `RUST_LOG`)
//!
//! # Example Config
//!
//! ```toml
//! [analysis]
//! profile = "pitch-class"
//! time_threshold = 8.0
//!
//! [sweep]
//! dimensions = [64, 128]
//! template = "exp/dim{dim}/continuation.json"
//!
//! [paths]
//! encoding = "~/mmt/encoding.json"
//!
//! [telemetry]
//! log_level = "debug"
//! ```

pub mod loader;
pub mod sections;

pub use loader::{discover_config_files_with_override, expand_path, ConfigSources};
pub use sections::{AnalysisConfig, PathsConfig, SweepConfig, TelemetryConfig};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Complete configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DissonanceConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub sweep: SweepConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl DissonanceConfig {
    /// Load configuration from all standard sources.
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration, with `config_path` replacing the local override.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration and report which files and env vars contributed.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let files = loader::discover_config_files_with_override(config_path);
        let (mut config, mut sources) = Self::load_files(&files)?;

        loader::apply_env_overrides(&mut config, &mut sources);
        config.expand_paths();

        Ok((config, sources))
    }

    /// Load exactly the given files (in order), without env overrides.
    pub fn load_files(files: &[PathBuf]) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut merged = toml::Table::new();

        for path in files {
            let table = loader::load_table(path)?;
            loader::merge_tables(&mut merged, table);
            sources.files.push(path.clone());
        }

        let origin = sources
            .files
            .last()
            .cloned()
            .unwrap_or_else(|| PathBuf::from("<defaults>"));
        let mut config = loader::table_to_config(merged, &origin)?;
        config.expand_paths();

        Ok((config, sources))
    }

    fn expand_paths(&mut self) {
        if let Some(s) = self.paths.encoding.to_str() {
            self.paths.encoding = expand_path(s);
        }
        if let Some(s) = self.paths.table_dir.to_str() {
            self.paths.table_dir = expand_path(s);
        }
    }

    /// Serialize config to a TOML string.
    pub fn to_toml(&self) -> String {
        let mut output = String::new();

        output.push_str("# Dissonance Configuration\n\n");

        output.push_str("[analysis]\n");
        output.push_str(&format!("profile = \"{}\"\n", self.analysis.profile));
        match self.analysis.time_threshold {
            Some(t) => output.push_str(&format!("time_threshold = {:?}\n", t)),
            None => output.push_str("# time_threshold = <profile default>\n"),
        }
        match &self.analysis.intervals {
            Some(intervals) => output.push_str(&format!("intervals = {:?}\n", intervals)),
            None => output.push_str("# intervals = <profile default>\n"),
        }

        output.push_str("\n[sweep]\n");
        output.push_str(&format!("dimensions = {:?}\n", self.sweep.dimensions));
        output.push_str(&format!("template = \"{}\"\n", self.sweep.template));

        output.push_str("\n[paths]\n");
        output.push_str(&format!(
            "encoding = \"{}\"\n",
            self.paths.encoding.display()
        ));
        output.push_str(&format!(
            "table_dir = \"{}\"\n",
            self.paths.table_dir.display()
        ));
        output.push_str(&format!(
            "plot_dir_name = \"{}\"\n",
            self.paths.plot_dir_name
        ));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!("log_level = \"{}\"\n", self.telemetry.log_level));

        output
    }
}
