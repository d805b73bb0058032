//! dissonance - count dissonant intervals in note-event JSON files
//!
//! Subcommands:
//! - `dissonance count <files>...` - Analyze individual files
//! - `dissonance sweep` - Analyze one generated file per embedding dimension
//! - `dissonance instruments <file>` - Export per-instrument tables and piano rolls
//! - `dissonance config` - Show the effective configuration

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use dissonance_conf::DissonanceConfig;
use std::path::PathBuf;

mod commands;
mod telemetry;

#[derive(Parser)]
#[command(name = "dissonance")]
#[command(about = "Count dissonant intervals between co-sounding notes")]
#[command(version)]
struct Cli {
    /// Config file (replaces ./dissonance.toml)
    #[arg(long, global = true, env = "DISSONANCE_CONFIG")]
    config: Option<PathBuf>,

    /// Log at debug level regardless of configuration
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides for the configured analysis profile.
#[derive(Args, Debug, Default, Clone)]
pub struct ProfileArgs {
    /// Preset: "wide" (raw pitch) or "pitch-class" (mod 12)
    #[arg(short, long)]
    profile: Option<String>,

    /// Only notes starting at or before this beat are analyzed
    #[arg(short, long, conflicts_with = "no_threshold")]
    threshold: Option<f64>,

    /// Analyze every note regardless of start time
    #[arg(long)]
    no_threshold: bool,

    /// Comma separated dissonant intervals in semitones (e.g. "1,2,6,10,11")
    #[arg(short, long)]
    intervals: Option<String>,

    /// Pitch comparison: "raw" or "pitch-class"
    #[arg(long)]
    pitch_policy: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Count dissonances in one or more note-event JSON files
    Count {
        /// Input files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        profile: ProfileArgs,

        /// Print results as JSON
        #[arg(long)]
        json: bool,

        /// Include every counted event in the output
        #[arg(long)]
        events: bool,
    },

    /// Count dissonances for each embedding dimension
    Sweep {
        /// Dimensions to run (default from config)
        #[arg(long, value_delimiter = ',')]
        dims: Option<Vec<u32>>,

        /// Path template; `{dim}` is replaced by each dimension
        #[arg(long)]
        template: Option<String>,

        /// Report failures and continue with the next dimension
        #[arg(long)]
        keep_going: bool,

        #[command(flatten)]
        profile: ProfileArgs,
    },

    /// Export per-instrument note tables and piano-roll images
    Instruments {
        /// Note-event JSON file
        file: PathBuf,

        /// Encoding file with program_instrument_map (default from config)
        #[arg(short, long)]
        encoding: Option<PathBuf>,

        /// Directory for CSV tables (default from config)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Skip piano-roll rendering
        #[arg(long)]
        no_plots: bool,
    },

    /// Print the effective configuration and where it came from
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        if !path.exists() {
            bail!("Config file not found: {}", path.display());
        }
    }

    let (config, sources) = DissonanceConfig::load_with_sources_from(cli.config.as_deref())
        .context("Failed to load configuration")?;

    let level = if cli.verbose {
        "debug"
    } else {
        config.telemetry.log_level.as_str()
    };
    telemetry::init(level);

    for file in &sources.files {
        tracing::debug!(path = %file.display(), "loaded config file");
    }

    match cli.command {
        Commands::Count {
            files,
            profile,
            json,
            events,
        } => commands::count(&config, &files, &profile, json, events),
        Commands::Sweep {
            dims,
            template,
            keep_going,
            profile,
        } => commands::sweep(&config, dims, template, keep_going, &profile),
        Commands::Instruments {
            file,
            encoding,
            out,
            no_plots,
        } => commands::instruments(&config, &file, encoding, out, !no_plots),
        Commands::Config => {
            commands::show_config(&config, &sources);
            Ok(())
        }
    }
}
