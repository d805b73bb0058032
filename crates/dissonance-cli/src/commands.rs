//! CLI command implementations

use anyhow::{bail, Context, Result};
use dissonance::{
    analyze_file, group_by_instrument, load_score, read_instrument_table,
    write_instrument_tables, AnalysisProfile, DissonanceAnalysis, DissonantIntervals,
    InstrumentMap, PianoRoll, PitchPolicy, RollOptions,
};
use dissonance_conf::{AnalysisConfig, ConfigSources, DissonanceConfig};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::ProfileArgs;

/// Build the analysis profile: preset, then config overrides, then flags.
pub fn resolve_profile(config: &AnalysisConfig, args: &ProfileArgs) -> Result<AnalysisProfile> {
    let name = args.profile.as_deref().unwrap_or(&config.profile);
    let mut profile = AnalysisProfile::by_name(name)?;

    if let Some(threshold) = config.time_threshold {
        check_threshold(threshold).context("invalid [analysis] time_threshold")?;
        profile = profile.with_time_threshold(Some(threshold));
    }
    if let Some(intervals) = &config.intervals {
        profile = profile.with_intervals(DissonantIntervals::new(intervals.iter().copied()));
    }

    if args.no_threshold {
        profile = profile.with_time_threshold(None);
    } else if let Some(threshold) = args.threshold {
        check_threshold(threshold)?;
        profile = profile.with_time_threshold(Some(threshold));
    }
    if let Some(list) = &args.intervals {
        profile = profile.with_intervals(DissonantIntervals::parse_list(list)?);
    }
    if let Some(policy) = &args.pitch_policy {
        profile = profile.with_pitch_policy(policy.parse::<PitchPolicy>()?);
    }

    Ok(profile)
}

fn check_threshold(threshold: f64) -> Result<()> {
    if !threshold.is_finite() || threshold < 0.0 {
        bail!("time threshold must be a non-negative number, got {}", threshold);
    }
    Ok(())
}

/// Analyze each file and print one line (or JSON document) per file.
pub fn count(
    config: &DissonanceConfig,
    files: &[PathBuf],
    profile_args: &ProfileArgs,
    json: bool,
    events: bool,
) -> Result<()> {
    let profile = resolve_profile(&config.analysis, profile_args)?;
    log_profile(&profile);

    for file in files {
        let mut analysis = analyze_file(file, &profile)
            .with_context(|| format!("Failed to analyze {}", file.display()))?;

        if json {
            if !events {
                analysis.events.clear();
            }
            println!("{}", serde_json::to_string_pretty(&analysis)?);
        } else {
            println!(
                "Total dissonances found({}): {}",
                file.display(),
                analysis.count
            );
            if events {
                print_events(&analysis);
            }
        }
    }
    Ok(())
}

/// Analyze one templated file per dimension.
///
/// Any failure ends the run unless `keep_going` is set.
pub fn sweep(
    config: &DissonanceConfig,
    dims: Option<Vec<u32>>,
    template: Option<String>,
    keep_going: bool,
    profile_args: &ProfileArgs,
) -> Result<()> {
    let profile = resolve_profile(&config.analysis, profile_args)?;
    log_profile(&profile);

    let mut sweep = config.sweep.clone();
    if let Some(dims) = dims {
        sweep.dimensions = dims;
    }
    if let Some(template) = template {
        sweep.template = template;
    }
    if !sweep.template.contains("{dim}") {
        warn!(template = %sweep.template, "template has no {{dim}} placeholder; every dimension reads the same file");
    }

    let mut failures = 0;
    for &dim in &sweep.dimensions {
        let path = sweep.path_for(dim);
        match analyze_file(&path, &profile) {
            Ok(analysis) => {
                println!("Total dissonances found(dim={}): {}", dim, analysis.count);
            }
            Err(e) if keep_going => {
                warn!(dim, path = %path.display(), error = %e, "skipping dimension");
                failures += 1;
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to analyze dim={} ({})", dim, path.display())
                });
            }
        }
    }

    if failures > 0 {
        bail!(
            "{} of {} dimensions failed",
            failures,
            sweep.dimensions.len()
        );
    }
    Ok(())
}

/// Export per-instrument CSV tables and render a piano roll for each.
pub fn instruments(
    config: &DissonanceConfig,
    file: &Path,
    encoding: Option<PathBuf>,
    out: Option<PathBuf>,
    plots: bool,
) -> Result<()> {
    let encoding = encoding.unwrap_or_else(|| config.paths.encoding.clone());
    let table_dir = out.unwrap_or_else(|| config.paths.table_dir.clone());

    let score = load_score(file).with_context(|| format!("Failed to load {}", file.display()))?;
    let map = InstrumentMap::load(&encoding)
        .with_context(|| format!("Failed to load encoding {}", encoding.display()))?;

    let groups = group_by_instrument(&score, &map);
    let tables = write_instrument_tables(&groups, &table_dir)
        .with_context(|| format!("Failed to write tables to {}", table_dir.display()))?;
    info!(instruments = tables.len(), dir = %table_dir.display(), "wrote instrument tables");
    for table in &tables {
        println!("table: {}", table.display());
    }

    if !plots {
        return Ok(());
    }

    let plot_dir = plot_dir_for(file, &config.paths.plot_dir_name);
    std::fs::create_dir_all(&plot_dir)
        .with_context(|| format!("Failed to create {}", plot_dir.display()))?;

    let options = RollOptions::default();
    for table in &tables {
        let title = table
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let notes = read_instrument_table(table)
            .with_context(|| format!("Failed to read table {}", table.display()))?;
        let image = plot_dir.join(format!("{}.png", title));
        let roll = PianoRoll::render(&notes, &options)
            .with_context(|| format!("Failed to render piano roll for {}", title))?;
        roll.write_png(&image)
            .with_context(|| format!("Failed to write {}", image.display()))?;
        println!("plot: {}", image.display());
    }
    Ok(())
}

/// `<parent of the input's directory>/<name>`.
pub fn plot_dir_for(input: &Path, name: &str) -> PathBuf {
    input
        .parent()
        .and_then(Path::parent)
        .unwrap_or_else(|| Path::new(""))
        .join(name)
}

pub fn show_config(config: &DissonanceConfig, sources: &ConfigSources) {
    print!("{}", config.to_toml());
    println!();
    if sources.files.is_empty() {
        println!("# sources: compiled defaults");
    }
    for file in &sources.files {
        println!("# source: {}", file.display());
    }
    for var in &sources.env_overrides {
        println!("# env: {}", var);
    }
}

fn log_profile(profile: &AnalysisProfile) {
    info!(
        profile = %profile.name,
        intervals = %profile.intervals,
        time_threshold = ?profile.time_threshold,
        pitch_policy = %profile.pitch_policy,
        "analysis profile"
    );
}

fn print_events(analysis: &DissonanceAnalysis) {
    for event in &analysis.events {
        println!(
            "  {}-{} ({} semitones) over [{}, {}]",
            event.pitches.low,
            event.pitches.high,
            event.pitches.interval(),
            event.window.start,
            event.window.end
        );
    }
}
