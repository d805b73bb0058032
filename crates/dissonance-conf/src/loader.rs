//! Config file discovery, loading, merging, and environment variable overlay.

use crate::{ConfigError, DissonanceConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided and exists, it replaces the local override.
/// Returns paths in load order (system, user, local/cli).
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/dissonance/config.toml");
    if system.exists() {
        files.push(system);
    }

    // XDG_CONFIG_HOME or ~/.config
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("dissonance/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("dissonance.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Read a TOML file and check that it describes a valid config on its own.
pub fn load_table(path: &Path) -> Result<toml::Table, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let table: toml::Table = contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    table_to_config(table.clone(), path)?;
    Ok(table)
}

/// Deep-merge `overlay` into `base`: nested tables merge, everything else replaces.
pub fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

pub(crate) fn table_to_config(
    table: toml::Table,
    origin: &Path,
) -> Result<DissonanceConfig, ConfigError> {
    toml::Value::Table(table)
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::Parse {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(config: &mut DissonanceConfig, sources: &mut ConfigSources) {
    apply_overrides_from(config, sources, |name| env::var(name).ok());
}

fn apply_overrides_from(
    config: &mut DissonanceConfig,
    sources: &mut ConfigSources,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if let Some(v) = lookup("DISSONANCE_PROFILE") {
        config.analysis.profile = v;
        sources.env_overrides.push("DISSONANCE_PROFILE".to_string());
    }
    if let Some(v) = lookup("DISSONANCE_TIME_THRESHOLD") {
        if let Ok(threshold) = v.trim().parse() {
            config.analysis.time_threshold = Some(threshold);
            sources.env_overrides.push("DISSONANCE_TIME_THRESHOLD".to_string());
        }
    }
    if let Some(v) = lookup("DISSONANCE_INTERVALS") {
        let parsed: Result<Vec<u32>, _> = v
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect();
        if let Ok(intervals) = parsed {
            config.analysis.intervals = Some(intervals);
            sources.env_overrides.push("DISSONANCE_INTERVALS".to_string());
        }
    }
    if let Some(v) = lookup("DISSONANCE_ENCODING") {
        config.paths.encoding = PathBuf::from(v);
        sources.env_overrides.push("DISSONANCE_ENCODING".to_string());
    }
    if let Some(v) = lookup("DISSONANCE_LOG_LEVEL") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("DISSONANCE_LOG_LEVEL".to_string());
    }
    // Also support RUST_LOG
    if let Some(v) = lookup("RUST_LOG") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("RUST_LOG".to_string());
    }
}

/// Expand `~/` and a leading `$VAR` in a path.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            return home.join(stripped);
        }
    } else if let Some(stripped) = path.strip_prefix('$') {
        // $VAR/rest/of/path
        let (var_name, rest) = match stripped.find('/') {
            Some(pos) => (&stripped[..pos], Some(&stripped[pos + 1..])),
            None => (stripped, None),
        };
        if let Ok(value) = env::var(var_name) {
            let base = PathBuf::from(value);
            return match rest {
                Some(rest) => base.join(rest),
                None => base,
            };
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::io::Write;

    fn write_config(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_expand_path_tilde() {
        let expanded = expand_path("~/test/path");
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("test/path"));
    }

    #[test]
    fn test_expand_path_absolute() {
        assert_eq!(expand_path("/absolute/path"), PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_discover_with_missing_override() {
        let files = discover_config_files_with_override(Some(Path::new("/nope/missing.toml")));
        assert!(!files.iter().any(|p| p.ends_with("missing.toml")));
    }

    #[test]
    fn test_parse_minimal_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "a.toml", "[analysis]\nprofile = \"pitch-class\"\n");

        let (config, sources) = DissonanceConfig::load_files(&[path]).unwrap();
        assert_eq!(config.analysis.profile, "pitch-class");
        assert_eq!(config.sweep.dimensions, vec![64, 128, 256, 512, 1024]);
        assert_eq!(sources.files.len(), 1);
    }

    #[test]
    fn test_later_file_overrides_only_its_keys() {
        let dir = tempfile::tempdir().unwrap();
        let base = write_config(
            dir.path(),
            "base.toml",
            r#"
[analysis]
profile = "pitch-class"
time_threshold = 8.0

[sweep]
dimensions = [64]
"#,
        );
        let local = write_config(
            dir.path(),
            "local.toml",
            r#"
[analysis]
time_threshold = 2.5

[telemetry]
log_level = "debug"
"#,
        );

        let (config, _) = DissonanceConfig::load_files(&[base, local]).unwrap();
        assert_eq!(config.analysis.profile, "pitch-class");
        assert_eq!(config.analysis.time_threshold, Some(2.5));
        assert_eq!(config.sweep.dimensions, vec![64]);
        assert_eq!(config.telemetry.log_level, "debug");
    }

    #[test]
    fn test_invalid_toml_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "bad.toml", "[analysis\nprofile = 1");

        match DissonanceConfig::load_files(&[path]).unwrap_err() {
            ConfigError::Parse { path, .. } => assert!(path.ends_with("bad.toml")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_wrong_type_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "typed.toml", "[sweep]\ndimensions = \"all\"\n");
        assert!(matches!(
            DissonanceConfig::load_files(&[path]),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        assert!(matches!(
            load_table(Path::new("/nonexistent/dissonance.toml")),
            Err(ConfigError::FileRead { .. })
        ));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("DISSONANCE_PROFILE", "pitch-class"),
            ("DISSONANCE_TIME_THRESHOLD", "12"),
            ("DISSONANCE_INTERVALS", "1, 6"),
            ("DISSONANCE_LOG_LEVEL", "warn"),
        ]
        .into_iter()
        .collect();

        let mut config = DissonanceConfig::default();
        let mut sources = ConfigSources::default();
        apply_overrides_from(&mut config, &mut sources, |name| {
            vars.get(name).map(|v| v.to_string())
        });

        assert_eq!(config.analysis.profile, "pitch-class");
        assert_eq!(config.analysis.time_threshold, Some(12.0));
        assert_eq!(config.analysis.intervals, Some(vec![1, 6]));
        assert_eq!(config.telemetry.log_level, "warn");
        assert_eq!(sources.env_overrides.len(), 4);
    }

    #[test]
    fn test_unparseable_env_values_are_ignored() {
        let mut config = DissonanceConfig::default();
        let mut sources = ConfigSources::default();
        apply_overrides_from(&mut config, &mut sources, |name| match name {
            "DISSONANCE_TIME_THRESHOLD" => Some("soon".to_string()),
            "DISSONANCE_INTERVALS" => Some("1,x".to_string()),
            _ => None,
        });

        assert_eq!(config.analysis.time_threshold, None);
        assert_eq!(config.analysis.intervals, None);
        assert!(sources.env_overrides.is_empty());
    }
}
