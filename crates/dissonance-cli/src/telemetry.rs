//! Logging setup. Logs go to stderr so stdout carries only results.

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber filtered by `level` (a level name or EnvFilter directive).
pub fn init(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
