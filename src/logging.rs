// ABOUTME: Log sink setup — routes `tracing` output to otter.log in the log directory.
// ABOUTME: The terminal belongs to the UI, so nothing is written to stdout or stderr.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::{Config, LogConfig};

/// Resolve the directory otter.log is written to.
pub fn log_dir(config: &LogConfig) -> PathBuf {
    config.dir.clone().unwrap_or_else(Config::log_dir)
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
///
/// Fails if the log file cannot be opened or a subscriber is already set.
pub fn init(config: &LogConfig) -> anyhow::Result<PathBuf> {
    let dir = log_dir(config);
    fs::create_dir_all(&dir)?;
    let path = dir.join("otter.log");
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))?;

    Ok(path)
}
