// ABOUTME: Configuration loading for otter.
// ABOUTME: Reads ~/.otter/config.toml into explicit structs handed to the agent at construction.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub agent: AgentConfig,
    pub log: LogConfig,
}

/// Knobs consumed by the agent loop.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Hard ceiling on provider round-trips per invocation.
    pub max_steps: usize,
    /// Use the provider's streaming mode.
    pub stream: bool,
    /// Successful tool output longer than this (in chars) is truncated.
    pub tool_output_chars: usize,
    /// Generated titles are cut to this many chars.
    pub title_chars: usize,
    pub compaction: CompactionConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: 100,
            stream: false,
            tool_output_chars: 4000,
            title_chars: 20,
            compaction: CompactionConfig::default(),
        }
    }
}

/// Automatic history compaction settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompactionConfig {
    pub enabled: bool,
    /// Estimated transcript tokens at or above which compaction runs.
    pub threshold_tokens: u64,
    /// Most recent messages kept verbatim.
    pub keep_recent: usize,
    /// Deadline for the summarization call.
    pub summary_timeout_secs: u64,
    /// Per-entry cap (chars) for tool results fed to the summarizer.
    pub summary_entry_chars: usize,
}

impl CompactionConfig {
    pub fn summary_timeout(&self) -> Duration {
        Duration::from_secs(self.summary_timeout_secs)
    }
}

impl Default for CompactionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold_tokens: 60_000,
            keep_recent: 6,
            summary_timeout_secs: 30,
            summary_entry_chars: 500,
        }
    }
}

/// Log sink settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter directive when RUST_LOG is unset.
    pub level: String,
    /// Directory for otter.log; defaults to `Config::log_dir()`.
    pub dir: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
        }
    }
}

impl Config {
    /// Load config from ~/.otter/config.toml, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    fn home() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".otter")
    }

    /// Path to the config file.
    pub fn config_path() -> PathBuf {
        Self::home().join("config.toml")
    }

    /// Root directory for per-workspace session files.
    pub fn sessions_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(Self::home)
            .join("otter")
            .join("sessions")
    }

    /// Directory holding otter.log.
    pub fn log_dir() -> PathBuf {
        Self::home().join("logs")
    }
}
