// ABOUTME: JSONL session logger — one line per message, one file per run.
// ABOUTME: Fed by the caller from Done events; files live in a per-workspace session directory.

use std::fs::{self, File};
use std::hash::Hasher;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::llm::Message;

/// One line of a session log.
#[derive(Debug, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub message: Message,
}

/// Directory under `sessions_root` that holds everything recorded for
/// `workspace`. Named by a stable hash of the workspace path.
pub fn session_dir(sessions_root: &Path, workspace: &Path) -> PathBuf {
    let mut hasher = std::hash::DefaultHasher::new();
    hasher.write(workspace.as_os_str().as_encoded_bytes());
    sessions_root.join(format!("{:016x}", hasher.finish()))
}

/// Appends finished turns to a timestamped `.jsonl` file.
pub struct SessionLogger {
    writer: BufWriter<File>,
    pub log_path: PathBuf,
}

impl SessionLogger {
    pub fn open(session_dir: &Path) -> anyhow::Result<Self> {
        fs::create_dir_all(session_dir)?;
        let stamp = Utc::now().format("%Y-%m-%dT%H-%M-%S");
        let log_path = session_dir.join(format!("{}.jsonl", stamp));
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            log_path,
        })
    }

    /// Write `messages` in order and flush once.
    pub fn record(&mut self, messages: &[Message]) -> anyhow::Result<()> {
        let timestamp = Utc::now().to_rfc3339();
        for message in messages {
            let entry = LogEntry {
                timestamp: timestamp.clone(),
                message: message.clone(),
            };
            serde_json::to_writer(&mut self.writer, &entry)?;
            self.writer.write_all(b"\n")?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
