// ABOUTME: Session state persistence — the whole conversation as one JSON document.
// ABOUTME: Folds Done events into the stored history; saves replace the file atomically.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::agent::Done;
use crate::llm::Message;

/// File name of the state document inside a session directory.
pub const STATE_FILE: &str = "session.json";

/// Conversation state carried between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub workspace_dir: String,
    #[serde(default)]
    pub title: String,
    pub created_at: String,
    pub updated_at: String,
    pub messages: Vec<Message>,
    pub total_tokens: u64,
}

impl SessionState {
    pub fn new(workspace_dir: &Path) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            workspace_dir: workspace_dir.display().to_string(),
            title: String::new(),
            created_at: now.clone(),
            updated_at: now,
            messages: Vec::new(),
            total_tokens: 0,
        }
    }

    /// Append a completed turn: the user's input, then the messages the
    /// agent produced, in order.
    pub fn record_turn(&mut self, input: &str, done: &Done) {
        self.messages.push(Message::user(input));
        self.messages.extend(done.messages.iter().cloned());
        self.total_tokens += done.usage.total();
        self.updated_at = Utc::now().to_rfc3339();
    }

    /// Read the state stored in `session_dir`. `None` if nothing was saved yet.
    pub fn load(session_dir: &Path) -> anyhow::Result<Option<Self>> {
        let content = match std::fs::read_to_string(state_path(session_dir)) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Write the state into `session_dir`, replacing any previous save.
    pub fn save(&self, session_dir: &Path) -> anyhow::Result<()> {
        std::fs::create_dir_all(session_dir)?;
        let path = state_path(session_dir);
        let staged = path.with_extension("json.tmp");
        std::fs::write(&staged, serde_json::to_vec_pretty(self)?)?;
        std::fs::rename(&staged, &path)?;
        Ok(())
    }
}

fn state_path(session_dir: &Path) -> PathBuf {
    session_dir.join(STATE_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Role, ToolCall, ToolResult, Usage};

    fn sample_done() -> Done {
        let mut call = Message::assistant("");
        call.tool_calls.push(ToolCall::new("call-1", "shell", r#"{"cmd":"ls"}"#));
        Done {
            full_text: "two files".to_string(),
            usage: Usage {
                input_tokens: 1000,
                output_tokens: 234,
            },
            messages: vec![
                call,
                Message::tool_results(vec![ToolResult::new("call-1", "a.txt\nb.txt")]),
                Message::assistant("two files"),
            ],
        }
    }

    #[test]
    fn record_turn_appends_input_then_messages() {
        let mut state = SessionState::new(Path::new("/tmp/ws"));
        state.record_turn("list files", &sample_done());

        let roles: Vec<Role> = state.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::Tool, Role::Assistant]
        );
        assert_eq!(state.messages[0].content, "list files");
        assert_eq!(state.total_tokens, 1234);
    }

    #[test]
    fn save_then_load_restores_history() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("abc");

        let mut state = SessionState::new(Path::new("/home/user/projects/myapp"));
        state.title = "List files".to_string();
        state.record_turn("list files", &sample_done());
        state.save(&dir).unwrap();

        let loaded = SessionState::load(&dir).unwrap().unwrap();
        assert_eq!(loaded.title, "List files");
        assert_eq!(loaded.messages, state.messages);
        assert_eq!(loaded.total_tokens, 1234);
        assert!(!dir.join("session.json.tmp").exists());
    }

    #[test]
    fn load_without_save_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(SessionState::load(&tmp.path().join("fresh")).unwrap().is_none());
    }

    #[test]
    fn load_rejects_corrupt_state() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(STATE_FILE), "{not json").unwrap();
        assert!(SessionState::load(tmp.path()).is_err());
    }

    #[test]
    fn later_save_replaces_earlier() {
        let tmp = tempfile::tempdir().unwrap();
        let mut state = SessionState::new(Path::new("/w"));
        state.save(tmp.path()).unwrap();

        state.record_turn("again", &sample_done());
        state.save(tmp.path()).unwrap();

        let loaded = SessionState::load(tmp.path()).unwrap().unwrap();
        assert_eq!(loaded.messages.len(), 4);
    }
}
