// ABOUTME: Session module — persistence of conversation history to disk.
// ABOUTME: A collaborator of the agent: callers feed it the messages carried by Done events.

pub mod log;
pub mod persistence;

pub use log::{SessionLogger, session_dir};
pub use persistence::SessionState;
