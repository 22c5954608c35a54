// ABOUTME: Agent module — the bounded step loop, its event vocabulary, and its helpers.
// ABOUTME: Covers tool dispatch, history compaction, and title generation.

pub mod compaction;
pub mod dispatch;
pub mod event;
pub mod r#loop;
pub mod title;

pub use event::{AgentError, AgentEvent, Done};
pub use r#loop::{Agent, EVENT_BUFFER};
