// ABOUTME: Event vocabulary streamed from the agent loop to its observer.
// ABOUTME: A closed enum; every invocation ends with exactly one Done or Error.

use thiserror::Error;

use crate::llm::{Message, ProviderError, Usage};

/// Why an invocation stopped without completing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AgentError {
    /// The caller's cancellation token fired. A controlled stop, not a failure.
    #[error("cancelled")]
    Cancelled,
    /// The model kept calling tools past the step budget.
    #[error("max steps reached ({0})")]
    MaxSteps(usize),
    /// The backend failed; the loop does not retry.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Payload of the successful terminal event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Done {
    /// Text of the final turn.
    pub full_text: String,
    pub usage: Usage,
    /// Assistant and tool messages produced by this invocation, for the
    /// caller to persist.
    pub messages: Vec<Message>,
}

/// Progress notifications, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEvent {
    TextDelta(String),
    ToolStart {
        id: String,
        name: String,
        args: String,
    },
    /// `output` is the (possibly truncated) result or the error text.
    ToolEnd {
        id: String,
        name: String,
        output: Result<String, String>,
    },
    CompactStart {
        tokens: u64,
        threshold: u64,
    },
    CompactEnd {
        before: u64,
        after: u64,
    },
    Done(Done),
    Error(AgentError),
}

impl AgentEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AgentEvent::Done(_) | AgentEvent::Error(_))
    }
}
