// ABOUTME: Provider boundary — message model, tool specs, and the chat / chat-stream contract.
// ABOUTME: Backends implement Provider; the agent loop only ever talks to this trait.

pub mod token;

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use token::{HeuristicEstimator, TokenEstimator};

/// Who authored a message in the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

/// A model-issued tool invocation. `args` is opaque to the agent and handed
/// to the named tool untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub args: String,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, args: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            args: args.into(),
        }
    }
}

/// The textual outcome of a tool call. Failures are encoded in `content`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub content: String,
}

impl ToolResult {
    pub fn new(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
        }
    }
}

/// A single transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_results: Vec<ToolResult>,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            reasoning: None,
            tool_calls: Vec::new(),
            tool_results: Vec::new(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    /// Build the assistant message recording a provider response.
    pub fn from_response(response: &Response) -> Self {
        Self {
            role: Role::Assistant,
            content: response.content.clone(),
            reasoning: response.reasoning.clone(),
            tool_calls: response.tool_calls.clone(),
            tool_results: Vec::new(),
        }
    }

    /// A `tool` message carrying every result of one dispatch round.
    pub fn tool_results(results: Vec<ToolResult>) -> Self {
        Self {
            role: Role::Tool,
            content: String::new(),
            reasoning: None,
            tool_calls: Vec::new(),
            tool_results: results,
        }
    }
}

/// Tool description advertised to the model with every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub schema: serde_json::Value,
}

/// Token counts reported by a backend. Zero means the backend did not say.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl Usage {
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// A complete assistant response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub content: String,
    pub reasoning: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub usage: Usage,
}

impl Response {
    /// A plain text response with no tool calls and unknown usage.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    /// A response that asks for the given tool calls.
    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: calls,
            ..Default::default()
        }
    }
}

/// One item of a streaming response: any number of chunks, then exactly one
/// `Final` carrying the aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamItem {
    Chunk(String),
    Final(Response),
}

/// Failures reported by a model backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("stream error: {0}")]
    Stream(String),
    #[error("stream ended without a final response")]
    IncompleteStream,
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("cancelled")]
    Cancelled,
}

pub type ChatStream<'a> = BoxStream<'a, Result<StreamItem, ProviderError>>;

/// A language-model backend.
///
/// Retry policy, authentication and wire formats live behind this trait.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Send the transcript and wait for the complete response.
    async fn chat(&self, messages: &[Message], tools: &[ToolSpec])
    -> Result<Response, ProviderError>;

    /// Send the transcript and stream the response back.
    ///
    /// The default adapts `chat`: the whole content arrives as one chunk.
    fn chat_stream<'a>(&'a self, messages: &'a [Message], tools: &'a [ToolSpec]) -> ChatStream<'a> {
        stream::once(self.chat(messages, tools))
            .flat_map(|result| {
                let items = match result {
                    Ok(response) => {
                        let mut items = Vec::with_capacity(2);
                        if !response.content.is_empty() {
                            items.push(Ok(StreamItem::Chunk(response.content.clone())));
                        }
                        items.push(Ok(StreamItem::Final(response)));
                        items
                    }
                    Err(e) => vec![Err(e)],
                };
                stream::iter(items)
            })
            .boxed()
    }
}
