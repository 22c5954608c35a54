// ABOUTME: Library root for otter — the agent execution core of a terminal coding assistant.
// ABOUTME: Providers, tools, and the UI plug in from outside through the traits re-exported here.

pub mod agent;
pub mod config;
pub mod llm;
pub mod logging;
pub mod prompt;
pub mod session;
pub mod tools;

pub use agent::{Agent, AgentError, AgentEvent, Done};
pub use config::{AgentConfig, CompactionConfig, Config};
pub use llm::{Message, Provider, ProviderError, Response, Role, StreamItem, ToolCall, ToolResult};
pub use tools::{Tool, ToolRegistry};
