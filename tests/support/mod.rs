// ABOUTME: Shared fixtures for integration tests — a scripted provider and simple tools.
// ABOUTME: The provider replays queued responses and records every transcript it was sent.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use otter::agent::compaction::SUMMARIZATION_PROMPT;
use otter::llm::{ChatStream, ToolSpec};
use otter::{AgentEvent, Message, Provider, ProviderError, Response, StreamItem, Tool};

/// Replays queued responses in order; answers "done" once the queue is empty.
#[derive(Default)]
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<Response, ProviderError>>>,
    calls: Mutex<Vec<Vec<Message>>>,
    /// Summarization requests sleep this long before answering.
    summary_delay: Option<Duration>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<Result<Response, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            ..Default::default()
        }
    }

    pub fn with_summary_delay(mut self, delay: Duration) -> Self {
        self.summary_delay = Some(delay);
        self
    }

    /// Every transcript sent so far, in call order.
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().unwrap().clone()
    }

    fn next(&self, messages: &[Message]) -> Result<Response, ProviderError> {
        self.calls.lock().unwrap().push(messages.to_vec());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Response::text("done")))
    }
}

fn is_summary_request(messages: &[Message]) -> bool {
    messages
        .first()
        .is_some_and(|m| m.content == SUMMARIZATION_PROMPT)
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn chat(
        &self,
        messages: &[Message],
        _tools: &[ToolSpec],
    ) -> Result<Response, ProviderError> {
        if let Some(delay) = self.summary_delay {
            if is_summary_request(messages) {
                tokio::time::sleep(delay).await;
            }
        }
        self.next(messages)
    }

    /// Splits content into word chunks, then yields the response itself.
    fn chat_stream<'a>(
        &'a self,
        messages: &'a [Message],
        _tools: &'a [ToolSpec],
    ) -> ChatStream<'a> {
        let items: Vec<Result<StreamItem, ProviderError>> = match self.next(messages) {
            Ok(response) => {
                let mut items: Vec<_> = response
                    .content
                    .split_inclusive(' ')
                    .map(|chunk| Ok(StreamItem::Chunk(chunk.to_string())))
                    .collect();
                items.push(Ok(StreamItem::Final(response)));
                items
            }
            Err(e) => vec![Err(e)],
        };
        stream::iter(items).boxed()
    }
}

/// Returns its raw arguments.
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echo the arguments back"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": { "text": { "type": "string" } }
        })
    }

    async fn run(&self, args: &str) -> anyhow::Result<String> {
        Ok(args.to_string())
    }
}

/// Fires a cancellation token when run.
pub struct CancelTool(pub CancellationToken);

#[async_trait]
impl Tool for CancelTool {
    fn name(&self) -> &str {
        "stop"
    }

    fn description(&self) -> &str {
        "Cancel the current run"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object"})
    }

    async fn run(&self, _args: &str) -> anyhow::Result<String> {
        self.0.cancel();
        Ok("stopping".to_string())
    }
}

/// Collect every event until the channel closes.
pub async fn collect(mut rx: mpsc::Receiver<AgentEvent>) -> Vec<AgentEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

/// Assert the stream holds exactly one terminal event and it is the last.
pub fn assert_single_terminal(events: &[AgentEvent]) {
    let terminals = events.iter().filter(|e| e.is_terminal()).count();
    assert_eq!(terminals, 1, "expected one terminal event in {:?}", events);
    assert!(
        events.last().is_some_and(AgentEvent::is_terminal),
        "terminal event must be last: {:?}",
        events
    );
}

/// Short name for each event, for order assertions.
pub fn kinds(events: &[AgentEvent]) -> Vec<String> {
    events
        .iter()
        .map(|event| match event {
            AgentEvent::TextDelta(_) => "text".to_string(),
            AgentEvent::ToolStart { id, .. } => format!("{}-start", id),
            AgentEvent::ToolEnd { id, .. } => format!("{}-end", id),
            AgentEvent::CompactStart { .. } => "compact-start".to_string(),
            AgentEvent::CompactEnd { .. } => "compact-end".to_string(),
            AgentEvent::Done(_) => "done".to_string(),
            AgentEvent::Error(_) => "error".to_string(),
        })
        .collect()
}
