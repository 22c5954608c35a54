// ABOUTME: Agent loop — drives the conversation between the transcript, the provider, and tools.
// ABOUTME: Runs one invocation per spawned task and reports progress over a bounded event channel.

use std::path::PathBuf;
use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::agent::compaction;
use crate::agent::dispatch::execute_tool_calls;
use crate::agent::event::{AgentError, AgentEvent, Done};
use crate::agent::title;
use crate::config::AgentConfig;
use crate::llm::{
    HeuristicEstimator, Message, Provider, ProviderError, Response, StreamItem, TokenEstimator,
    ToolSpec, Usage,
};
use crate::prompt::SystemPromptBuilder;
use crate::tools::ToolRegistry;

/// Capacity of the outbound event channel. A slow consumer eventually
/// blocks the loop; events are never dropped.
pub const EVENT_BUFFER: usize = 64;

/// A configured agent. Cheap to clone; every invocation runs on its own task
/// with its own transcript.
#[derive(Clone)]
pub struct Agent {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    estimator: Arc<dyn TokenEstimator>,
    config: AgentConfig,
    system_prompt: String,
}

impl Agent {
    /// Create an agent whose system prompt is the default layered prompt
    /// for the current working directory, listing `tools`.
    pub fn new(provider: Arc<dyn Provider>, tools: ToolRegistry, config: AgentConfig) -> Self {
        let workspace = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let system_prompt = SystemPromptBuilder::for_workspace(&workspace, &tools).build();
        Self {
            provider,
            tools: Arc::new(tools),
            estimator: Arc::new(HeuristicEstimator),
            config,
            system_prompt,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_estimator(mut self, estimator: Arc<dyn TokenEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Start an invocation that can only end by completing or failing.
    ///
    /// Must be called from within a tokio runtime.
    pub fn run(
        &self,
        history: Vec<Message>,
        input: impl Into<String>,
    ) -> mpsc::Receiver<AgentEvent> {
        self.run_with_cancel(history, input, CancellationToken::new())
    }

    /// Start an invocation on a new task and return its event stream.
    ///
    /// The stream ends with exactly one `Done` or `Error`, after which the
    /// channel closes. `cancel` is checked before every provider call.
    pub fn run_with_cancel(
        &self,
        history: Vec<Message>,
        input: impl Into<String>,
        cancel: CancellationToken,
    ) -> mpsc::Receiver<AgentEvent> {
        let (agent_tx, agent_rx) = mpsc::channel(EVENT_BUFFER);
        let agent = self.clone();
        let input = input.into();

        tokio::spawn(async move {
            let terminal = match agent.drive(history, input, &cancel, &agent_tx).await {
                Ok(done) => {
                    info!(
                        messages = done.messages.len(),
                        input_tokens = done.usage.input_tokens,
                        output_tokens = done.usage.output_tokens,
                        "agent run done"
                    );
                    AgentEvent::Done(done)
                }
                Err(e) => {
                    warn!(error = %e, "agent run stopped");
                    AgentEvent::Error(e)
                }
            };
            if agent_tx.send(terminal).await.is_err() {
                debug!("event receiver dropped before terminal event");
            }
        });

        agent_rx
    }

    /// Generate a short title for a conversation. Independent of any run.
    pub async fn generate_title(&self, text: &str) -> Result<String, ProviderError> {
        title::generate_title(self.provider.as_ref(), text, self.config.title_chars).await
    }

    /// The invocation body. Every exit path yields the single terminal
    /// outcome; intermediate events are sent along the way.
    async fn drive(
        &self,
        history: Vec<Message>,
        input: String,
        cancel: &CancellationToken,
        agent_tx: &mpsc::Sender<AgentEvent>,
    ) -> Result<Done, AgentError> {
        if cancel.is_cancelled() {
            return Err(AgentError::Cancelled);
        }
        info!(
            history = history.len(),
            input_len = input.len(),
            max_steps = self.config.max_steps,
            stream = self.config.stream,
            "agent run started"
        );

        let mut messages = self.build_messages(history, input, cancel, agent_tx).await;
        let tool_specs = self.tools.specs();
        let mut new_messages: Vec<Message> = Vec::new();

        for step in 0..self.config.max_steps {
            if cancel.is_cancelled() {
                return Err(AgentError::Cancelled);
            }
            debug!(step, transcript = messages.len(), "calling provider");

            let response = self.chat(&messages, &tool_specs, agent_tx).await?;
            let usage = self.resolve_usage(&messages, &response);

            let assistant = Message::from_response(&response);
            messages.push(assistant.clone());
            new_messages.push(assistant);

            if response.tool_calls.is_empty() {
                return Ok(Done {
                    full_text: response.content,
                    usage,
                    messages: new_messages,
                });
            }

            debug!(step, calls = response.tool_calls.len(), "dispatching tool calls");
            let results = execute_tool_calls(
                &self.tools,
                &response.tool_calls,
                self.config.tool_output_chars,
                agent_tx,
            )
            .await;

            // Every call yields a result, so this only guards against
            // re-asking the provider with nothing new in the transcript.
            if results.is_empty() {
                return Ok(Done {
                    full_text: response.content,
                    usage,
                    messages: new_messages,
                });
            }

            let tool_msg = Message::tool_results(results);
            messages.push(tool_msg.clone());
            new_messages.push(tool_msg);
        }

        Err(AgentError::MaxSteps(self.config.max_steps))
    }

    /// System prompt, prior history, and the new input, compacted if the
    /// result is over budget.
    async fn build_messages(
        &self,
        history: Vec<Message>,
        input: String,
        cancel: &CancellationToken,
        agent_tx: &mpsc::Sender<AgentEvent>,
    ) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system(self.system_prompt.clone()));
        messages.extend(history);
        messages.push(Message::user(input));

        compaction::maybe_compact(
            self.provider.as_ref(),
            self.estimator.as_ref(),
            &self.config.compaction,
            messages,
            cancel,
            agent_tx,
        )
        .await
    }

    /// One provider round-trip in the configured mode. Text is forwarded as
    /// `TextDelta` events before the response is returned.
    async fn chat(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
        agent_tx: &mpsc::Sender<AgentEvent>,
    ) -> Result<Response, ProviderError> {
        if self.config.stream {
            return stream_response(self.provider.as_ref(), messages, tools, agent_tx).await;
        }

        let response = self.provider.chat(messages, tools).await?;
        if !response.content.is_empty() {
            let _ = agent_tx
                .send(AgentEvent::TextDelta(response.content.clone()))
                .await;
        }
        Ok(response)
    }

    /// Backend-reported usage, with unknown (zero) counts estimated.
    fn resolve_usage(&self, sent: &[Message], response: &Response) -> Usage {
        let mut usage = response.usage;
        if usage.input_tokens == 0 {
            usage.input_tokens = self.estimator.estimate(sent);
        }
        if usage.output_tokens == 0 {
            usage.output_tokens = self
                .estimator
                .estimate_output(&response.content, &response.tool_calls);
        }
        usage
    }
}

/// Drain a streaming response, forwarding non-empty chunks in arrival order.
/// Returns at the final item; a stream without one is an error.
async fn stream_response(
    provider: &dyn Provider,
    messages: &[Message],
    tools: &[ToolSpec],
    agent_tx: &mpsc::Sender<AgentEvent>,
) -> Result<Response, ProviderError> {
    let mut stream = provider.chat_stream(messages, tools);
    let mut text = String::new();

    while let Some(item) = stream.next().await {
        match item? {
            StreamItem::Chunk(chunk) => {
                if chunk.is_empty() {
                    continue;
                }
                text.push_str(&chunk);
                let _ = agent_tx.send(AgentEvent::TextDelta(chunk)).await;
            }
            StreamItem::Final(mut response) => {
                // The turn's text is what was forwarded. Content that only
                // arrived with the final item is forwarded as one delta.
                if !text.is_empty() {
                    response.content = text;
                } else if !response.content.is_empty() {
                    let _ = agent_tx
                        .send(AgentEvent::TextDelta(response.content.clone()))
                        .await;
                }
                return Ok(response);
            }
        }
    }

    Err(ProviderError::IncompleteStream)
}
