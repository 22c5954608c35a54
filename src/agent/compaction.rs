// ABOUTME: Conversation compaction — summarizes the middle of the transcript when it grows too large.
// ABOUTME: Keeps the system prompt and recent tail verbatim; falls back to the full transcript on failure.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::agent::event::AgentEvent;
use crate::config::CompactionConfig;
use crate::llm::{Message, Provider, ProviderError, TokenEstimator};

/// Marks the synthetic user message that carries recovered context.
pub const SUMMARY_PREFIX: &str = "[Previous conversation summary]\n";

pub const SUMMARIZATION_PROMPT: &str = "Summarize the following conversation concisely. Preserve: key decisions, important file paths and code changes, current task context. Be brief but complete. Output only the summary.";

/// Whether an estimate of `tokens` should trigger compaction.
pub fn needs_compaction(tokens: u64, config: &CompactionConfig) -> bool {
    config.enabled && tokens >= config.threshold_tokens
}

/// Split into (system, middle, recent tail). `None` when there is no middle
/// region to summarize.
///
/// The split is by count: the tail may open with tool results whose call
/// went into the summary.
pub fn split_transcript(
    messages: &[Message],
    keep_recent: usize,
) -> Option<(&Message, &[Message], &[Message])> {
    if messages.len() <= keep_recent + 1 {
        return None;
    }
    let (system, rest) = messages.split_first()?;
    let (middle, recent) = rest.split_at(rest.len() - keep_recent);
    Some((system, middle, recent))
}

fn clip(text: &str, cap: usize) -> String {
    match text.char_indices().nth(cap) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Render messages as role-tagged plain text for the summarizer. Tool
/// results are clipped to `entry_cap` chars each.
pub fn flatten_transcript(messages: &[Message], entry_cap: usize) -> String {
    let mut out = String::new();
    for msg in messages {
        out.push_str(&format!("[{}]: {}\n", msg.role.as_str(), msg.content));
        for tc in &msg.tool_calls {
            out.push_str(&format!("[tool_call {}]: {}({})\n", tc.id, tc.name, tc.args));
        }
        for tr in &msg.tool_results {
            out.push_str(&format!(
                "[tool_result {}]: {}\n",
                tr.tool_call_id,
                clip(&tr.content, entry_cap)
            ));
        }
    }
    out
}

/// Assemble the compacted transcript: system, summary, recent tail.
pub fn build_compacted_history(
    system: &Message,
    summary: &str,
    recent: &[Message],
) -> Vec<Message> {
    let mut compacted = Vec::with_capacity(recent.len() + 2);
    compacted.push(system.clone());
    compacted.push(Message::user(format!("{}{}", SUMMARY_PREFIX, summary)));
    compacted.extend_from_slice(recent);
    compacted
}

/// Ask the provider for a summary of `middle` under the configured deadline.
/// The call also gives up as soon as `cancel` fires.
pub async fn summarize(
    provider: &dyn Provider,
    middle: &[Message],
    config: &CompactionConfig,
    cancel: &CancellationToken,
) -> Result<String, ProviderError> {
    let prompt = vec![
        Message::system(SUMMARIZATION_PROMPT),
        Message::user(flatten_transcript(middle, config.summary_entry_chars)),
    ];
    let timeout = config.summary_timeout();

    let response = tokio::select! {
        _ = cancel.cancelled() => Err(ProviderError::Cancelled),
        result = tokio::time::timeout(timeout, provider.chat(&prompt, &[])) => {
            result.unwrap_or(Err(ProviderError::Timeout(timeout)))
        }
    }?;

    let summary = response.content.trim();
    if summary.is_empty() {
        return Err(ProviderError::Request("empty summary".to_string()));
    }
    Ok(summary.to_string())
}

/// Compact `messages` if they are over budget. Returns the transcript to use:
/// compacted on success, the input unchanged otherwise.
pub async fn maybe_compact(
    provider: &dyn Provider,
    estimator: &dyn TokenEstimator,
    config: &CompactionConfig,
    messages: Vec<Message>,
    cancel: &CancellationToken,
    agent_tx: &mpsc::Sender<AgentEvent>,
) -> Vec<Message> {
    let tokens = estimator.estimate(&messages);
    if !needs_compaction(tokens, config) {
        return messages;
    }
    let Some((system, middle, recent)) = split_transcript(&messages, config.keep_recent) else {
        return messages;
    };

    info!(tokens, threshold = config.threshold_tokens, "auto-compact triggered");
    let _ = agent_tx
        .send(AgentEvent::CompactStart {
            tokens,
            threshold: config.threshold_tokens,
        })
        .await;

    let summary = match summarize(provider, middle, config, cancel).await {
        Ok(summary) => summary,
        Err(e) => {
            warn!(error = %e, "compact failed, using full history");
            return messages;
        }
    };

    let compacted = build_compacted_history(system, &summary, recent);
    let after = estimator.estimate(&compacted);
    info!(
        before = tokens,
        after,
        summarized_msgs = middle.len(),
        "compact done"
    );
    let _ = agent_tx
        .send(AgentEvent::CompactEnd {
            before: tokens,
            after,
        })
        .await;
    compacted
}
