// ABOUTME: Token estimation contract and the default byte-length heuristic.
// ABOUTME: Used only for compaction thresholds and for filling in unreported usage.

use super::{Message, ToolCall};

/// Fixed per-message overhead added on top of the text estimate.
const MESSAGE_OVERHEAD_TOKENS: u64 = 4;

/// Estimates token cost. Implementations must be pure and cheap.
pub trait TokenEstimator: Send + Sync {
    fn estimate(&self, messages: &[Message]) -> u64;
    fn estimate_output(&self, text: &str, tool_calls: &[ToolCall]) -> u64;
}

/// Heuristic token count: bytes / 4.
pub fn approx_token_count(text: &str) -> u64 {
    (text.len() / 4) as u64
}

/// Byte-length estimator. Good enough for threshold decisions without
/// shipping a tokenizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicEstimator;

impl TokenEstimator for HeuristicEstimator {
    fn estimate(&self, messages: &[Message]) -> u64 {
        messages
            .iter()
            .map(|msg| {
                let reasoning = msg.reasoning.as_deref().map_or(0, approx_token_count);
                let calls: u64 = msg
                    .tool_calls
                    .iter()
                    .map(|tc| approx_token_count(&tc.name) + approx_token_count(&tc.args))
                    .sum();
                let results: u64 = msg
                    .tool_results
                    .iter()
                    .map(|tr| approx_token_count(&tr.content))
                    .sum();
                approx_token_count(&msg.content)
                    + reasoning
                    + calls
                    + results
                    + MESSAGE_OVERHEAD_TOKENS
            })
            .sum()
    }

    fn estimate_output(&self, text: &str, tool_calls: &[ToolCall]) -> u64 {
        let calls: u64 = tool_calls
            .iter()
            .map(|tc| {
                approx_token_count(&tc.name)
                    + approx_token_count(&tc.args)
                    + MESSAGE_OVERHEAD_TOKENS
            })
            .sum();
        approx_token_count(text) + calls
    }
}
