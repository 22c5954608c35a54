// ABOUTME: Tool dispatch — runs a turn's tool calls in order and folds outcomes into ToolResults.
// ABOUTME: Unknown tools and tool errors become error text for the model, never loop failures.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::agent::event::AgentEvent;
use crate::llm::{ToolCall, ToolResult};
use crate::tools::ToolRegistry;

/// Appended to tool output cut at the cap.
pub const TRUNCATION_MARKER: &str = "\n... (truncated)";

/// Prefix marking a ToolResult as a failure rather than data.
pub const ERROR_PREFIX: &str = "error: ";

/// Cut `text` to `cap` chars plus the marker. Output already in that shape is
/// returned unchanged.
pub fn truncate_output(text: &str, cap: usize) -> String {
    let already_cut = text
        .strip_suffix(TRUNCATION_MARKER)
        .is_some_and(|head| head.chars().count() == cap);
    if already_cut {
        return text.to_string();
    }
    match text.char_indices().nth(cap) {
        Some((idx, _)) => format!("{}{}", &text[..idx], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

fn unknown_tool_error(name: &str) -> String {
    format!("unknown tool: {}", name)
}

/// Execute `calls` one after another, emitting a ToolStart/ToolEnd pair per
/// call. Returns one ToolResult per call, in call order.
pub async fn execute_tool_calls(
    registry: &ToolRegistry,
    calls: &[ToolCall],
    output_cap: usize,
    agent_tx: &mpsc::Sender<AgentEvent>,
) -> Vec<ToolResult> {
    let mut results = Vec::with_capacity(calls.len());

    for call in calls {
        let _ = agent_tx
            .send(AgentEvent::ToolStart {
                id: call.id.clone(),
                name: call.name.clone(),
                args: call.args.clone(),
            })
            .await;

        let output = run_single_tool(registry, call, output_cap).await;
        let content = match &output {
            Ok(text) => text.clone(),
            Err(e) => format!("{}{}", ERROR_PREFIX, e),
        };

        let _ = agent_tx
            .send(AgentEvent::ToolEnd {
                id: call.id.clone(),
                name: call.name.clone(),
                output,
            })
            .await;
        results.push(ToolResult::new(&call.id, content));
    }

    results
}

async fn run_single_tool(
    registry: &ToolRegistry,
    call: &ToolCall,
    output_cap: usize,
) -> Result<String, String> {
    let Some(tool) = registry.get(&call.name) else {
        warn!(tool = %call.name, id = %call.id, "model called unknown tool");
        return Err(unknown_tool_error(&call.name));
    };

    debug!(tool = %call.name, id = %call.id, "running tool");
    match tool.run(&call.args).await {
        Ok(text) => Ok(truncate_output(&text, output_cap)),
        Err(e) => {
            debug!(tool = %call.name, error = %e, "tool failed");
            Err(e.to_string())
        }
    }
}
