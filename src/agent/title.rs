// ABOUTME: Conversation title generation — one buffered provider call, no tools.
// ABOUTME: The reply is trimmed and cut to a char cap; errors go straight back to the caller.

use crate::llm::{Message, Provider, ProviderError};

pub const TITLE_PROMPT: &str = "Generate a very short title (max 15 chars) for this conversation in English. Reply with ONLY the title, no quotes, no explanation.";

/// Cut `text` to at most `cap` chars without splitting a code point.
pub fn clamp_title(text: &str, cap: usize) -> String {
    text.trim().chars().take(cap).collect()
}

/// Ask the provider for a short label for `text`.
pub async fn generate_title(
    provider: &dyn Provider,
    text: &str,
    cap: usize,
) -> Result<String, ProviderError> {
    let messages = [Message::system(TITLE_PROMPT), Message::user(text)];
    let response = provider.chat(&messages, &[]).await?;
    Ok(clamp_title(&response.content, cap))
}
