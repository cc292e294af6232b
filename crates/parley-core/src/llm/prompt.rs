//! Prompt assembly for completion requests.
//!
//! Every prompt has the same shape: one fixed system instruction, then the
//! prior turns oldest first, then the new user turn.

use parley_types::chat::ChatMessage;
use parley_types::llm::PromptMessage;

/// Build the prompt for a session turn.
///
/// `history` must already be in chronological order and must not contain
/// the new user message.
pub fn build_session_prompt(
    system_prompt: &str,
    history: &[ChatMessage],
    user_content: &str,
) -> Vec<PromptMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(PromptMessage::system(system_prompt));
    messages.extend(history.iter().map(|m| PromptMessage {
        role: m.role,
        content: m.content.clone(),
    }));
    messages.push(PromptMessage::user(user_content));
    messages
}

/// Build the prompt for a stateless single-turn request.
///
/// `window` bounds the number of turns sent, counting the new user turn, so
/// only the most recent `window - 1` history entries are kept.
pub fn build_single_turn_prompt(
    system_prompt: &str,
    history: &[PromptMessage],
    message: &str,
    window: u32,
) -> Vec<PromptMessage> {
    let keep = (window as usize).saturating_sub(1);
    let start = history.len().saturating_sub(keep);

    let mut messages = Vec::with_capacity(history.len() - start + 2);
    messages.push(PromptMessage::system(system_prompt));
    messages.extend_from_slice(&history[start..]);
    messages.push(PromptMessage::user(message));
    messages
}
