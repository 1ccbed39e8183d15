//! Conversion of persisted messages into completion turns.

use etlas_types::llm::Turn;
use etlas_types::message::{AiContent, Message, MessageContent};

/// Text sent for an `ai` message with no populated fields.
pub const NO_CONTENT: &str = "No content available";

/// Render structured content as one descriptive string.
///
/// Only populated fields appear, in fixed order, each prefixed with its
/// name and separated by newlines. Never returns an empty string.
pub fn render_ai_content(content: &AiContent) -> String {
    let fields = [
        ("Analysis", &content.analysis),
        ("Comment", &content.comment),
        ("Code", &content.code),
        ("Executable Code", &content.executable_code),
    ];

    let parts: Vec<String> = fields
        .into_iter()
        .filter_map(|(label, value)| {
            value
                .as_deref()
                .filter(|value| !value.is_empty())
                .map(|value| format!("{label}: {value}"))
        })
        .collect();

    if parts.is_empty() {
        NO_CONTENT.to_string()
    } else {
        parts.join("\n")
    }
}

/// Flatten a chat's stored messages into role/text turns, oldest first.
pub fn normalize_history(messages: &[Message]) -> Vec<Turn> {
    messages
        .iter()
        .map(|message| match &message.content {
            MessageContent::User(user) => Turn::user(user.text.clone()),
            MessageContent::Ai(ai) => Turn::assistant(render_ai_content(ai)),
        })
        .collect()
}
