//! Completion-service request/response types for Etlas.
//!
//! These types model the data shapes exchanged with the external completion
//! service: role-tagged turns, completion requests, usage tracking, the
//! structured response parsed from the assistant reply, and provider errors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::message::AiContent;

/// Role of a turn in a completion conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(MessageRole::System),
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// One role-tagged unit of text sent to or received from the completion service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: MessageRole,
    pub content: String,
}

impl Turn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Request to a completion provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Turn>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// Response from a completion provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub id: String,
    pub content: String,
    pub model: String,
    pub stop_reason: StopReason,
    pub usage: Usage,
}

/// Reason why the service stopped generating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    ContentFilter,
    ToolUse,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::EndTurn => write!(f, "end_turn"),
            StopReason::MaxTokens => write!(f, "max_tokens"),
            StopReason::ContentFilter => write!(f, "content_filter"),
            StopReason::ToolUse => write!(f, "tool_use"),
        }
    }
}

/// Token usage for a completion request/response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// The JSON object the assistant is instructed to reply with.
///
/// Every key is optional; missing keys stay absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredResponse {
    #[serde(default)]
    pub analysis: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub executable_code: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl StructuredResponse {
    /// The four content fields, without the title.
    pub fn content(&self) -> AiContent {
        AiContent {
            analysis: self.analysis.clone(),
            comment: self.comment.clone(),
            code: self.code.clone(),
            executable_code: self.executable_code.clone(),
        }
    }

    /// The title, if the reply carried a non-blank one.
    pub fn title(&self) -> Option<&str> {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|title| !title.is_empty())
    }
}

/// Errors from completion provider operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("provider overloaded: {0}")]
    Overloaded(String),

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("context length exceeded")]
    ContextLengthExceeded,

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl LlmError {
    /// Whether repeating the identical request could succeed.
    ///
    /// A history that overflows the context window is resent unchanged on
    /// retry, so it fails the same way every time.
    pub fn is_transient(&self) -> bool {
        !matches!(
            self,
            LlmError::AuthenticationFailed
                | LlmError::InvalidRequest(_)
                | LlmError::ContextLengthExceeded
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_role_roundtrip() {
        for role in [MessageRole::System, MessageRole::User, MessageRole::Assistant] {
            let s = role.to_string();
            let parsed: MessageRole = s.parse().unwrap();
            assert_eq!(role, parsed);
        }
    }

    #[test]
    fn test_message_role_serde() {
        let json = serde_json::to_string(&MessageRole::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }

    #[test]
    fn test_structured_response_missing_keys_are_absent() {
        let parsed: StructuredResponse =
            serde_json::from_str(r#"{"analysis":"a","code":"SELECT 1;"}"#).unwrap();
        assert_eq!(parsed.analysis.as_deref(), Some("a"));
        assert_eq!(parsed.code.as_deref(), Some("SELECT 1;"));
        assert!(parsed.comment.is_none());
        assert!(parsed.executable_code.is_none());
        assert!(parsed.title.is_none());
    }

    #[test]
    fn test_structured_response_blank_title_ignored() {
        let parsed = StructuredResponse {
            title: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(parsed.title().is_none());
    }

    #[test]
    fn test_transient_classification() {
        assert!(LlmError::Overloaded("x".into()).is_transient());
        assert!(LlmError::RateLimited { retry_after_ms: None }.is_transient());
        assert!(!LlmError::AuthenticationFailed.is_transient());
        assert!(!LlmError::InvalidRequest("bad".into()).is_transient());
        assert!(!LlmError::ContextLengthExceeded.is_transient());
    }
}
