//! Message and content model types for Etlas.
//!
//! A message's payload is a tagged union: a human-authored free-text turn
//! or a machine-authored structured turn. The role is derived from the
//! variant, so a message whose role disagrees with its content cannot be
//! constructed. Stored records are flat; conversion from a record is where
//! the role/content invariant is checked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::attachment::Attachment;
use crate::entity::{Entity, OrderedParams};
use crate::error::ValidationError;

/// Author of a persisted message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Ai,
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatRole::User => write!(f, "user"),
            ChatRole::Ai => write!(f, "ai"),
        }
    }
}

impl FromStr for ChatRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(ChatRole::User),
            "ai" => Ok(ChatRole::Ai),
            other => Err(format!("invalid chat role: '{other}'")),
        }
    }
}

/// Free text written by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContent {
    pub text: String,
}

/// Structured reply produced by the completion service.
///
/// All four fields are optional so a partially failed generation can still
/// be persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiContent {
    pub analysis: Option<String>,
    pub comment: Option<String>,
    pub code: Option<String>,
    pub executable_code: Option<String>,
}

impl AiContent {
    pub fn is_empty(&self) -> bool {
        self.analysis.is_none()
            && self.comment.is_none()
            && self.code.is_none()
            && self.executable_code.is_none()
    }
}

/// Payload of a message; the variant determines the role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MessageContent {
    User(UserContent),
    Ai(AiContent),
}

impl MessageContent {
    pub fn user(text: impl Into<String>) -> Self {
        MessageContent::User(UserContent { text: text.into() })
    }

    pub fn ai(content: AiContent) -> Self {
        MessageContent::Ai(content)
    }

    pub fn role(&self) -> ChatRole {
        match self {
            MessageContent::User(_) => ChatRole::User,
            MessageContent::Ai(_) => ChatRole::Ai,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            MessageContent::User(_) => "user",
            MessageContent::Ai(_) => "ai",
        }
    }

    /// Rebuild the content from the flat stored columns, checking that the
    /// populated columns agree with `role`.
    pub fn from_parts(
        role: ChatRole,
        text: Option<String>,
        ai: AiContent,
    ) -> Result<Self, ValidationError> {
        match role {
            ChatRole::User => {
                if !ai.is_empty() {
                    return Err(ValidationError::RoleContentMismatch {
                        role: role.to_string(),
                        content: "ai",
                    });
                }
                let text = text.ok_or(ValidationError::MissingField("content"))?;
                Ok(MessageContent::user(text))
            }
            ChatRole::Ai => {
                if text.is_some() {
                    return Err(ValidationError::RoleContentMismatch {
                        role: role.to_string(),
                        content: "user",
                    });
                }
                Ok(MessageContent::Ai(ai))
            }
        }
    }
}

/// Flat, store-shaped form of a message.
///
/// This is the shape exchanged with the backing store and the serialized
/// form of [`Message`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub chat_id: Uuid,
    pub role: ChatRole,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub content_analysis: Option<String>,
    #[serde(default)]
    pub content_comment: Option<String>,
    #[serde(default)]
    pub content_code: Option<String>,
    #[serde(default)]
    pub content_executable_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl MessageRecord {
    fn from_content(chat_id: Uuid, content: &MessageContent) -> Self {
        let (text, ai) = match content {
            MessageContent::User(user) => (Some(user.text.clone()), AiContent::default()),
            MessageContent::Ai(ai) => (None, ai.clone()),
        };
        Self {
            id: None,
            chat_id,
            role: content.role(),
            content: text,
            content_analysis: ai.analysis,
            content_comment: ai.comment,
            content_code: ai.code,
            content_executable_code: ai.executable_code,
            created_at: None,
            attachments: Vec::new(),
        }
    }
}

/// A persisted conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MessageRecord", into = "MessageRecord")]
pub struct Message {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub content: MessageContent,
    pub attachments: Vec<Attachment>,
}

impl Message {
    pub fn role(&self) -> ChatRole {
        self.content.role()
    }
}

impl Entity for Message {
    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl TryFrom<MessageRecord> for Message {
    type Error = ValidationError;

    fn try_from(record: MessageRecord) -> Result<Self, Self::Error> {
        let id = record.id.ok_or(ValidationError::MissingField("id"))?;
        let created_at = record
            .created_at
            .ok_or(ValidationError::MissingField("created_at"))?;
        let ai = AiContent {
            analysis: record.content_analysis,
            comment: record.content_comment,
            code: record.content_code,
            executable_code: record.content_executable_code,
        };
        let content = MessageContent::from_parts(record.role, record.content, ai)?;

        Ok(Message {
            id,
            chat_id: record.chat_id,
            created_at,
            content,
            attachments: record.attachments,
        })
    }
}

impl From<Message> for MessageRecord {
    fn from(message: Message) -> Self {
        let mut record = MessageRecord::from_content(message.chat_id, &message.content);
        record.id = Some(message.id);
        record.created_at = Some(message.created_at);
        record.attachments = message.attachments;
        record
    }
}

/// Input for creating a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "MessageRecord")]
pub struct MessageCreate {
    chat_id: Uuid,
    content: MessageContent,
}

impl MessageCreate {
    /// Validate that `role` agrees with the content variant.
    pub fn new(
        chat_id: Uuid,
        role: ChatRole,
        content: MessageContent,
    ) -> Result<Self, ValidationError> {
        if content.role() != role {
            return Err(ValidationError::RoleContentMismatch {
                role: role.to_string(),
                content: content.kind(),
            });
        }
        if let MessageContent::User(user) = &content {
            if user.text.trim().is_empty() {
                return Err(ValidationError::MissingField("content"));
            }
        }
        Ok(Self { chat_id, content })
    }

    pub fn user(chat_id: Uuid, text: impl Into<String>) -> Result<Self, ValidationError> {
        Self::new(chat_id, ChatRole::User, MessageContent::user(text))
    }

    pub fn ai(chat_id: Uuid, content: AiContent) -> Self {
        Self {
            chat_id,
            content: MessageContent::Ai(content),
        }
    }

    pub fn chat_id(&self) -> Uuid {
        self.chat_id
    }

    pub fn content(&self) -> &MessageContent {
        &self.content
    }

    pub fn role(&self) -> ChatRole {
        self.content.role()
    }
}

impl From<MessageCreate> for MessageRecord {
    fn from(input: MessageCreate) -> Self {
        MessageRecord::from_content(input.chat_id, &input.content)
    }
}

impl OrderedParams for MessageCreate {
    const ORDERED_PARAMS: &'static [&'static str] = &[
        "chat_id",
        "role",
        "content",
        "content_analysis",
        "content_comment",
        "content_code",
        "content_executable_code",
    ];
}

/// Partial update of the structured fields of an `ai` message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageUpdate {
    #[serde(rename = "content_analysis")]
    pub analysis: Option<String>,
    #[serde(rename = "content_comment")]
    pub comment: Option<String>,
    #[serde(rename = "content_code")]
    pub code: Option<String>,
    #[serde(rename = "content_executable_code")]
    pub executable_code: Option<String>,
}

impl OrderedParams for MessageUpdate {
    const ORDERED_PARAMS: &'static [&'static str] = &[
        "id",
        "content_analysis",
        "content_comment",
        "content_code",
        "content_executable_code",
    ];
}
