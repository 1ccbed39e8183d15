//! Attachment types for Etlas.
//!
//! An attachment always belongs to one message and is only created together
//! with, or after, its owning message.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{Entity, OrderedParams};
use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: Uuid,
    pub message_id: Uuid,
    pub url: String,
    pub filename: String,
    pub created_at: DateTime<Utc>,
}

impl Entity for Attachment {
    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// A file supplied alongside a message that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAttachment {
    pub url: String,
    pub filename: String,
}

impl NewAttachment {
    pub fn new(url: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            filename: filename.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.trim().is_empty() {
            return Err(ValidationError::MissingField("url"));
        }
        if self.filename.trim().is_empty() {
            return Err(ValidationError::MissingField("filename"));
        }
        Ok(())
    }

    /// Bind this attachment to its owning message.
    pub fn owned_by(self, message_id: Uuid) -> AttachmentCreate {
        AttachmentCreate {
            message_id,
            url: self.url,
            filename: self.filename,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentCreate {
    pub message_id: Uuid,
    pub url: String,
    pub filename: String,
}

impl OrderedParams for AttachmentCreate {
    const ORDERED_PARAMS: &'static [&'static str] = &["message_id", "url", "filename"];
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentUpdate {
    pub url: Option<String>,
    pub filename: Option<String>,
}

impl OrderedParams for AttachmentUpdate {
    const ORDERED_PARAMS: &'static [&'static str] = &["id", "url", "filename"];
}
