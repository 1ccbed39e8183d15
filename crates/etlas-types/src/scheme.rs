//! Scheme types for Etlas.
//!
//! A scheme is a stored description of a target data schema. When a chat is
//! associated with one, its content grounds the system instruction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{Entity, OrderedParams};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scheme {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub attachment_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Entity for Scheme {
    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeCreate {
    pub title: String,
    pub content: String,
    pub user_id: Uuid,
    pub attachment_url: Option<String>,
}

impl OrderedParams for SchemeCreate {
    const ORDERED_PARAMS: &'static [&'static str] =
        &["title", "content", "user_id", "attachment_url"];
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub attachment_url: Option<String>,
}

impl OrderedParams for SchemeUpdate {
    const ORDERED_PARAMS: &'static [&'static str] =
        &["id", "title", "content", "attachment_url"];
}
