//! Chat types for Etlas.
//!
//! A chat belongs to one user and optionally one scheme. Its display name
//! starts unset and is assigned from the first completion that yields a title.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{Entity, OrderedParams};

/// A conversation designing one ETL pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub scheme_id: Option<Uuid>,
    #[serde(default)]
    pub name_chat: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Entity for Chat {
    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Input for creating a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatCreate {
    pub user_id: Uuid,
    pub scheme_id: Option<Uuid>,
    pub name_chat: Option<String>,
}

impl ChatCreate {
    /// An unnamed chat for `user_id`, optionally grounded on a scheme.
    pub fn new(user_id: Uuid, scheme_id: Option<Uuid>) -> Self {
        Self {
            user_id,
            scheme_id,
            name_chat: None,
        }
    }
}

impl OrderedParams for ChatCreate {
    const ORDERED_PARAMS: &'static [&'static str] = &["user_id", "scheme_id", "name_chat"];
}

/// Partial update of a chat; unset fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatUpdate {
    pub user_id: Option<Uuid>,
    pub scheme_id: Option<Uuid>,
    pub name_chat: Option<String>,
}

impl ChatUpdate {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name_chat: Some(name.into()),
            ..Default::default()
        }
    }
}

impl OrderedParams for ChatUpdate {
    const ORDERED_PARAMS: &'static [&'static str] = &["id", "user_id", "scheme_id", "name_chat"];
}
