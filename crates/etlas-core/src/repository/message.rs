//! Message persistence.
//!
//! Messages are stored flat (see `MessageRecord`); decoding a row is where
//! the role/content invariant is enforced, so a corrupt row surfaces as a
//! validation error instead of a mis-typed message.

use std::collections::HashMap;

use etlas_types::attachment::Attachment;
use etlas_types::entity::{OrderedParams, Page};
use etlas_types::error::RepositoryError;
use etlas_types::message::{Message, MessageCreate, MessageUpdate};
use serde_json::json;
use uuid::Uuid;

use super::attachment::AttachmentRepository;
use super::entity::{EntityKind, EntityRepository, args, decode_all, decode_page, window_arg};
use super::store::{Procedure, ProcedureSet, ProcedureStore};

pub const MESSAGES_BY_USER: Procedure =
    Procedure::new("get_all_messages_by_user_id", &["user_id"]);
pub const MESSAGES_BY_CHAT: Procedure = Procedure::new(
    "get_all_messages_with_attachments_by_chat_id",
    &["chat_id", "limit", "skip"],
);
pub const FULL_HISTORY: Procedure = Procedure::new("get_full_messages_by_chat_id", &["chat_id"]);

pub struct MessageKind;

impl EntityKind for MessageKind {
    type Entity = Message;
    type Create = MessageCreate;
    type Update = MessageUpdate;

    const NAME: &'static str = "message";
    const PROCEDURES: ProcedureSet = ProcedureSet {
        entity: "message",
        get_by_id: Procedure::new("get_message_by_id", &["id"]),
        list: Procedure::new("get_all_messages", &["limit", "skip"]),
        create: Procedure::new("create_message", MessageCreate::ORDERED_PARAMS),
        update: Procedure::new("update_message", MessageUpdate::ORDERED_PARAMS),
        delete: Procedure::new("delete_message", &["id"]),
        queries: &[MESSAGES_BY_USER, MESSAGES_BY_CHAT, FULL_HISTORY],
    };
}

pub type MessageRepository<S> = EntityRepository<MessageKind, S>;

impl<S: ProcedureStore> EntityRepository<MessageKind, S> {
    /// Every message across all chats owned by `user_id`.
    pub async fn get_by_user_id(&self, user_id: Uuid) -> Result<Vec<Message>, RepositoryError> {
        let rows = self
            .call(&MESSAGES_BY_USER, &args([("user_id", json!(user_id))]))
            .await?;
        decode_all(rows)
    }

    /// One page of a chat's messages, each carrying its attachments.
    pub async fn get_by_chat_id(
        &self,
        chat_id: Uuid,
        skip: u64,
        limit: u64,
    ) -> Result<Page<Message>, RepositoryError> {
        let rows = self
            .call(
                &MESSAGES_BY_CHAT,
                &args([
                    ("chat_id", json!(chat_id)),
                    ("limit", window_arg(limit)),
                    ("skip", window_arg(skip)),
                ]),
            )
            .await?;
        let page: Page<Message> = decode_page(rows, skip, limit)?;
        if page.is_empty() {
            return Ok(page);
        }

        let ids: Vec<Uuid> = page.data.iter().map(|message| message.id).collect();
        let attachments = AttachmentRepository::new(self.store())
            .get_by_message_ids(&ids)
            .await?;
        let mut by_message: HashMap<Uuid, Vec<Attachment>> = HashMap::new();
        for attachment in attachments {
            by_message
                .entry(attachment.message_id)
                .or_default()
                .push(attachment);
        }

        Ok(page.map(|mut message| {
            message.attachments = by_message.remove(&message.id).unwrap_or_default();
            message
        }))
    }

    /// The complete conversation of a chat, oldest first.
    ///
    /// A chat with no messages yields an empty vector.
    pub async fn get_full_history(&self, chat_id: Uuid) -> Result<Vec<Message>, RepositoryError> {
        let rows = self
            .call(&FULL_HISTORY, &args([("chat_id", json!(chat_id))]))
            .await?;
        decode_all(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::entity::to_record;
    use crate::repository::attachment::ATTACHMENTS_BY_MESSAGES;
    use crate::test_support::{ScriptedStore, stored_message};
    use etlas_types::message::{AiContent, ChatRole, MessageContent};

    #[tokio::test]
    async fn get_by_chat_id_attaches_files_to_owners() {
        let store = ScriptedStore::new();
        let chat_id = Uuid::now_v7();
        let first = stored_message(chat_id, MessageContent::user("hola"));
        let second = stored_message(chat_id, MessageContent::ai(AiContent::default()));
        store.reply(
            MESSAGES_BY_CHAT.name,
            vec![to_record(&first).unwrap(), to_record(&second).unwrap()],
        );
        store.reply(
            ATTACHMENTS_BY_MESSAGES.name,
            vec![args([
                ("id", json!(Uuid::now_v7())),
                ("message_id", json!(first.id)),
                ("url", json!("/tmp/playground/ventas.csv")),
                ("filename", json!("ventas.csv")),
                ("created_at", json!("2026-03-01T10:00:00Z")),
            ])],
        );
        let repo = MessageRepository::new(store.clone());

        let page = repo.get_by_chat_id(chat_id, 0, 10).await.unwrap();

        let (name, params) = &store.calls()[1];
        assert_eq!(*name, ATTACHMENTS_BY_MESSAGES.name);
        assert_eq!(params, &vec![("message_ids", json!([first.id, second.id]))]);
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.data[0].attachments.len(), 1);
        assert_eq!(page.data[0].attachments[0].filename, "ventas.csv");
        assert!(page.data[1].attachments.is_empty());
    }

    #[tokio::test]
    async fn empty_page_skips_attachment_lookup() {
        let store = ScriptedStore::new();
        let repo = MessageRepository::new(store.clone());

        let page = repo.get_by_chat_id(Uuid::now_v7(), 0, 10).await.unwrap();

        assert!(page.is_empty());
        assert_eq!(store.called(), vec![MESSAGES_BY_CHAT.name]);
    }

    #[tokio::test]
    async fn empty_history_is_empty_vec() {
        let repo = MessageRepository::new(ScriptedStore::new());
        let history = repo.get_full_history(Uuid::now_v7()).await.unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn mismatched_row_is_rejected() {
        let store = ScriptedStore::new();
        let chat_id = Uuid::now_v7();
        let mut row = to_record(&stored_message(chat_id, MessageContent::user("hola"))).unwrap();
        row.insert("content_code".to_string(), json!("SELECT 1;"));
        store.reply(FULL_HISTORY.name, vec![row]);
        let repo = MessageRepository::new(store);

        let err = repo.get_full_history(chat_id).await.unwrap_err();

        assert!(matches!(err, RepositoryError::Validation(_)));
    }

    #[tokio::test]
    async fn create_ai_message_sends_structured_columns() {
        let store = ScriptedStore::new();
        store.reply(
            "create_message",
            vec![args([
                ("id", json!(Uuid::now_v7())),
                ("created_at", json!("2026-03-01T10:00:00Z")),
            ])],
        );
        let repo = MessageRepository::new(store.clone());
        let content = AiContent {
            code: Some("SELECT 1;".to_string()),
            ..Default::default()
        };

        let message = repo
            .create(&MessageCreate::ai(Uuid::now_v7(), content.clone()))
            .await
            .unwrap();

        assert_eq!(message.role(), ChatRole::Ai);
        assert_eq!(message.content, MessageContent::Ai(content));
        let (_, params) = &store.calls()[0];
        assert_eq!(params[1], ("role", json!("ai")));
        assert!(params[2].1.is_null());
        assert_eq!(params[5], ("content_code", json!("SELECT 1;")));
    }
}
