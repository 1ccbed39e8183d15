//! Chat persistence: generic operations plus lookups by owner and scheme.

use etlas_types::chat::{Chat, ChatCreate, ChatUpdate};
use etlas_types::entity::{OrderedParams, Page};
use etlas_types::error::RepositoryError;
use serde_json::json;
use uuid::Uuid;

use super::entity::{EntityKind, EntityRepository, args, decode_page, window_arg};
use super::store::{Procedure, ProcedureSet, ProcedureStore};

pub const CHATS_BY_USER: Procedure =
    Procedure::new("get_all_chats_by_user_id", &["user_id", "limit", "skip"]);
pub const CHATS_BY_SCHEME: Procedure =
    Procedure::new("get_all_chats_by_scheme_id", &["scheme_id", "limit", "skip"]);

pub struct ChatKind;

impl EntityKind for ChatKind {
    type Entity = Chat;
    type Create = ChatCreate;
    type Update = ChatUpdate;

    const NAME: &'static str = "chat";
    const PROCEDURES: ProcedureSet = ProcedureSet {
        entity: "chat",
        get_by_id: Procedure::new("get_chat_by_id", &["id"]),
        list: Procedure::new("get_all_chats", &["limit", "skip"]),
        create: Procedure::new("create_chat", ChatCreate::ORDERED_PARAMS),
        update: Procedure::new("update_chat", ChatUpdate::ORDERED_PARAMS),
        delete: Procedure::new("delete_chat", &["id"]),
        queries: &[CHATS_BY_USER, CHATS_BY_SCHEME],
    };
}

pub type ChatRepository<S> = EntityRepository<ChatKind, S>;

impl<S: ProcedureStore> EntityRepository<ChatKind, S> {
    pub async fn get_by_user_id(
        &self,
        user_id: Uuid,
        skip: u64,
        limit: u64,
    ) -> Result<Page<Chat>, RepositoryError> {
        let rows = self
            .call(
                &CHATS_BY_USER,
                &args([
                    ("user_id", json!(user_id)),
                    ("limit", window_arg(limit)),
                    ("skip", window_arg(skip)),
                ]),
            )
            .await?;
        decode_page(rows, skip, limit)
    }

    pub async fn get_by_scheme_id(
        &self,
        scheme_id: Uuid,
        skip: u64,
        limit: u64,
    ) -> Result<Page<Chat>, RepositoryError> {
        let rows = self
            .call(
                &CHATS_BY_SCHEME,
                &args([
                    ("scheme_id", json!(scheme_id)),
                    ("limit", window_arg(limit)),
                    ("skip", window_arg(skip)),
                ]),
            )
            .await?;
        decode_page(rows, skip, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::entity::to_record;
    use crate::test_support::{ScriptedStore, stored_chat};

    #[tokio::test]
    async fn get_by_user_id_binds_owner_first() {
        let store = ScriptedStore::new();
        let user_id = Uuid::now_v7();
        let chat = stored_chat(user_id, None, Some("ventas"));
        store.reply(CHATS_BY_USER.name, vec![to_record(&chat).unwrap()]);
        let repo = ChatRepository::new(store.clone());

        let page = repo.get_by_user_id(user_id, 0, 10).await.unwrap();

        assert_eq!(page.data, vec![chat]);
        assert_eq!(page.total, 1);
        let (_, params) = &store.calls()[0];
        assert_eq!(params[0], ("user_id", json!(user_id)));
        assert_eq!(params[1], ("limit", json!(10)));
    }

    #[tokio::test]
    async fn unknown_scheme_yields_empty_page() {
        let repo = ChatRepository::new(ScriptedStore::new());
        let page = repo.get_by_scheme_id(Uuid::now_v7(), 0, 10).await.unwrap();
        assert!(page.is_empty());
    }
}
