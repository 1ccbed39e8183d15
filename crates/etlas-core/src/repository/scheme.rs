//! Scheme persistence: generic operations plus lookups by owner and chat.

use etlas_types::entity::{OrderedParams, Page};
use etlas_types::error::RepositoryError;
use etlas_types::scheme::{Scheme, SchemeCreate, SchemeUpdate};
use serde_json::json;
use uuid::Uuid;

use super::entity::{EntityKind, EntityRepository, args, decode_all, decode_page, window_arg};
use super::store::{Procedure, ProcedureSet, ProcedureStore};

pub const SCHEMES_BY_USER: Procedure = Procedure::new("get_all_schemes_by_user_id", &["user_id"]);
pub const SCHEMES_BY_CHAT: Procedure =
    Procedure::new("get_all_schemes_by_chat_id", &["chat_id", "limit", "skip"]);

pub struct SchemeKind;

impl EntityKind for SchemeKind {
    type Entity = Scheme;
    type Create = SchemeCreate;
    type Update = SchemeUpdate;

    const NAME: &'static str = "scheme";
    const PROCEDURES: ProcedureSet = ProcedureSet {
        entity: "scheme",
        get_by_id: Procedure::new("get_scheme_by_id", &["id"]),
        list: Procedure::new("get_all_schemes", &["limit", "skip"]),
        create: Procedure::new("create_scheme", SchemeCreate::ORDERED_PARAMS),
        update: Procedure::new("update_scheme", SchemeUpdate::ORDERED_PARAMS),
        delete: Procedure::new("delete_scheme", &["id"]),
        queries: &[SCHEMES_BY_USER, SCHEMES_BY_CHAT],
    };
}

pub type SchemeRepository<S> = EntityRepository<SchemeKind, S>;

impl<S: ProcedureStore> EntityRepository<SchemeKind, S> {
    /// All schemes owned by `user_id`, oldest first.
    pub async fn get_by_user_id(&self, user_id: Uuid) -> Result<Vec<Scheme>, RepositoryError> {
        let rows = self
            .call(&SCHEMES_BY_USER, &args([("user_id", json!(user_id))]))
            .await?;
        decode_all(rows)
    }

    pub async fn get_by_chat_id(
        &self,
        chat_id: Uuid,
        skip: u64,
        limit: u64,
    ) -> Result<Page<Scheme>, RepositoryError> {
        let rows = self
            .call(
                &SCHEMES_BY_CHAT,
                &args([
                    ("chat_id", json!(chat_id)),
                    ("limit", window_arg(limit)),
                    ("skip", window_arg(skip)),
                ]),
            )
            .await?;
        decode_page(rows, skip, limit)
    }
}
