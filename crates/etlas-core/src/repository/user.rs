//! User persistence.

use etlas_types::entity::OrderedParams;
use etlas_types::error::RepositoryError;
use etlas_types::user::{User, UserCreate, UserUpdate};
use serde_json::json;

use super::entity::{EntityKind, EntityRepository, args, decode};
use super::store::{Procedure, ProcedureSet, ProcedureStore};

pub const USER_BY_EMAIL: Procedure = Procedure::new("get_user_by_email", &["email"]);

pub struct UserKind;

impl EntityKind for UserKind {
    type Entity = User;
    type Create = UserCreate;
    type Update = UserUpdate;

    const NAME: &'static str = "user";
    const PROCEDURES: ProcedureSet = ProcedureSet {
        entity: "user",
        get_by_id: Procedure::new("get_user_by_id", &["id"]),
        list: Procedure::new("get_all_users", &["limit", "skip"]),
        create: Procedure::new("create_user", UserCreate::ORDERED_PARAMS),
        update: Procedure::new("update_user", UserUpdate::ORDERED_PARAMS),
        delete: Procedure::new("delete_user", &["id"]),
        queries: &[USER_BY_EMAIL],
    };
}

pub type UserRepository<S> = EntityRepository<UserKind, S>;

impl<S: ProcedureStore> EntityRepository<UserKind, S> {
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let rows = self
            .call(&USER_BY_EMAIL, &args([("email", json!(email))]))
            .await?;
        rows.into_iter().next().map(decode).transpose()
    }
}
