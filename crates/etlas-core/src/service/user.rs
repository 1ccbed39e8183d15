//! User service.

use etlas_types::entity::Page;
use etlas_types::error::{RepositoryError, ValidationError};
use etlas_types::user::{User, UserCreate};
use tracing::info;
use uuid::Uuid;

use crate::repository::ProcedureStore;
use crate::repository::user::UserRepository;

pub struct UserService<S> {
    repo: UserRepository<S>,
}

impl<S: ProcedureStore> UserService<S> {
    pub fn new(store: S) -> Self {
        Self {
            repo: UserRepository::new(store),
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        self.repo.get(id).await
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        self.repo.get_by_email(email).await
    }

    pub async fn list(&self, skip: u64, limit: u64) -> Result<Page<User>, RepositoryError> {
        self.repo.get_multi(skip, limit).await
    }

    /// Register a user. Emails are unique.
    pub async fn create(&self, input: &UserCreate) -> Result<User, RepositoryError> {
        if self.repo.get_by_email(&input.email).await?.is_some() {
            return Err(ValidationError::InvalidField {
                field: "email",
                reason: format!("'{}' is already registered", input.email),
            }
            .into());
        }
        let user = self.repo.create(input).await?;
        info!(user_id = %user.id, "user created");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::entity::{args, to_record};
    use crate::test_support::{ScriptedStore, timestamp};
    use serde_json::json;

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = ScriptedStore::new();
        let existing = User {
            id: Uuid::now_v7(),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            email_verified: None,
            image: None,
            created_at: timestamp(),
        };
        store.reply("get_user_by_email", vec![to_record(&existing).unwrap()]);
        let service = UserService::new(store.clone());

        let err = service
            .create(&UserCreate::new("Ana", "ana@example.com").unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::Validation(_)));
        assert_eq!(store.called(), vec!["get_user_by_email"]);
    }

    #[tokio::test]
    async fn create_new_user() {
        let store = ScriptedStore::new();
        store.reply(
            "create_user",
            vec![args([
                ("id", json!(Uuid::now_v7())),
                ("created_at", json!("2026-03-01T10:00:00Z")),
            ])],
        );
        let service = UserService::new(store);

        let user = service
            .create(&UserCreate::new("Ana", "ana@example.com").unwrap())
            .await
            .unwrap();

        assert_eq!(user.email, "ana@example.com");
    }
}
