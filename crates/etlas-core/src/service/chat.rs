//! Chat service.

use etlas_types::chat::{Chat, ChatCreate, ChatUpdate};
use etlas_types::entity::{Deleted, Page};
use etlas_types::error::RepositoryError;
use tracing::info;
use uuid::Uuid;

use crate::repository::ProcedureStore;
use crate::repository::chat::ChatRepository;

pub struct ChatService<S> {
    repo: ChatRepository<S>,
}

impl<S: ProcedureStore> ChatService<S> {
    pub fn new(store: S) -> Self {
        Self {
            repo: ChatRepository::new(store),
        }
    }

    pub fn repository(&self) -> &ChatRepository<S> {
        &self.repo
    }

    pub async fn create(&self, input: &ChatCreate) -> Result<Chat, RepositoryError> {
        let chat = self.repo.create(input).await?;
        info!(chat_id = %chat.id, user_id = %chat.user_id, "chat created");
        Ok(chat)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Chat>, RepositoryError> {
        self.repo.get(id).await
    }

    /// Partially update the chat with `id`.
    pub async fn update(&self, id: Uuid, input: &ChatUpdate) -> Result<Chat, RepositoryError> {
        let existing = self.repo.get(id).await?.ok_or(RepositoryError::NotFound)?;
        self.repo.update(&existing, input).await
    }

    pub async fn remove(&self, id: Uuid) -> Result<Deleted, RepositoryError> {
        self.repo.remove(id).await
    }

    pub async fn list(&self, skip: u64, limit: u64) -> Result<Page<Chat>, RepositoryError> {
        self.repo.get_multi(skip, limit).await
    }

    pub async fn list_by_user(
        &self,
        user_id: Uuid,
        skip: u64,
        limit: u64,
    ) -> Result<Page<Chat>, RepositoryError> {
        self.repo.get_by_user_id(user_id, skip, limit).await
    }

    pub async fn list_by_scheme(
        &self,
        scheme_id: Uuid,
        skip: u64,
        limit: u64,
    ) -> Result<Page<Chat>, RepositoryError> {
        self.repo.get_by_scheme_id(scheme_id, skip, limit).await
    }
}
