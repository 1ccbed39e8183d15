//! Scheme service.

use etlas_types::entity::{Deleted, Page};
use etlas_types::error::RepositoryError;
use etlas_types::scheme::{Scheme, SchemeCreate, SchemeUpdate};
use tracing::info;
use uuid::Uuid;

use crate::repository::ProcedureStore;
use crate::repository::scheme::SchemeRepository;

pub struct SchemeService<S> {
    repo: SchemeRepository<S>,
}

impl<S: ProcedureStore> SchemeService<S> {
    pub fn new(store: S) -> Self {
        Self {
            repo: SchemeRepository::new(store),
        }
    }

    pub async fn create(&self, input: &SchemeCreate) -> Result<Scheme, RepositoryError> {
        let scheme = self.repo.create(input).await?;
        info!(scheme_id = %scheme.id, title = %scheme.title, "scheme created");
        Ok(scheme)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Scheme>, RepositoryError> {
        self.repo.get(id).await
    }

    pub async fn update(&self, id: Uuid, input: &SchemeUpdate) -> Result<Scheme, RepositoryError> {
        let existing = self.repo.get(id).await?.ok_or(RepositoryError::NotFound)?;
        self.repo.update(&existing, input).await
    }

    pub async fn remove(&self, id: Uuid) -> Result<Deleted, RepositoryError> {
        self.repo.remove(id).await
    }

    pub async fn list(&self, skip: u64, limit: u64) -> Result<Page<Scheme>, RepositoryError> {
        self.repo.get_multi(skip, limit).await
    }

    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Scheme>, RepositoryError> {
        self.repo.get_by_user_id(user_id).await
    }

    pub async fn list_by_chat(
        &self,
        chat_id: Uuid,
        skip: u64,
        limit: u64,
    ) -> Result<Page<Scheme>, RepositoryError> {
        self.repo.get_by_chat_id(chat_id, skip, limit).await
    }
}
