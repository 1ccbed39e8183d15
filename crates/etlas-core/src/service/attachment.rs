//! Attachment service.

use etlas_types::attachment::{Attachment, AttachmentCreate, AttachmentUpdate};
use etlas_types::entity::Page;
use etlas_types::error::RepositoryError;
use uuid::Uuid;

use crate::repository::ProcedureStore;
use crate::repository::attachment::AttachmentRepository;

pub struct AttachmentService<S> {
    repo: AttachmentRepository<S>,
}

impl<S: ProcedureStore> AttachmentService<S> {
    pub fn new(store: S) -> Self {
        Self {
            repo: AttachmentRepository::new(store),
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Attachment>, RepositoryError> {
        self.repo.get(id).await
    }

    pub async fn list(&self, skip: u64, limit: u64) -> Result<Page<Attachment>, RepositoryError> {
        self.repo.get_multi(skip, limit).await
    }

    pub async fn list_by_message(&self, message_id: Uuid) -> Result<Vec<Attachment>, RepositoryError> {
        self.repo.get_by_message_id(message_id).await
    }

    pub async fn create(&self, input: &AttachmentCreate) -> Result<Attachment, RepositoryError> {
        self.repo.create(input).await
    }

    pub async fn update(
        &self,
        id: Uuid,
        input: &AttachmentUpdate,
    ) -> Result<Attachment, RepositoryError> {
        let existing = self.repo.get(id).await?.ok_or(RepositoryError::NotFound)?;
        self.repo.update(&existing, input).await
    }
}
