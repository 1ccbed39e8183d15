//! Attachment persistence.

use etlas_types::attachment::{Attachment, AttachmentCreate, AttachmentUpdate};
use etlas_types::entity::OrderedParams;
use etlas_types::error::RepositoryError;
use serde_json::json;
use uuid::Uuid;

use super::entity::{EntityKind, EntityRepository, args, decode_all};
use super::store::{Procedure, ProcedureSet, ProcedureStore};

pub const ATTACHMENTS_BY_MESSAGE: Procedure =
    Procedure::new("get_all_attachments_by_message_id", &["message_id"]);
/// Attachments owned by any of a set of messages; used to decorate message pages.
pub const ATTACHMENTS_BY_MESSAGES: Procedure =
    Procedure::new("get_all_attachments_by_message_ids", &["message_ids"]);

pub struct AttachmentKind;

impl EntityKind for AttachmentKind {
    type Entity = Attachment;
    type Create = AttachmentCreate;
    type Update = AttachmentUpdate;

    const NAME: &'static str = "attachment";
    const PROCEDURES: ProcedureSet = ProcedureSet {
        entity: "attachment",
        get_by_id: Procedure::new("get_attachment_by_id", &["id"]),
        list: Procedure::new("get_all_attachments", &["limit", "skip"]),
        create: Procedure::new("create_attachment", AttachmentCreate::ORDERED_PARAMS),
        update: Procedure::new("update_attachment", AttachmentUpdate::ORDERED_PARAMS),
        delete: Procedure::new("delete_attachment", &["id"]),
        queries: &[ATTACHMENTS_BY_MESSAGE, ATTACHMENTS_BY_MESSAGES],
    };
}

pub type AttachmentRepository<S> = EntityRepository<AttachmentKind, S>;

impl<S: ProcedureStore> EntityRepository<AttachmentKind, S> {
    pub async fn get_by_message_id(
        &self,
        message_id: Uuid,
    ) -> Result<Vec<Attachment>, RepositoryError> {
        let rows = self
            .call(&ATTACHMENTS_BY_MESSAGE, &args([("message_id", json!(message_id))]))
            .await?;
        decode_all(rows)
    }

    /// Attachments of every message in `message_ids`, in creation order.
    pub async fn get_by_message_ids(
        &self,
        message_ids: &[Uuid],
    ) -> Result<Vec<Attachment>, RepositoryError> {
        if message_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .call(&ATTACHMENTS_BY_MESSAGES, &args([("message_ids", json!(message_ids))]))
            .await?;
        decode_all(rows)
    }
}
