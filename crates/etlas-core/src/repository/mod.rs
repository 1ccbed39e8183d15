//! Repository port and the per-entity repositories built on it.
//!
//! The infrastructure layer (etlas-infra) implements [`ProcedureStore`];
//! everything above it is storage-agnostic.

pub mod attachment;
pub mod chat;
pub mod entity;
pub mod message;
pub mod scheme;
pub mod store;
pub mod user;

pub use entity::{EntityKind, EntityRepository};
pub use store::{CatalogError, Params, Procedure, ProcedureCatalog, ProcedureSet, ProcedureStore, Record};

use attachment::AttachmentKind;
use chat::ChatKind;
use message::MessageKind;
use scheme::SchemeKind;
use user::UserKind;

/// The catalog of every procedure the repositories may call.
pub fn catalog() -> ProcedureCatalog {
    ProcedureCatalog::new(vec![
        UserKind::PROCEDURES,
        SchemeKind::PROCEDURES,
        ChatKind::PROCEDURES,
        MessageKind::PROCEDURES,
        AttachmentKind::PROCEDURES,
    ])
}
