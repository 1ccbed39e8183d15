use thiserror::Error;
use uuid::Uuid;

use crate::llm::LlmError;

/// Errors from repository operations (used by trait definitions in etlas-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("store reported no created {entity} record")]
    CreationFailed { entity: &'static str },

    #[error("failed to update {entity} record: {reason}")]
    UpdateFailed { entity: &'static str, reason: String },

    #[error("invalid record: {0}")]
    Validation(#[from] ValidationError),

    #[error("no store binding for procedure '{0}'")]
    MissingProcedure(String),
}

/// Errors raised when a domain object violates its invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("role '{role}' does not match {content} content")]
    RoleContentMismatch {
        role: String,
        content: &'static str,
    },

    #[error("invalid value for '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("malformed record: {0}")]
    Malformed(String),
}

/// Errors from loading the system instruction document.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("failed to read prompt template '{path}': {reason}")]
    Unreadable { path: String, reason: String },

    #[error("invalid prompt template '{path}': {reason}")]
    Invalid { path: String, reason: String },
}

/// Errors from the completion client.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("there is no prompt template loaded")]
    NoTemplateLoaded,

    #[error("completion service unavailable after {attempts} attempt(s): {source}")]
    CompletionUnavailable {
        attempts: u32,
        #[source]
        source: LlmError,
    },

    #[error("completion service returned a malformed response: {reason}")]
    MalformedResponse { raw: String, reason: String },

    #[error("completion request cancelled")]
    Cancelled,
}

/// Failure conditions of the message orchestration flow.
///
/// Every collaborator failure aborts the remaining steps of a send.
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    #[error("message not created: {0}")]
    MessageNotCreated(#[source] RepositoryError),

    #[error("attachment not created for committed message {message_id}: {source}")]
    AttachmentNotCreated {
        message_id: Uuid,
        #[source]
        source: RepositoryError,
    },

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Completion(#[from] CompletionError),
}
