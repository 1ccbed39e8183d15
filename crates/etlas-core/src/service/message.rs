//! Message service and the send-message orchestration.
//!
//! `send_message` runs one completion round-trip for a chat:
//! 1. Load the chat and its full history, oldest first
//! 2. Normalize history into completion turns
//! 3. Build a `CompletionClient` and initialize it with the chat's scheme
//! 4. Persist the user turn (and its attachments)
//! 5. Request a completion, asking for a title on the chat's first exchange
//! 6. Rename the chat when the reply carries a title and the chat is unnamed
//! 7. Persist and return the assistant turn
//!
//! Every collaborator failure aborts the remaining steps. Steps 4-7 are not
//! one transaction: a failure after step 4 leaves the user turn committed.

use std::sync::Arc;

use etlas_types::attachment::NewAttachment;
use etlas_types::chat::ChatUpdate;
use etlas_types::entity::Page;
use etlas_types::error::{MessageError, RepositoryError};
use etlas_types::message::{ChatRole, Message, MessageContent, MessageCreate, MessageUpdate};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::completion::history::normalize_history;
use crate::completion::{CompletionClient, CompletionConfig};
use crate::llm::BoxLlmProvider;
use crate::prompt::PromptTemplate;
use crate::repository::ProcedureStore;
use crate::repository::attachment::AttachmentRepository;
use crate::repository::chat::ChatRepository;
use crate::repository::message::MessageRepository;
use crate::repository::scheme::SchemeRepository;

/// An inbound user turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessage {
    pub chat_id: Uuid,
    pub role: ChatRole,
    pub text: String,
    pub attachments: Vec<NewAttachment>,
}

impl SendMessage {
    pub fn user(chat_id: Uuid, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            role: ChatRole::User,
            text: text.into(),
            attachments: Vec::new(),
        }
    }

    pub fn with_attachment(mut self, attachment: NewAttachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

pub struct MessageService<S> {
    messages: MessageRepository<S>,
    chats: ChatRepository<S>,
    schemes: SchemeRepository<S>,
    attachments: AttachmentRepository<S>,
    provider: Arc<BoxLlmProvider>,
    template: Option<Arc<PromptTemplate>>,
    config: CompletionConfig,
}

impl<S: ProcedureStore + Clone> MessageService<S> {
    pub fn new(
        store: S,
        provider: Arc<BoxLlmProvider>,
        template: Option<Arc<PromptTemplate>>,
        config: CompletionConfig,
    ) -> Self {
        Self {
            messages: MessageRepository::new(store.clone()),
            chats: ChatRepository::new(store.clone()),
            schemes: SchemeRepository::new(store.clone()),
            attachments: AttachmentRepository::new(store),
            provider,
            template,
            config,
        }
    }
}

impl<S: ProcedureStore> MessageService<S> {
    pub async fn get(&self, id: Uuid) -> Result<Option<Message>, RepositoryError> {
        self.messages.get(id).await
    }

    pub async fn get_multi(&self, skip: u64, limit: u64) -> Result<Page<Message>, RepositoryError> {
        self.messages.get_multi(skip, limit).await
    }

    pub async fn get_by_user_id(&self, user_id: Uuid) -> Result<Vec<Message>, RepositoryError> {
        self.messages.get_by_user_id(user_id).await
    }

    pub async fn get_by_chat_id(
        &self,
        chat_id: Uuid,
        skip: u64,
        limit: u64,
    ) -> Result<Page<Message>, RepositoryError> {
        self.messages.get_by_chat_id(chat_id, skip, limit).await
    }

    /// Persist a message, then each attachment bound to it.
    ///
    /// Attachments are validated before anything is written. If one fails
    /// to persist, the message stays committed and the error names it.
    pub async fn create(
        &self,
        input: &MessageCreate,
        attachments: Vec<NewAttachment>,
    ) -> Result<Message, MessageError> {
        for attachment in &attachments {
            attachment.validate()?;
        }

        let mut message = self
            .messages
            .create(input)
            .await
            .map_err(MessageError::MessageNotCreated)?;

        for attachment in attachments {
            let created = self
                .attachments
                .create(&attachment.owned_by(message.id))
                .await
                .map_err(|source| {
                    warn!(
                        message_id = %message.id,
                        error = %source,
                        "attachment failed after message commit"
                    );
                    MessageError::AttachmentNotCreated {
                        message_id: message.id,
                        source,
                    }
                })?;
            message.attachments.push(created);
        }

        Ok(message)
    }

    /// Update the structured fields of an `ai` message.
    pub async fn update(&self, id: Uuid, input: &MessageUpdate) -> Result<Message, MessageError> {
        let existing = self
            .messages
            .get(id)
            .await?
            .ok_or(MessageError::NotFound("message"))?;
        Ok(self.messages.update(&existing, input).await?)
    }

    /// Run one completion round-trip and return the persisted reply.
    ///
    /// `cancel` aborts an in-flight completion or backoff wait.
    #[tracing::instrument(skip(self, request, cancel), fields(chat_id = %request.chat_id))]
    pub async fn send_message(
        &self,
        request: SendMessage,
        cancel: CancellationToken,
    ) -> Result<Message, MessageError> {
        let SendMessage {
            chat_id,
            role,
            text,
            attachments,
        } = request;
        let user_input = MessageCreate::new(chat_id, role, MessageContent::user(text.as_str()))?;
        for attachment in &attachments {
            attachment.validate()?;
        }

        let chat = self
            .chats
            .get(chat_id)
            .await?
            .ok_or(MessageError::NotFound("chat"))?;

        let prior = self.messages.get_full_history(chat_id).await?;
        let history = normalize_history(&prior);
        debug!(prior_turns = history.len(), "history loaded");

        let scheme = match chat.scheme_id {
            Some(scheme_id) => {
                let scheme = self.schemes.get(scheme_id).await?;
                if scheme.is_none() {
                    warn!(%scheme_id, "chat references a missing scheme, continuing without it");
                }
                scheme
            }
            None => None,
        };

        let mut client = CompletionClient::new(Arc::clone(&self.provider), self.config.model.clone())
            .with_max_tokens(self.config.max_tokens)
            .with_retry(self.config.retry)
            .with_history(history)
            .with_cancellation(cancel);
        if let Some(template) = &self.template {
            client = client.with_template(Arc::clone(template));
        }
        let want_title = client
            .initialize(scheme.as_ref().map(|scheme| scheme.content.as_str()))?
            .len()
            == 1;

        let user_message = self.create(&user_input, attachments).await?;
        info!(message_id = %user_message.id, want_title, "user message stored");

        let response = client.send(&text, want_title).await?;

        if let Some(title) = response.title() {
            if chat.name_chat.is_none() {
                self.chats.update(&chat, &ChatUpdate::rename(title)).await?;
                info!(title, "chat titled");
            }
        }

        let reply = self
            .messages
            .create(&MessageCreate::ai(chat_id, response.content()))
            .await
            .map_err(MessageError::MessageNotCreated)?;
        info!(message_id = %reply.id, "assistant message stored");

        Ok(reply)
    }
}
