//! In-memory fakes of the core ports, shared by unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use etlas_types::chat::Chat;
use etlas_types::error::RepositoryError;
use etlas_types::llm::{CompletionRequest, CompletionResponse, LlmError, StopReason, Usage};
use etlas_types::message::{Message, MessageContent};
use uuid::Uuid;

use crate::llm::provider::LlmProvider;
use crate::repository::store::{Params, ProcedureStore, Record};

/// A procedure store that replays queued replies per procedure name.
///
/// Procedures with nothing queued return no rows. Every call is logged.
#[derive(Clone, Default)]
pub struct ScriptedStore {
    replies: Arc<Mutex<HashMap<&'static str, VecDeque<Result<Vec<Record>, RepositoryError>>>>>,
    calls: Arc<Mutex<Vec<(&'static str, Params)>>>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, procedure: &'static str, rows: Vec<Record>) {
        self.push(procedure, Ok(rows));
    }

    pub fn fail(&self, procedure: &'static str, err: RepositoryError) {
        self.push(procedure, Err(err));
    }

    fn push(&self, procedure: &'static str, reply: Result<Vec<Record>, RepositoryError>) {
        self.replies
            .lock()
            .unwrap()
            .entry(procedure)
            .or_default()
            .push_back(reply);
    }

    pub fn calls(&self) -> Vec<(&'static str, Params)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self) -> Vec<&'static str> {
        self.calls().into_iter().map(|(name, _)| name).collect()
    }
}

impl ProcedureStore for ScriptedStore {
    async fn call(
        &self,
        procedure: &'static str,
        params: Params,
    ) -> Result<Vec<Record>, RepositoryError> {
        self.calls.lock().unwrap().push((procedure, params));
        self.replies
            .lock()
            .unwrap()
            .get_mut(procedure)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// A completion provider that replays queued outcomes and records requests.
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    outcomes: Arc<Mutex<VecDeque<Result<String, LlmError>>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, text: impl Into<String>) -> &Self {
        self.outcomes.lock().unwrap().push_back(Ok(text.into()));
        self
    }

    pub fn fail(&self, err: LlmError) -> &Self {
        self.outcomes.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::Provider {
                message: "no scripted outcome".to_string(),
            }))?;
        Ok(CompletionResponse {
            id: "resp-1".to_string(),
            content: outcome,
            model: request.model.clone(),
            stop_reason: StopReason::EndTurn,
            usage: Usage::default(),
        })
    }
}

pub fn timestamp() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

pub fn stored_chat(user_id: Uuid, scheme_id: Option<Uuid>, name: Option<&str>) -> Chat {
    Chat {
        id: Uuid::now_v7(),
        user_id,
        scheme_id,
        name_chat: name.map(String::from),
        created_at: timestamp(),
    }
}

pub fn stored_message(chat_id: Uuid, content: MessageContent) -> Message {
    Message {
        id: Uuid::now_v7(),
        chat_id,
        created_at: timestamp(),
        content,
        attachments: Vec::new(),
    }
}
