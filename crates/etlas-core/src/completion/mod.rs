//! Stateful completion client.
//!
//! A `CompletionClient` owns the linear history of one orchestration call:
//! the system instruction first, then alternating user/assistant turns. It
//! retries transient provider failures with exponential backoff and parses
//! the assistant reply into a [`StructuredResponse`].

pub mod history;

use std::sync::Arc;
use std::time::Duration;

use etlas_types::config::Settings;
use etlas_types::error::CompletionError;
use etlas_types::llm::{CompletionRequest, StructuredResponse, Turn};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::llm::BoxLlmProvider;
use crate::prompt::{PromptTemplate, TITLE_REQUEST};

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Total attempts made before giving up. Never less than one.
    pub fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Wait after the failed attempt numbered `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Per-process completion tuning, derived once from [`Settings`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionConfig {
    pub model: String,
    pub max_tokens: u32,
    pub retry: RetryPolicy,
}

impl CompletionConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            model: settings.model_name.clone(),
            max_tokens: settings.max_tokens,
            retry: RetryPolicy::new(
                settings.max_retries,
                Duration::from_millis(settings.retry_delay_ms),
            ),
        }
    }
}

pub struct CompletionClient {
    provider: Arc<BoxLlmProvider>,
    model: String,
    max_tokens: u32,
    template: Option<Arc<PromptTemplate>>,
    history: Vec<Turn>,
    retry: RetryPolicy,
    cancel: CancellationToken,
}

impl CompletionClient {
    pub fn new(provider: Arc<BoxLlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens: 4096,
            template: None,
            history: Vec::new(),
            retry: RetryPolicy::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_template(mut self, template: Arc<PromptTemplate>) -> Self {
        self.template = Some(template);
        self
    }

    /// Pre-populate prior turns; `initialize` still places the system
    /// instruction ahead of them.
    pub fn with_history(mut self, history: Vec<Turn>) -> Self {
        self.history = history;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Abort in-flight requests and backoff waits when `token` fires.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    /// Insert the rendered system instruction at the head of the history.
    ///
    /// `scheme`, when given, is appended verbatim after the instructions.
    pub fn initialize(&mut self, scheme: Option<&str>) -> Result<&[Turn], CompletionError> {
        let template = self
            .template
            .as_ref()
            .ok_or(CompletionError::NoTemplateLoaded)?;
        let system = template.render_with_schema(scheme);
        self.history.insert(0, Turn::system(system));
        Ok(&self.history)
    }

    /// Send one user turn and parse the structured reply.
    ///
    /// With `want_title` the turn asks the service to add a `title` key.
    /// Provider failures are retried up to the policy's bound; a reply that
    /// is not a JSON object fails immediately with `MalformedResponse`.
    #[tracing::instrument(skip(self, text), fields(model = %self.model, provider = %self.provider.name()))]
    pub async fn send(
        &mut self,
        text: &str,
        want_title: bool,
    ) -> Result<StructuredResponse, CompletionError> {
        let mut content = text.to_string();
        if want_title {
            content.push_str(TITLE_REQUEST);
        }
        self.history.push(Turn::user(content));

        let attempts = self.retry.attempts();
        let mut attempt = 0;
        let reply = loop {
            let request = CompletionRequest {
                model: self.model.clone(),
                messages: self.history.clone(),
                max_tokens: self.max_tokens,
                temperature: None,
            };

            let result = tokio::select! {
                _ = self.cancel.cancelled() => return Err(CompletionError::Cancelled),
                result = self.provider.complete(&request) => result,
            };

            match result {
                Ok(response) => {
                    debug!(
                        attempt,
                        input_tokens = response.usage.input_tokens,
                        output_tokens = response.usage.output_tokens,
                        "completion received"
                    );
                    break response.content;
                }
                Err(err) => {
                    attempt += 1;
                    if !err.is_transient() || attempt >= attempts {
                        warn!(attempts = attempt, error = %err, "completion service unavailable");
                        return Err(CompletionError::CompletionUnavailable {
                            attempts: attempt,
                            source: err,
                        });
                    }

                    let delay = self.retry.delay_for(attempt - 1);
                    warn!(
                        attempt,
                        max_attempts = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "completion failed, retrying"
                    );
                    tokio::select! {
                        _ = self.cancel.cancelled() => return Err(CompletionError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        };

        self.history.push(Turn::assistant(reply.clone()));
        parse_structured(&reply)
    }

    /// Drop every turn, including the system instruction.
    pub fn clear_conversation(&mut self) {
        self.history.clear();
    }
}

/// Parse an assistant reply into its structured fields.
///
/// A surrounding markdown code fence is tolerated; anything else that is
/// not a JSON object is a malformed response.
pub fn parse_structured(raw: &str) -> Result<StructuredResponse, CompletionError> {
    let body = strip_code_fence(raw.trim());
    let malformed = |reason: String| CompletionError::MalformedResponse {
        raw: raw.to_string(),
        reason,
    };

    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|err| malformed(err.to_string()))?;
    if !value.is_object() {
        return Err(malformed("reply is not a JSON object".to_string()));
    }
    serde_json::from_value(value).map_err(|err| malformed(err.to_string()))
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedProvider;
    use etlas_types::llm::{LlmError, MessageRole};
    use tokio::time::Instant;

    const REPLY: &str =
        r#"{"analysis":"a","comment":"c","code":"SELECT 1;","title":"Resumen diario"}"#;

    fn client(provider: &ScriptedProvider) -> CompletionClient {
        CompletionClient::new(Arc::new(BoxLlmProvider::new(provider.clone())), "o4-mini")
            .with_template(Arc::new(PromptTemplate::default()))
            .with_retry(RetryPolicy::new(3, Duration::from_secs(2)))
    }

    #[test]
    fn config_follows_settings() {
        let settings = Settings {
            model_name: "gpt-4o-mini".to_string(),
            retry_delay_ms: 250,
            ..Default::default()
        };
        let config = CompletionConfig::from_settings(&settings);
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.retry, RetryPolicy::new(3, Duration::from_millis(250)));
    }

    #[test]
    fn delays_double_per_attempt() {
        let policy = RetryPolicy::new(3, Duration::from_millis(500));
        assert_eq!(policy.delay_for(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).attempts(), 1);
    }

    #[test]
    fn initialize_without_template_fails() {
        let provider = ScriptedProvider::new();
        let mut client = CompletionClient::new(Arc::new(BoxLlmProvider::new(provider)), "o4-mini");
        assert!(matches!(
            client.initialize(None),
            Err(CompletionError::NoTemplateLoaded)
        ));
    }

    #[test]
    fn initialize_inserts_system_turn_first() {
        let provider = ScriptedProvider::new();
        let mut client = client(&provider).with_history(vec![
            Turn::user("hola"),
            Turn::assistant("Comment: hola"),
        ]);

        let history = client.initialize(Some("CREATE TABLE ventas (total INT);")).unwrap();

        assert_eq!(history.len(), 3);
        assert_eq!(history[0].role, MessageRole::System);
        assert!(history[0].content.ends_with("CREATE TABLE ventas (total INT);"));
        assert_eq!(history[1], Turn::user("hola"));
    }

    #[tokio::test]
    async fn send_parses_reply_and_grows_history() {
        let provider = ScriptedProvider::new();
        provider.reply(REPLY);
        let mut client = client(&provider);
        client.initialize(None).unwrap();

        let response = client.send("Necesito un resumen diario de ventas", true).await.unwrap();

        assert_eq!(response.code.as_deref(), Some("SELECT 1;"));
        assert_eq!(response.title(), Some("Resumen diario"));
        assert!(response.executable_code.is_none());

        let sent = &provider.requests()[0];
        assert_eq!(sent.model, "o4-mini");
        assert_eq!(sent.messages.len(), 2);
        assert_eq!(
            sent.messages[1].content,
            format!("Necesito un resumen diario de ventas{TITLE_REQUEST}")
        );
        assert_eq!(client.history().len(), 3);
        assert_eq!(client.history()[2], Turn::assistant(REPLY));
    }

    #[tokio::test]
    async fn send_without_title_leaves_text_untouched() {
        let provider = ScriptedProvider::new();
        provider.reply(REPLY);
        let mut client = client(&provider);

        client.send("otra pregunta", false).await.unwrap();

        assert_eq!(provider.requests()[0].messages[0].content, "otra pregunta");
    }

    #[tokio::test(start_paused = true)]
    async fn retries_with_exponential_backoff_then_gives_up() {
        let provider = ScriptedProvider::new();
        for _ in 0..5 {
            provider.fail(LlmError::Overloaded("busy".to_string()));
        }
        let mut client = client(&provider);
        let started = Instant::now();

        let err = client.send("hola", false).await.unwrap_err();

        match err {
            CompletionError::CompletionUnavailable { attempts, source } => {
                assert_eq!(attempts, 3);
                assert!(matches!(source, LlmError::Overloaded(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(provider.requests().len(), 3);
        // 2s after the first failure, 4s after the second, none after the last.
        assert_eq!(started.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_transient_failure() {
        let provider = ScriptedProvider::new();
        provider
            .fail(LlmError::RateLimited { retry_after_ms: None })
            .reply(REPLY);
        let mut client = client(&provider);

        let response = client.send("hola", false).await.unwrap();

        assert_eq!(response.analysis.as_deref(), Some("a"));
        assert_eq!(provider.requests().len(), 2);
        // The user turn is sent once, not once per attempt.
        assert_eq!(client.history().len(), 2);
    }

    #[tokio::test]
    async fn authentication_failure_is_not_retried() {
        let provider = ScriptedProvider::new();
        provider.fail(LlmError::AuthenticationFailed);
        let mut client = client(&provider);

        let err = client.send("hola", false).await.unwrap_err();

        assert!(matches!(
            err,
            CompletionError::CompletionUnavailable { attempts: 1, .. }
        ));
        assert_eq!(provider.requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn context_overflow_is_not_retried() {
        let provider = ScriptedProvider::new();
        provider.fail(LlmError::ContextLengthExceeded).reply(REPLY);
        let mut client = client(&provider);
        let started = Instant::now();

        let err = client.send("hola", false).await.unwrap_err();

        assert!(matches!(
            err,
            CompletionError::CompletionUnavailable {
                attempts: 1,
                source: LlmError::ContextLengthExceeded,
            }
        ));
        assert_eq!(provider.requests().len(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn malformed_reply_is_not_retried() {
        let provider = ScriptedProvider::new();
        provider.reply("Claro, aqui tienes el codigo").reply(REPLY);
        let mut client = client(&provider);

        let err = client.send("hola", false).await.unwrap_err();

        assert!(matches!(err, CompletionError::MalformedResponse { .. }));
        assert_eq!(provider.requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_backoff() {
        let provider = ScriptedProvider::new();
        provider.fail(LlmError::Overloaded("busy".to_string()));
        let token = CancellationToken::new();
        let mut client = client(&provider).with_cancellation(token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            token.cancel();
        });
        let err = client.send("hola", false).await.unwrap_err();
        canceller.await.unwrap();

        assert!(matches!(err, CompletionError::Cancelled));
        assert_eq!(provider.requests().len(), 1);
    }

    #[test]
    fn clear_conversation_empties_history() {
        let provider = ScriptedProvider::new();
        let mut client = client(&provider);
        client.initialize(None).unwrap();
        client.clear_conversation();
        assert!(client.history().is_empty());
    }

    #[test]
    fn parse_tolerates_code_fence() {
        let fenced = format!("```json\n{REPLY}\n```");
        let parsed = parse_structured(&fenced).unwrap();
        assert_eq!(parsed.comment.as_deref(), Some("c"));
    }

    #[test]
    fn parse_rejects_non_object() {
        assert!(matches!(
            parse_structured("[1, 2]"),
            Err(CompletionError::MalformedResponse { .. })
        ));
    }
}
