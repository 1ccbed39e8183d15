//! LlmProvider trait definition.
//!
//! This is the abstraction every completion backend implements. Uses RPITIT
//! for `complete`; see `BoxLlmProvider` for dynamic dispatch.

use etlas_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for completion service backends.
///
/// Implementations live in etlas-infra (e.g., `OpenAiCompatibleProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "openai").
    fn name(&self) -> &str;

    /// Send the full conversation and receive one assistant turn.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
