//! Completion provider implementations.
//!
//! Contains the concrete implementation of the [`LlmProvider`] trait defined
//! in `etlas-core`, and a factory ([`create_provider`]) that builds it from
//! the application [`Settings`].
//!
//! [`LlmProvider`]: etlas_core::llm::provider::LlmProvider

pub mod openai_compat;

use etlas_core::llm::box_provider::BoxLlmProvider;
use etlas_types::config::Settings;
use etlas_types::llm::LlmError;
use secrecy::ExposeSecret;

use self::openai_compat::OpenAiCompatibleProvider;
use self::openai_compat::config::OpenAiCompatConfig;

/// Create a [`BoxLlmProvider`] from the application settings.
///
/// # Errors
///
/// Returns [`LlmError::AuthenticationFailed`] when no API key is configured.
pub fn create_provider(settings: &Settings) -> Result<BoxLlmProvider, LlmError> {
    if settings.openai_api_key.expose_secret().trim().is_empty() {
        return Err(LlmError::AuthenticationFailed);
    }

    let config = OpenAiCompatConfig::from_settings(settings);
    tracing::debug!(
        provider = %config.provider_name,
        base_url = %config.base_url,
        model = %config.model,
        "creating completion provider"
    );
    Ok(BoxLlmProvider::new(OpenAiCompatibleProvider::new(config)))
}
