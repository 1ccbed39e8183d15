//! Connection settings for an OpenAI-compatible chat completions endpoint.

use etlas_types::config::Settings;
use secrecy::{ExposeSecret, SecretString};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Configuration for an [`super::OpenAiCompatibleProvider`].
///
/// Does not derive Debug; the API key must never reach a log line.
pub struct OpenAiCompatConfig {
    /// Human-readable provider name used in logs.
    pub provider_name: String,
    /// Base URL for the API (e.g., "https://api.openai.com/v1").
    pub base_url: String,
    pub api_key: SecretString,
    /// Model used when a request leaves its model empty.
    pub model: String,
}

impl OpenAiCompatConfig {
    /// OpenAI defaults, optionally pointed at another compatible endpoint.
    pub fn from_settings(settings: &Settings) -> Self {
        let base_url = settings
            .openai_base_url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| OPENAI_BASE_URL.to_string());
        let provider_name = if base_url == OPENAI_BASE_URL {
            "openai"
        } else {
            "openai-compatible"
        };

        Self {
            provider_name: provider_name.to_string(),
            base_url,
            api_key: SecretString::from(settings.openai_api_key.expose_secret().to_string()),
            model: settings.model_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_openai() {
        let mut settings = Settings::default();
        settings.openai_api_key = SecretString::from("sk-test".to_string());

        let config = OpenAiCompatConfig::from_settings(&settings);

        assert_eq!(config.provider_name, "openai");
        assert_eq!(config.base_url, OPENAI_BASE_URL);
        assert_eq!(config.model, "o4-mini");
        assert_eq!(config.api_key.expose_secret(), "sk-test");
    }

    #[test]
    fn test_custom_base_url() {
        let settings = Settings {
            openai_base_url: Some("http://localhost:8080/v1".to_string()),
            ..Default::default()
        };

        let config = OpenAiCompatConfig::from_settings(&settings);

        assert_eq!(config.provider_name, "openai-compatible");
        assert_eq!(config.base_url, "http://localhost:8080/v1");
    }
}
