//! Runtime settings for Etlas.
//!
//! `Settings` is built once at start-up from `config.toml` plus environment
//! overrides and handed to the components that need it. Values consumed only
//! by outer layers (upload handling, CORS) are carried through unchanged.

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

/// Top-level configuration for an Etlas process.
///
/// Loaded from `{data_dir}/config.toml`; every field has a default.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory where uploaded files are staged.
    pub upload_dir: String,
    /// Largest accepted upload, in bytes.
    pub max_upload_size: u64,
    /// Upper bound for running generated code, in seconds.
    pub execution_timeout_secs: u64,
    pub allowed_origins: Vec<String>,
    pub cleanup_after_run: bool,

    /// Credential for the completion service. Never logged.
    #[serde(deserialize_with = "secret_from_string")]
    pub openai_api_key: SecretString,
    pub model_name: String,
    /// Override for OpenAI-compatible endpoints.
    pub openai_base_url: Option<String>,

    /// Store connection string. Defaults to `sqlite://{data_dir}/etlas.db`.
    pub database_url: Option<String>,
    /// JSON instruction document; the built-in default is used when unset.
    pub prompt_template_path: Option<String>,

    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub max_tokens: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            upload_dir: "/tmp/playground".to_string(),
            max_upload_size: 100 * 1024 * 1024,
            execution_timeout_secs: 5,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "https://etlas.vercel.app".to_string(),
            ],
            cleanup_after_run: true,
            openai_api_key: SecretString::from(String::new()),
            model_name: "o4-mini".to_string(),
            openai_base_url: None,
            database_url: None,
            prompt_template_path: None,
            max_retries: 3,
            retry_delay_ms: 2_000,
            max_tokens: 4_096,
        }
    }
}

impl Settings {
    /// The connection string to open, falling back to a file in `data_dir`.
    pub fn database_url_or(&self, data_dir: &std::path::Path) -> String {
        match &self.database_url {
            Some(url) => url.clone(),
            None => format!("sqlite://{}?mode=rwc", data_dir.join("etlas.db").display()),
        }
    }
}

fn secret_from_string<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(SecretString::from(raw))
}

/// Split a comma-separated origin list, dropping blanks.
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}
