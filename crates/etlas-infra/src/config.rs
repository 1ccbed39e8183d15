//! Settings loader for Etlas.
//!
//! Reads `config.toml` from the data directory (`~/.etlas/` by default) and
//! deserializes it into [`Settings`]. Falls back to defaults when the file is
//! missing or malformed, then applies environment overrides on top.

use std::path::{Path, PathBuf};

use etlas_types::config::{Settings, parse_origins};
use secrecy::SecretString;

/// Resolve the data directory.
///
/// Priority:
/// 1. `ETLAS_DATA_DIR` environment variable
/// 2. `~/.etlas`
/// 3. `.etlas` in the current directory
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("ETLAS_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".etlas");
    }

    PathBuf::from(".etlas")
}

/// Load settings from `{data_dir}/config.toml`, then the process environment.
pub async fn load_settings(data_dir: &Path) -> Settings {
    let settings = load_settings_file(data_dir).await;
    apply_env_overrides(settings, |name| std::env::var(name).ok())
}

/// Load `{data_dir}/config.toml` without environment overrides.
///
/// - If the file does not exist, returns [`Settings::default()`].
/// - If the file exists but fails to read or parse, logs a warning and returns the default.
pub async fn load_settings_file(data_dir: &Path) -> Settings {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return Settings::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return Settings::default();
        }
    };

    match toml::from_str::<Settings>(&content) {
        Ok(settings) => settings,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            Settings::default()
        }
    }
}

/// Override file values with environment variables.
///
/// `lookup` returns the value of a variable, if set. Values that fail to
/// parse are ignored with a warning.
pub fn apply_env_overrides(
    mut settings: Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Settings {
    if let Some(dir) = lookup("UPLOAD_FOLDER") {
        settings.upload_dir = dir;
    }
    if let Some(size) = parsed(&lookup, "MAX_UPLOAD_SIZE") {
        settings.max_upload_size = size;
    }
    if let Some(secs) = parsed(&lookup, "EXECUTION_TIMEOUT") {
        settings.execution_timeout_secs = secs;
    }
    if let Some(origins) = lookup("ALLOWED_ORIGINS") {
        settings.allowed_origins = parse_origins(&origins);
    }
    if let Some(cleanup) = lookup("CLEANUP_AFTER_RUN") {
        match parse_flag(&cleanup) {
            Some(flag) => settings.cleanup_after_run = flag,
            None => tracing::warn!("Ignoring CLEANUP_AFTER_RUN={cleanup}: not a boolean"),
        }
    }
    if let Some(key) = lookup("OPENAI_API_KEY") {
        settings.openai_api_key = SecretString::from(key);
    }
    if let Some(model) = lookup("MODEL_NAME") {
        settings.model_name = model;
    }
    if let Some(url) = lookup("DATABASE_URL") {
        settings.database_url = Some(url);
    }
    if let Some(url) = lookup("OPENAI_BASE_URL") {
        settings.openai_base_url = Some(url);
    }
    if let Some(path) = lookup("PROMPT_TEMPLATE_PATH") {
        settings.prompt_template_path = Some(path);
    }
    settings
}

fn parsed<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring {name}={raw}: not a number");
            None
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[tokio::test]
    async fn load_settings_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let settings = load_settings_file(tmp.path()).await;
        assert_eq!(settings.model_name, "o4-mini");
        assert_eq!(settings.max_retries, 3);
    }

    #[tokio::test]
    async fn load_settings_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
model_name = "gpt-4o"
max_retries = 5
retry_delay_ms = 500
"#,
        )
        .await
        .unwrap();

        let settings = load_settings_file(tmp.path()).await;

        assert_eq!(settings.model_name, "gpt-4o");
        assert_eq!(settings.max_retries, 5);
        assert_eq!(settings.retry_delay_ms, 500);
        assert_eq!(settings.max_tokens, 4_096);
    }

    #[tokio::test]
    async fn load_settings_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not [valid toml")
            .await
            .unwrap();

        let settings = load_settings_file(tmp.path()).await;

        assert_eq!(settings.model_name, "o4-mini");
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let settings = apply_env_overrides(
            Settings::default(),
            env(&[
                ("UPLOAD_FOLDER", "/srv/uploads"),
                ("MAX_UPLOAD_SIZE", "1024"),
                ("EXECUTION_TIMEOUT", "30"),
                ("ALLOWED_ORIGINS", "https://a.example, https://b.example"),
                ("CLEANUP_AFTER_RUN", "false"),
                ("OPENAI_API_KEY", "sk-env"),
                ("MODEL_NAME", "gpt-4o-mini"),
                ("DATABASE_URL", "sqlite:///tmp/etlas.db"),
                ("OPENAI_BASE_URL", "http://localhost:8080/v1"),
                ("PROMPT_TEMPLATE_PATH", "/etc/etlas/prompt.json"),
            ]),
        );

        assert_eq!(settings.upload_dir, "/srv/uploads");
        assert_eq!(settings.max_upload_size, 1024);
        assert_eq!(settings.execution_timeout_secs, 30);
        assert_eq!(
            settings.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert!(!settings.cleanup_after_run);
        assert_eq!(settings.openai_api_key.expose_secret(), "sk-env");
        assert_eq!(settings.model_name, "gpt-4o-mini");
        assert_eq!(settings.database_url.as_deref(), Some("sqlite:///tmp/etlas.db"));
        assert_eq!(
            settings.openai_base_url.as_deref(),
            Some("http://localhost:8080/v1")
        );
        assert_eq!(
            settings.prompt_template_path.as_deref(),
            Some("/etc/etlas/prompt.json")
        );
    }

    #[test]
    fn unparseable_env_values_are_ignored() {
        let settings = apply_env_overrides(
            Settings::default(),
            env(&[("MAX_UPLOAD_SIZE", "lots"), ("CLEANUP_AFTER_RUN", "maybe")]),
        );

        assert_eq!(settings.max_upload_size, Settings::default().max_upload_size);
        assert!(settings.cleanup_after_run);
    }

    #[test]
    fn no_env_keeps_settings() {
        let settings = apply_env_overrides(Settings::default(), env(&[]));
        assert_eq!(settings.model_name, "o4-mini");
        assert!(settings.database_url.is_none());
    }
}
