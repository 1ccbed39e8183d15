//! Application state wiring all services together.
//!
//! Services in etlas-core are generic over the procedure store; AppState
//! pins them to the SQLite store from etlas-infra.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use etlas_core::completion::CompletionConfig;
use etlas_core::prompt::PromptTemplate;
use etlas_core::repository::catalog;
use etlas_core::repository::message::MessageRepository;
use etlas_core::service::{ChatService, MessageService, SchemeService, UserService};
use etlas_infra::config::load_settings;
use etlas_infra::llm::create_provider;
use etlas_infra::sqlite::pool::DatabasePool;
use etlas_infra::sqlite::store::SqliteProcedureStore;
use etlas_types::config::Settings;

/// The procedure store shared by every service.
pub type Store = Arc<SqliteProcedureStore>;

/// Shared application state holding all services.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ChatService<Store>>,
    pub scheme_service: Arc<SchemeService<Store>>,
    pub user_service: Arc<UserService<Store>>,
    pub messages: MessageRepository<Store>,
    pub template: Arc<PromptTemplate>,
    pub settings: Arc<Settings>,
    pub data_dir: PathBuf,
    store: Store,
}

impl AppState {
    /// Initialize the application state: load settings, connect to DB, wire services.
    pub async fn init(data_dir: PathBuf) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("creating data directory {}", data_dir.display()))?;
        let settings = load_settings(&data_dir).await;
        Self::with_settings(data_dir, settings).await
    }

    pub async fn with_settings(data_dir: PathBuf, settings: Settings) -> anyhow::Result<Self> {
        let db_url = settings.database_url_or(&data_dir);
        let db_pool = DatabasePool::new(&db_url)
            .await
            .context("opening database")?;
        let store: Store = Arc::new(SqliteProcedureStore::new(db_pool, &catalog())?);

        let template = PromptTemplate::load(settings.prompt_template_path.as_deref().map(Path::new))?;
        tracing::debug!(version = %template.version, "prompt template ready");

        Ok(Self {
            chat_service: Arc::new(ChatService::new(store.clone())),
            scheme_service: Arc::new(SchemeService::new(store.clone())),
            user_service: Arc::new(UserService::new(store.clone())),
            messages: MessageRepository::new(store.clone()),
            template: Arc::new(template),
            settings: Arc::new(settings),
            data_dir,
            store,
        })
    }

    /// Build the message orchestrator. Requires a completion API key.
    pub fn message_service(&self) -> anyhow::Result<MessageService<Store>> {
        let provider = create_provider(&self.settings).map_err(|_| {
            anyhow::anyhow!(
                "no completion API key configured; set OPENAI_API_KEY or openai_api_key in {}",
                self.data_dir.join("config.toml").display()
            )
        })?;

        Ok(MessageService::new(
            self.store.clone(),
            Arc::new(provider),
            Some(self.template.clone()),
            CompletionConfig::from_settings(&self.settings),
        ))
    }

    /// Flush and close the database pools.
    pub async fn close(&self) {
        self.store.pool().close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use etlas_types::chat::ChatCreate;
    use etlas_types::user::UserCreate;

    #[tokio::test]
    async fn state_wires_services_to_one_store() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::with_settings(dir.path().to_path_buf(), Settings::default())
            .await
            .unwrap();

        let user = state
            .user_service
            .create(&UserCreate::new("Ana", "ana@example.com").unwrap())
            .await
            .unwrap();
        let chat = state
            .chat_service
            .create(&ChatCreate::new(user.id, None))
            .await
            .unwrap();

        let page = state.chat_service.list_by_user(user.id, 0, 10).await.unwrap();
        assert_eq!(page.data[0].id, chat.id);
        assert!(dir.path().join("etlas.db").exists());
    }

    #[tokio::test]
    async fn message_service_requires_api_key() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::with_settings(dir.path().to_path_buf(), Settings::default())
            .await
            .unwrap();

        let err = state.message_service().err().unwrap();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[tokio::test]
    async fn close_releases_the_database() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::with_settings(dir.path().to_path_buf(), Settings::default())
            .await
            .unwrap();

        state.close().await;

        assert!(state.store.pool().writer.is_closed());
        assert!(state.user_service.get(uuid::Uuid::new_v4()).await.is_err());
    }
}
