//! Application state wiring all services together.
//!
//! Services are generic over the repository traits; AppState pins them to the
//! SQLite implementations and holds the single completion gateway built at
//! startup.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use parley_core::chat::orchestrator::CompletionOrchestrator;
use parley_core::chat::service::ChatService;
use parley_core::llm::box_gateway::BoxCompletionGateway;
use parley_infra::config::load_chat_config;
use parley_infra::llm::create_gateway;
use parley_infra::sqlite::chat::SqliteChatRepository;
use parley_infra::sqlite::pool::DatabasePool;
use parley_infra::sqlite::user::SqliteUserRepository;
use parley_types::config::ChatConfig;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteChatService = ChatService<SqliteChatRepository, SqliteUserRepository>;

pub type ConcreteOrchestrator = CompletionOrchestrator<SqliteChatRepository, SqliteUserRepository>;

/// Shared application state for the REST API.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
    pub orchestrator: Arc<ConcreteOrchestrator>,
    pub config: Arc<ChatConfig>,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Resolve configuration, build the gateway, open the database.
    ///
    /// The gateway is built first so a misconfigured completion service
    /// stops the process before any listener binds.
    pub async fn init(data_dir: PathBuf, database_url: &str) -> anyhow::Result<Self> {
        let config = load_chat_config(&data_dir).await;

        let gateway = create_gateway(Duration::from_secs(config.request_timeout_secs))
            .context("completion service is not configured")?;

        let db_pool = open_database(&data_dir, database_url).await?;

        Ok(Self::from_parts(db_pool, gateway, config))
    }

    /// Wire services from already-constructed parts.
    pub fn from_parts(db_pool: DatabasePool, gateway: BoxCompletionGateway, config: ChatConfig) -> Self {
        let chat_repo = SqliteChatRepository::new(db_pool.clone());
        let user_repo = SqliteUserRepository::new(db_pool.clone());
        let orchestrator =
            CompletionOrchestrator::new(chat_repo, user_repo, Arc::new(gateway), config.clone());

        Self {
            chat_service: Arc::new(chat_service(&db_pool)),
            orchestrator: Arc::new(orchestrator),
            config: Arc::new(config),
            db_pool,
        }
    }
}

/// CRUD service over an open pool, without a completion gateway.
pub fn chat_service(db_pool: &DatabasePool) -> ConcreteChatService {
    ChatService::new(
        SqliteChatRepository::new(db_pool.clone()),
        SqliteUserRepository::new(db_pool.clone()),
    )
}

/// Create the data directory if needed and open (and migrate) the database.
pub async fn open_database(data_dir: &Path, database_url: &str) -> anyhow::Result<DatabasePool> {
    tokio::fs::create_dir_all(data_dir)
        .await
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

    DatabasePool::new(database_url)
        .await
        .with_context(|| format!("failed to open database {database_url}"))
}
