/// Application context and dependency injection
use crate::{
    account::AccountManager,
    config::ServerConfig,
    db,
    error::EthosResult,
    focus::FocusSessionManager,
    goals::{GoalLogManager, GoalManager, RevisionManager},
    settings::SettingsManager,
    stats::StatsManager,
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub db: SqlitePool,
    pub account_manager: Arc<AccountManager>,
    pub settings: Arc<SettingsManager>,
    // Tracking
    pub goals: Arc<GoalManager>,
    pub revisions: Arc<RevisionManager>,
    pub logs: Arc<GoalLogManager>,
    pub focus: Arc<FocusSessionManager>,
    pub stats: Arc<StatsManager>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> EthosResult<Self> {
        // Validate configuration
        config.validate()?;

        // Media directory is served as-is; make sure it exists
        tokio::fs::create_dir_all(&config.storage.media_root).await?;

        let options = db::DatabaseOptions {
            max_connections: config.storage.max_connections,
            ..Default::default()
        };
        let pool = db::create_pool(&config.storage.database_url, options).await?;

        db::run_migrations(&pool).await?;
        db::test_connection(&pool).await?;

        Ok(Self::from_pool(config, pool))
    }

    /// Wire services around an existing pool with migrations already applied
    pub fn from_pool(config: ServerConfig, db: SqlitePool) -> Self {
        let config = Arc::new(config);

        Self {
            account_manager: Arc::new(AccountManager::new(db.clone(), config.clone())),
            settings: Arc::new(SettingsManager::new(db.clone())),
            goals: Arc::new(GoalManager::new(db.clone())),
            revisions: Arc::new(RevisionManager::new(db.clone())),
            logs: Arc::new(GoalLogManager::new(db.clone())),
            focus: Arc::new(FocusSessionManager::new(db.clone())),
            stats: Arc::new(StatsManager::new(db.clone())),
            config,
            db,
        }
    }

    /// Get service URL
    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }
}
