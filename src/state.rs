use crate::config::AppConfig;
use crate::notify::{LogNotifier, Notifier};
use crate::presence::PresenceTracker;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub notifier: Arc<dyn Notifier>,
    pub presence: Arc<PresenceTracker>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = crate::db::connect(&config).await?;
        Ok(Self {
            db,
            config,
            notifier: Arc::new(LogNotifier),
            presence: Arc::new(PresenceTracker::new()),
        })
    }

    pub fn from_parts(db: PgPool, config: Arc<AppConfig>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            db,
            config,
            notifier,
            presence: Arc::new(PresenceTracker::new()),
        }
    }

    /// State over an existing pool with default collaborators; used by tests.
    pub fn with_pool(db: PgPool) -> Self {
        let config = Arc::new(AppConfig {
            database_url: String::new(),
            max_db_connections: 5,
            signup_credits: 0,
        });
        Self {
            db,
            config,
            notifier: Arc::new(LogNotifier),
            presence: Arc::new(PresenceTracker::new()),
        }
    }
}
