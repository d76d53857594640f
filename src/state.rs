use deadpool_postgres::Pool;
use redis::aio::ConnectionManager;
use std::sync::Arc;
use crate::config::Config;
use crate::error::Result;
use crate::session_store::{RedisSessionStore, SessionStore};

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The database connection pool.
    pub db: Pool,
    /// The session store. Redis-backed in production, swappable in tests.
    pub sessions: Arc<dyn SessionStore>,
    /// The application's configuration.
    pub config: Config,
}

impl AppState {
    /// Creates a new `AppState` with the Redis-backed session store.
    pub async fn new(config: &Config) -> Result<Self> {
        let db = crate::db::create_pool(&config.database_url)?;
        tracing::info!("PostgreSQL pool initialized");

        let redis_client = redis::Client::open(config.redis_url.as_str())?;
        let redis = ConnectionManager::new(redis_client).await?;
        tracing::info!("Redis connection manager initialized");

        Ok(AppState {
            db,
            sessions: Arc::new(RedisSessionStore::new(redis)),
            config: config.clone(),
        })
    }
}
