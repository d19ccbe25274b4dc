//! Application state

use std::sync::Arc;

use anyhow::Result;

use mistduel_auth::{AuthState, TokenConfig};
use mistduel_db::DbPool;
use mistduel_engine::{LobbyManager, Matchmaker, SnapshotStore, WarRegistry};
use mistduel_locations::LocationProvider;

use crate::config::Config;

/// Shared state for every route and socket handler.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub redis: redis::Client,
    pub config: Config,
    pub tokens: TokenConfig,
    pub lobbies: LobbyManager,
    pub matchmaker: Matchmaker,
    pub provider: Arc<LocationProvider>,
    pub wars: WarRegistry,
}

impl AppState {
    pub async fn new(config: &Config) -> Result<Self> {
        let db = mistduel_db::create_pool(&config.database_url).await?;
        tracing::info!("Connected to database");

        let redis = redis::Client::open(config.redis_url.as_str())?;
        tracing::info!("Connected to Redis");

        let tokens = TokenConfig::new(config.secret_key.clone());
        let provider = Arc::new(LocationProvider::new(db.clone()));
        let wars = WarRegistry::new();
        let snapshots = SnapshotStore::new(redis.clone());
        let lobbies = LobbyManager::new(db.clone(), Some(snapshots), wars.clone());
        let matchmaker = Matchmaker::new(db.clone(), Arc::clone(&provider));

        Ok(Self {
            db,
            redis,
            config: config.clone(),
            tokens,
            lobbies,
            matchmaker,
            provider,
            wars,
        })
    }

    pub fn redis(&self) -> &redis::Client {
        &self.redis
    }
}

impl AuthState for AppState {
    fn db_pool(&self) -> &sqlx::PgPool {
        &self.db
    }

    fn token_config(&self) -> &TokenConfig {
        &self.tokens
    }
}
