use std::sync::Arc;

use campusqa_db::PgStore;
use campusqa_engine::ConsistencyCoordinator;

use crate::config::ServerConfig;

/// The coordinator as wired for production.
pub type Engine = ConsistencyCoordinator<PgStore>;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: campusqa_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Vote, acceptance, and comment coordinator over the same pool.
    pub engine: Arc<Engine>,
}

impl AppState {
    pub fn new(pool: campusqa_db::DbPool, config: ServerConfig) -> Self {
        let engine = ConsistencyCoordinator::new(PgStore::new(pool.clone()), config.engine.clone());
        Self {
            pool,
            config: Arc::new(config),
            engine: Arc::new(engine),
        }
    }
}
