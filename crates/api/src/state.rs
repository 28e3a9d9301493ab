use std::sync::Arc;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
/// All coordination state lives in the database; nothing here survives a
/// restart or needs to.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: gatekeep_db::DbPool,
    /// Server configuration (JWT settings, lockout policy, timeouts).
    pub config: Arc<ServerConfig>,
}
