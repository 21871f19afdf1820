//! Application state shared across handlers

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::repositories::{PhotoRepository, SessionRepository, UserRepository};
use crate::storage::DiskStorage;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: ServerConfig,
    pub user_repository: UserRepository,
    pub session_repository: SessionRepository,
    pub photo_repository: PhotoRepository,
    pub storage: DiskStorage,
}
