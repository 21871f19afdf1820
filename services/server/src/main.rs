use anyhow::Result;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

mod config;
mod error;
mod middleware;
mod models;
mod repositories;
mod routes;
mod session;
mod state;
mod storage;
mod validation;

use common::database::{DatabaseConfig, init_pool, init_schema};

use crate::config::ServerConfig;
use crate::repositories::{PhotoRepository, SessionRepository, UserRepository};
use crate::state::AppState;
use crate::storage::DiskStorage;

/// How often expired sessions are reaped
const SESSION_SWEEP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting Underneath Media backend");

    let config = ServerConfig::from_env();

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if common::database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    init_schema(&pool).await?;
    info!("Database tables initialized successfully");

    // Open the uploads directory
    let storage = DiskStorage::init(config.uploads_dir.clone()).await?;

    let user_repository = UserRepository::new(pool.clone());
    let session_repository = SessionRepository::new(pool.clone());
    let photo_repository = PhotoRepository::new(pool.clone());

    // Periodically reap expired sessions
    let sweeper = session_repository.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            match sweeper.delete_expired().await {
                Ok(0) => {}
                Ok(reaped) => info!("Reaped {} expired sessions", reaped),
                Err(e) => warn!("Session sweep failed: {}", e),
            }
        }
    });

    let port = config.port;
    let app_state = AppState {
        db_pool: pool,
        config,
        user_repository,
        session_repository,
        photo_repository,
        storage,
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Server listening on 0.0.0.0:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}
