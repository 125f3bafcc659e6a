use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod extract;
mod middleware;
mod models;
mod repositories;
mod response;
mod routes;
mod services;
mod state;

use honey_common::{
    database::{health_check, init_pool},
    storage::SupabaseStorage,
};
use tokio::net::TcpListener;

use crate::{
    config::AppConfig, middleware::JwtVerifier, services::ImageService, state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting API service");

    let config = AppConfig::load()?;

    // Initialize database connection pool
    let pool = init_pool(&config.database()).await?;

    // Check database connectivity
    if health_check(&pool).await {
        info!("Database connection successful");
    } else {
        warn!("Database health check failed, continuing");
    }

    if config.run_migrations {
        info!("Running database migrations");
        sqlx::migrate!("../../migrations").run(&pool).await?;
    }

    let storage = Arc::new(SupabaseStorage::new(config.storage()));
    let images = ImageService::new(storage, config.images());
    let jwt_verifier = JwtVerifier::new(&config.jwt_secret, &config.jwt_audience);

    let app_state = AppState::new(pool, jwt_verifier, images);

    // Start the web server
    let app = routes::create_router(app_state);

    let address = config.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!("API service listening on {}", address);

    axum::serve(listener, app).await?;

    Ok(())
}
