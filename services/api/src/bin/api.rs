//! services/api/src/bin/api.rs

use api_lib::{
    adapters::db::DbAdapter,
    config::Config,
    error::ApiError,
    telemetry,
    web::{self, state::AppState},
};
use rango_core::memory::InMemoryDatabase;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    telemetry::init(config.log_level);
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Storage ---
    let app_state = match config.database_url.as_deref() {
        Some(database_url) => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(database_url)
                .await?;
            let db_adapter = Arc::new(DbAdapter::new(db_pool));
            info!("Running database migrations...");
            db_adapter.run_migrations().await?;
            info!("Database migrations complete.");
            AppState::with_backend(db_adapter, config.clone())
        }
        None => {
            warn!("DATABASE_URL is not set; categories, pages and sessions are kept in memory");
            AppState::with_backend(Arc::new(InMemoryDatabase::new()), config.clone())
        }
    };

    // --- 3. Sweep Expired Sessions in the Background ---
    web::session::spawn_session_purger(
        app_state.sessions.clone(),
        config.session_purge_interval,
    );

    // --- 4. Create the Web Router ---
    let app = web::router(Arc::new(app_state));

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
