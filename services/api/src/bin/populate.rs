//! services/api/src/bin/populate.rs
//!
//! Loads the demo categories and pages into the configured database.
//! Safe to run repeatedly: existing rows are updated in place.

use api_lib::{adapters::db::DbAdapter, config::Config, error::ApiError, telemetry};
use rango_core::{
    ports::SessionStore,
    seed::{fixtures, populate},
};
use sqlx::postgres::PgPoolOptions;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    let config = Config::from_env()?;
    telemetry::init(config.log_level);
    info!("Starting population script...");

    let db_pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(config.require_database_url()?)
        .await?;
    let db_adapter = DbAdapter::new(db_pool);
    db_adapter.run_migrations().await?;

    let loaded = populate(&db_adapter, &fixtures()).await?;

    for (category, pages) in &loaded {
        for page in pages {
            info!("- {} - {}", category.name, page.title);
        }
    }
    info!("Populated {} categories.", loaded.len());

    let purged = db_adapter.purge_expired_sessions().await?;
    info!("Removed {} expired sessions.", purged);

    Ok(())
}
