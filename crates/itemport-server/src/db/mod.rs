//! PostgreSQL connection pool and migrations

use itemport_ingest::MemoryItemSink;
use sqlx::migrate::MigrateError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, DatabaseConfig, StoreBackend};
use crate::error::AppResult;
use crate::features::ItemSink;

pub mod items;

pub use items::PgItemSink;

pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .connect(&config.url)
        .await?;

    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Database connection pool established"
    );

    Ok(pool)
}

/// Open the item store selected by `ITEMPORT_STORE`
///
/// The PostgreSQL store is migrated before it is handed out.
pub async fn connect_item_store(config: &Config) -> AppResult<Arc<ItemSink>> {
    let policy = config.import.conflict_policy;

    match config.store {
        StoreBackend::Postgres => {
            let pool = create_pool(&config.database).await?;
            run_migrations(&pool).await?;
            tracing::info!(%policy, "Using PostgreSQL item store");
            Ok(Arc::new(PgItemSink::new(pool, policy)))
        },
        StoreBackend::Memory => {
            tracing::warn!(%policy, "Using in-memory item store; data is lost on shutdown");
            Ok(Arc::new(MemoryItemSink::new(policy)))
        },
    }
}

/// Apply the bundled migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    tracing::info!("Database migrations completed");
    Ok(())
}
