//! Database module

pub mod filters;
pub mod memory;
pub mod postgres;
pub mod queries;
pub mod store;

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::config::{Config, StoreBackend};

pub use filters::{ActivityFilter, ImportBatchFilter, LeadFilter, ReminderFilter, StatusFilter};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::{ActivityStore, ImportBatchStore, LeadStore, OverviewStore, ReminderStore, StatusStore, Store};

/// Connect the configured backend. Postgres is migrated before use.
pub async fn create_store(config: &Config) -> Result<Arc<dyn Store>> {
    match config.store_backend {
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set for the postgres backend")?;
            let pool = create_pool(database_url).await?;
            info!("Connected to PostgreSQL");
            run_migrations(&pool).await?;
            Ok(Arc::new(PgStore::new(pool)))
        }
        StoreBackend::Memory => {
            warn!("Using in-memory store, data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Create a database connection pool
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    Ok(pool)
}

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    info!("Running database migrations...");
    MIGRATOR.run(pool).await.context("Failed to apply migrations")?;
    info!("Database migrations complete");
    Ok(())
}
