//! Persistence for quill: entities, schema migrations and repositories.
//!
//! Repositories hold an `Arc<DatabaseConnection>` and are cheap to clone.

pub mod entities;
pub mod migrations;
pub mod repositories;
pub mod test_utils;

use std::time::Duration;

use quill_common::{AppError, AppResult, config::DatabaseConfig};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tracing::{info, log::LevelFilter};

fn db_err(e: impl std::fmt::Display) -> AppError {
    AppError::Database(e.to_string())
}

/// Open the connection pool and check that the server answers.
pub async fn init(config: &DatabaseConfig) -> AppResult<DatabaseConnection> {
    let mut opt = ConnectOptions::new(&config.url);
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .sqlx_logging(true)
        .sqlx_logging_level(LevelFilter::Trace);

    let db = Database::connect(opt).await.map_err(db_err)?;
    db.ping().await.map_err(db_err)?;

    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Database pool ready"
    );
    Ok(db)
}

/// Apply every pending migration.
pub async fn migrate(db: &DatabaseConnection) -> AppResult<()> {
    let pending = migrations::Migrator::get_pending_migrations(db)
        .await
        .map_err(db_err)?;

    if pending.is_empty() {
        info!("Schema is up to date");
        return Ok(());
    }

    info!(count = pending.len(), "Applying migrations");
    migrations::Migrator::up(db, None).await.map_err(db_err)
}
