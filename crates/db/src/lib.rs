//! PostgreSQL persistence for Keystone.
//!
//! This crate provides:
//! - `SeaORM` entity definitions for the prioritization and budget tables
//! - Database migrations
//! - [`PgStore`], which implements every repository trait of `keystone-core`

pub mod entities;
pub mod migration;

mod convert;
mod store;

pub use store::PgStore;

use std::time::Duration;

use keystone_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tracing::info;

/// Opens a connection pool.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    info!(max_connections = config.max_connections, "Database pool ready");
    Ok(db)
}
