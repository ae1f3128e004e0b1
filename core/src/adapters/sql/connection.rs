//! Database connection setup

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use crate::config::DatabaseConfig;
use crate::error::DomainError;

/// Open a pooled connection.
///
/// An in-memory SQLite database lives and dies with its connection, so the
/// pool is pinned to a single connection for those URLs.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DomainError> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .sqlx_logging(config.sql_logging);

    if config.is_sqlite_memory() {
        options.max_connections(1).min_connections(1);
    }

    let db = Database::connect(options).await?;
    tracing::info!(
        max_connections = config.max_connections,
        "Connected to database"
    );
    Ok(db)
}
