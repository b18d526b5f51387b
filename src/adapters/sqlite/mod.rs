//! SQLite database adapters for the reasoning bank.

pub mod connection;
pub mod hyperedge_repository;
pub mod migrations;
pub mod trajectory_repository;

pub use connection::{create_pool, create_test_pool, database_url, ConnectionError, PoolConfig};
pub use hyperedge_repository::SqliteHyperedgeRepository;
pub use migrations::{all_embedded_migrations, Migration, MigrationError, Migrator};
pub use trajectory_repository::SqliteTrajectoryRepository;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::DatabaseConfig;

/// Parse a UUID string from a SQLite row field.
pub fn parse_uuid(s: &str) -> DomainResult<Uuid> {
    Uuid::parse_str(s).map_err(|e| DomainError::SerializationError(e.to_string()))
}

/// Parse an RFC3339 datetime string from a SQLite row field.
pub fn parse_datetime(s: &str) -> DomainResult<DateTime<Utc>> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map_err(|e| DomainError::SerializationError(e.to_string()))
        .map(|dt| dt.with_timezone(&Utc))
}

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),
    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),
    #[error("Query error: {0}")]
    Query(#[from] sqlx::Error),
}

pub async fn initialize_database(
    database_url: &str,
    config: Option<PoolConfig>,
) -> Result<SqlitePool, DatabaseError> {
    let pool = create_pool(database_url, config).await?;
    let migrator = Migrator::new(pool.clone());
    let applied = migrator.run_embedded_migrations(all_embedded_migrations()).await?;
    tracing::info!(database_url, applied, "database initialized");
    Ok(pool)
}

/// Open and migrate the database described by the configuration.
pub async fn initialize_from_config(config: &DatabaseConfig) -> Result<SqlitePool, DatabaseError> {
    initialize_database(&database_url(&config.path), Some(PoolConfig::from(config))).await
}

/// Create an in-memory test pool with all migrations applied.
pub async fn create_migrated_test_pool() -> Result<SqlitePool, DatabaseError> {
    let pool = create_test_pool().await?;
    let migrator = Migrator::new(pool.clone());
    migrator.run_embedded_migrations(all_embedded_migrations()).await?;
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_helpers() {
        let id = Uuid::new_v4();
        assert_eq!(parse_uuid(&id.to_string()).unwrap(), id);
        assert!(matches!(parse_uuid("nope"), Err(DomainError::SerializationError(_))));

        let ts = parse_datetime("2026-03-01T12:30:00+02:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2026-03-01T10:30:00+00:00");
        assert!(parse_datetime("yesterday").is_err());
    }

    #[tokio::test]
    async fn test_initialize_from_config_is_rerunnable() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            path: dir.path().join("bank.db").to_string_lossy().into_owned(),
            max_connections: 2,
        };

        let pool = initialize_from_config(&config).await.unwrap();
        pool.close().await;

        let pool = initialize_from_config(&config).await.unwrap();
        let version = Migrator::new(pool.clone()).get_current_version().await.unwrap();
        assert_eq!(version, 1);
        pool.close().await;
    }
}
