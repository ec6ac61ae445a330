use crate::config::Config;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;

pub type DbPool = DatabaseConnection;

/// Connect to the configured database and make sure every table exists.
pub async fn create_pool(config: &Config) -> Result<DbPool, anyhow::Error> {
    let mut options = ConnectOptions::new(config.database_url());
    options
        .max_connections(config.database.max_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    super::create_schema(&db).await?;
    Ok(db)
}

/// A private in-memory SQLite database with the schema applied.
///
/// Every connection to `sqlite::memory:` opens a fresh database, so the pool is
/// pinned to a single connection that is never recycled.
pub async fn create_memory_pool() -> Result<DbPool, anyhow::Error> {
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(Duration::from_secs(24 * 60 * 60))
        .max_lifetime(Duration::from_secs(24 * 60 * 60))
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    super::create_schema(&db).await?;
    Ok(db)
}
