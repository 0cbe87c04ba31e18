//! Async database connection pool implementation.
//!
//! Uses bb8 connection pool manager with diesel_async for PostgreSQL connections.

use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::Pool;
use diesel_migrations::{EmbeddedMigrations, embed_migrations};

use crate::config::DatabaseConfig;
use crate::quota::QuotaStoreError;

/// Async connection pool type alias.
///
/// bb8::Pool internally uses Arc, so Clone is cheap.
pub type AsyncDbPool = Pool<AsyncPgConnection>;

/// Migrations compiled into the binary, applied by `migrate` or `auto_migrate`
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Creates an async database connection pool from `[database]` settings.
///
/// # Example
///
/// ```ignore
/// let pool = establish_async_connection_pool(&settings.database).await?;
/// let mut conn = pool.get().await?;
/// ```
pub async fn establish_async_connection_pool(
    config: &DatabaseConfig,
) -> Result<AsyncDbPool, QuotaStoreError> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.url.as_str());
    Pool::builder()
        .max_size(config.max_connections)
        .min_idle(Some(config.min_connections))
        .connection_timeout(Duration::from_secs(config.connection_timeout))
        .build(manager)
        .await
        .map_err(|e| QuotaStoreError::Connection(e.to_string()))
}
