//! Blocking migration runner over a dedicated sync connection.
//!
//! Used by the `migrate` command and by `database.auto_migrate` at startup;
//! callers run these inside `spawn_blocking`.

use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::MigrationHarness;

use super::MIGRATIONS;
use crate::error::{AppError, AppResult};
use crate::quota::QuotaStoreError;

fn connect(database_url: &str) -> Result<PgConnection, QuotaStoreError> {
    PgConnection::establish(database_url).map_err(|e| QuotaStoreError::Connection(e.to_string()))
}

fn migration_error(operation: &str, e: impl std::fmt::Display) -> QuotaStoreError {
    QuotaStoreError::Operation(format!("{}: {}", operation, e))
}

/// Names of migrations not yet applied
pub fn pending_migrations(database_url: &str) -> Result<Vec<String>, QuotaStoreError> {
    let mut conn = connect(database_url)?;
    let pending = conn
        .pending_migrations(MIGRATIONS)
        .map_err(|e| migration_error("check pending migrations", e))?;
    Ok(pending.iter().map(|m| m.name().to_string()).collect())
}

/// Apply everything pending, returning the applied versions
pub fn run_pending_migrations(database_url: &str) -> Result<Vec<String>, QuotaStoreError> {
    let mut conn = connect(database_url)?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| migration_error("run pending migrations", e))?;
    Ok(applied.iter().map(|m| m.to_string()).collect())
}

/// Revert the last `steps` migrations; fails without reverting anything
/// when fewer are applied.
pub fn revert_migrations(database_url: &str, steps: u32) -> Result<Vec<String>, QuotaStoreError> {
    let mut conn = connect(database_url)?;
    let applied = conn
        .applied_migrations()
        .map_err(|e| migration_error("get applied migrations", e))?;

    if applied.len() < steps as usize {
        return Err(QuotaStoreError::Operation(format!(
            "cannot roll back {} migrations, only {} applied",
            steps,
            applied.len()
        )));
    }

    let mut reverted = Vec::with_capacity(steps as usize);
    for _ in 0..steps {
        let version = conn
            .revert_last_migration(MIGRATIONS)
            .map_err(|e| migration_error("revert migration", e))?;
        reverted.push(version.to_string());
    }
    Ok(reverted)
}

/// Run one of the functions above off the async runtime
pub async fn blocking<T, F>(f: F) -> AppResult<T>
where
    F: FnOnce() -> Result<T, QuotaStoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal {
            source: anyhow::Error::from(e),
        })?
        .map_err(AppError::from)
}
