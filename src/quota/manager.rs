//! Builds the configured quota store.

use std::sync::Arc;

use crate::config::{QuotaBackend, Settings};
use crate::db::establish_async_connection_pool;
use crate::quota::memory::MemoryQuotaStore;
use crate::quota::postgres::PostgresQuotaStore;
use crate::quota::redis::RedisQuotaStore;
use crate::quota::{QuotaStore, QuotaStoreError};

/// Connect the backend named by `quota.backend`.
pub async fn build_quota_store(settings: &Settings) -> Result<Arc<dyn QuotaStore>, QuotaStoreError> {
    let store: Arc<dyn QuotaStore> = match settings.quota.backend {
        QuotaBackend::Memory => {
            tracing::warn!(
                "Using in-memory quota store; counters are lost on restart and not shared between instances"
            );
            Arc::new(MemoryQuotaStore::new())
        }
        QuotaBackend::Redis => Arc::new(RedisQuotaStore::new(&settings.quota.redis).await?),
        QuotaBackend::Postgres => {
            let pool = establish_async_connection_pool(&settings.database).await?;
            Arc::new(PostgresQuotaStore::new(pool))
        }
    };

    tracing::info!(backend = store.backend(), "Quota store ready");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_backend_is_default() {
        let store = build_quota_store(&Settings::default()).await.unwrap();
        assert_eq!(store.backend(), "memory");
        assert!(store.health_check().await.is_ok());
    }
}
