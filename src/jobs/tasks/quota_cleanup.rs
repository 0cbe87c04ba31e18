use std::sync::Arc;

use jiff::Timestamp;

use crate::jobs::error::JobResult;
use crate::quota::{QuotaPolicy, QuotaStore};

/// Deletes quota records from earlier days whose cooldown has elapsed.
#[derive(Clone)]
pub struct QuotaCleanupTask {
    store: Arc<dyn QuotaStore>,
    policy: QuotaPolicy,
}

impl QuotaCleanupTask {
    pub fn new(store: Arc<dyn QuotaStore>, policy: QuotaPolicy) -> Self {
        Self { store, policy }
    }

    pub fn task_type() -> &'static str {
        "quota_cleanup"
    }

    pub async fn execute(&self) -> JobResult<u64> {
        self.execute_at(Timestamp::now()).await
    }

    pub async fn execute_at(&self, now: Timestamp) -> JobResult<u64> {
        let deleted = self.store.purge_stale(now, &self.policy).await?;

        tracing::info!(
            task = Self::task_type(),
            backend = self.store.backend(),
            deleted_count = deleted,
            "Quota cleanup completed"
        );
        Ok(deleted)
    }
}
