mod quota_cleanup;

pub use quota_cleanup::QuotaCleanupTask;
