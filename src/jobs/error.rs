use thiserror::Error;

use crate::quota::QuotaStoreError;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Invalid cron expression '{expression}': {message}")]
    InvalidCronExpression { expression: String, message: String },

    #[error("Scheduler error: {0}")]
    Scheduler(String),

    #[error("Job execution failed: {0}")]
    ExecutionFailed(#[from] QuotaStoreError),
}

pub type JobResult<T> = Result<T, JobError>;
