use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler as TokioCronScheduler};

use crate::jobs::error::{JobError, JobResult};
use crate::jobs::tasks::QuotaCleanupTask;

/// Wrapper around tokio-cron-scheduler running the maintenance tasks
pub struct JobScheduler {
    scheduler: Arc<Mutex<TokioCronScheduler>>,
}

impl JobScheduler {
    pub async fn new() -> JobResult<Self> {
        let scheduler = TokioCronScheduler::new()
            .await
            .map_err(|e| JobError::Scheduler(e.to_string()))?;

        Ok(Self {
            scheduler: Arc::new(Mutex::new(scheduler)),
        })
    }

    /// Register the quota cleanup on a six-field cron expression (UTC)
    pub async fn schedule_quota_cleanup(
        &self,
        cron_expression: &str,
        task: QuotaCleanupTask,
    ) -> JobResult<()> {
        let cron_job = Job::new_async(cron_expression, move |_uuid, _lock| {
            let task = task.clone();
            Box::pin(async move {
                if let Err(e) = task.execute().await {
                    tracing::error!(
                        task = QuotaCleanupTask::task_type(),
                        error = %e,
                        "Job execution failed"
                    );
                }
            })
        })
        .map_err(|e| JobError::InvalidCronExpression {
            expression: cron_expression.to_string(),
            message: e.to_string(),
        })?;

        self.scheduler
            .lock()
            .await
            .add(cron_job)
            .await
            .map_err(|e| JobError::Scheduler(e.to_string()))?;

        tracing::info!(
            task = QuotaCleanupTask::task_type(),
            cron = cron_expression,
            "Job scheduled"
        );
        Ok(())
    }

    pub async fn start(&self) -> JobResult<()> {
        self.scheduler
            .lock()
            .await
            .start()
            .await
            .map_err(|e| JobError::Scheduler(e.to_string()))
    }

    /// Stop the scheduler gracefully
    pub async fn stop(&self) -> JobResult<()> {
        self.scheduler
            .lock()
            .await
            .shutdown()
            .await
            .map_err(|e| JobError::Scheduler(e.to_string()))
    }
}
