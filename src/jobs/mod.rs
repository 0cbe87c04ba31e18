//! Scheduled maintenance jobs.

pub mod error;
pub mod scheduler;
pub mod tasks;

pub use error::{JobError, JobResult};
pub use scheduler::JobScheduler;
pub use tasks::QuotaCleanupTask;
