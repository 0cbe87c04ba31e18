//! Data Transfer Objects for API requests and responses.

mod error;
mod health;
mod notification;

pub use error::ErrorResponse;
pub use health::{ComponentHealth, HealthResponse, HealthStatus};
pub use notification::{DispatchRequest, QuotaQuery};
