//! Service layer for business logic operations.

pub mod notifications;

pub use notifications::{DispatchGateway, DispatchResult, NotificationRequest, QuotaStatus};

use crate::config::Settings;
use crate::error::{AppError, AppResult};
use crate::phone::PhoneValidator;
use crate::quota::{QuotaPolicy, build_quota_store};

/// Wire the gateway from settings: phone policy, quota store and provider.
pub async fn build_gateway(settings: &Settings) -> AppResult<DispatchGateway> {
    let validator = PhoneValidator::new(&settings.phone);
    let policy = QuotaPolicy::from_config(&settings.quota)?;
    let store = build_quota_store(settings).await?;
    let provider = notifications::build_provider(&settings.twilio).map_err(|e| {
        AppError::Configuration {
            key: "twilio".to_string(),
            source: anyhow::Error::from(e),
        }
    })?;

    Ok(DispatchGateway::new(validator, policy, store, provider))
}
