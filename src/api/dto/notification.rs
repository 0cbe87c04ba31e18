//! Dispatch request DTOs.
//!
//! Field names follow the client's observed naming (`guyPhone`, `dryRun`,
//! ...); the neutral camelCase names are accepted as aliases.

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::services::NotificationRequest;

/// POST /api/notifications/dispatch body
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "guyName": "Sam",
    "guyPhone": "+1 (555) 123-4567",
    "periodDate": "2026-04-02",
    "cycleLength": 28,
    "spamMode": false,
    "dryRun": true
}))]
pub struct DispatchRequest {
    #[serde(default, rename = "guyName", alias = "recipientName")]
    #[validate(length(max = 100, message = "name must be at most 100 characters"))]
    pub recipient_name: String,

    /// Must carry a country code, e.g. `+15551234567`. Digit count is
    /// checked after normalization; the raw bound only guards formatting noise.
    #[serde(default, rename = "guyPhone", alias = "recipientPhone")]
    #[validate(length(max = 256, message = "phone number is too long"))]
    pub recipient_phone: String,

    #[serde(default, rename = "periodDate", alias = "scheduledDate")]
    #[validate(length(max = 64, message = "date must be at most 64 characters"))]
    pub scheduled_date: String,

    #[serde(rename = "cycleLength", alias = "intervalDays")]
    pub interval_days: i64,

    #[serde(default, rename = "spamMode", alias = "repeatMode")]
    pub repeat_mode: bool,

    #[serde(default, rename = "dryRun", alias = "simulateOnly")]
    pub simulate_only: bool,
}

impl From<DispatchRequest> for NotificationRequest {
    fn from(dto: DispatchRequest) -> Self {
        NotificationRequest {
            recipient_name: dto.recipient_name,
            recipient_phone: dto.recipient_phone,
            scheduled_date: dto.scheduled_date,
            interval_days: dto.interval_days,
            repeat_mode: dto.repeat_mode,
            simulate_only: dto.simulate_only,
        }
    }
}

/// GET /api/notifications/quota query
#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct QuotaQuery {
    /// Phone number, normalized before lookup
    #[validate(length(min = 1, max = 256, message = "phone is required"))]
    pub phone: String,
}
