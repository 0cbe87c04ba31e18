//! Health check DTOs for API responses.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

/// Health check response structure.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "status": "healthy",
    "version": "0.1.0",
    "timestamp": "2026-03-14T12:00:00Z",
    "checks": {
        "quota_store": {
            "status": "healthy",
            "message": "memory",
            "response_time_ms": 0
        },
        "sms_provider": {
            "status": "degraded",
            "message": "Not configured, only simulated sends are possible"
        }
    }
}))]
pub struct HealthResponse {
    pub status: HealthStatus,
    #[schema(example = "0.1.0")]
    pub version: String,
    /// RFC 3339 timestamp of the check
    #[schema(value_type = String, format = DateTime)]
    pub timestamp: String,
    pub checks: HashMap<String, ComponentHealth>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// All systems operational
    Healthy,
    /// Serving, with reduced capability
    Degraded,
    /// Critical dependency down
    Unhealthy,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ComponentHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
}

impl HealthStatus {
    /// The worse of two statuses
    pub fn combine(self, other: HealthStatus) -> HealthStatus {
        match (self, other) {
            (HealthStatus::Unhealthy, _) | (_, HealthStatus::Unhealthy) => HealthStatus::Unhealthy,
            (HealthStatus::Degraded, _) | (_, HealthStatus::Degraded) => HealthStatus::Degraded,
            _ => HealthStatus::Healthy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_serialization() {
        let json = serde_json::to_string(&HealthStatus::Healthy).unwrap();
        assert_eq!(json, "\"healthy\"");
    }

    #[test]
    fn test_combine_keeps_worst() {
        use HealthStatus::*;
        assert_eq!(Healthy.combine(Healthy), Healthy);
        assert_eq!(Healthy.combine(Degraded), Degraded);
        assert_eq!(Degraded.combine(Unhealthy), Unhealthy);
        assert_eq!(Unhealthy.combine(Healthy), Unhealthy);
    }
}
