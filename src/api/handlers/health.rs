//! Health check endpoint handlers.
//!
//! `/health` reports every component, `/health/ready` gates traffic on the
//! quota store, `/health/live` never touches dependencies.

use crate::api::doc::HEALTH_TAG;
use crate::api::dto::{ComponentHealth, HealthResponse, HealthStatus};
use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use jiff::Timestamp;
use std::collections::HashMap;
use std::time::Instant;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

pub fn health_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(health_check))
        .routes(routes!(readiness_check))
        .routes(routes!(liveness_check))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy or degraded", body = HealthResponse),
        (status = 503, description = "Service is unhealthy", body = HealthResponse)
    ),
    tag = HEALTH_TAG
)]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let store = check_quota_store(&state).await;
    let provider = check_provider(&state);
    let status = store.status.combine(provider.status);

    let checks = HashMap::from([
        ("quota_store".to_string(), store),
        ("sms_provider".to_string(), provider),
    ]);

    let response = HealthResponse {
        status,
        version: crate::pkg_version().to_string(),
        timestamp: Timestamp::now().to_string(),
        checks,
    };

    let code = match status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
    };
    (code, Json(response))
}

#[utoipa::path(
    get,
    path = "/health/ready",
    responses(
        (status = 200, description = "Service is ready"),
        (status = 503, description = "Quota store is not reachable")
    ),
    tag = HEALTH_TAG
)]
pub async fn readiness_check(State(state): State<AppState>) -> StatusCode {
    match check_quota_store(&state).await.status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
    }
}

#[utoipa::path(
    get,
    path = "/health/live",
    responses(
        (status = 200, description = "Service is alive")
    ),
    tag = HEALTH_TAG
)]
pub async fn liveness_check() -> StatusCode {
    StatusCode::OK
}

async fn check_quota_store(state: &AppState) -> ComponentHealth {
    let start = Instant::now();
    let store = state.gateway.store();

    match store.health_check().await {
        Ok(()) => ComponentHealth {
            status: HealthStatus::Healthy,
            message: Some(store.backend().to_string()),
            response_time_ms: Some(start.elapsed().as_millis() as u64),
        },
        Err(e) => {
            tracing::warn!(backend = store.backend(), error = %e, "Quota store health check failed");
            ComponentHealth {
                status: HealthStatus::Unhealthy,
                message: Some(format!("{} unreachable", store.backend())),
                response_time_ms: Some(start.elapsed().as_millis() as u64),
            }
        }
    }
}

/// Missing credentials only degrade the service: simulation still works.
fn check_provider(state: &AppState) -> ComponentHealth {
    match state.gateway.provider_name() {
        Some(name) => ComponentHealth {
            status: HealthStatus::Healthy,
            message: Some(name.to_string()),
            response_time_ms: None,
        },
        None => ComponentHealth {
            status: HealthStatus::Degraded,
            message: Some("Not configured, only simulated sends are possible".to_string()),
            response_time_ms: None,
        },
    }
}
