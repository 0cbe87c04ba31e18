//! Notification dispatch handlers.

use crate::api::doc::NOTIFICATION_TAG;
use crate::api::dto::{DispatchRequest, ErrorResponse, QuotaQuery};
use crate::error::AppResult;
use crate::services::{DispatchResult, NotificationRequest, QuotaStatus};
use crate::state::AppState;
use crate::utils::validate::{ValidatedJson, ValidatedQuery};
use axum::{Json, extract::State};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Routes:
/// - POST /dispatch - validate, rate limit and send (or simulate) a reminder
/// - GET /quota     - quota view for one phone
pub fn notification_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(dispatch))
        .routes(routes!(quota_status))
}

/// POST /api/notifications/dispatch
#[utoipa::path(
    post,
    path = "/dispatch",
    tag = NOTIFICATION_TAG,
    request_body = DispatchRequest,
    responses(
        (status = 200, description = "Sent or simulated", body = DispatchResult),
        (status = 400, description = "Invalid phone number or request body", body = ErrorResponse),
        (status = 429, description = "Daily limit or cooldown active; see Retry-After", body = ErrorResponse),
        (status = 502, description = "Messaging provider failed", body = ErrorResponse),
        (status = 503, description = "Quota store unavailable", body = ErrorResponse)
    )
)]
async fn dispatch(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<DispatchRequest>,
) -> AppResult<Json<DispatchResult>> {
    let mut request = NotificationRequest::from(payload);
    if state.simulate_only {
        request.simulate_only = true;
    }

    let result = state.gateway.submit(&request).await?;
    Ok(Json(result))
}

/// GET /api/notifications/quota?phone=...
#[utoipa::path(
    get,
    path = "/quota",
    tag = NOTIFICATION_TAG,
    params(QuotaQuery),
    responses(
        (status = 200, description = "Current quota for the phone", body = QuotaStatus),
        (status = 400, description = "Invalid phone number", body = ErrorResponse),
        (status = 503, description = "Quota store unavailable", body = ErrorResponse)
    )
)]
async fn quota_status(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<QuotaQuery>,
) -> AppResult<Json<QuotaStatus>> {
    let status = state.gateway.quota_status(&query.phone).await?;
    Ok(Json(status))
}
