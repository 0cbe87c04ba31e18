//! Error handler for converting AppError to HTTP responses.
//!
//! `IntoResponse for AppError` picks the status and a client-safe body.
//! [`global_error_handler`] then stamps the request id on every error body
//! and turns bare framework errors (404, 405, ...) into the same format.

use axum::{
    Json,
    body::to_bytes,
    extract::Request,
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::RequestId;
use crate::api::dto::ErrorResponse;
use crate::error::AppError;

const MAX_FALLBACK_BODY: usize = 64 * 1024;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = error_to_status_code(&self);
        log_error(&self, status);

        let body = error_body(&self);
        let mut response = (status, Json(body.clone())).into_response();

        if let Some(secs) = self.retry_after_secs()
            && let Ok(value) = HeaderValue::from_str(&secs.to_string())
        {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
        response.extensions_mut().insert(body);
        response
    }
}

fn log_error(error: &AppError, status: StatusCode) {
    if status.is_server_error() {
        tracing::error!(status = status.as_u16(), error = ?error, "Request failed");
    } else {
        tracing::info!(status = status.as_u16(), error = %error, "Request rejected");
    }
}

/// Client-facing body; never includes provider or store internals.
fn error_body(error: &AppError) -> ErrorResponse {
    match error {
        AppError::Validation { field, reason } => ErrorResponse::validation_error(field, reason),
        AppError::BadRequest { message } => ErrorResponse::new("BAD_REQUEST", message),
        AppError::RateLimitExceeded { retry_after_secs } => ErrorResponse::new(
            "RATE_LIMIT_EXCEEDED",
            "Daily message limit reached for this number, try again tomorrow",
        )
        .with_details(json!({ "retryAfterSecs": retry_after_secs })),
        AppError::CooldownActive { retry_after_secs } => ErrorResponse::new(
            "COOLDOWN_ACTIVE",
            "A reminder was sent to this number recently, try again later",
        )
        .with_details(json!({ "retryAfterSecs": retry_after_secs })),
        AppError::Provider { .. } => {
            ErrorResponse::new("PROVIDER_ERROR", "Failed to send notification")
        }
        AppError::QuotaStore { .. } => ErrorResponse::new(
            "SERVICE_UNAVAILABLE",
            "Quota store unavailable, try again later",
        ),
        AppError::Configuration { key, .. } => ErrorResponse::new(
            "CONFIGURATION_ERROR",
            "Service is not configured for this operation",
        )
        .with_details(json!({ "key": key })),
        AppError::Internal { .. } => {
            ErrorResponse::new("INTERNAL_ERROR", "An internal error occurred")
        }
    }
}

/// Maps an AppError variant to its corresponding HTTP status code.
pub fn error_to_status_code(error: &AppError) -> StatusCode {
    match error {
        AppError::Validation { .. } | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        AppError::RateLimitExceeded { .. } | AppError::CooldownActive { .. } => {
            StatusCode::TOO_MANY_REQUESTS
        }
        AppError::Provider { .. } => StatusCode::BAD_GATEWAY,
        AppError::QuotaStore { .. } => StatusCode::SERVICE_UNAVAILABLE,
        AppError::Configuration { .. } | AppError::Internal { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Normalizes every 4xx/5xx response to [`ErrorResponse`] with a request id.
pub async fn global_error_handler(request: Request, next: Next) -> Response {
    let request_id = request.extensions().get::<RequestId>().map(|r| r.0.clone());
    let response = next.run(request).await;

    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let error = match parts.extensions.remove::<ErrorResponse>() {
        Some(error) => error,
        None => {
            let is_json = parts
                .headers
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.contains("application/json"));
            if is_json {
                return Response::from_parts(parts, body);
            }
            let bytes = to_bytes(body, MAX_FALLBACK_BODY).await.unwrap_or_default();
            fallback_error(status, String::from_utf8_lossy(&bytes).trim())
        }
    };

    let error = match request_id {
        Some(id) => error.with_request_id(&id),
        None => error,
    };

    let mut rebuilt = (status, Json(error)).into_response();
    for (name, value) in parts.headers.iter() {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            rebuilt.headers_mut().insert(name.clone(), value.clone());
        }
    }
    rebuilt
}

fn fallback_error(status: StatusCode, original: &str) -> ErrorResponse {
    let (code, default_message) = match status {
        StatusCode::BAD_REQUEST => ("BAD_REQUEST", "Bad request"),
        StatusCode::NOT_FOUND => ("NOT_FOUND", "The requested resource was not found"),
        StatusCode::METHOD_NOT_ALLOWED => {
            ("METHOD_NOT_ALLOWED", "HTTP method not allowed for this endpoint")
        }
        StatusCode::UNSUPPORTED_MEDIA_TYPE => ("UNSUPPORTED_MEDIA_TYPE", "Unsupported media type"),
        StatusCode::REQUEST_TIMEOUT => ("REQUEST_TIMEOUT", "Request timed out"),
        StatusCode::PAYLOAD_TOO_LARGE => ("PAYLOAD_TOO_LARGE", "Request payload too large"),
        s if s.is_server_error() => ("INTERNAL_ERROR", "An internal error occurred"),
        _ => ("UNKNOWN_ERROR", "Request failed"),
    };

    // Framework 4xx bodies are safe to echo; 5xx bodies are not.
    let message = if original.is_empty() || status.is_server_error() {
        default_message
    } else {
        original
    };
    ErrorResponse::new(code, message)
}
