//! Error response DTOs.

use serde::Serialize;
use utoipa::ToSchema;

/// Standard error response format.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[schema(example = json!({
    "code": "COOLDOWN_ACTIVE",
    "message": "A reminder was sent to this number recently, try again later",
    "details": {"retryAfterSecs": 1800},
    "request_id": "3f2b8c3e-2f41-4d4b-9a57-4a1f0f6c1e7a"
}))]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorResponse {
    /// Creates a new error response with code and message.
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            details: None,
            request_id: None,
        }
    }

    /// Field-level validation failure
    pub fn validation_error(field: &str, reason: &str) -> Self {
        Self::new("VALIDATION_ERROR", reason).with_details(serde_json::json!({ "field": field }))
    }

    /// Adds details to the error response.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Adds request ID to the error response for correlation.
    pub fn with_request_id(mut self, request_id: &str) -> Self {
        self.request_id = Some(request_id.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_fields_are_omitted() {
        let json = serde_json::to_value(ErrorResponse::new("BAD_REQUEST", "nope")).unwrap();
        assert_eq!(json, serde_json::json!({"code": "BAD_REQUEST", "message": "nope"}));
    }

    #[test]
    fn test_validation_error_names_field() {
        let response = ErrorResponse::validation_error("recipientPhone", "phone number is required")
            .with_request_id("req-1");
        let json = serde_json::to_value(response).unwrap();
        assert_eq!(json["details"]["field"], "recipientPhone");
        assert_eq!(json["request_id"], "req-1");
    }
}
