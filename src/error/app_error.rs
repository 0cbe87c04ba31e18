use axum::extract::rejection::{JsonRejection, QueryRejection};
use thiserror::Error;
use validator::ValidationErrors;

use crate::config::error::ConfigError;
use crate::quota::QuotaStoreError;
use crate::services::notifications::ProviderError;

/// Application-wide error type for the dispatch gateway.
///
/// Every terminal failure of a dispatch request maps to exactly one variant,
/// so handlers can translate it into a status code without inspecting messages.
#[derive(Error, Debug)]
pub enum AppError {
    /// Validation error with field-specific details
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Bad request error with descriptive message
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    /// The recipient already received the maximum number of messages today
    #[error("Daily send limit reached, retry after {retry_after_secs}s")]
    RateLimitExceeded { retry_after_secs: u64 },

    /// The previous message to the recipient is too recent
    #[error("Cooldown active, retry after {retry_after_secs}s")]
    CooldownActive { retry_after_secs: u64 },

    /// The external messaging provider failed to accept the message
    #[error("Messaging provider {provider} failed")]
    Provider {
        provider: String,
        #[source]
        source: ProviderError,
    },

    /// The quota store could not be reached or returned garbage
    #[error("Quota store unavailable")]
    QuotaStore {
        #[source]
        source: QuotaStoreError,
    },

    /// Configuration error with key information
    #[error("Configuration error: {key}")]
    Configuration {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// Internal error for unexpected failures
    #[error("Internal error")]
    Internal {
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    /// Seconds the caller should wait before retrying, for policy rejections.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            AppError::RateLimitExceeded { retry_after_secs }
            | AppError::CooldownActive { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal { source: error }
    }
}

impl From<QuotaStoreError> for AppError {
    fn from(error: QuotaStoreError) -> Self {
        AppError::QuotaStore { source: error }
    }
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        let key = match &error {
            ConfigError::ValidationError { field, .. } => field.clone(),
            _ => "settings".to_string(),
        };
        AppError::Configuration {
            key,
            source: anyhow::Error::from(error),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest {
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest {
            message: rejection.body_text(),
        }
    }
}

/// Reports the first failing field; fields are sorted for stable output.
impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        match fields.first() {
            Some((field, errs)) => AppError::Validation {
                field: camel_case(field),
                reason: errs
                    .first()
                    .and_then(|e| e.message.as_ref())
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "invalid value".to_string()),
            },
            None => AppError::BadRequest {
                message: errors.to_string(),
            },
        }
    }
}

/// Wire-facing name of a DTO field (`recipient_phone` -> `recipientPhone`)
fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Type alias for Result with AppError to simplify function signatures
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_after_only_for_policy_errors() {
        let limit = AppError::RateLimitExceeded {
            retry_after_secs: 120,
        };
        let cooldown = AppError::CooldownActive {
            retry_after_secs: 30,
        };
        let validation = AppError::Validation {
            field: "recipientPhone".to_string(),
            reason: "missing country code".to_string(),
        };

        assert_eq!(limit.retry_after_secs(), Some(120));
        assert_eq!(cooldown.retry_after_secs(), Some(30));
        assert_eq!(validation.retry_after_secs(), None);
    }

    #[test]
    fn test_validation_errors_use_camel_case_field_names() {
        let mut errors = ValidationErrors::new();
        errors.add(
            "scheduled_date",
            validator::ValidationError::new("length").with_message("too long".into()),
        );

        match AppError::from(errors) {
            AppError::Validation { field, reason } => {
                assert_eq!(field, "scheduledDate");
                assert_eq!(reason, "too long");
            }
            other => panic!("Expected Validation error, got {:?}", other),
        }
        assert_eq!(camel_case("phone"), "phone");
    }

    #[test]
    fn test_config_error_keeps_field_as_key() {
        let error: AppError = ConfigError::validation("twilio.auth_token", "missing").into();
        match error {
            AppError::Configuration { key, .. } => assert_eq!(key, "twilio.auth_token"),
            other => panic!("Expected Configuration error, got {:?}", other),
        }
    }
}
