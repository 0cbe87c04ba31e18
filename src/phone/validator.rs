use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::config::PhoneConfig;
use crate::error::{AppError, AppResult};
use crate::phone::{digit_count, normalize};

/// `+`, a country code that does not start with 0, then digits
static E164_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+[1-9][0-9]*$").expect("E.164 pattern compiles"));

/// Outcome of validating one raw phone string
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub valid: bool,
    pub formatted_phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationResult {
    fn ok(formatted_phone: String) -> Self {
        Self {
            valid: true,
            formatted_phone,
            error: None,
        }
    }

    fn rejected(formatted_phone: String, error: impl Into<String>) -> Self {
        Self {
            valid: false,
            formatted_phone,
            error: Some(error.into()),
        }
    }
}

/// Applies the configured E.164 length policy to normalized numbers
#[derive(Debug, Clone)]
pub struct PhoneValidator {
    min_digits: usize,
    max_digits: usize,
}

impl PhoneValidator {
    pub fn new(config: &PhoneConfig) -> Self {
        Self {
            min_digits: config.min_digits,
            max_digits: config.max_digits,
        }
    }

    pub fn validate(&self, raw: &str) -> ValidationResult {
        let formatted = normalize(raw);

        if formatted.is_empty() {
            return ValidationResult::rejected(formatted, "phone number is required");
        }

        if !formatted.starts_with('+') {
            return ValidationResult::rejected(
                formatted,
                "phone number must include a country code starting with +",
            );
        }

        let digits = digit_count(&formatted);
        if digits < self.min_digits || digits > self.max_digits {
            return ValidationResult::rejected(
                formatted,
                format!(
                    "phone number must have between {} and {} digits",
                    self.min_digits, self.max_digits
                ),
            );
        }

        if !E164_SHAPE.is_match(&formatted) {
            return ValidationResult::rejected(formatted, "country code cannot start with 0");
        }

        ValidationResult::ok(formatted)
    }

    /// Validate and return the formatted phone, or a `Validation` error on `field`.
    pub fn require_valid(&self, field: &str, raw: &str) -> AppResult<String> {
        let result = self.validate(raw);
        match result.error {
            None => Ok(result.formatted_phone),
            Some(reason) => Err(AppError::Validation {
                field: field.to_string(),
                reason,
            }),
        }
    }
}

impl Default for PhoneValidator {
    fn default() -> Self {
        Self::new(&PhoneConfig::default())
    }
}
