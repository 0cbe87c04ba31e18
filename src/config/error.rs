//! Configuration error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// A single setting holds an unusable value
    #[error("Validation error: {field} - {message}")]
    ValidationError { field: String, message: String },

    #[error("Environment variable error: {0}")]
    EnvVarError(String),

    /// Two sources that cannot be combined were both requested
    #[error("Mutual exclusivity error: {0}")]
    MutualExclusivityError(String),

    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

impl ConfigError {
    pub fn validation<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        ConfigError::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn file_not_found<S: Into<String>>(path: S) -> Self {
        ConfigError::FileNotFound(path.into())
    }

    pub fn mutual_exclusivity<S: Into<String>>(message: S) -> Self {
        ConfigError::MutualExclusivityError(message.into())
    }
}
