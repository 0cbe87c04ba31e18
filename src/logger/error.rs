//! Error types for the logger

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A global subscriber was already installed
    #[error("Logger already initialized: {message}")]
    AlreadyInitialized { message: String },
}

impl LoggerError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn already_initialized(message: impl Into<String>) -> Self {
        Self::AlreadyInitialized {
            message: message.into(),
        }
    }
}
