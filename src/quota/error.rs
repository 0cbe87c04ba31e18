//! Quota store error types.

use thiserror::Error;

/// Errors that can occur while reading or updating quota records.
#[derive(Error, Debug)]
pub enum QuotaStoreError {
    #[error("Quota store connection failed: {0}")]
    Connection(String),

    #[error("Quota store operation failed: {0}")]
    Operation(String),

    /// A stored record could not be decoded
    #[error("Corrupt quota record: {0}")]
    Corrupt(String),
}
