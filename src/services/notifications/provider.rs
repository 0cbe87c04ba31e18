//! Core SMS provider trait and types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Outbound text message; `to` is an already normalized E.164 number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsMessage {
    pub to: String,
    pub body: String,
}

/// What the provider hands back for an accepted message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderReceipt {
    pub message_id: String,
    /// Provider-side delivery state at acceptance (e.g. "queued")
    pub status: Option<String>,
}

/// Provider failures. Details are for logs only and never reach API clients.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider request failed: {0}")]
    Transport(String),

    #[error("Provider rejected the message (HTTP {status}): {message}")]
    Rejected {
        status: u16,
        code: Option<i64>,
        message: String,
    },

    #[error("Unexpected provider response: {0}")]
    InvalidResponse(String),
}

/// Trait for SMS providers.
///
/// Uses `async_trait` so the gateway can hold an `Arc<dyn SmsProvider>`.
///
/// # Example Implementation
/// ```ignore
/// #[async_trait]
/// impl SmsProvider for LoggingProvider {
///     async fn send(&self, message: &SmsMessage) -> Result<ProviderReceipt, ProviderError> {
///         tracing::info!(body = %message.body, "would send");
///         Ok(ProviderReceipt { message_id: "local".into(), status: None })
///     }
///
///     fn name(&self) -> &'static str {
///         "logging"
///     }
/// }
/// ```
#[async_trait]
pub trait SmsProvider: Send + Sync {
    /// Hand one message to the provider. No retries.
    async fn send(&self, message: &SmsMessage) -> Result<ProviderReceipt, ProviderError>;

    /// Provider name for logs and responses
    fn name(&self) -> &'static str;
}
