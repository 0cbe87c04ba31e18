//! Outbound reminder notifications.
//!
//! [`DispatchGateway`] runs the validate/quota/send pipeline. Providers sit
//! behind the [`SmsProvider`] trait; Twilio is the only real one.

mod gateway;
mod message;
mod provider;
mod twilio_provider;

pub use gateway::{DispatchGateway, DispatchResult, NotificationRequest, QuotaStatus};
pub use message::compose_body;
pub use provider::{ProviderError, ProviderReceipt, SmsMessage, SmsProvider};
pub use twilio_provider::TwilioProvider;

use std::sync::Arc;

use crate::config::TwilioConfig;

/// Build the configured provider, `None` when real sends are not set up.
pub fn build_provider(config: &TwilioConfig) -> Result<Option<Arc<dyn SmsProvider>>, ProviderError> {
    let provider = TwilioProvider::from_config(config)?;
    match provider {
        Some(twilio) => {
            tracing::info!(provider = "twilio", "SMS provider configured");
            Ok(Some(Arc::new(twilio)))
        }
        None => {
            tracing::warn!("Twilio credentials missing, only simulated sends will succeed");
            Ok(None)
        }
    }
}
