//! Send command handler
//!
//! Runs one request through the same gateway the HTTP server uses.

use crate::config::settings::Settings;
use crate::error::{AppError, AppResult};
use crate::services::{DispatchResult, NotificationRequest, build_gateway};

pub struct SendCommandHandler {
    config: Settings,
}

impl SendCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    pub async fn execute(&self, request: NotificationRequest) -> AppResult<DispatchResult> {
        let gateway = build_gateway(&self.config).await?;
        let result = gateway.submit(&request).await?;

        let rendered = serde_json::to_string_pretty(&result).map_err(|e| AppError::Internal {
            source: anyhow::Error::from(e),
        })?;
        println!("{}", rendered);
        Ok(result)
    }
}
