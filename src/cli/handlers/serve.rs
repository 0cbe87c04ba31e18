//! Serve command handler

use crate::config::settings::Settings;
use crate::error::AppResult;
use crate::server::Server;
use crate::services::notifications::TwilioProvider;

pub struct ServeCommandHandler {
    config: Settings,
}

impl ServeCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Run the server, or only validate configuration when `dry_run` is set.
    pub async fn execute(&self, dry_run: bool, simulate_only: bool) -> AppResult<()> {
        if dry_run {
            return self.validate_only();
        }
        Server::new(self.config.clone(), simulate_only).run().await
    }

    /// Validate configuration without starting the server
    pub fn validate_only(&self) -> AppResult<()> {
        self.config.validate()?;
        let policy = crate::quota::QuotaPolicy::from_config(&self.config.quota)?;

        println!("✓ Configuration is valid");
        println!("✓ Server would bind to: {}", self.config.server.address());
        println!(
            "✓ Quota: {} sends/day, {} min cooldown, {} backend",
            policy.max_sends_per_day(),
            self.config.quota.cooldown_minutes,
            self.config.quota.backend.as_str()
        );

        let provider_ready = TwilioProvider::from_config(&self.config.twilio)
            .map(|p| p.is_some())
            .unwrap_or(false);
        if provider_ready {
            println!("✓ Twilio provider configured");
        } else {
            println!("! Twilio provider not configured, only simulated sends will succeed");
        }

        println!("Dry run completed successfully");
        Ok(())
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}
