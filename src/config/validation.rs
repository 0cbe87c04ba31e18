//! Configuration validation logic

use jiff::tz::TimeZone;

use crate::config::error::ConfigError;
use crate::config::settings::{
    DatabaseConfig, LoggerSettings, PhoneConfig, QuotaBackend, QuotaConfig, ServerConfig,
    Settings, TwilioConfig, non_blank,
};

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

/// Longest number E.164 allows, country code included
const E164_MAX_DIGITS: usize = 15;

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::validation(
                "server.port",
                "Port must be between 1 and 65535.",
            ));
        }

        if self.host.trim().is_empty() {
            return Err(ConfigError::validation("server.host", "Host cannot be empty."));
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::validation(
                "server.request_timeout",
                "Request timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl LoggerSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.level.to_lowercase().as_str()) {
            return Err(ConfigError::validation(
                "logger.level",
                format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    self.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            ));
        }

        if !VALID_LOG_FORMATS.contains(&self.file.format.to_lowercase().as_str()) {
            return Err(ConfigError::validation(
                "logger.file.format",
                format!(
                    "Invalid log format '{}'. Valid formats are: {}",
                    self.file.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            ));
        }

        if self.file.enabled && self.file.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "File path is required when file logging is enabled.",
            ));
        }

        if !self.console.enabled && !self.file.enabled {
            return Err(ConfigError::validation(
                "logger",
                "At least one output (console or file) must be enabled.",
            ));
        }

        Ok(())
    }
}

impl PhoneConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_digits < 2 {
            return Err(ConfigError::validation(
                "phone.min_digits",
                "A phone number needs at least a country code and one subscriber digit.",
            ));
        }

        if self.max_digits > E164_MAX_DIGITS {
            return Err(ConfigError::validation(
                "phone.max_digits",
                format!("E.164 numbers have at most {} digits.", E164_MAX_DIGITS),
            ));
        }

        if self.min_digits > self.max_digits {
            return Err(ConfigError::validation(
                "phone.min_digits",
                format!(
                    "Min digits ({}) cannot exceed max digits ({}).",
                    self.min_digits, self.max_digits
                ),
            ));
        }

        Ok(())
    }
}

impl QuotaConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_sends_per_day == 0 {
            return Err(ConfigError::validation(
                "quota.max_sends_per_day",
                "At least one send per day must be allowed.",
            ));
        }

        self.time_zone()?;

        if self.cleanup_enabled && self.cleanup_cron.split_whitespace().count() != 6 {
            return Err(ConfigError::validation(
                "quota.cleanup_cron",
                format!(
                    "Expected a six-field cron expression (sec min hour day month weekday), got '{}'",
                    self.cleanup_cron
                ),
            ));
        }

        if self.backend == QuotaBackend::Redis {
            if !self.redis.url.starts_with("redis://") && !self.redis.url.starts_with("rediss://")
            {
                return Err(ConfigError::validation(
                    "quota.redis.url",
                    "Redis URL must start with redis:// or rediss://",
                ));
            }
            if self.redis.pool_size == 0 {
                return Err(ConfigError::validation(
                    "quota.redis.pool_size",
                    "Pool size must be greater than 0.",
                ));
            }
        }

        Ok(())
    }

    /// Resolve the configured zone; `UTC` never touches the tz database.
    pub fn time_zone(&self) -> Result<TimeZone, ConfigError> {
        if self.timezone.eq_ignore_ascii_case("utc") {
            return Ok(TimeZone::UTC);
        }
        TimeZone::get(&self.timezone).map_err(|e| {
            ConfigError::validation(
                "quota.timezone",
                format!("Unknown time zone '{}': {}", self.timezone, e),
            )
        })
    }
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.is_empty() {
            return Err(ConfigError::validation(
                "database.url",
                "Database URL is required for the postgres quota backend.",
            ));
        }

        if !self.url.starts_with("postgres://") && !self.url.starts_with("postgresql://") {
            return Err(ConfigError::validation(
                "database.url",
                "Expected format: postgres://[user:password@]host[:port]/database",
            ));
        }

        if self.max_connections == 0 {
            return Err(ConfigError::validation(
                "database.max_connections",
                "Max connections must be greater than 0.",
            ));
        }

        if self.min_connections > self.max_connections {
            return Err(ConfigError::validation(
                "database.min_connections",
                format!(
                    "Min connections ({}) cannot exceed max connections ({}).",
                    self.min_connections, self.max_connections
                ),
            ));
        }

        Ok(())
    }
}

impl TwilioConfig {
    /// Partial credentials are an error; no credentials at all is allowed
    /// and leaves the gateway able to simulate only.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let has_sid = non_blank(&self.account_sid);
        let has_token = non_blank(&self.auth_token);

        if has_sid != has_token {
            return Err(ConfigError::validation(
                "twilio",
                "TWILIO_ACCOUNT_SID and TWILIO_AUTH_TOKEN must be set together.",
            ));
        }

        if self.is_configured() && !self.has_sender() {
            return Err(ConfigError::validation(
                "twilio",
                "Either TWILIO_PHONE_NUMBER or TWILIO_MESSAGING_SERVICE_SID must be set.",
            ));
        }

        if !self.api_base_url.starts_with("https://") && !self.api_base_url.starts_with("http://")
        {
            return Err(ConfigError::validation(
                "twilio.api_base_url",
                "API base URL must use http or https.",
            ));
        }

        if self.timeout_seconds == 0 {
            return Err(ConfigError::validation(
                "twilio.timeout_seconds",
                "Provider timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.logger.validate()?;
        self.phone.validate()?;
        self.quota.validate()?;
        self.twilio.validate()?;

        if self.quota.backend == QuotaBackend::Postgres {
            self.database.validate()?;
        }

        Ok(())
    }
}
