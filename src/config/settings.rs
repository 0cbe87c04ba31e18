//! Configuration settings structures for tlc-gateway
//!
//! Every section deserializes with defaults, so an empty `default.toml`
//! yields a runnable development configuration (memory quota store,
//! no provider credentials).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;
use crate::logger::{ConsoleConfig, FileConfig, LogFormat, LoggerConfig};

// ============================================================================
// Default value functions
// ============================================================================

fn default_app_name() -> String {
    "tlc-gateway".to_string()
}

fn default_app_version() -> String {
    crate::pkg_version().to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_path() -> String {
    "logs/tlc-gateway.log".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_min_digits() -> usize {
    8
}

fn default_max_digits() -> usize {
    15
}

fn default_max_sends_per_day() -> u32 {
    3
}

fn default_cooldown_minutes() -> u32 {
    60
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_cleanup_cron() -> String {
    // sec min hour day month weekday
    "0 0 * * * *".to_string()
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_redis_pool_size() -> u32 {
    4
}

fn default_redis_connection_timeout() -> u64 {
    5
}

fn default_redis_key_prefix() -> String {
    "tlc".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connection_timeout() -> u64 {
    30
}

fn default_twilio_base_url() -> String {
    "https://api.twilio.com".to_string()
}

fn default_provider_timeout() -> u64 {
    15
}

// ============================================================================
// Application / Server
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    #[serde(default = "default_app_name")]
    pub name: String,

    #[serde(default = "default_app_version")]
    pub version: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            version: default_app_version(),
        }
    }
}

/// Axum HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Upper bound for a whole request, provider round-trip included (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

impl ServerConfig {
    /// Full bind address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
        }
    }
}

// ============================================================================
// Logger Settings
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_true")]
    pub colored: bool,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            colored: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_log_path")]
    pub path: String,

    #[serde(default = "default_true")]
    pub append: bool,

    /// "full", "compact" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_log_path(),
            append: true,
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub console: ConsoleSettings,

    #[serde(default)]
    pub file: FileSettings,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            console: ConsoleSettings::default(),
            file: FileSettings::default(),
        }
    }
}

impl LoggerSettings {
    /// Convert the file representation into the runtime [`LoggerConfig`]
    pub fn into_logger_config(self) -> Result<LoggerConfig, ConfigError> {
        let format = self
            .file
            .format
            .parse::<LogFormat>()
            .map_err(|e| ConfigError::validation("logger.file.format", e.to_string()))?;

        let config = LoggerConfig {
            level: self.level,
            console: ConsoleConfig {
                enabled: self.console.enabled,
                colored: self.console.colored,
            },
            file: FileConfig {
                enabled: self.file.enabled,
                path: PathBuf::from(self.file.path),
                append: self.file.append,
                format,
            },
        };
        config
            .validate()
            .map_err(|e| ConfigError::validation("logger", e.to_string()))?;
        Ok(config)
    }
}

// ============================================================================
// Phone Policy
// ============================================================================

/// E.164 length policy applied after normalization.
///
/// Counts digits only (the leading `+` is not counted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneConfig {
    #[serde(default = "default_min_digits")]
    pub min_digits: usize,

    #[serde(default = "default_max_digits")]
    pub max_digits: usize,
}

impl Default for PhoneConfig {
    fn default() -> Self {
        Self {
            min_digits: default_min_digits(),
            max_digits: default_max_digits(),
        }
    }
}

// ============================================================================
// Quota Configuration
// ============================================================================

/// Where per-recipient send counters live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QuotaBackend {
    #[default]
    Memory,
    Redis,
    Postgres,
}

impl QuotaBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuotaBackend::Memory => "memory",
            QuotaBackend::Redis => "redis",
            QuotaBackend::Postgres => "postgres",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedisQuotaConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,

    #[serde(default = "default_redis_pool_size")]
    pub pool_size: u32,

    /// Seconds
    #[serde(default = "default_redis_connection_timeout")]
    pub connection_timeout: u64,

    #[serde(default = "default_redis_key_prefix")]
    pub key_prefix: String,
}

impl Default for RedisQuotaConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            pool_size: default_redis_pool_size(),
            connection_timeout: default_redis_connection_timeout(),
            key_prefix: default_redis_key_prefix(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaConfig {
    #[serde(default)]
    pub backend: QuotaBackend,

    #[serde(default = "default_max_sends_per_day")]
    pub max_sends_per_day: u32,

    #[serde(default = "default_cooldown_minutes")]
    pub cooldown_minutes: u32,

    /// IANA zone whose midnight resets the daily counter
    #[serde(default = "default_timezone")]
    pub timezone: String,

    #[serde(default = "default_true")]
    pub cleanup_enabled: bool,

    /// Six-field cron expression for the stale record purge
    #[serde(default = "default_cleanup_cron")]
    pub cleanup_cron: String,

    #[serde(default)]
    pub redis: RedisQuotaConfig,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            backend: QuotaBackend::default(),
            max_sends_per_day: default_max_sends_per_day(),
            cooldown_minutes: default_cooldown_minutes(),
            timezone: default_timezone(),
            cleanup_enabled: true,
            cleanup_cron: default_cleanup_cron(),
            redis: RedisQuotaConfig::default(),
        }
    }
}

// ============================================================================
// Database Configuration
// ============================================================================

/// PostgreSQL pool configuration, used by the `postgres` quota backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,

    /// Run pending migrations when the server starts
    #[serde(default)]
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connection_timeout: default_connection_timeout(),
            auto_migrate: false,
        }
    }
}

// ============================================================================
// Twilio Configuration
// ============================================================================

/// Twilio credentials and sender identity.
///
/// Real sends need `account_sid`, `auth_token` and at least one of
/// `phone_number` / `messaging_service_sid`. Simulated sends need nothing.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwilioConfig {
    #[serde(default)]
    pub account_sid: Option<String>,

    #[serde(default)]
    pub auth_token: Option<String>,

    #[serde(default)]
    pub phone_number: Option<String>,

    #[serde(default)]
    pub messaging_service_sid: Option<String>,

    #[serde(default = "default_twilio_base_url")]
    pub api_base_url: String,

    /// Seconds
    #[serde(default = "default_provider_timeout")]
    pub timeout_seconds: u64,
}

impl TwilioConfig {
    pub const ACCOUNT_SID_ENV: &'static str = "TWILIO_ACCOUNT_SID";
    pub const AUTH_TOKEN_ENV: &'static str = "TWILIO_AUTH_TOKEN";
    pub const PHONE_NUMBER_ENV: &'static str = "TWILIO_PHONE_NUMBER";
    pub const MESSAGING_SERVICE_SID_ENV: &'static str = "TWILIO_MESSAGING_SERVICE_SID";

    /// True once credentials are present; sender identity is checked by `validate`.
    pub fn is_configured(&self) -> bool {
        non_blank(&self.account_sid) && non_blank(&self.auth_token)
    }

    /// A phone number or messaging service to send from, ignoring blank values
    pub fn has_sender(&self) -> bool {
        non_blank(&self.phone_number) || non_blank(&self.messaging_service_sid)
    }

    /// Apply the plain `TWILIO_*` variables on top of file configuration.
    ///
    /// Blank variables are ignored so an exported-but-empty value cannot
    /// wipe a credential from the config file.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = pick(Self::ACCOUNT_SID_ENV) {
            self.account_sid = Some(v);
        }
        if let Some(v) = pick(Self::AUTH_TOKEN_ENV) {
            self.auth_token = Some(v);
        }
        if let Some(v) = pick(Self::PHONE_NUMBER_ENV) {
            self.phone_number = Some(v);
        }
        if let Some(v) = pick(Self::MESSAGING_SERVICE_SID_ENV) {
            self.messaging_service_sid = Some(v);
        }
    }
}

pub(crate) fn non_blank(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

impl Default for TwilioConfig {
    fn default() -> Self {
        Self {
            account_sid: None,
            auth_token: None,
            phone_number: None,
            messaging_service_sid: None,
            api_base_url: default_twilio_base_url(),
            timeout_seconds: default_provider_timeout(),
        }
    }
}

impl std::fmt::Debug for TwilioConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("phone_number", &self.phone_number)
            .field("messaging_service_sid", &self.messaging_service_sid)
            .field("api_base_url", &self.api_base_url)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

// ============================================================================
// Root Settings
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub application: ApplicationConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logger: LoggerSettings,

    #[serde(default)]
    pub phone: PhoneConfig,

    #[serde(default)]
    pub quota: QuotaConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub twilio: TwilioConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_documented_limits() {
        let settings = Settings::default();
        assert_eq!(settings.quota.max_sends_per_day, 3);
        assert_eq!(settings.quota.cooldown_minutes, 60);
        assert_eq!(settings.quota.backend, QuotaBackend::Memory);
        assert_eq!(settings.phone.max_digits, 15);
        assert_eq!(settings.server.address(), "127.0.0.1:3000");
    }

    #[test]
    fn test_twilio_overrides_ignore_blank_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("TWILIO_ACCOUNT_SID", "AC123"),
            ("TWILIO_AUTH_TOKEN", "  "),
            ("TWILIO_MESSAGING_SERVICE_SID", "MG456"),
        ]);
        let mut twilio = TwilioConfig {
            auth_token: Some("from-file".to_string()),
            ..TwilioConfig::default()
        };

        twilio.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(twilio.account_sid.as_deref(), Some("AC123"));
        assert_eq!(twilio.auth_token.as_deref(), Some("from-file"));
        assert_eq!(twilio.messaging_service_sid.as_deref(), Some("MG456"));
        assert!(twilio.phone_number.is_none());
        assert!(twilio.is_configured());
    }

    #[test]
    fn test_twilio_debug_redacts_token() {
        let twilio = TwilioConfig {
            account_sid: Some("AC123".to_string()),
            auth_token: Some("super-secret".to_string()),
            ..TwilioConfig::default()
        };
        let rendered = format!("{:?}", twilio);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_logger_settings_conversion() {
        let settings = LoggerSettings {
            level: "debug".to_string(),
            file: FileSettings {
                format: "compact".to_string(),
                ..FileSettings::default()
            },
            ..LoggerSettings::default()
        };
        let config = settings.into_logger_config().unwrap();
        assert_eq!(config.level, "debug");
        assert_eq!(config.file.format, LogFormat::Compact);
    }

    #[test]
    fn test_logger_settings_rejects_unknown_format() {
        let settings = LoggerSettings {
            file: FileSettings {
                format: "xml".to_string(),
                ..FileSettings::default()
            },
            ..LoggerSettings::default()
        };
        assert!(settings.into_logger_config().is_err());
    }

    #[test]
    fn test_quota_backend_deserializes_lowercase() {
        let quota: QuotaConfig = serde_json::from_str(r#"{"backend": "redis"}"#).unwrap();
        assert_eq!(quota.backend, QuotaBackend::Redis);
        assert_eq!(quota.redis.key_prefix, "tlc");
    }
}
