//! Runtime logger configuration, built from the `[logger]` settings section.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::logger::LoggerError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// `trace`, `debug`, `info`, `warn` or `error`; `RUST_LOG` overrides it
    pub level: String,
    pub console: ConsoleConfig,
    pub file: FileConfig,
}

impl LoggerConfig {
    pub fn validate(&self) -> Result<(), LoggerError> {
        self.level()?;

        if !self.console.enabled && !self.file.enabled {
            return Err(LoggerError::config(
                "At least one output (console or file) must be enabled",
            ));
        }
        if self.file.enabled && self.file.path.as_os_str().is_empty() {
            return Err(LoggerError::config(
                "logger.file.path is required when file output is enabled",
            ));
        }
        Ok(())
    }

    pub fn level(&self) -> Result<Level, LoggerError> {
        Level::from_str(self.level.trim()).map_err(|_| {
            LoggerError::config(format!(
                "Unknown log level '{}' (expected trace, debug, info, warn or error)",
                self.level
            ))
        })
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console: ConsoleConfig::default(),
            file: FileConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub enabled: bool,
    /// Only honored when stdout is a terminal
    pub colored: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            colored: true,
        }
    }
}

/// Append-mode log file; parent directories are created by the writer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub enabled: bool,
    pub path: PathBuf,
    pub append: bool,
    pub format: LogFormat,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: PathBuf::from("logs/tlc-gateway.log"),
            append: true,
            format: LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
    /// One JSON object per event, for log shippers
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("full") {
            Ok(LogFormat::Full)
        } else if s.eq_ignore_ascii_case("compact") {
            Ok(LogFormat::Compact)
        } else if s.eq_ignore_ascii_case("json") {
            Ok(LogFormat::Json)
        } else {
            Err(LoggerError::config(format!(
                "Unknown log format '{}' (expected full, compact or json)",
                s
            )))
        }
    }
}
