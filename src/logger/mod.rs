//! Logger Module
//!
//! `tracing-subscriber` setup with:
//! - Console output with color control
//! - File output in Full, Compact or JSON format
//! - Fallback to stderr when the log file stops accepting writes
//!
//! `RUST_LOG`, when set, takes precedence over the configured level.

pub mod config;
pub mod error;
pub(crate) mod writer;

pub use config::*;
pub use error::LoggerError;

use std::io::IsTerminal;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use writer::LogFileWriter;

/// Install the global subscriber
pub fn init_logger(config: LoggerConfig) -> Result<(), LoggerError> {
    config.validate()?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match (config.console.enabled, config.file.enabled) {
        (true, true) => init_both(&config, filter),
        (true, false) => init_console_only(&config.console, filter),
        (false, true) => init_file_only(&config.file, filter),
        (false, false) => Err(LoggerError::config(
            "At least one output (console or file) must be enabled",
        )),
    }
}

fn already_initialized(e: impl std::fmt::Display) -> LoggerError {
    LoggerError::already_initialized(e.to_string())
}

fn init_console_only(config: &ConsoleConfig, filter: EnvFilter) -> Result<(), LoggerError> {
    let use_ansi = config.colored && std::io::stdout().is_terminal();

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_ansi(use_ansi)
                .with_target(true)
                .with_level(true),
        )
        .try_init()
        .map_err(already_initialized)
}

fn init_file_only(config: &FileConfig, filter: EnvFilter) -> Result<(), LoggerError> {
    let writer = LogFileWriter::new(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.format {
        LogFormat::Full => registry
            .with(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(writer),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .compact()
                    .with_writer(writer),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().with_ansi(false).json().with_writer(writer))
            .try_init(),
    };

    result.map_err(already_initialized)
}

fn init_both(config: &LoggerConfig, filter: EnvFilter) -> Result<(), LoggerError> {
    let use_ansi = config.console.colored && std::io::stdout().is_terminal();
    let writer = LogFileWriter::new(&config.file)?;

    // The file layer goes first so ANSI codes from the console layer's
    // span formatting never reach the file (tokio-rs/tracing#1817).
    fn console_layer<S>(use_ansi: bool) -> fmt::Layer<S> {
        fmt::layer()
            .with_ansi(use_ansi)
            .with_target(true)
            .with_level(true)
    }
    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.file.format {
        LogFormat::Full => registry
            .with(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(writer),
            )
            .with(console_layer(use_ansi))
            .try_init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .compact()
                    .with_writer(writer),
            )
            .with(console_layer(use_ansi))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().with_ansi(false).json().with_writer(writer))
            .with(console_layer(use_ansi))
            .try_init(),
    };

    result.map_err(already_initialized)
}
