//! CLI module for tlc-gateway
//!
//! - Argument parsing with clap
//! - Configuration merging (CLI args + config files + environment)
//! - Command handlers for serve, send and migrate

pub mod config_merger;
pub mod executor;
pub mod handlers;
pub mod parser;
pub mod validation;

pub use config_merger::ConfigurationMerger;
pub use executor::execute_command;
pub use parser::{Cli, Commands, Environment, LogLevel};

use anyhow::Context;

use crate::config::settings::Settings;
use crate::logger::init_logger;

/// Load configuration files and apply CLI overrides
pub fn load_and_merge_config(cli: &Cli) -> anyhow::Result<Settings> {
    let merger = ConfigurationMerger::from_cli(cli).context("Failed to load configuration")?;
    merger
        .merge_cli_args(cli)
        .context("Invalid configuration after applying command line overrides")
}

/// Install the global tracing subscriber from `[logger]` settings
pub fn init_logger_from_settings(settings: &Settings) -> anyhow::Result<()> {
    let logger_config = settings
        .logger
        .clone()
        .into_logger_config()
        .context("Invalid logger configuration")?;

    init_logger(logger_config).context("Failed to initialize logger")
}
