//! CLI argument parsing with clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Validated, rate-limited SMS reminder gateway
#[derive(Parser, Debug)]
#[command(name = "tlc-gateway")]
#[command(about = "Validated, rate-limited SMS reminder gateway")]
#[command(long_about = "
tlc-gateway accepts reminder-setup requests, validates the recipient's phone
number, enforces a per-recipient daily quota and cooldown, and sends the
reminder through Twilio (or simulates it).

EXAMPLES:
    # Start the HTTP server with default configuration
    tlc-gateway serve

    # Bind to all interfaces on port 8080
    tlc-gateway serve --host 0.0.0.0 --port 8080

    # Accept traffic but never contact Twilio
    tlc-gateway serve --simulate-only

    # Check configuration without starting the server
    tlc-gateway serve --dry-run

    # Send one reminder from the command line (simulated)
    tlc-gateway send --name Sam --phone '+1 555 123 4567' --date 2026-04-02 --interval 28 --simulate

    # Apply database migrations (postgres quota backend)
    tlc-gateway migrate
")]
#[command(version = crate::clap_long_version())]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path
    ///
    /// Read only this TOML file instead of the layered config directory.
    /// Environment variables still apply on top.
    #[arg(short, long, value_name = "FILE", value_parser = super::validation::config_file)]
    pub config: Option<PathBuf>,

    /// Override environment detection (TLC_APP_ENV)
    #[arg(short, long, value_enum)]
    pub env: Option<Environment>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve {
        /// Host address to bind to
        #[arg(long, value_name = "ADDRESS", value_parser = super::validation::bind_host)]
        host: Option<String>,

        /// Port number to listen on
        #[arg(short, long, value_name = "PORT", value_parser = clap::value_parser!(u16).range(1..))]
        port: Option<u16>,

        /// Log level override, takes precedence over --verbose/--quiet
        #[arg(long, value_enum)]
        log_level: Option<LogLevel>,

        /// Validate configuration and exit
        #[arg(long)]
        dry_run: bool,

        /// Treat every dispatch request as a simulation
        #[arg(long)]
        simulate_only: bool,
    },
    /// Dispatch a single reminder and print the result as JSON
    Send {
        /// Recipient name used in the message
        #[arg(long, default_value = "")]
        name: String,

        /// Recipient phone number with country code
        #[arg(long)]
        phone: String,

        /// Expected start date shown in the message
        #[arg(long)]
        date: String,

        /// Cycle length in days (1-365)
        #[arg(long, value_name = "DAYS", value_parser = clap::value_parser!(i64).range(1..=365))]
        interval: i64,

        /// Mention that the reminder repeats every cycle
        #[arg(long)]
        repeat: bool,

        /// Run all checks without contacting the provider
        #[arg(long)]
        simulate: bool,
    },
    /// Database migration operations
    Migrate {
        /// Show pending migrations without applying
        #[arg(long, conflicts_with = "rollback")]
        dry_run: bool,

        /// Number of migrations to roll back (1-100)
        #[arg(long, value_name = "STEPS", conflicts_with = "dry_run", value_parser = clap::value_parser!(u32).range(1..=100))]
        rollback: Option<u32>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Environment {
    #[value(name = "development", alias = "dev")]
    Development,
    #[value(name = "test")]
    Test,
    #[value(name = "staging", alias = "stage")]
    Staging,
    #[value(name = "production", alias = "prod")]
    Production,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum LogLevel {
    #[value(name = "error")]
    Error,
    #[value(name = "warn", alias = "warning")]
    Warn,
    #[value(name = "info")]
    Info,
    #[value(name = "debug")]
    Debug,
    #[value(name = "trace")]
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl From<Environment> for crate::config::Environment {
    fn from(env: Environment) -> Self {
        match env {
            Environment::Development => crate::config::Environment::Development,
            Environment::Test => crate::config::Environment::Test,
            Environment::Staging => crate::config::Environment::Staging,
            Environment::Production => crate::config::Environment::Production,
        }
    }
}
