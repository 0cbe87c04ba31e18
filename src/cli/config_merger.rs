//! Configuration merger for CLI arguments and config files
//!
//! Precedence, lowest first: config files, environment variables, CLI flags.

use super::parser::{Cli, Commands};
use crate::config::error::ConfigError;
use crate::config::{ConfigLoader, settings::Settings};

pub struct ConfigurationMerger {
    base_config: Settings,
}

impl ConfigurationMerger {
    pub fn new(base_config: Settings) -> Self {
        Self { base_config }
    }

    /// Load the base configuration the way the CLI asks for it: `--config`
    /// selects a single file, `--env` overrides `TLC_APP_ENV`.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let loader = match &cli.config {
            Some(path) => ConfigLoader::for_file(path),
            None => ConfigLoader::new()?,
        };
        let loader = match cli.env {
            Some(env) => loader.with_environment(env.into()),
            None => loader,
        };

        tracing::debug!(environment = %loader.environment(), "Loading configuration");
        Ok(Self::new(loader.load()?))
    }

    /// Apply CLI overrides on top of the base configuration and re-validate.
    pub fn merge_cli_args(&self, cli: &Cli) -> Result<Settings, ConfigError> {
        let mut config = self.base_config.clone();

        if cli.verbose {
            config.logger.level = "debug".to_string();
        } else if cli.quiet {
            config.logger.level = "error".to_string();
        }

        if let Some(Commands::Serve {
            host,
            port,
            log_level,
            ..
        }) = &cli.command
        {
            if let Some(host_addr) = host {
                config.server.host = host_addr.clone();
            }
            if let Some(port_num) = port {
                config.server.port = *port_num;
            }
            // command-specific level wins over --verbose/--quiet
            if let Some(level) = log_level {
                config.logger.level = level.as_str().to_string();
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn config(&self) -> &Settings {
        &self.base_config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    fn merge(args: &[&str]) -> Settings {
        let cli = Cli::try_parse_from(args).unwrap();
        ConfigurationMerger::new(Settings::default())
            .merge_cli_args(&cli)
            .unwrap()
    }

    #[test]
    fn test_verbose_and_quiet_flags() {
        assert_eq!(merge(&["tlc-gateway", "--verbose"]).logger.level, "debug");
        assert_eq!(merge(&["tlc-gateway", "--quiet"]).logger.level, "error");
    }

    #[test]
    fn test_serve_host_and_port() {
        let config = merge(&["tlc-gateway", "serve", "--host", "0.0.0.0", "--port", "8080"]);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_command_log_level_overrides_global() {
        let config = merge(&["tlc-gateway", "--verbose", "serve", "--log-level", "warn"]);
        assert_eq!(config.logger.level, "warn");
    }

    #[test]
    fn test_send_leaves_server_untouched() {
        let config = merge(&[
            "tlc-gateway",
            "send",
            "--phone",
            "+15551234567",
            "--date",
            "2026-04-02",
            "--interval",
            "28",
        ]);
        assert_eq!(config.server, Settings::default().server);
    }

    #[test]
    fn test_from_cli_reads_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gateway.toml");
        fs::write(&path, "[quota]\nmax_sends_per_day = 5\n").unwrap();

        let cli = Cli::try_parse_from(["tlc-gateway", "--config", path.to_str().unwrap()]).unwrap();
        let merger = ConfigurationMerger::from_cli(&cli).unwrap();
        assert_eq!(merger.config().quota.max_sends_per_day, 5);
    }
}
