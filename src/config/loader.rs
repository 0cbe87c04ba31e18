//! Configuration loader for tlc-gateway
//!
//! Sources, lowest priority first:
//! 1. `default.toml` (required in layered mode)
//! 2. `{environment}.toml`
//! 3. `local.toml`
//! 4. `TLC_*` environment variables (`TLC_QUOTA__BACKEND` -> `quota.backend`)
//! 5. The plain `TWILIO_*` provider variables

use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};

use crate::config::environment::Environment as AppEnvironment;
use crate::config::error::ConfigError;
use crate::config::settings::Settings;

const CONFIG_DIR_ENV: &str = "TLC_CONFIG_DIR";

const CONFIG_FILE_ENV: &str = "TLC_CONFIG_FILE";

const DEFAULT_CONFIG_DIR: &str = "config";

const ENV_PREFIX: &str = "TLC";

const ENV_SEPARATOR: &str = "__";

#[derive(Debug)]
pub struct ConfigLoader {
    config_dir: PathBuf,
    /// When set, layered loading is skipped and only this file is read
    config_file: Option<PathBuf>,
    environment: AppEnvironment,
}

impl ConfigLoader {
    /// Create a loader from `TLC_CONFIG_DIR`, `TLC_CONFIG_FILE` and `TLC_APP_ENV`.
    ///
    /// # Errors
    ///
    /// Fails when both `TLC_CONFIG_DIR` and `TLC_CONFIG_FILE` are set.
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = std::env::var(CONFIG_DIR_ENV).ok().map(PathBuf::from);
        let config_file = std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from);

        if config_dir.is_some() && config_file.is_some() {
            return Err(ConfigError::mutual_exclusivity(
                "TLC_CONFIG_DIR and TLC_CONFIG_FILE cannot both be set. \
                 Use TLC_CONFIG_DIR for layered configuration or \
                 TLC_CONFIG_FILE for a single configuration file.",
            ));
        }

        Ok(Self {
            config_dir: config_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR)),
            config_file,
            environment: AppEnvironment::from_env(),
        })
    }

    /// Loader that reads a single file, used for `--config`
    pub fn for_file(path: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            config_file: Some(path.into()),
            environment: AppEnvironment::from_env(),
        }
    }

    /// Layered loader rooted at `dir`
    pub fn for_dir(dir: impl Into<PathBuf>, environment: AppEnvironment) -> Self {
        Self {
            config_dir: dir.into(),
            config_file: None,
            environment,
        }
    }

    /// Override the environment overlay that is loaded
    pub fn with_environment(mut self, environment: AppEnvironment) -> Self {
        self.environment = environment;
        self
    }

    pub fn environment(&self) -> AppEnvironment {
        self.environment
    }

    /// Load, apply provider env overrides, and validate.
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let config = self.build_config()?;
        let mut settings: Settings = config.try_deserialize().map_err(|e| {
            ConfigError::ParseError(format!("Failed to deserialize configuration: {}", e))
        })?;

        settings.twilio.apply_env_overrides();
        settings.validate()?;

        Ok(settings)
    }

    fn build_config(&self) -> Result<Config, ConfigError> {
        let builder = Config::builder();

        let builder = match self.config_file {
            Some(ref file) => Self::add_file_source(builder, file, true)?,
            None => self.build_layered_config(builder)?,
        };

        Self::add_env_source(builder)
            .build()
            .map_err(ConfigError::from)
    }

    fn build_layered_config(
        &self,
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let builder =
            Self::add_file_source(builder, &self.config_dir.join("default.toml"), true)?;
        let builder = Self::add_file_source(
            builder,
            &self.config_dir.join(self.environment.overlay_file()),
            false,
        )?;
        Self::add_file_source(builder, &self.config_dir.join("local.toml"), false)
    }

    fn add_file_source(
        builder: ConfigBuilder<DefaultState>,
        path: &Path,
        required: bool,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        if required && !path.exists() {
            return Err(ConfigError::file_not_found(format!(
                "Required configuration file not found: {}",
                path.display()
            )));
        }

        let path_str = path.to_str().ok_or_else(|| {
            ConfigError::ParseError(format!("Non UTF-8 configuration path: {}", path.display()))
        })?;

        Ok(builder.add_source(File::new(path_str, FileFormat::Toml).required(required)))
    }

    fn add_env_source(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
        builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator(ENV_SEPARATOR)
                .ignore_empty(true)
                .try_parsing(true),
        )
    }
}
