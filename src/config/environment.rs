//! Deployment environment selection

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;

/// Deployment environment of the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Test,
    Staging,
    Production,
}

impl Environment {
    /// Variable consulted by [`Environment::from_env`]
    pub const ENV_VAR: &'static str = "TLC_APP_ENV";

    /// Reads `TLC_APP_ENV`, falling back to `Development` when unset or unparsable.
    pub fn from_env() -> Self {
        std::env::var(Self::ENV_VAR)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    /// Name of the environment overlay file inside the config directory
    pub fn overlay_file(&self) -> String {
        format!("{}.toml", self.as_str())
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(ConfigError::EnvVarError(format!(
                "Invalid environment '{}'. Valid values are: development, test, staging, production",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_aliases() {
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Development);
        assert_eq!("stage".parse::<Environment>().unwrap(), Environment::Staging);
        assert_eq!("prod".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!(" Test ".parse::<Environment>().unwrap(), Environment::Test);
    }

    #[test]
    fn test_environment_invalid() {
        assert!("qa".parse::<Environment>().is_err());
    }

    #[test]
    fn test_overlay_file() {
        assert_eq!(Environment::Staging.overlay_file(), "staging.toml");
        assert!(Environment::Production.is_production());
        assert!(!Environment::default().is_production());
    }
}
