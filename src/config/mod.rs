//! Configuration management for tlc-gateway
//!
//! Layered TOML files plus environment overrides, see [`ConfigLoader`].

pub mod environment;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use environment::Environment;
pub use loader::ConfigLoader;
pub use settings::{
    DatabaseConfig, PhoneConfig, QuotaBackend, QuotaConfig, RedisQuotaConfig, Settings,
    TwilioConfig,
};
