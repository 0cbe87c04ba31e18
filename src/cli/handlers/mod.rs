//! Command handlers for CLI operations

pub mod migrate;
pub mod send;
pub mod serve;

pub use migrate::MigrateCommandHandler;
pub use send::SendCommandHandler;
pub use serve::ServeCommandHandler;
