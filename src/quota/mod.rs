//! Per-recipient sending quota.
//!
//! The policy (daily cap, cooldown, calendar day) is pure; stores persist
//! [`SendQuotaRecord`]s and apply the policy atomically per phone:
//! - Memory (in-process, single instance)
//! - Redis (shared, keys expire on their own)
//! - PostgreSQL (shared, durable)
//!
//! ```toml
//! [quota]
//! backend = "redis"  # or "memory" or "postgres"
//! max_sends_per_day = 3
//! cooldown_minutes = 60
//! timezone = "UTC"
//!
//! [quota.redis]
//! url = "redis://127.0.0.1:6379"
//! key_prefix = "tlc"
//! ```

mod error;
mod manager;
mod memory;
mod policy;
mod postgres;
mod record;
mod redis;
mod traits;

pub use error::QuotaStoreError;
pub use manager::build_quota_store;
pub use memory::MemoryQuotaStore;
pub use policy::{QuotaPolicy, QuotaViolation};
pub use postgres::PostgresQuotaStore;
pub use record::SendQuotaRecord;
pub use self::redis::RedisQuotaStore;
pub use traits::{QuotaStore, Reservation, ReserveOutcome};
