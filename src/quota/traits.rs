//! QuotaStore trait definition.

use async_trait::async_trait;
use jiff::Timestamp;

use crate::quota::{QuotaPolicy, QuotaStoreError, QuotaViolation, SendQuotaRecord};

/// A send recorded ahead of the provider call.
///
/// Holds what the store looked like before so the send can be undone when
/// the provider rejects the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub phone: String,
    pub previous: Option<SendQuotaRecord>,
    pub record: SendQuotaRecord,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReserveOutcome {
    Reserved(Reservation),
    Rejected(QuotaViolation),
}

/// Storage for per-recipient send counters.
///
/// `try_record_send` must check the policy and record the send as one atomic
/// step per phone, so concurrent requests for a number cannot both pass.
#[async_trait]
pub trait QuotaStore: Send + Sync {
    /// Backend name for logs and health output
    fn backend(&self) -> &'static str;

    async fn get(&self, phone: &str) -> Result<Option<SendQuotaRecord>, QuotaStoreError>;

    /// Check `policy` against the stored record and, when allowed, store the
    /// record with this send applied.
    async fn try_record_send(
        &self,
        phone: &str,
        now: Timestamp,
        policy: &QuotaPolicy,
    ) -> Result<ReserveOutcome, QuotaStoreError>;

    /// Undo a reservation. A no-op when the stored record is no longer the
    /// one the reservation wrote.
    async fn release(&self, reservation: &Reservation) -> Result<(), QuotaStoreError>;

    /// Delete records that no longer affect any decision; returns how many.
    async fn purge_stale(&self, now: Timestamp, policy: &QuotaPolicy)
    -> Result<u64, QuotaStoreError>;

    async fn health_check(&self) -> Result<(), QuotaStoreError>;
}
