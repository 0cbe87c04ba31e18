//! In-process quota store backed by DashMap.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use jiff::Timestamp;

use crate::quota::{
    QuotaPolicy, QuotaStore, QuotaStoreError, Reservation, ReserveOutcome, SendQuotaRecord,
};

/// Single-instance store; the per-key entry lock makes `try_record_send` atomic.
#[derive(Default)]
pub struct MemoryQuotaStore {
    records: DashMap<String, SendQuotaRecord>,
}

impl MemoryQuotaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl QuotaStore for MemoryQuotaStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, phone: &str) -> Result<Option<SendQuotaRecord>, QuotaStoreError> {
        Ok(self.records.get(phone).map(|r| *r.value()))
    }

    async fn try_record_send(
        &self,
        phone: &str,
        now: Timestamp,
        policy: &QuotaPolicy,
    ) -> Result<ReserveOutcome, QuotaStoreError> {
        let outcome = match self.records.entry(phone.to_string()) {
            Entry::Occupied(mut entry) => {
                let previous = *entry.get();
                match policy.check(Some(&previous), now) {
                    Err(violation) => ReserveOutcome::Rejected(violation),
                    Ok(()) => {
                        let record = policy.apply(Some(&previous), now);
                        entry.insert(record);
                        ReserveOutcome::Reserved(Reservation {
                            phone: phone.to_string(),
                            previous: Some(previous),
                            record,
                        })
                    }
                }
            }
            Entry::Vacant(entry) => {
                let record = policy.apply(None, now);
                entry.insert(record);
                ReserveOutcome::Reserved(Reservation {
                    phone: phone.to_string(),
                    previous: None,
                    record,
                })
            }
        };
        Ok(outcome)
    }

    async fn release(&self, reservation: &Reservation) -> Result<(), QuotaStoreError> {
        if let Entry::Occupied(mut entry) = self.records.entry(reservation.phone.clone()) {
            if *entry.get() != reservation.record {
                return Ok(());
            }
            match reservation.previous {
                Some(previous) => {
                    entry.insert(previous);
                }
                None => {
                    entry.remove();
                }
            }
        }
        Ok(())
    }

    async fn purge_stale(
        &self,
        now: Timestamp,
        policy: &QuotaPolicy,
    ) -> Result<u64, QuotaStoreError> {
        let mut purged = 0u64;
        self.records.retain(|_, record| {
            let stale = policy.is_stale(record, now);
            if stale {
                purged += 1;
            }
            !stale
        });
        Ok(purged)
    }

    async fn health_check(&self) -> Result<(), QuotaStoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quota::QuotaViolation;
    use jiff::tz::TimeZone;
    use std::sync::Arc;

    const PHONE: &str = "+15551234567";

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    fn policy() -> QuotaPolicy {
        QuotaPolicy::new(3, 60, TimeZone::UTC)
    }

    fn reserved(outcome: ReserveOutcome) -> Reservation {
        match outcome {
            ReserveOutcome::Reserved(reservation) => reservation,
            ReserveOutcome::Rejected(v) => panic!("Expected reservation, got {:?}", v),
        }
    }

    #[tokio::test]
    async fn test_reserve_then_reject_during_cooldown() {
        let store = MemoryQuotaStore::new();
        let policy = policy();

        let first = reserved(
            store
                .try_record_send(PHONE, ts("2026-03-14T09:00:00Z"), &policy)
                .await
                .unwrap(),
        );
        assert!(first.previous.is_none());
        assert_eq!(store.get(PHONE).await.unwrap(), Some(first.record));

        let second = store
            .try_record_send(PHONE, ts("2026-03-14T09:10:00Z"), &policy)
            .await
            .unwrap();
        assert!(matches!(
            second,
            ReserveOutcome::Rejected(QuotaViolation::Cooldown { .. })
        ));
        assert_eq!(store.get(PHONE).await.unwrap(), Some(first.record));
    }

    #[tokio::test]
    async fn test_release_restores_previous_record() {
        let store = MemoryQuotaStore::new();
        let policy = policy();

        let first = reserved(
            store
                .try_record_send(PHONE, ts("2026-03-14T09:00:00Z"), &policy)
                .await
                .unwrap(),
        );
        let second = reserved(
            store
                .try_record_send(PHONE, ts("2026-03-14T11:00:00Z"), &policy)
                .await
                .unwrap(),
        );

        store.release(&second).await.unwrap();
        assert_eq!(store.get(PHONE).await.unwrap(), Some(first.record));

        store.release(&first).await.unwrap();
        assert!(store.get(PHONE).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_release_ignores_newer_record() {
        let store = MemoryQuotaStore::new();
        let policy = policy();

        let first = reserved(
            store
                .try_record_send(PHONE, ts("2026-03-14T09:00:00Z"), &policy)
                .await
                .unwrap(),
        );
        let second = reserved(
            store
                .try_record_send(PHONE, ts("2026-03-14T11:00:00Z"), &policy)
                .await
                .unwrap(),
        );

        store.release(&first).await.unwrap();
        assert_eq!(store.get(PHONE).await.unwrap(), Some(second.record));
    }

    #[tokio::test]
    async fn test_purge_keeps_active_cooldowns() {
        let store = MemoryQuotaStore::new();
        let policy = policy();

        store
            .try_record_send("+4420000001", ts("2026-03-14T10:00:00Z"), &policy)
            .await
            .unwrap();
        store
            .try_record_send("+4420000002", ts("2026-03-14T23:45:00Z"), &policy)
            .await
            .unwrap();
        store
            .try_record_send("+4420000003", ts("2026-03-15T00:05:00Z"), &policy)
            .await
            .unwrap();

        let purged = store
            .purge_stale(ts("2026-03-15T00:10:00Z"), &policy)
            .await
            .unwrap();

        assert_eq!(purged, 1);
        assert_eq!(store.len(), 2);
        assert!(store.get("+4420000001").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_reservations_respect_cap() {
        let store = Arc::new(MemoryQuotaStore::new());
        let policy = Arc::new(QuotaPolicy::new(3, 0, TimeZone::UTC));
        let now = ts("2026-03-14T09:00:00Z");

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            let policy = policy.clone();
            handles.push(tokio::spawn(async move {
                store.try_record_send(PHONE, now, &policy).await.unwrap()
            }));
        }

        let mut accepted = 0;
        for handle in handles {
            if let ReserveOutcome::Reserved(_) = handle.await.unwrap() {
                accepted += 1;
            }
        }

        assert_eq!(accepted, 3);
        assert_eq!(store.get(PHONE).await.unwrap().unwrap().sends_today, 3);
    }
}
