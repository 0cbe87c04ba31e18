//! PostgreSQL quota store on the shared diesel-async pool.
//!
//! `try_record_send` locks the phone's row (`SELECT ... FOR UPDATE`) inside a
//! transaction; a first send for a phone races on the primary key instead
//! and the loser retries against the committed row.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::pooled_connection::bb8::PooledConnection;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use jiff::Timestamp;
use jiff_diesel::ToDiesel;

use crate::db::AsyncDbPool;
use crate::models::{SendQuotaChanges, SendQuotaRow};
use crate::phone::mask;
use crate::quota::{
    QuotaPolicy, QuotaStore, QuotaStoreError, Reservation, ReserveOutcome, SendQuotaRecord,
};
use crate::schema::send_quotas;

const MAX_RESERVE_ATTEMPTS: usize = 3;

#[derive(Clone)]
pub struct PostgresQuotaStore {
    pool: AsyncDbPool,
}

impl PostgresQuotaStore {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    async fn get_conn(&self) -> Result<PooledConnection<'_, AsyncPgConnection>, QuotaStoreError> {
        self.pool
            .get()
            .await
            .map_err(|e| QuotaStoreError::Connection(e.to_string()))
    }
}

fn operation(e: diesel::result::Error) -> QuotaStoreError {
    QuotaStoreError::Operation(e.to_string())
}

/// TIMESTAMPTZ keeps microseconds; reservations must compare equal to what is stored.
fn to_stored_precision(now: Timestamp) -> Result<Timestamp, QuotaStoreError> {
    Timestamp::from_microsecond(now.as_microsecond())
        .map_err(|e| QuotaStoreError::Operation(e.to_string()))
}

#[async_trait]
impl QuotaStore for PostgresQuotaStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn get(&self, phone: &str) -> Result<Option<SendQuotaRecord>, QuotaStoreError> {
        let mut conn = self.get_conn().await?;

        send_quotas::table
            .find(phone)
            .select(SendQuotaRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map(|row| row.map(SendQuotaRow::into_record))
            .map_err(operation)
    }

    async fn try_record_send(
        &self,
        phone: &str,
        now: Timestamp,
        policy: &QuotaPolicy,
    ) -> Result<ReserveOutcome, QuotaStoreError> {
        let now = to_stored_precision(now)?;
        let mut conn = self.get_conn().await?;

        for attempt in 1..=MAX_RESERVE_ATTEMPTS {
            let outcome = conn
                .transaction::<_, diesel::result::Error, _>(|conn| {
                    async move {
                        let previous = send_quotas::table
                            .find(phone)
                            .select(SendQuotaRow::as_select())
                            .for_update()
                            .first(conn)
                            .await
                            .optional()?
                            .map(SendQuotaRow::into_record);

                        if let Err(violation) = policy.check(previous.as_ref(), now) {
                            return Ok(Some(ReserveOutcome::Rejected(violation)));
                        }

                        let record = policy.apply(previous.as_ref(), now);
                        let changes = SendQuotaChanges::from_record(phone, &record);

                        if previous.is_some() {
                            diesel::update(send_quotas::table.find(phone))
                                .set(&changes)
                                .execute(conn)
                                .await?;
                        } else {
                            let inserted = diesel::insert_into(send_quotas::table)
                                .values(&changes)
                                .on_conflict_do_nothing()
                                .execute(conn)
                                .await?;
                            if inserted == 0 {
                                return Ok(None);
                            }
                        }

                        Ok(Some(ReserveOutcome::Reserved(Reservation {
                            phone: phone.to_string(),
                            previous,
                            record,
                        })))
                    }
                    .scope_boxed()
                })
                .await
                .map_err(operation)?;

            match outcome {
                Some(outcome) => return Ok(outcome),
                None => tracing::debug!(
                    phone = %mask(phone),
                    attempt,
                    "First-send race lost, retrying against committed row"
                ),
            }
        }

        Err(QuotaStoreError::Operation(format!(
            "reservation for {} still contended after {} attempts",
            mask(phone),
            MAX_RESERVE_ATTEMPTS
        )))
    }

    async fn release(&self, reservation: &Reservation) -> Result<(), QuotaStoreError> {
        let Some(reserved_at) = reservation.record.last_sent_at else {
            return Ok(());
        };
        let mut conn = self.get_conn().await?;

        let target = send_quotas::table
            .filter(send_quotas::phone.eq(&reservation.phone))
            .filter(send_quotas::last_sent_at.eq(reserved_at.to_diesel()));

        let restored = match &reservation.previous {
            Some(previous) => {
                diesel::update(target)
                    .set(&SendQuotaChanges::from_record(&reservation.phone, previous))
                    .execute(&mut conn)
                    .await
            }
            None => diesel::delete(target).execute(&mut conn).await,
        }
        .map_err(operation)?;

        if restored == 0 {
            tracing::debug!(
                phone = %mask(&reservation.phone),
                "Quota record changed since reservation, release skipped"
            );
        }
        Ok(())
    }

    async fn purge_stale(
        &self,
        now: Timestamp,
        policy: &QuotaPolicy,
    ) -> Result<u64, QuotaStoreError> {
        let today = policy.day_of(now);
        let cutoff = now
            .checked_sub(policy.cooldown())
            .map_err(|e| QuotaStoreError::Operation(e.to_string()))?;
        let mut conn = self.get_conn().await?;

        let deleted = diesel::delete(
            send_quotas::table
                .filter(send_quotas::quota_day.lt(today.to_diesel()))
                .filter(
                    send_quotas::last_sent_at
                        .is_null()
                        .or(send_quotas::last_sent_at.le(cutoff.to_diesel())),
                ),
        )
        .execute(&mut conn)
        .await
        .map_err(operation)?;

        Ok(deleted as u64)
    }

    async fn health_check(&self) -> Result<(), QuotaStoreError> {
        let mut conn = self.get_conn().await?;
        diesel::sql_query("SELECT 1")
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_precision_drops_nanoseconds() {
        let now: Timestamp = "2026-03-14T09:00:00.123456789Z".parse().unwrap();
        let stored = to_stored_precision(now).unwrap();
        assert_eq!(stored.to_string(), "2026-03-14T09:00:00.123456Z");
        assert_eq!(to_stored_precision(stored).unwrap(), stored);
    }
}
