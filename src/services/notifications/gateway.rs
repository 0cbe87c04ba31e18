//! Notification dispatch gateway.
//!
//! validate phone -> quota check -> simulate or send -> record.
//! The quota check and the record step are one atomic store call made
//! before the provider is contacted; a provider failure releases it again.

use std::sync::Arc;

use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::message::compose_body;
use super::provider::{SmsMessage, SmsProvider};
use crate::error::{AppError, AppResult};
use crate::phone::{PhoneValidator, mask};
use crate::quota::{QuotaPolicy, QuotaStore, ReserveOutcome, SendQuotaRecord};

const PHONE_FIELD: &str = "recipientPhone";

/// One reminder-setup request, after transport decoding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub recipient_name: String,
    pub recipient_phone: String,
    pub scheduled_date: String,
    pub interval_days: i64,
    pub repeat_mode: bool,
    pub simulate_only: bool,
}

/// Successful outcome of `submit`, real or simulated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResult {
    pub success: bool,
    pub simulated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    pub formatted_phone: String,
    /// Sends counted today, this one included when it was real
    pub sends_today: u32,
    pub remaining_today: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

/// Quota view of one phone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuotaStatus {
    pub formatted_phone: String,
    pub sends_today: u32,
    pub remaining_today: u32,
    pub max_sends_per_day: u32,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub last_sent_at: Option<Timestamp>,
    /// Earliest time a send would pass the policy; absent when allowed now
    #[schema(value_type = Option<String>, format = DateTime)]
    pub next_allowed_at: Option<Timestamp>,
}

#[derive(Clone)]
pub struct DispatchGateway {
    validator: PhoneValidator,
    policy: QuotaPolicy,
    store: Arc<dyn QuotaStore>,
    provider: Option<Arc<dyn SmsProvider>>,
}

impl DispatchGateway {
    pub fn new(
        validator: PhoneValidator,
        policy: QuotaPolicy,
        store: Arc<dyn QuotaStore>,
        provider: Option<Arc<dyn SmsProvider>>,
    ) -> Self {
        Self {
            validator,
            policy,
            store,
            provider,
        }
    }

    pub fn policy(&self) -> &QuotaPolicy {
        &self.policy
    }

    pub fn store(&self) -> &Arc<dyn QuotaStore> {
        &self.store
    }

    /// Name of the configured provider, if real sends are possible
    pub fn provider_name(&self) -> Option<&'static str> {
        self.provider.as_ref().map(|p| p.name())
    }

    pub async fn submit(&self, request: &NotificationRequest) -> AppResult<DispatchResult> {
        self.submit_at(request, Timestamp::now()).await
    }

    /// `submit` with an explicit clock
    pub async fn submit_at(
        &self,
        request: &NotificationRequest,
        now: Timestamp,
    ) -> AppResult<DispatchResult> {
        let phone = self
            .validator
            .require_valid(PHONE_FIELD, &request.recipient_phone)?;

        if request.simulate_only {
            return self.simulate(phone, now).await;
        }

        let Some(provider) = self.provider.as_ref() else {
            // Quota rejections still win over the missing provider; nothing is recorded.
            let record = self.store.get(&phone).await?;
            self.policy.check(record.as_ref(), now)?;
            return Err(AppError::Configuration {
                key: "twilio".to_string(),
                source: anyhow::anyhow!(
                    "TWILIO_ACCOUNT_SID, TWILIO_AUTH_TOKEN and a sender must be set for real sends"
                ),
            });
        };

        let reservation = match self
            .store
            .try_record_send(&phone, now, &self.policy)
            .await?
        {
            ReserveOutcome::Reserved(reservation) => reservation,
            ReserveOutcome::Rejected(violation) => {
                tracing::info!(
                    phone = %mask(&phone),
                    retry_after_secs = violation.retry_after_secs(),
                    "Dispatch rejected by quota policy"
                );
                return Err(violation.into());
            }
        };

        let message = SmsMessage {
            to: phone.clone(),
            body: compose_body(
                &request.recipient_name,
                &request.scheduled_date,
                request.interval_days,
                request.repeat_mode,
            ),
        };

        match provider.send(&message).await {
            Ok(receipt) => {
                tracing::info!(
                    phone = %mask(&phone),
                    provider = provider.name(),
                    message_id = %receipt.message_id,
                    sends_today = reservation.record.sends_today,
                    "Notification dispatched"
                );
                Ok(DispatchResult {
                    success: true,
                    simulated: false,
                    message_id: Some(receipt.message_id),
                    formatted_phone: phone,
                    sends_today: reservation.record.sends_today,
                    remaining_today: self.policy.remaining(Some(&reservation.record), now),
                    provider: Some(provider.name().to_string()),
                })
            }
            Err(error) => {
                tracing::error!(
                    phone = %mask(&phone),
                    provider = provider.name(),
                    error = %error,
                    "Provider send failed, releasing quota reservation"
                );
                if let Err(release_error) = self.store.release(&reservation).await {
                    tracing::error!(
                        phone = %mask(&phone),
                        error = %release_error,
                        "Failed to release quota reservation"
                    );
                }
                Err(AppError::Provider {
                    provider: provider.name().to_string(),
                    source: error,
                })
            }
        }
    }

    /// All checks, no provider call, no write
    async fn simulate(&self, phone: String, now: Timestamp) -> AppResult<DispatchResult> {
        let record = self.store.get(&phone).await?;
        self.policy.check(record.as_ref(), now)?;

        tracing::info!(phone = %mask(&phone), "Simulated dispatch");
        Ok(DispatchResult {
            success: true,
            simulated: true,
            message_id: None,
            sends_today: sends_today(&self.policy, record.as_ref(), now),
            remaining_today: self.policy.remaining(record.as_ref(), now),
            formatted_phone: phone,
            provider: None,
        })
    }

    pub async fn quota_status(&self, raw_phone: &str) -> AppResult<QuotaStatus> {
        self.quota_status_at(raw_phone, Timestamp::now()).await
    }

    pub async fn quota_status_at(&self, raw_phone: &str, now: Timestamp) -> AppResult<QuotaStatus> {
        let phone = self.validator.require_valid("phone", raw_phone)?;
        let record = self.store.get(&phone).await?;

        let next_allowed_at = match self.policy.check(record.as_ref(), now) {
            Ok(()) => None,
            Err(violation) => {
                let wait = SignedDuration::from_secs(
                    i64::try_from(violation.retry_after_secs()).unwrap_or(i64::MAX),
                );
                now.checked_add(wait).ok()
            }
        };

        Ok(QuotaStatus {
            sends_today: sends_today(&self.policy, record.as_ref(), now),
            remaining_today: self.policy.remaining(record.as_ref(), now),
            max_sends_per_day: self.policy.max_sends_per_day(),
            last_sent_at: record.and_then(|r| r.last_sent_at),
            next_allowed_at,
            formatted_phone: phone,
        })
    }

    /// Drop records that no longer affect decisions
    pub async fn purge_stale(&self, now: Timestamp) -> AppResult<u64> {
        Ok(self.store.purge_stale(now, &self.policy).await?)
    }
}

fn sends_today(policy: &QuotaPolicy, record: Option<&SendQuotaRecord>, now: Timestamp) -> u32 {
    record.map_or(0, |r| r.sends_on(policy.day_of(now)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quota::MemoryQuotaStore;
    use crate::services::notifications::{ProviderError, ProviderReceipt};
    use async_trait::async_trait;
    use jiff::tz::TimeZone;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    const PHONE: &str = "+15551234567";

    #[derive(Default)]
    struct FakeProvider {
        calls: AtomicUsize,
        fail: AtomicBool,
        sent: Mutex<Vec<SmsMessage>>,
    }

    impl FakeProvider {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SmsProvider for FakeProvider {
        async fn send(&self, message: &SmsMessage) -> Result<ProviderReceipt, ProviderError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail.load(Ordering::SeqCst) {
                return Err(ProviderError::Transport("connection reset".to_string()));
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(ProviderReceipt {
                message_id: format!("SM{}", n),
                status: Some("queued".to_string()),
            })
        }

        fn name(&self) -> &'static str {
            "fake"
        }
    }

    struct Harness {
        gateway: DispatchGateway,
        store: Arc<MemoryQuotaStore>,
        provider: Arc<FakeProvider>,
    }

    fn harness() -> Harness {
        let store = Arc::new(MemoryQuotaStore::new());
        let provider = Arc::new(FakeProvider::default());
        let gateway = DispatchGateway::new(
            PhoneValidator::default(),
            QuotaPolicy::new(3, 60, TimeZone::UTC),
            store.clone(),
            Some(provider.clone()),
        );
        Harness {
            gateway,
            store,
            provider,
        }
    }

    fn request(phone: &str) -> NotificationRequest {
        NotificationRequest {
            recipient_name: "Sam".to_string(),
            recipient_phone: phone.to_string(),
            scheduled_date: "2026-04-02".to_string(),
            interval_days: 28,
            repeat_mode: false,
            simulate_only: false,
        }
    }

    fn simulated(phone: &str) -> NotificationRequest {
        NotificationRequest {
            simulate_only: true,
            ..request(phone)
        }
    }

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_missing_plus_is_validation_error_without_side_effects() {
        let h = harness();
        let err = h
            .gateway
            .submit_at(&request("555-123-4567"), ts("2026-03-14T09:00:00Z"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "recipientPhone"));
        assert_eq!(h.provider.calls(), 0);
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn test_real_send_records_and_returns_message_id() {
        let h = harness();
        let result = h
            .gateway
            .submit_at(&request("+1 (555) 123-4567"), ts("2026-03-14T09:00:00Z"))
            .await
            .unwrap();

        assert!(result.success);
        assert!(!result.simulated);
        assert_eq!(result.message_id.as_deref(), Some("SM1"));
        assert_eq!(result.formatted_phone, PHONE);
        assert_eq!(result.sends_today, 1);
        assert_eq!(result.remaining_today, 2);

        let sent = h.provider.sent.lock().unwrap();
        assert_eq!(sent[0].to, PHONE);
        assert!(!sent[0].body.contains(PHONE));
    }

    #[tokio::test]
    async fn test_fourth_same_day_send_hits_daily_limit() {
        let h = harness();
        for time in ["08:00", "09:01", "10:02"] {
            let now = ts(&format!("2026-03-14T{}:00Z", time));
            h.gateway.submit_at(&request(PHONE), now).await.unwrap();
        }

        let err = h
            .gateway
            .submit_at(&request(PHONE), ts("2026-03-14T23:00:00Z"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::RateLimitExceeded {
                retry_after_secs: 3600
            }
        ));
        assert_eq!(h.provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_cooldown_between_sends() {
        let h = harness();
        h.gateway
            .submit_at(&request(PHONE), ts("2026-03-14T09:00:00Z"))
            .await
            .unwrap();

        let err = h
            .gateway
            .submit_at(&request(PHONE), ts("2026-03-14T09:30:00Z"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::CooldownActive {
                retry_after_secs: 1800
            }
        ));

        let result = h
            .gateway
            .submit_at(&request(PHONE), ts("2026-03-14T10:00:00Z"))
            .await
            .unwrap();
        assert_eq!(result.sends_today, 2);
    }

    #[tokio::test]
    async fn test_simulation_never_mutates_or_calls_provider() {
        let h = harness();
        let first = h
            .gateway
            .submit_at(&simulated(PHONE), ts("2026-03-14T09:00:00Z"))
            .await
            .unwrap();
        assert!(first.simulated);
        assert!(first.message_id.is_none());
        assert_eq!(first.sends_today, 0);
        assert_eq!(first.remaining_today, 3);

        h.gateway
            .submit_at(&simulated(PHONE), ts("2026-03-14T09:00:01Z"))
            .await
            .unwrap();

        assert_eq!(h.provider.calls(), 0);
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn test_simulation_still_enforces_policy() {
        let h = harness();
        h.gateway
            .submit_at(&request(PHONE), ts("2026-03-14T09:00:00Z"))
            .await
            .unwrap();
        let before = h.store.get(PHONE).await.unwrap();

        let err = h
            .gateway
            .submit_at(&simulated(PHONE), ts("2026-03-14T09:10:00Z"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::CooldownActive { .. }));
        assert_eq!(h.store.get(PHONE).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_simulation_works_without_provider() {
        let gateway = DispatchGateway::new(
            PhoneValidator::default(),
            QuotaPolicy::new(3, 60, TimeZone::UTC),
            Arc::new(MemoryQuotaStore::new()),
            None,
        );

        let result = gateway
            .submit_at(&simulated(PHONE), ts("2026-03-14T09:00:00Z"))
            .await
            .unwrap();
        assert!(result.simulated);

        let err = gateway
            .submit_at(&request(PHONE), ts("2026-03-14T09:00:00Z"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Configuration { ref key, .. } if key == "twilio"));
        assert!(gateway.store().get(PHONE).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_quota_rejection_precedes_missing_provider() {
        let store = Arc::new(MemoryQuotaStore::new());
        let policy = QuotaPolicy::new(3, 60, TimeZone::UTC);
        store
            .try_record_send(PHONE, ts("2026-03-14T09:00:00Z"), &policy)
            .await
            .unwrap();
        let before = store.get(PHONE).await.unwrap();

        let gateway = DispatchGateway::new(PhoneValidator::default(), policy, store.clone(), None);
        let err = gateway
            .submit_at(&request(PHONE), ts("2026-03-14T09:30:00Z"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::CooldownActive {
                retry_after_secs: 1800
            }
        ));
        assert_eq!(store.get(PHONE).await.unwrap(), before);

        let err = gateway
            .submit_at(&request(PHONE), ts("2026-03-14T10:30:00Z"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Configuration { .. }));
        assert_eq!(store.get(PHONE).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_provider_failure_leaves_quota_unchanged() {
        let h = harness();
        h.gateway
            .submit_at(&request(PHONE), ts("2026-03-14T08:00:00Z"))
            .await
            .unwrap();
        let before = h.store.get(PHONE).await.unwrap();

        h.provider.fail.store(true, Ordering::SeqCst);
        let err = h
            .gateway
            .submit_at(&request(PHONE), ts("2026-03-14T10:00:00Z"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Provider { ref provider, .. } if provider == "fake"));
        assert_eq!(h.store.get(PHONE).await.unwrap(), before);

        h.provider.fail.store(false, Ordering::SeqCst);
        let retry = h
            .gateway
            .submit_at(&request(PHONE), ts("2026-03-14T10:00:05Z"))
            .await
            .unwrap();
        assert_eq!(retry.sends_today, 2);
    }

    #[tokio::test]
    async fn test_failed_first_send_leaves_no_record() {
        let h = harness();
        h.provider.fail.store(true, Ordering::SeqCst);

        let result = h
            .gateway
            .submit_at(&request(PHONE), ts("2026-03-14T08:00:00Z"))
            .await;

        assert!(result.is_err());
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_same_phone_requests_send_once() {
        let h = harness();
        let now = ts("2026-03-14T09:00:00Z");

        let mut handles = Vec::new();
        for _ in 0..8 {
            let gateway = h.gateway.clone();
            handles.push(tokio::spawn(async move {
                gateway.submit_at(&request(PHONE), now).await
            }));
        }

        let mut ok = 0;
        let mut cooldown = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(AppError::CooldownActive { .. }) => cooldown += 1,
                Err(other) => panic!("unexpected error {:?}", other),
            }
        }

        assert_eq!(ok, 1);
        assert_eq!(cooldown, 7);
        assert_eq!(h.provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_quota_status_reports_next_allowed_time() {
        let h = harness();
        h.gateway
            .submit_at(&request(PHONE), ts("2026-03-14T09:00:00Z"))
            .await
            .unwrap();

        let status = h
            .gateway
            .quota_status_at("+1 555 123 4567", ts("2026-03-14T09:15:00Z"))
            .await
            .unwrap();

        assert_eq!(status.formatted_phone, PHONE);
        assert_eq!(status.sends_today, 1);
        assert_eq!(status.remaining_today, 2);
        assert_eq!(status.max_sends_per_day, 3);
        assert_eq!(status.last_sent_at, Some(ts("2026-03-14T09:00:00Z")));
        assert_eq!(status.next_allowed_at, Some(ts("2026-03-14T10:00:00Z")));
    }
}
