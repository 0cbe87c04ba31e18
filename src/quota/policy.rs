//! Daily cap and cooldown rules.
//!
//! Pure functions of a record and `now`; every store backend applies the
//! same rules, some of them re-expressed server side (Lua, SQL).

use jiff::civil::Date;
use jiff::tz::TimeZone;
use jiff::{SignedDuration, Timestamp};

use crate::config::QuotaConfig;
use crate::config::error::ConfigError;
use crate::error::AppError;
use crate::quota::SendQuotaRecord;

/// Why a send was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaViolation {
    /// `max_sends_per_day` already reached for the current day
    DailyLimit { retry_after_secs: u64 },
    /// Previous send is more recent than the cooldown
    Cooldown { retry_after_secs: u64 },
}

impl QuotaViolation {
    pub fn retry_after_secs(&self) -> u64 {
        match self {
            QuotaViolation::DailyLimit { retry_after_secs }
            | QuotaViolation::Cooldown { retry_after_secs } => *retry_after_secs,
        }
    }
}

impl From<QuotaViolation> for AppError {
    fn from(violation: QuotaViolation) -> Self {
        match violation {
            QuotaViolation::DailyLimit { retry_after_secs } => {
                AppError::RateLimitExceeded { retry_after_secs }
            }
            QuotaViolation::Cooldown { retry_after_secs } => {
                AppError::CooldownActive { retry_after_secs }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct QuotaPolicy {
    max_sends_per_day: u32,
    cooldown: SignedDuration,
    time_zone: TimeZone,
}

impl QuotaPolicy {
    pub fn new(max_sends_per_day: u32, cooldown_minutes: u32, time_zone: TimeZone) -> Self {
        Self {
            max_sends_per_day,
            cooldown: SignedDuration::from_mins(i64::from(cooldown_minutes)),
            time_zone,
        }
    }

    pub fn from_config(config: &QuotaConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.max_sends_per_day,
            config.cooldown_minutes,
            config.time_zone()?,
        ))
    }

    pub fn max_sends_per_day(&self) -> u32 {
        self.max_sends_per_day
    }

    pub fn cooldown(&self) -> SignedDuration {
        self.cooldown
    }

    /// Calendar day `at` falls on in the policy's zone
    pub fn day_of(&self, at: Timestamp) -> Date {
        at.to_zoned(self.time_zone.clone()).date()
    }

    /// Daily cap first, then cooldown.
    pub fn check(&self, record: Option<&SendQuotaRecord>, now: Timestamp) -> Result<(), QuotaViolation> {
        let Some(record) = record else {
            return Ok(());
        };

        let cooldown_left = self.cooldown_left(record, now);

        if record.sends_on(self.day_of(now)) >= self.max_sends_per_day {
            // A cooldown started late in the evening can outlast midnight.
            let retry_after_secs = self
                .secs_until_next_day(now)
                .max(cooldown_left.map_or(0, ceil_secs));
            return Err(QuotaViolation::DailyLimit { retry_after_secs });
        }

        if let Some(left) = cooldown_left {
            return Err(QuotaViolation::Cooldown {
                retry_after_secs: ceil_secs(left),
            });
        }

        Ok(())
    }

    /// Time until the cooldown of the last send runs out, `None` when it already has
    fn cooldown_left(&self, record: &SendQuotaRecord, now: Timestamp) -> Option<SignedDuration> {
        let last = record.last_sent_at?;
        let elapsed = now.duration_since(last);
        (elapsed < self.cooldown).then(|| self.cooldown - elapsed)
    }

    /// Record after one more accepted send at `now`
    pub fn apply(&self, record: Option<&SendQuotaRecord>, now: Timestamp) -> SendQuotaRecord {
        let today = self.day_of(now);
        let sends = record.map_or(0, |r| r.sends_on(today));
        SendQuotaRecord::new(today, sends.saturating_add(1), Some(now))
    }

    pub fn remaining(&self, record: Option<&SendQuotaRecord>, now: Timestamp) -> u32 {
        let used = record.map_or(0, |r| r.sends_on(self.day_of(now)));
        self.max_sends_per_day.saturating_sub(used)
    }

    /// A record from an earlier day whose cooldown has run out carries no
    /// information and can be dropped.
    pub fn is_stale(&self, record: &SendQuotaRecord, now: Timestamp) -> bool {
        if record.quota_day >= self.day_of(now) {
            return false;
        }
        record
            .last_sent_at
            .is_none_or(|last| now.duration_since(last) >= self.cooldown)
    }

    fn secs_until_next_day(&self, now: Timestamp) -> u64 {
        let next_midnight = self
            .day_of(now)
            .tomorrow()
            .and_then(|day| day.to_zoned(self.time_zone.clone()));

        match next_midnight {
            Ok(start) => ceil_secs(start.timestamp().duration_since(now)),
            Err(_) => 24 * 60 * 60,
        }
    }
}

/// Whole seconds, rounded up, never below 1
fn ceil_secs(duration: SignedDuration) -> u64 {
    let mut secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs += 1;
    }
    u64::try_from(secs).unwrap_or(0).max(1)
}
