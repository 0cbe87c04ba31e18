//! Per-recipient send counter.

use jiff::Timestamp;
use jiff::civil::Date;
use serde::{Deserialize, Serialize};

/// Sends accepted for one normalized phone.
///
/// `sends_today` counts sends on `quota_day` only; once the calendar day
/// moves on the counter is logically zero without any write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendQuotaRecord {
    pub quota_day: Date,
    pub sends_today: u32,
    pub last_sent_at: Option<Timestamp>,
}

impl SendQuotaRecord {
    pub fn new(quota_day: Date, sends_today: u32, last_sent_at: Option<Timestamp>) -> Self {
        Self {
            quota_day,
            sends_today,
            last_sent_at,
        }
    }

    /// Sends that count against `day`
    pub fn sends_on(&self, day: Date) -> u32 {
        if self.quota_day == day {
            self.sends_today
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;

    #[test]
    fn test_sends_on_resets_on_other_days() {
        let record = SendQuotaRecord::new(date(2026, 3, 14), 2, None);
        assert_eq!(record.sends_on(date(2026, 3, 14)), 2);
        assert_eq!(record.sends_on(date(2026, 3, 15)), 0);
    }
}
