use diesel::prelude::*;
use jiff_diesel::ToDiesel;

use crate::quota::SendQuotaRecord;

/// Row of `send_quotas`
#[derive(Debug, Queryable, Selectable, Clone)]
#[diesel(table_name = crate::schema::send_quotas)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SendQuotaRow {
    pub phone: String,
    pub quota_day: jiff_diesel::Date,
    pub sends_today: i32,
    pub last_sent_at: Option<jiff_diesel::Timestamp>,
}

impl SendQuotaRow {
    pub fn into_record(self) -> SendQuotaRecord {
        SendQuotaRecord::new(
            self.quota_day.to_jiff(),
            u32::try_from(self.sends_today).unwrap_or(0),
            self.last_sent_at.map(|t| t.to_jiff()),
        )
    }
}

/// Insert / full overwrite of a quota row; `None` clears `last_sent_at`.
#[derive(Debug, Insertable, AsChangeset, Clone)]
#[diesel(table_name = crate::schema::send_quotas)]
#[diesel(primary_key(phone))]
#[diesel(treat_none_as_null = true)]
pub struct SendQuotaChanges {
    pub phone: String,
    pub quota_day: jiff_diesel::Date,
    pub sends_today: i32,
    pub last_sent_at: Option<jiff_diesel::Timestamp>,
    pub updated_at: jiff_diesel::Timestamp,
}

impl SendQuotaChanges {
    pub fn from_record(phone: &str, record: &SendQuotaRecord) -> Self {
        Self {
            phone: phone.to_string(),
            quota_day: record.quota_day.to_diesel(),
            sends_today: i32::try_from(record.sends_today).unwrap_or(i32::MAX),
            last_sent_at: record.last_sent_at.map(|t| t.to_diesel()),
            updated_at: jiff::Timestamp::now().to_diesel(),
        }
    }
}
