//! Redis quota store using a bb8 connection pool.
//!
//! One hash per phone, `{prefix}:quota:{phone}` with fields `day`
//! (`YYYY-MM-DD`), `sends` and `last_ms` (unix milliseconds). Check and
//! increment run inside a Lua script, so they are atomic on the server.
//! Keys expire on their own, which makes `purge_stale` a no-op.

use std::collections::HashMap;

use async_trait::async_trait;
use bb8::{Pool, PooledConnection};
use jiff::Timestamp;
use jiff::civil::Date;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, RedisError, Script};

use crate::config::RedisQuotaConfig;
use crate::quota::{
    QuotaPolicy, QuotaStore, QuotaStoreError, QuotaViolation, Reservation, ReserveOutcome,
    SendQuotaRecord,
};

type RedisPool = Pool<Client>;

/// Keys outlive the day they count plus one cooldown
const MIN_KEY_TTL_SECS: i64 = 2 * 24 * 60 * 60;

const RESERVE_SCRIPT: &str = r#"
local prev = redis.call('HMGET', KEYS[1], 'day', 'sends', 'last_ms')
local day = prev[1]
local sends = tonumber(prev[2]) or 0
local last_ms = tonumber(prev[3])
local now_ms = tonumber(ARGV[2])

local current = 0
if day == ARGV[1] then
  current = sends
end

local verdict = 1
if current >= tonumber(ARGV[3]) then
  verdict = 0
elseif last_ms and now_ms - last_ms < tonumber(ARGV[4]) then
  verdict = 0
end

if verdict == 1 then
  redis.call('HSET', KEYS[1], 'day', ARGV[1], 'sends', current + 1, 'last_ms', ARGV[2])
  redis.call('EXPIRE', KEYS[1], ARGV[5])
end

return {verdict, day or '', sends, prev[3] or ''}
"#;

const RELEASE_SCRIPT: &str = r#"
if redis.call('HGET', KEYS[1], 'last_ms') ~= ARGV[1] then
  return 0
end
if ARGV[2] == '' then
  redis.call('DEL', KEYS[1])
  return 1
end
redis.call('HSET', KEYS[1], 'day', ARGV[2], 'sends', ARGV[3])
if ARGV[4] == '' then
  redis.call('HDEL', KEYS[1], 'last_ms')
else
  redis.call('HSET', KEYS[1], 'last_ms', ARGV[4])
end
return 1
"#;

pub struct RedisQuotaStore {
    pool: RedisPool,
    key_prefix: String,
    reserve: Script,
    release: Script,
}

impl RedisQuotaStore {
    pub async fn new(config: &RedisQuotaConfig) -> Result<Self, QuotaStoreError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| QuotaStoreError::Connection(e.to_string()))?;

        let pool = Pool::builder()
            .max_size(config.pool_size)
            .connection_timeout(std::time::Duration::from_secs(config.connection_timeout))
            .build(client)
            .await
            .map_err(|e| QuotaStoreError::Connection(e.to_string()))?;

        Ok(Self {
            pool,
            key_prefix: format!("{}:quota", config.key_prefix),
            reserve: Script::new(RESERVE_SCRIPT),
            release: Script::new(RELEASE_SCRIPT),
        })
    }

    fn key(&self, phone: &str) -> String {
        format!("{}:{}", self.key_prefix, phone)
    }

    async fn get_conn(&self) -> Result<PooledConnection<'_, Client>, QuotaStoreError> {
        self.pool
            .get()
            .await
            .map_err(|e| QuotaStoreError::Connection(e.to_string()))
    }
}

fn operation(e: RedisError) -> QuotaStoreError {
    QuotaStoreError::Operation(e.to_string())
}

fn key_ttl_secs(policy: &QuotaPolicy) -> i64 {
    let cooldown_with_margin = policy.cooldown().as_secs() + 24 * 60 * 60;
    cooldown_with_margin.max(MIN_KEY_TTL_SECS)
}

fn millis_to_timestamp(ms: &str) -> Result<Option<Timestamp>, QuotaStoreError> {
    if ms.is_empty() {
        return Ok(None);
    }
    let ms: i64 = ms
        .parse()
        .map_err(|_| QuotaStoreError::Corrupt(format!("last_ms '{}' is not an integer", ms)))?;
    Timestamp::from_millisecond(ms)
        .map(Some)
        .map_err(|e| QuotaStoreError::Corrupt(e.to_string()))
}

/// Rebuild a record from its hash fields; `day == ""` means no record.
fn decode_record(
    day: &str,
    sends: i64,
    last_ms: &str,
) -> Result<Option<SendQuotaRecord>, QuotaStoreError> {
    if day.is_empty() {
        return Ok(None);
    }
    let quota_day: Date = day
        .parse()
        .map_err(|e: jiff::Error| QuotaStoreError::Corrupt(e.to_string()))?;
    let sends_today = u32::try_from(sends)
        .map_err(|_| QuotaStoreError::Corrupt(format!("sends '{}' out of range", sends)))?;
    Ok(Some(SendQuotaRecord::new(
        quota_day,
        sends_today,
        millis_to_timestamp(last_ms)?,
    )))
}

fn encode_last_ms(record: &SendQuotaRecord) -> String {
    record
        .last_sent_at
        .map(|t| t.as_millisecond().to_string())
        .unwrap_or_default()
}

#[async_trait]
impl QuotaStore for RedisQuotaStore {
    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, phone: &str) -> Result<Option<SendQuotaRecord>, QuotaStoreError> {
        let mut conn = self.get_conn().await?;
        let conn_ref: &mut MultiplexedConnection = &mut conn;

        let fields: HashMap<String, String> =
            conn_ref.hgetall(self.key(phone)).await.map_err(operation)?;

        let Some(day) = fields.get("day") else {
            return Ok(None);
        };
        let sends = fields
            .get("sends")
            .map(|s| s.parse::<i64>())
            .transpose()
            .map_err(|e| QuotaStoreError::Corrupt(e.to_string()))?
            .unwrap_or(0);
        let last_ms = fields.get("last_ms").map(String::as_str).unwrap_or("");

        decode_record(day, sends, last_ms)
    }

    async fn try_record_send(
        &self,
        phone: &str,
        now: Timestamp,
        policy: &QuotaPolicy,
    ) -> Result<ReserveOutcome, QuotaStoreError> {
        // Stored precision is milliseconds; the reservation must match what is stored.
        let now = Timestamp::from_millisecond(now.as_millisecond())
            .map_err(|e| QuotaStoreError::Operation(e.to_string()))?;
        let today = policy.day_of(now);

        let mut conn = self.get_conn().await?;
        let conn_ref: &mut MultiplexedConnection = &mut conn;

        let (verdict, day, sends, last_ms): (i64, String, i64, String) = self
            .reserve
            .key(self.key(phone))
            .arg(today.to_string())
            .arg(now.as_millisecond())
            .arg(policy.max_sends_per_day())
            .arg(policy.cooldown().as_millis() as i64)
            .arg(key_ttl_secs(policy))
            .invoke_async(conn_ref)
            .await
            .map_err(operation)?;

        let previous = decode_record(&day, sends, &last_ms)?;

        if verdict == 1 {
            return Ok(ReserveOutcome::Reserved(Reservation {
                phone: phone.to_string(),
                previous,
                record: policy.apply(previous.as_ref(), now),
            }));
        }

        // The script and the policy agree except at sub-millisecond edges.
        let violation = policy
            .check(previous.as_ref(), now)
            .err()
            .unwrap_or(QuotaViolation::Cooldown {
                retry_after_secs: 1,
            });
        Ok(ReserveOutcome::Rejected(violation))
    }

    async fn release(&self, reservation: &Reservation) -> Result<(), QuotaStoreError> {
        let mut conn = self.get_conn().await?;
        let conn_ref: &mut MultiplexedConnection = &mut conn;

        let (prev_day, prev_sends, prev_last_ms) = match &reservation.previous {
            Some(previous) => (
                previous.quota_day.to_string(),
                previous.sends_today.to_string(),
                encode_last_ms(previous),
            ),
            None => (String::new(), String::new(), String::new()),
        };

        let _restored: i64 = self
            .release
            .key(self.key(&reservation.phone))
            .arg(encode_last_ms(&reservation.record))
            .arg(prev_day)
            .arg(prev_sends)
            .arg(prev_last_ms)
            .invoke_async(conn_ref)
            .await
            .map_err(operation)?;

        Ok(())
    }

    async fn purge_stale(
        &self,
        _now: Timestamp,
        _policy: &QuotaPolicy,
    ) -> Result<u64, QuotaStoreError> {
        Ok(0)
    }

    async fn health_check(&self) -> Result<(), QuotaStoreError> {
        let mut conn = self.get_conn().await?;
        let conn_ref: &mut MultiplexedConnection = &mut conn;
        redis::cmd("PING")
            .query_async::<String>(conn_ref)
            .await
            .map(|_| ())
            .map_err(operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;
    use jiff::tz::TimeZone;

    #[test]
    fn test_decode_missing_record() {
        assert_eq!(decode_record("", 0, "").unwrap(), None);
    }

    #[test]
    fn test_decode_full_record() {
        let record = decode_record("2026-03-14", 2, "1773478800000")
            .unwrap()
            .unwrap();
        assert_eq!(record.quota_day, date(2026, 3, 14));
        assert_eq!(record.sends_today, 2);
        assert_eq!(
            record.last_sent_at,
            Some(Timestamp::from_millisecond(1_773_478_800_000).unwrap())
        );
        assert_eq!(encode_last_ms(&record), "1773478800000");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_record("yesterday", 1, ""),
            Err(QuotaStoreError::Corrupt(_))
        ));
        assert!(matches!(
            decode_record("2026-03-14", -1, ""),
            Err(QuotaStoreError::Corrupt(_))
        ));
        assert!(matches!(
            decode_record("2026-03-14", 1, "soon"),
            Err(QuotaStoreError::Corrupt(_))
        ));
    }

    #[test]
    fn test_key_ttl_covers_long_cooldowns() {
        let short = QuotaPolicy::new(3, 60, TimeZone::UTC);
        assert_eq!(key_ttl_secs(&short), MIN_KEY_TTL_SECS);

        let long = QuotaPolicy::new(3, 4 * 24 * 60, TimeZone::UTC);
        assert_eq!(key_ttl_secs(&long), 5 * 24 * 60 * 60);
    }
}
