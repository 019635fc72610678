use chrono::{DateTime, Utc};

pub const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1_000;

/// Epoch milliseconds at or before which a stream is older than the
/// retention period of its group.
pub fn retention_cutoff_millis(now: DateTime<Utc>, retention_days: u32) -> i64 {
    now.timestamp_millis()
        .saturating_sub(i64::from(retention_days).saturating_mul(MILLIS_PER_DAY))
}

/// Whether `timestamp` lies strictly inside the retention window.
pub fn is_within_retention(timestamp: i64, cutoff: i64) -> bool {
    timestamp > cutoff
}

/// Whole days between `timestamp` and `now`, for log context.
pub fn age_in_days(now: DateTime<Utc>, timestamp: i64) -> i64 {
    now.timestamp_millis().saturating_sub(timestamp) / MILLIS_PER_DAY
}
