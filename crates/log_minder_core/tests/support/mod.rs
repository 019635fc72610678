#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use log_minder_core::time::MILLIS_PER_DAY;

pub const NOW_DAY: i64 = 100;

pub fn now() -> DateTime<Utc> {
    Utc.timestamp_millis_opt(NOW_DAY * MILLIS_PER_DAY)
        .single()
        .expect("valid timestamp")
}

/// Epoch milliseconds `age` days before [`now`].
pub fn days_ago(age: i64) -> i64 {
    (NOW_DAY - age) * MILLIS_PER_DAY
}
