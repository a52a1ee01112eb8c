//! Wall-clock helpers.
//!
//! Every component takes `now_ms` (milliseconds since the Unix epoch) as an
//! argument so tests can drive time explicitly; drivers pass [`now_ms`].

use chrono::{DateTime, Utc};

pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Convert an epoch-millisecond instant into an event timestamp.
pub fn timestamp(ms: u64) -> DateTime<Utc> {
    i64::try_from(ms)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or_default()
}
