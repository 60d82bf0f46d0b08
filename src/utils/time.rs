use chrono::Utc;
use std::time::Duration;

/// Milliseconds since the Unix epoch
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Whether less than `window` has passed since `timestamp_ms`.
pub fn is_within_window(timestamp_ms: i64, window: Duration) -> bool {
    let window_ms = i64::try_from(window.as_millis()).unwrap_or(i64::MAX);
    now_ms().saturating_sub(timestamp_ms) < window_ms
}
