//! Timestamp helpers.

use chrono::Utc;

/// Get the current Unix timestamp in milliseconds (UTC).
pub fn get_unix_timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}
