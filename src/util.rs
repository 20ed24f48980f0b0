use std::time::{SystemTime, UNIX_EPOCH};

use chrono::DateTime;

// Epoch values at or above this are taken as milliseconds, below as seconds.
const EPOCH_MILLIS_FLOOR: i64 = 100_000_000_000;

/// Best-effort parse of an upstream timestamp into epoch milliseconds.
/// Accepts RFC 3339 strings and bare epoch numbers (seconds or millis).
pub(crate) fn parse_timestamp_ms(timestamp: Option<&str>) -> Option<u64> {
    let value = timestamp?.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        let ms = parsed.timestamp_millis();
        return u64::try_from(ms).ok();
    }

    if let Ok(number) = value.parse::<i64>() {
        if number <= 0 {
            return None;
        }
        let ms = if number >= EPOCH_MILLIS_FLOOR {
            number
        } else {
            number.checked_mul(1000)?
        };
        return u64::try_from(ms).ok();
    }

    None
}

pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or(0)
}
