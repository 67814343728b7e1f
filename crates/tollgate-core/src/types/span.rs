//! Conversions from configured counts to `chrono` spans.
//!
//! Settings arrive as unsigned counts that may be arbitrarily large. These
//! helpers saturate at the largest representable value instead of panicking.

use chrono::{DateTime, Duration, Utc};

/// `seconds` as a duration, saturating at [`Duration::MAX`].
pub fn saturating_seconds(seconds: u64) -> Duration {
    i64::try_from(seconds)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

/// `minutes` as a duration, saturating at [`Duration::MAX`].
pub fn saturating_minutes(minutes: u64) -> Duration {
    i64::try_from(minutes)
        .ok()
        .and_then(Duration::try_minutes)
        .unwrap_or(Duration::MAX)
}

/// `days` as a duration, saturating at [`Duration::MAX`].
pub fn saturating_days(days: u64) -> Duration {
    i64::try_from(days)
        .ok()
        .and_then(Duration::try_days)
        .unwrap_or(Duration::MAX)
}

/// `start + span`, saturating at the latest representable instant.
pub fn saturating_add(start: DateTime<Utc>, span: Duration) -> DateTime<Utc> {
    start.checked_add_signed(span).unwrap_or(DateTime::<Utc>::MAX_UTC)
}
