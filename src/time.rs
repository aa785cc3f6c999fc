//! Wall-clock and monotonic time helpers (C1).
//!
//! `now_ms` and `now_monotonic_ns` mirror `original_source/src/utils/time_utils.c`'s
//! `CLOCK_REALTIME`/`CLOCK_MONOTONIC` pair. Rust's `Instant` has no
//! fixed epoch, so monotonic nanoseconds are measured from a
//! process-lifetime anchor captured the first time it's read.

use chrono::{FixedOffset, Local, TimeZone};
use std::sync::OnceLock;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

static MONOTONIC_ANCHOR: OnceLock<Instant> = OnceLock::new();

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    let dur = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before 1970");
    dur.as_millis() as i64
}

/// Current monotonic time in nanoseconds, anchored at first call.
/// Only differences between two calls are meaningful.
pub fn now_monotonic_ns() -> i64 {
    let anchor = MONOTONIC_ANCHOR.get_or_init(Instant::now);
    anchor.elapsed().as_nanos() as i64
}

/// Minute timestamp (ms, floored to a whole minute) containing `ms`.
pub fn floor_to_minute_ms(ms: i64) -> i64 {
    const MS_PER_MINUTE: i64 = 60_000;
    (ms.div_euclid(MS_PER_MINUTE)) * MS_PER_MINUTE
}

/// Formats a minute-aligned millisecond timestamp as
/// `YYYY-MM-DDTHH:MM:00±HHMM`, in local time.
pub fn format_minute_iso(minute_ts_ms: i64) -> String {
    format_minute_iso_at(minute_ts_ms, None)
}

/// Same as [`format_minute_iso`], but with an explicit offset for
/// deterministic test fixtures (spec §9's local-timezone open question).
pub fn format_minute_iso_at(minute_ts_ms: i64, offset: Option<FixedOffset>) -> String {
    let secs = minute_ts_ms.div_euclid(1000);
    match offset {
        Some(off) => off
            .timestamp_opt(secs, 0)
            .single()
            .expect("valid minute timestamp")
            .format("%Y-%m-%dT%H:%M:00%z")
            .to_string(),
        None => Local
            .timestamp_opt(secs, 0)
            .single()
            .expect("valid minute timestamp")
            .format("%Y-%m-%dT%H:%M:00%z")
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn floors_to_minute_boundary() {
        assert_eq!(floor_to_minute_ms(125_999), 60_000);
        assert_eq!(floor_to_minute_ms(60_000), 60_000);
        assert_eq!(floor_to_minute_ms(0), 0);
    }

    #[test]
    fn formats_minute_iso_with_fixed_offset() {
        // 2021-01-01T00:00:00Z
        let utc = FixedOffset::east_opt(0).unwrap();
        let s = format_minute_iso_at(1_609_459_200_000, Some(utc));
        assert_eq!(s, "2021-01-01T00:00:00+0000");
    }

    #[test]
    fn monotonic_ns_is_nondecreasing() {
        let a = now_monotonic_ns();
        let b = now_monotonic_ns();
        assert!(b >= a);
    }
}
