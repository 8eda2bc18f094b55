//! Time source abstraction for quota-window math
//!
//! Quota windows are pinned to UTC: when a community has no explicit reset
//! timestamp, the window opens at midnight UTC of the current day. A
//! server-local-midnight policy would make the window depend on deployment
//! geography.

use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of "now" for all ledger components
///
/// Production code uses [`SystemTimeSource`]; tests pin time with
/// [`ManualTimeSource`] so window boundaries are deterministic.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time source
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually-advanced time source for tests
///
/// Stores microseconds since the Unix epoch so advancing is a single
/// atomic operation.
#[derive(Debug)]
pub struct ManualTimeSource {
    micros: AtomicI64,
}

impl ManualTimeSource {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            micros: AtomicI64::new(start.timestamp_micros()),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.micros.store(at.timestamp_micros(), Ordering::SeqCst);
    }

    pub fn advance(&self, duration: chrono::Duration) {
        self.micros
            .fetch_add(duration.num_microseconds().unwrap_or(0), Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc.timestamp_micros(self.micros.load(Ordering::SeqCst))
            .single()
            .unwrap_or_else(Utc::now)
    }
}

/// Midnight UTC of the day containing `at`
pub fn midnight_utc(at: DateTime<Utc>) -> DateTime<Utc> {
    at.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .unwrap_or(at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn test_midnight_utc() {
        let at = ts("2026-03-15T17:42:10Z");
        assert_eq!(midnight_utc(at), ts("2026-03-15T00:00:00Z"));
        // Already midnight stays put
        assert_eq!(
            midnight_utc(ts("2026-03-15T00:00:00Z")),
            ts("2026-03-15T00:00:00Z")
        );
    }

    #[test]
    fn test_manual_time_source() {
        let clock = ManualTimeSource::new(ts("2026-01-01T12:00:00Z"));
        assert_eq!(clock.now(), ts("2026-01-01T12:00:00Z"));

        clock.advance(Duration::hours(13));
        assert_eq!(clock.now(), ts("2026-01-02T01:00:00Z"));

        clock.set(ts("2026-06-01T00:00:00Z"));
        assert_eq!(clock.now(), ts("2026-06-01T00:00:00Z"));
    }
}
