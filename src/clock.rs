//! Time source abstraction.
//!
//! Every date-sensitive rule (past check-in, promotion windows, reward
//! cooldowns) reads time through a [`Clock`] so the engine stays
//! deterministic under test.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use parking_lot::Mutex;

/// A source of the current instant.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Today's calendar date (UTC). Time of day is discarded.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to a chosen instant, movable forward by tests.
///
/// # Example
///
/// ```
/// use stay_engine::clock::{Clock, FixedClock};
/// use chrono::{Duration, TimeZone, Utc};
///
/// let clock = FixedClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap());
/// clock.advance(Duration::hours(24));
/// assert_eq!(clock.today().to_string(), "2026-03-02");
/// ```
#[derive(Debug)]
pub struct FixedClock {
    instant: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    /// Creates a clock reading `instant`.
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self {
            instant: Mutex::new(instant),
        }
    }

    /// Moves the clock forward (or backward, for negative durations).
    pub fn advance(&self, by: Duration) {
        let mut instant = self.instant.lock();
        *instant += by;
    }

    /// Pins the clock to a new instant.
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.instant.lock() = instant;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.instant.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_today_ignores_time_of_day() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2026, 3, 10, 23, 59, 59).unwrap());
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 3, 10).unwrap());
    }

    #[test]
    fn test_set_replaces_instant() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap());
        let later = Utc.with_ymd_and_hms(2026, 4, 1, 12, 0, 0).unwrap();
        clock.set(later);
        assert_eq!(clock.now(), later);
    }
}
