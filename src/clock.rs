//! Time source for date stamps and the notification timer.
//!
//! Everything that needs "now" or "today" goes through a [`Clock`] so tests
//! can drive time by hand with [`ManualClock`].

use std::cell::Cell;
use std::rc::Rc;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

/// A source of the current instant.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar date used for completion stamps and enrollment start dates.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same instant, so a test can keep one handle and give
/// another to the store.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        ManualClock { now: Rc::new(Cell::new(start)) }
    }

    /// Start at midday UTC on the given date, or `None` if the date does not
    /// exist.
    pub fn on(year: i32, month: u32, day: u32) -> Option<Self> {
        let start = Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).single()?;
        Some(Self::new(start))
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, to: DateTime<Utc>) {
        self.now.set(to);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shares_time_between_clones() {
        let clock = ManualClock::on(2025, 3, 6).unwrap();
        let handle = clock.clone();
        handle.advance(Duration::hours(13));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2025, 3, 7).unwrap());
    }

    #[test]
    fn test_manual_clock_rejects_impossible_dates() {
        assert!(ManualClock::on(2025, 2, 30).is_none());
        assert!(ManualClock::on(2025, 13, 1).is_none());
        assert!(ManualClock::on(2024, 2, 29).is_some());
    }
}
