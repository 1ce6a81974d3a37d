//! Time sources.

use chrono::{DateTime, Duration, Utc};
use std::cell::Cell;
use std::rc::Rc;

/// Wall-clock source for frame time and the time-filter anchor.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// Seconds since the Unix epoch, with microsecond resolution.
    fn seconds(&self) -> f64 {
        self.now().timestamp_micros() as f64 / 1_000_000.0
    }
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock. Clones share the same instant, so a test can keep a
/// handle and advance the clock an engine owns.
#[derive(Debug, Clone)]
pub struct FixedClock {
    micros: Rc<Cell<i64>>,
}

impl FixedClock {
    #[must_use]
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            micros: Rc::new(Cell::new(at.timestamp_micros())),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.micros.set(at.timestamp_micros());
    }

    pub fn advance(&self, by: Duration) {
        let step = by.num_microseconds().unwrap_or(i64::MAX);
        self.micros.set(self.micros.get().saturating_add(step));
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_micros(self.micros.get()).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fixed_clock_shared_between_clones() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = FixedClock::new(start);
        let handle = clock.clone();
        handle.advance(Duration::milliseconds(1500));
        assert_eq!(clock.now(), start + Duration::milliseconds(1500));
        assert!((clock.seconds() - (start.timestamp() as f64 + 1.5)).abs() < 1e-6);
    }
}
