//! Settable clock for deterministic modification times.

use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;

use crate::ports::clock::Clock;

/// Clock that returns a pinned instant until moved.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    /// Pins the clock at `at`.
    #[must_use]
    pub fn at(at: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(at) }
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }

    /// Pins the clock at `at`.
    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock() = at;
    }
}

impl Default for FixedClock {
    fn default() -> Self {
        Self::at(Utc.timestamp_opt(0, 0).single().unwrap_or_default())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holds_until_advanced() {
        let clock = FixedClock::default();
        let start = clock.now();
        assert_eq!(clock.now(), start);
        clock.advance(Duration::minutes(2));
        assert_eq!(clock.now() - start, Duration::minutes(2));
    }
}
