//! System clock.

use chrono::{DateTime, Utc};

use crate::ports::clock::Clock;

/// Clock that reads the system time; the default for new file stores.
#[derive(Debug, Default, Clone, Copy)]
pub struct LiveClock;

impl Clock for LiveClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamps_fall_within_the_call() {
        let before = Utc::now();
        let stamp = LiveClock.now();
        assert!(before <= stamp && stamp <= Utc::now());
    }
}
