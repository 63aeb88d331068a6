//! Deterministic clock for in-memory wiring and tests.

use chrono::{DateTime, Duration, Local, Utc};
use mockable::Clock;
use std::sync::Mutex;

/// Clock that advances by a fixed step every time it is read.
///
/// Successive reads are strictly increasing, which keeps snapshot ordering
/// deterministic without sleeping.
#[derive(Debug)]
pub struct SteppingClock {
    now: Mutex<DateTime<Utc>>,
    step: Duration,
}

impl SteppingClock {
    /// Creates a clock starting at `start` and stepping one second per read.
    #[must_use]
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self::with_step(start, Duration::seconds(1))
    }

    /// Creates a clock with an explicit step.
    #[must_use]
    pub const fn with_step(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            now: Mutex::new(start),
            step,
        }
    }

    /// Moves the clock forward without reading it.
    pub fn advance(&self, by: Duration) {
        let mut guard = self
            .now
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard += by;
    }

    /// Returns the time the next read will report, without advancing.
    #[must_use]
    pub fn peek(&self) -> DateTime<Utc> {
        *self
            .now
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Clock for SteppingClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        let mut guard = self
            .now
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let current = *guard;
        *guard = current + self.step;
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_are_strictly_increasing() {
        let clock = SteppingClock::starting_at(Utc::now());

        let first = clock.utc();
        let second = clock.utc();

        assert_eq!(second - first, Duration::seconds(1));
    }

    #[test]
    fn advance_moves_the_next_read() {
        let start = Utc::now();
        let clock = SteppingClock::with_step(start, Duration::zero());

        clock.advance(Duration::hours(2));

        assert_eq!(clock.peek(), start + Duration::hours(2));
        assert_eq!(clock.utc(), start + Duration::hours(2));
    }
}
