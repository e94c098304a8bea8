//! Sources of monotonic time for a recorder.

use std::{
    cell::Cell,
    rc::Rc,
    time::{Duration, Instant},
};

/// A source of monotonic instants.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// The system's monotonic clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock which only moves when told to.
///
/// Clones share the same time, so a test can keep one clone to advance while the recorder owns
/// another.
#[derive(Clone, Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }

    /// The time the clock has been advanced by since it was created.
    pub fn elapsed(&self) -> Duration {
        self.offset.get()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + self.offset.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_time() {
        let clock = ManualClock::new();
        let other = clock.clone();
        let start = other.now();

        clock.advance(Duration::from_millis(5));

        assert_eq!(other.now() - start, Duration::from_millis(5));
        assert_eq!(other.elapsed(), Duration::from_millis(5));
    }
}
