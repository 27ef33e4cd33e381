use std::cell::Cell;
use std::time::{Duration, Instant};

/// Monotonic time source driving idle-age computations.
///
/// All pool timestamps are durations since an arbitrary per-clock epoch;
/// only differences between readings are ever interpreted. Injecting the
/// clock keeps every eviction decision a pure function of "now minus
/// insertion time" and makes sweeps testable without sleeping.
pub trait Clock {
    /// Current time since this clock's epoch.
    fn now(&self) -> Duration;
}

/// Wall-clock backed monotonic time source. The default for production.
#[derive(Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-advanced time source for deterministic tests and replay drivers.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Jump to an absolute reading.
    pub fn set(&self, now: Duration) {
        self.now.set(now);
    }

    /// Advance the reading by `delta`.
    pub fn advance(&self, delta: Duration) {
        self.now.set(self.now.get() + delta);
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now(&self) -> Duration {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new();
        assert_eq!(clock.now(), Duration::ZERO);
        clock.advance(Duration::from_secs(5));
        assert_eq!(clock.now(), Duration::from_secs(5));
        clock.set(Duration::from_secs(2));
        assert_eq!(clock.now(), Duration::from_secs(2));
    }

    #[test]
    fn test_monotonic_clock_moves_forward() {
        let clock = MonotonicClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
