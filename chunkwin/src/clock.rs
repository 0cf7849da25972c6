//! Tick sources for the reservoir driver.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, Instant};

/// A monotonic source of nanosecond ticks.
///
/// Only differences between ticks are meaningful; the origin is arbitrary.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current tick in nanoseconds.
    fn tick(&self) -> i64;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn tick(&self) -> i64 {
        (**self).tick()
    }
}

/// Clock backed by [`Instant`], counting nanoseconds since construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Creates a clock whose tick 0 is now.
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
    #[allow(clippy::cast_possible_truncation)] // i64 nanoseconds cover ~292 years of uptime
    fn tick(&self) -> i64 {
        self.origin.elapsed().as_nanos() as i64
    }
}

/// Clock that only moves when told to. Used by tests and replays.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use chunkwin::clock::{Clock, ManualClock};
///
/// let clock = ManualClock::new(0);
/// clock.advance(Duration::from_millis(5));
/// assert_eq!(clock.tick(), 5_000_000);
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    nanos: AtomicI64,
}

impl ManualClock {
    /// Creates a clock reading `start` nanoseconds.
    pub fn new(start: i64) -> Self {
        Self {
            nanos: AtomicI64::new(start),
        }
    }

    /// Moves the clock forward, wrapping on `i64` overflow.
    #[allow(clippy::cast_possible_truncation)] // wrapping is the intended behavior
    pub fn advance(&self, by: Duration) {
        let delta = by.as_nanos() as i64;
        // fetch_add wraps on overflow.
        self.nanos.fetch_add(delta, Ordering::SeqCst);
    }

    /// Sets the clock to an absolute tick.
    pub fn set(&self, nanos: i64) {
        self.nanos.store(nanos, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn tick(&self) -> i64 {
        self.nanos.load(Ordering::SeqCst)
    }
}
