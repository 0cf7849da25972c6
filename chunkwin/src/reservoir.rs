//! Sliding time-window reservoir driver.
//!
//! [`SlidingWindowReservoir`] keeps every sample recorded within the last
//! `window` of clock time. It turns clock readings into strictly increasing
//! [`Tick`]s, stores samples in a [`WindowedArray`], and periodically trims
//! the array to the retention window.
//!
//! # Tick generation
//!
//! Clock nanoseconds are multiplied by [`COLLISION_BUFFER`], leaving room for
//! up to 256 distinct ticks per nanosecond. When the clock has not moved
//! since the previous tick, the previous tick plus one is used instead:
//!
//! ```text
//! clock (ns):   1000        1000        1000        1001
//! tick:         256000      256001      256002      256256
//! ```
//!
//! Ticks wrap after roughly 417 days of elapsed clock time. On wrap the
//! reservoir discards everything and starts over; window enforcement uses
//! `clear_range` for the wrapped interval.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

use crate::array::WindowedArray;
use crate::chunk::Tick;
use crate::clock::{Clock, MonotonicClock};
use crate::config::ReservoirConfig;
use crate::error::Result;

/// Distinct ticks available per clock nanosecond.
pub const COLLISION_BUFFER: i64 = 256;

/// Slack above the newest tick that window enforcement keeps: one hour.
const CLEAR_BUFFER: i64 = 3_600_000_000_000 * COLLISION_BUFFER;

/// Retains samples whose arrival falls inside a sliding time window.
///
/// All methods take `&self`; the reservoir can be shared across threads.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use std::time::Duration;
/// use chunkwin::clock::ManualClock;
/// use chunkwin::config::ReservoirConfig;
/// use chunkwin::reservoir::SlidingWindowReservoir;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let clock = Arc::new(ManualClock::new(0));
/// let config = ReservoirConfig::new(Duration::from_secs(10))?;
/// let reservoir = SlidingWindowReservoir::with_clock(config, Arc::clone(&clock))?;
///
/// reservoir.update(1);
/// clock.advance(Duration::from_secs(6));
/// reservoir.update(2);
/// clock.advance(Duration::from_secs(6));
///
/// assert_eq!(reservoir.values(), vec![2]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SlidingWindowReservoir<C = MonotonicClock> {
    clock: C,
    measurements: WindowedArray<i64>,
    /// Clock reading at construction.
    origin: i64,
    /// Window length in ticks.
    window: Tick,
    trim_threshold: u64,
    last_tick: AtomicI64,
    updates: AtomicU64,
}

impl SlidingWindowReservoir<MonotonicClock> {
    /// Creates a reservoir driven by the monotonic system clock.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`](crate::error::ConfigError) if the
    /// configuration is invalid.
    pub fn new(config: ReservoirConfig) -> Result<Self> {
        Self::with_clock(config, MonotonicClock::new())
    }
}

impl<C: Clock> SlidingWindowReservoir<C> {
    /// Creates a reservoir driven by `clock`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`](crate::error::ConfigError) if the
    /// configuration is invalid.
    pub fn with_clock(config: ReservoirConfig, clock: C) -> Result<Self> {
        config.validate()?;

        let measurements = WindowedArray::with_config(config.array())?;
        let window_nanos = i64::try_from(config.window.as_nanos()).unwrap_or(i64::MAX);
        let origin = clock.tick();

        Ok(Self {
            clock,
            measurements,
            origin,
            window: window_nanos.saturating_mul(COLLISION_BUFFER),
            trim_threshold: config.trim_threshold,
            last_tick: AtomicI64::new(0),
            updates: AtomicU64::new(0),
        })
    }

    /// Retention window length.
    #[allow(clippy::cast_sign_loss)] // window is validated positive
    pub fn window(&self) -> Duration {
        Duration::from_nanos((self.window / COLLISION_BUFFER) as u64)
    }

    /// Records a sample at the current clock time.
    pub fn update(&self, value: i64) {
        loop {
            let updates = self.updates.fetch_add(1, Ordering::Relaxed) + 1;
            if updates % self.trim_threshold == 0 {
                self.trim();
            }

            let (previous, tick) = self.next_tick();
            if tick < previous {
                tracing::debug!(previous, tick, "tick overflow, clearing reservoir");
                self.measurements.clear_all();
            }

            // A concurrent writer may have stored a larger tick first; retry
            // with a fresh one.
            if self.measurements.put(tick, value) {
                return;
            }
        }
    }

    /// Number of samples inside the window.
    pub fn size(&self) -> usize {
        self.trim();
        self.measurements.size()
    }

    /// Samples inside the window, oldest first.
    pub fn values(&self) -> Vec<i64> {
        self.trim();
        self.measurements.values()
    }

    /// Discards every sample.
    pub fn clear(&self) {
        self.measurements.clear_all();
    }

    /// Borrows the underlying array for diagnostics.
    pub fn measurements(&self) -> &WindowedArray<i64> {
        &self.measurements
    }

    /// Returns `(previous, next)` where `next` is strictly greater than
    /// `previous` unless the tick space wrapped.
    fn next_tick(&self) -> (Tick, Tick) {
        loop {
            let previous = self.last_tick.load(Ordering::Acquire);
            let raw = self
                .clock
                .tick()
                .wrapping_sub(self.origin)
                .wrapping_mul(COLLISION_BUFFER);
            let next = if raw.wrapping_sub(previous) > 0 {
                raw
            } else {
                previous.wrapping_add(1)
            };

            if self
                .last_tick
                .compare_exchange(previous, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return (previous, next);
            }
        }
    }

    /// Enforces the retention window relative to a fresh tick.
    fn trim(&self) {
        let (_, now) = self.next_tick();
        let window_start = now.wrapping_sub(self.window);
        let window_end = now.wrapping_add(CLEAR_BUFFER);

        if window_start < window_end {
            self.measurements.trim_to_window(window_start, window_end);
        } else {
            // The window straddles the wrap point.
            self.measurements.clear_range(window_end, window_start);
        }
    }
}
