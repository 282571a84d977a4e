//! Monotonic clock abstraction for TTL bookkeeping.
//!
//! Stores that track expiry take an `Arc<dyn Clock>` so tests can drive time
//! explicitly with [`ManualClock`]. Readings are monotonic, so wall-clock
//! adjustments never expire or extend entries.

use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Longest lifetime a deadline can express (roughly a century).
pub const MAX_LIFETIME: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Source of the current time.
pub trait Clock: Send + Sync + 'static {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

/// Clock backed by the operating system's monotonic timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    #[must_use]
    pub fn new(start: Instant) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now = deadline(*now, by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}

/// Instant `ttl` after `now`, with `ttl` capped at [`MAX_LIFETIME`].
#[must_use]
pub fn deadline(now: Instant, ttl: Duration) -> Instant {
    now.checked_add(ttl.min(MAX_LIFETIME)).unwrap_or(now)
}
