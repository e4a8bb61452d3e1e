//! Clock-bound throttler for std environments.

use std::time::Duration;

use decimate_core::{ConfigError, EventThrottler, THROTTLE_OFF};

use crate::clock::TickClock;

/// Adaptive event throttler bound to a monotonic clock.
///
/// One instance per throttled event category, shared by reference between
/// producer threads. The per-event [`sample`](Self::sample) call reads the
/// clock and delegates to the lock-free core.
pub struct Throttler {
    clock: TickClock,
    inner: EventThrottler<TickClock>,
}

impl Throttler {
    /// Create a throttler seeded from OS entropy. It samples nothing until
    /// the first [`configure`](Self::configure).
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// Create a throttler with a fixed RNG seed, for reproducible tests.
    pub fn with_seed(seed: u64) -> Self {
        let clock = TickClock::new();
        Self {
            clock,
            inner: EventThrottler::new(clock, seed),
        }
    }

    /// Set the target to `sample_size` events per `period`. Takes effect at
    /// the next `sample()` call; never blocks in-flight sampling.
    pub fn configure(&self, sample_size: i64, period: Duration) -> Result<(), ConfigError> {
        let period_ms = period.as_millis() as u64;
        self.inner.configure(sample_size, period_ms)?;
        tracing::debug!(sample_size, period_ms, "sampling target reconfigured");
        Ok(())
    }

    /// Disable sampling entirely until the next [`configure`](Self::configure).
    pub fn set_off(&self) {
        // The off sentinel is always a valid target
        let _ = self.inner.configure(THROTTLE_OFF, 0);
        tracing::debug!("sampling switched off");
    }

    /// Decide whether the current candidate event is sampled.
    #[inline]
    pub fn sample(&self) -> bool {
        self.inner.sample(self.clock.now())
    }

    /// Whether sampling is currently switched off.
    #[inline]
    pub fn is_disabled(&self) -> bool {
        self.inner.is_disabled()
    }
}

impl Default for Throttler {
    fn default() -> Self {
        Self::new()
    }
}
