//! A single time-sliced epoch of sampling state.
//!
//! A [`SamplerWindow`] answers one question on the hot path: is this event,
//! the k-th observed this epoch, selected? Every shared field is atomic so a
//! window can be read by producer threads while the rotation path prepares
//! its successor. The non-counter fields (`sampling_interval`,
//! `projected_population`, `samples_per_window`) are written only while a
//! window is off-line, before the owning sampler publishes it; the publish
//! itself carries the release/acquire ordering.

use core::sync::atomic::{AtomicU64, Ordering};

use crate::params::WindowParams;
use crate::sampler::Timebase;

/// One epoch of sampling state. Exactly one of a sampler's two windows is
/// active at a time; the other is exclusively owned by the rotating thread
/// until the atomic publish completes.
#[derive(Debug)]
pub struct SamplerWindow {
    /// Absolute tick at which this window expires. `0` means the window is
    /// permanently expired and never samples (disabled state).
    end_tick: AtomicU64,

    /// Count of `sample()` calls observed during this window's lifetime,
    /// including drops. Reset at window start.
    measured_population: AtomicU64,

    /// Every `sampling_interval`-th observed event is selected. Always >= 1.
    sampling_interval: AtomicU64,

    /// Ceiling on how many observed events this window considers before
    /// refusing further sampling.
    projected_population: AtomicU64,

    /// Copy of the per-window sample budget, used by debt accounting.
    samples_per_window: AtomicU64,
}

impl SamplerWindow {
    /// Create a window in the permanently-expired state. The first call to
    /// the owning sampler's `sample()` will rotate it into service.
    pub const fn new() -> Self {
        Self {
            end_tick: AtomicU64::new(0),
            measured_population: AtomicU64::new(0),
            sampling_interval: AtomicU64::new(1),
            projected_population: AtomicU64::new(0),
            samples_per_window: AtomicU64::new(0),
        }
    }

    /// Whether this window has expired at tick `now`.
    #[inline]
    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.end_tick.load(Ordering::Relaxed)
    }

    /// Force immediate expiry so the next hot-path call rotates.
    pub fn expire(&self) {
        self.end_tick.store(0, Ordering::Relaxed);
    }

    /// Reset counters and arm the expiry tick. A zero duration leaves the
    /// window permanently expired: every call attempts a (cheap) rotation and
    /// the window keeps reporting a zero projected population.
    pub fn initialize<T: Timebase>(&self, duration_ms: u64, now: u64, timebase: &T) {
        if duration_ms == 0 {
            self.end_tick.store(0, Ordering::Relaxed);
            return;
        }
        self.measured_population.store(0, Ordering::Relaxed);
        self.end_tick
            .store(now + timebase.millis_to_ticks(duration_ms), Ordering::Relaxed);
    }

    /// Observe one event and decide whether it is selected.
    ///
    /// The only hot-path operation touching shared memory: one atomic
    /// fetch-and-increment plus pure arithmetic. Events beyond the projected
    /// population ceiling are always rejected, bounding worst-case
    /// over-sampling when the population estimate is wrong.
    #[inline]
    pub fn sample(&self) -> bool {
        let ordinal = self.measured_population.fetch_add(1, Ordering::Relaxed) + 1;
        ordinal <= self.projected_population.load(Ordering::Relaxed)
            && ordinal % self.sampling_interval.load(Ordering::Relaxed) == 0
    }

    /// Number of events observed so far in this window, including drops.
    pub fn population_size(&self) -> u64 {
        self.measured_population.load(Ordering::Relaxed)
    }

    /// The largest sample count this window can deliver.
    pub fn max_sample_size(&self) -> u64 {
        self.projected_population.load(Ordering::Relaxed)
            / self.sampling_interval.load(Ordering::Relaxed)
    }

    /// The sample count this window actually delivered, given its measured
    /// population. Saturated windows deliver exactly `max_sample_size`.
    pub fn sample_size(&self) -> u64 {
        let measured = self.population_size();
        let projected = self.projected_population.load(Ordering::Relaxed);
        if measured > projected {
            self.max_sample_size()
        } else {
            measured / self.sampling_interval.load(Ordering::Relaxed)
        }
    }

    /// Shortfall between this window's budget and what it delivered.
    ///
    /// Non-positive values mean the window under-delivered and the deficit can
    /// be folded into a later window's budget. Always zero for windows with no
    /// projected population.
    pub fn accumulated_debt(&self) -> i64 {
        if self.projected_population.load(Ordering::Relaxed) == 0 {
            return 0;
        }
        let budget = self.samples_per_window.load(Ordering::Relaxed) as i64;
        (budget - self.max_sample_size() as i64) + (self.sample_size() as i64 - budget)
    }

    /// Copy the per-window budget out of `params`. Called for both windows
    /// when a reconfiguration is applied.
    pub(crate) fn apply_params(&self, params: &WindowParams) {
        self.samples_per_window
            .store(params.samples_per_window, Ordering::Relaxed);
    }

    /// Install the derived sampling interval. Only called on the off-line
    /// window during rotation.
    pub(crate) fn set_sampling_interval(&self, interval: u64) {
        debug_assert!(interval >= 1);
        self.sampling_interval.store(interval, Ordering::Relaxed);
    }

    /// Install the projected population ceiling. Only called on the off-line
    /// window during rotation.
    pub(crate) fn set_projected_population(&self, projected: u64) {
        self.projected_population.store(projected, Ordering::Relaxed);
    }
}

impl Default for SamplerWindow {
    fn default() -> Self {
        Self::new()
    }
}
