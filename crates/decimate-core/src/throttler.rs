//! Event throttler: translates a user-facing sampling target into per-window
//! parameters.
//!
//! The throttler owns an [`AdaptiveSampler`] and implements its policy hook.
//! `configure()` accepts "N samples per P milliseconds", validates it, and
//! arms a pending update; the update is folded into window parameters at the
//! next rotation, never synchronously. Periods expressed in canonical units
//! (seconds, minutes, hours, days) are normalized so that window arithmetic
//! stays in convenient ranges, and very low targets get the whole period as a
//! single window instead of five sub-windows that would round their share of
//! the budget down to zero.

use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};

use crate::constants::{
    DAY_MS, HOUR_MS, LOW_RATE_UPPER_BOUND, MINUTE_LOOKBACK, MINUTE_MS, SECOND_MS,
    SUB_SECOND_LOOKBACK, TEN_PER_SECOND_IN_DAYS, TEN_PER_SECOND_IN_HOURS,
    TEN_PER_SECOND_IN_MINUTES, WINDOW_DIVISOR,
};
use crate::lock::SpinLock;
use crate::params::{ConfigError, WindowParams, DISABLED_PARAMS, THROTTLE_OFF};
use crate::sampler::{AdaptiveSampler, Timebase, WindowPolicy};

/// Sampling target shared between `configure()` callers and the rotation
/// path. Writers hold the throttler's user lock; the rotation path reads with
/// plain atomic loads and never blocks on it.
struct TargetState {
    sample_size: AtomicI64,
    period_ms: AtomicU64,
    pending: AtomicBool,
    disabled: AtomicBool,
}

/// Policy implementing the parameter derivation. Lives inside the sampler's
/// rotation lock, so `last_params` needs no synchronization.
pub struct TargetPolicy {
    target: Arc<TargetState>,
    last_params: WindowParams,
}

impl WindowPolicy for TargetPolicy {
    fn next_window_params(&mut self) -> WindowParams {
        if self.target.pending.swap(false, Ordering::Acquire) {
            self.update_params();
        }
        if self.target.disabled.load(Ordering::Relaxed) {
            DISABLED_PARAMS
        } else {
            self.last_params
        }
    }
}

impl TargetPolicy {
    /// Recompute `last_params` from the stored target. Runs under the
    /// rotation lock. A negative size means the stored target is (or is
    /// concurrently becoming) the off sentinel; `last_params` stays untouched
    /// and the disabled flag governs what the rotation installs.
    fn update_params(&mut self) {
        let sample_size = self.target.sample_size.load(Ordering::Relaxed);
        if sample_size < 0 {
            return;
        }
        let period_ms = self.target.period_ms.load(Ordering::Relaxed);
        let mut params = derive_window_params(sample_size as u64, period_ms);
        params.reconfigure = true;
        self.last_params = params;
    }
}

/// Adaptive throttler for one event category.
///
/// Create once, share by reference between any number of producer threads,
/// and call [`sample`](Self::sample) for every candidate event.
/// [`configure`](Self::configure) may be called at any time from any thread;
/// it takes effect at the next window rotation.
pub struct EventThrottler<T: Timebase> {
    sampler: AdaptiveSampler<TargetPolicy, T>,
    target: Arc<TargetState>,
    /// Serializes concurrent `configure()` callers. Never touched by the
    /// sampling path.
    update_lock: SpinLock<()>,
}

impl<T: Timebase> EventThrottler<T> {
    /// Create a throttler with no target: it samples nothing until the first
    /// successful [`configure`](Self::configure).
    pub fn new(timebase: T, seed: u64) -> Self {
        let target = Arc::new(TargetState {
            sample_size: AtomicI64::new(0),
            period_ms: AtomicU64::new(0),
            pending: AtomicBool::new(false),
            disabled: AtomicBool::new(false),
        });
        let policy = TargetPolicy {
            target: Arc::clone(&target),
            last_params: DISABLED_PARAMS,
        };
        Self {
            sampler: AdaptiveSampler::new(policy, timebase, seed),
            target,
            update_lock: SpinLock::new(()),
        }
    }

    /// Set the sampling target to `sample_size` events per `period_ms`
    /// milliseconds. A `sample_size` of [`THROTTLE_OFF`] disables sampling
    /// entirely.
    ///
    /// Validation happens here, at the boundary: other negative sample sizes
    /// are rejected, as is any period that would be subdivided into
    /// sub-windows without dividing evenly. The accepted target takes effect
    /// at the next hot-path call, which is forced to rotate.
    pub fn configure(&self, sample_size: i64, period_ms: u64) -> Result<(), ConfigError> {
        if sample_size < 0 && sample_size != THROTTLE_OFF {
            return Err(ConfigError::NegativeSampleSize(sample_size));
        }
        if sample_size >= 0 {
            let (normalized_size, normalized_period) = normalize(sample_size as u64, period_ms);
            if !is_low_rate(normalized_size, normalized_period)
                && normalized_period % WINDOW_DIVISOR != 0
            {
                return Err(ConfigError::PeriodNotDivisible {
                    period_ms: normalized_period,
                });
            }
        }
        let _guard = self.update_lock.lock();
        self.target.sample_size.store(sample_size, Ordering::Relaxed);
        self.target.period_ms.store(period_ms, Ordering::Relaxed);
        self.target
            .disabled
            .store(sample_size == THROTTLE_OFF, Ordering::Relaxed);
        self.target.pending.store(true, Ordering::Release);
        self.sampler.reconfigure();
        Ok(())
    }

    /// Decide whether the candidate event observed at tick `now` is sampled.
    #[inline]
    pub fn sample(&self, now: u64) -> bool {
        self.sampler.sample(now)
    }

    /// Whether the throttler is currently switched off. Callers may use this
    /// to skip the `sample()` call entirely.
    #[inline]
    pub fn is_disabled(&self) -> bool {
        self.target.disabled.load(Ordering::Relaxed)
    }
}

/// Derive per-window parameters from an enabled sampling target.
///
/// Pure function, exposed so callers and tests can inspect the derivation
/// without driving a sampler through rotations. The returned params carry
/// `reconfigure = false`.
pub fn derive_window_params(sample_size: u64, period_ms: u64) -> WindowParams {
    let (sample_size, period_ms) = normalize(sample_size, period_ms);
    let (samples_per_window, window_duration_ms) = if is_low_rate(sample_size, period_ms) {
        (sample_size, period_ms)
    } else {
        (sample_size / WINDOW_DIVISOR, period_ms / WINDOW_DIVISOR)
    };
    WindowParams {
        samples_per_window,
        window_duration_ms,
        window_lookback_count: window_lookback(window_duration_ms),
        reconfigure: false,
    }
}

/// Reduce minute/hour/day targets to the next-smaller canonical unit once the
/// rate reaches ten per second, keeping per-window numbers small.
fn normalize(sample_size: u64, period_ms: u64) -> (u64, u64) {
    match period_ms {
        MINUTE_MS if sample_size >= TEN_PER_SECOND_IN_MINUTES => {
            (sample_size / 60, period_ms / 60)
        }
        HOUR_MS if sample_size >= TEN_PER_SECOND_IN_HOURS => {
            (sample_size / 3_600, period_ms / 3_600)
        }
        DAY_MS if sample_size >= TEN_PER_SECOND_IN_DAYS => {
            (sample_size / 86_400, period_ms / 86_400)
        }
        _ => (sample_size, period_ms),
    }
}

/// Whether the target is small enough that the whole period becomes a single
/// window. Subdividing such a budget would round it to zero per window.
fn is_low_rate(sample_size: u64, period_ms: u64) -> bool {
    if sample_size <= LOW_RATE_UPPER_BOUND {
        return true;
    }
    match period_ms {
        MINUTE_MS => sample_size < TEN_PER_SECOND_IN_MINUTES,
        HOUR_MS => sample_size < TEN_PER_SECOND_IN_HOURS,
        DAY_MS => sample_size < TEN_PER_SECOND_IN_DAYS,
        _ => false,
    }
}

/// Pick the EWMA lookback for a window length. Short windows see noisy
/// populations and need smoothing; day-scale windows trust every observation.
fn window_lookback(window_duration_ms: u64) -> u64 {
    if window_duration_ms <= SECOND_MS {
        SUB_SECOND_LOOKBACK
    } else if window_duration_ms == MINUTE_MS {
        MINUTE_LOOKBACK
    } else {
        1
    }
}
