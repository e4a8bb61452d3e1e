//! Adaptive sampler: double-buffered windows plus the numeric adaptation.
//!
//! The sampler owns two [`SamplerWindow`]s and rotates between them when the
//! active one expires. Rotation recomputes the next window's parameters from
//! an EWMA of recent populations, a geometric-distribution draw for the
//! sampling interval, and the expired window's unpaid sampling debt. The
//! per-event path never blocks: expiry triggers a non-blocking try-lock, and
//! a thread that loses the race simply reports "not sampled" for that one
//! event while the winner installs the fresh window.

use core::sync::atomic::{AtomicUsize, Ordering};

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::lock::SpinLock;
use crate::math;
use crate::params::WindowParams;
use crate::window::SamplerWindow;

/// Conversion from wall-clock milliseconds to the tick unit the caller's
/// clock reports. Implemented by the embedding layer; the core stays agnostic
/// of where ticks come from.
pub trait Timebase {
    /// Convert a duration in milliseconds to ticks.
    fn millis_to_ticks(&self, millis: u64) -> u64;
}

/// Identity timebase: one tick is one millisecond.
#[derive(Debug, Clone, Copy, Default)]
pub struct MillisTimebase;

impl Timebase for MillisTimebase {
    #[inline]
    fn millis_to_ticks(&self, millis: u64) -> u64 {
        millis
    }
}

/// Policy hook deciding the parameters of the next window.
///
/// Called only while the rotation lock is held, so implementations get
/// `&mut self` and need no synchronization of their own.
pub trait WindowPolicy {
    /// Produce the parameters for the window about to be installed.
    fn next_window_params(&mut self) -> WindowParams;
}

/// Mutable adaptation state, single-writer under the rotation lock.
struct Rotation<P> {
    policy: P,
    /// EWMA estimate of per-window population.
    avg_population: f64,
    /// Smoothing factor derived from the configured lookback count.
    ewma_alpha: f64,
    /// Rotations between successive debt repayments. Repaying every rotation
    /// of a sub-second window would oscillate, so repayment is gated to about
    /// once per second.
    debt_carry_limit: u64,
    debt_carry_count: u64,
    prng: Xoshiro256PlusPlus,
}

/// Double-buffered adaptive sampler.
///
/// Generic over the window [`WindowPolicy`] and the caller's [`Timebase`].
/// All methods take `&self`; the sampler is safe to share across any number
/// of producer threads.
pub struct AdaptiveSampler<P, T = MillisTimebase> {
    /// Both windows, statically owned. Nothing is allocated on the hot path.
    windows: [SamplerWindow; 2],
    /// Index of the live window. Stored with release ordering on rotation so
    /// any thread observing the new index also observes its initialization.
    active: AtomicUsize,
    rotation: SpinLock<Rotation<P>>,
    timebase: T,
}

impl<P: WindowPolicy, T: Timebase> AdaptiveSampler<P, T> {
    /// Create a sampler with both windows in the expired state. The first
    /// `sample()` call rotates and pulls the initial parameters from `policy`.
    pub fn new(policy: P, timebase: T, seed: u64) -> Self {
        Self {
            windows: [SamplerWindow::new(), SamplerWindow::new()],
            active: AtomicUsize::new(0),
            rotation: SpinLock::new(Rotation {
                policy,
                avg_population: 0.0,
                ewma_alpha: 1.0,
                debt_carry_limit: 1,
                debt_carry_count: 1,
                prng: Xoshiro256PlusPlus::seed_from_u64(seed),
            }),
            timebase,
        }
    }

    /// Decide whether the event observed at tick `now` is sampled.
    ///
    /// Hot path: one acquire load of the active index and one atomic
    /// fetch-add in the window. On expiry the calling thread attempts the
    /// rotation with a non-blocking try-lock; losers return `false` for this
    /// one event and the next call serves from the fresh window. The rotating
    /// call itself also returns `false`.
    #[inline]
    pub fn sample(&self, now: u64) -> bool {
        let window = &self.windows[self.active.load(Ordering::Acquire)];
        if !window.is_expired(now) {
            return window.sample();
        }
        if let Some(mut rotation) = self.rotation.try_lock() {
            // Re-check under the lock: a racing rotator may have already
            // installed a fresh window.
            let active = self.active.load(Ordering::Relaxed);
            if self.windows[active].is_expired(now) {
                self.rotate(&mut rotation, active, now);
            }
        }
        false
    }

    /// Force the active window to expire so the next hot-path call rotates
    /// unconditionally and re-runs the policy hook.
    pub fn reconfigure(&self) {
        self.windows[self.active.load(Ordering::Acquire)].expire();
    }

    /// Install the non-active window with freshly derived parameters and
    /// publish it. Runs under the rotation lock, single writer.
    fn rotate(&self, rotation: &mut Rotation<P>, active: usize, now: u64) {
        let mut params = rotation.policy.next_window_params();
        if params.reconfigure {
            self.apply_reconfiguration(rotation, &mut params);
        }
        let expired = &self.windows[active];
        let next = &self.windows[active ^ 1];
        self.set_rate(rotation, &params, expired, next);
        next.initialize(params.window_duration_ms, now, &self.timebase);
        self.active.store(active ^ 1, Ordering::Release);
    }

    /// Apply a parameter change into both windows and reset averaging state.
    fn apply_reconfiguration(&self, rotation: &mut Rotation<P>, params: &mut WindowParams) {
        self.windows[0].apply_params(params);
        self.windows[1].apply_params(params);
        rotation.avg_population = 0.0;
        rotation.ewma_alpha = if params.window_lookback_count <= 1 {
            1.0
        } else {
            1.0 / params.window_lookback_count as f64
        };
        rotation.debt_carry_limit =
            if params.window_duration_ms == 0 || params.window_duration_ms >= 1_000 {
                1
            } else {
                1_000 / params.window_duration_ms
            };
        rotation.debt_carry_count = rotation.debt_carry_limit;
        params.reconfigure = false;
    }

    /// Derive the next window's interval and population ceiling from the
    /// expired window's statistics.
    fn set_rate(
        &self,
        rotation: &mut Rotation<P>,
        params: &WindowParams,
        expired: &SamplerWindow,
        next: &SamplerWindow,
    ) {
        let sample_size = params.samples_per_window + Self::amortize_debt(rotation, expired);
        if sample_size == 0 {
            next.set_projected_population(0);
            return;
        }
        rotation.avg_population = math::ewma(
            expired.population_size() as f64,
            rotation.ewma_alpha,
            rotation.avg_population,
        );
        let interval = Self::derive_sampling_interval(rotation, sample_size as f64);
        debug_assert!(interval >= 1, "derived interval must be positive");
        next.set_sampling_interval(interval);
        next.set_projected_population(sample_size.saturating_mul(interval));
    }

    /// Fold the expired window's shortfall into the next budget, at most once
    /// every `debt_carry_limit` rotations.
    fn amortize_debt(rotation: &mut Rotation<P>, expired: &SamplerWindow) -> u64 {
        let debt = expired.accumulated_debt();
        debug_assert!(debt <= 0, "windows cannot over-deliver");
        if rotation.debt_carry_count == rotation.debt_carry_limit {
            rotation.debt_carry_count = 1;
            return debt.unsigned_abs();
        }
        rotation.debt_carry_count += 1;
        0
    }

    /// Choose the interval so that, in expectation, `sample_size` out of the
    /// estimated population are selected. A population at or below the budget
    /// samples everything.
    fn derive_sampling_interval(rotation: &mut Rotation<P>, sample_size: f64) -> u64 {
        if rotation.avg_population <= sample_size {
            return 1;
        }
        let probability = sample_size / rotation.avg_population;
        math::next_geometric(probability, rotation.prng.random())
    }

    #[cfg(test)]
    pub(crate) fn active_window(&self) -> &SamplerWindow {
        &self.windows[self.active.load(Ordering::Acquire)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Policy that hands out a fixed parameter set, reconfiguring once.
    struct FixedPolicy {
        params: WindowParams,
        handed_out: bool,
    }

    impl FixedPolicy {
        fn new(samples_per_window: u64, window_duration_ms: u64, lookback: u64) -> Self {
            Self {
                params: WindowParams {
                    samples_per_window,
                    window_duration_ms,
                    window_lookback_count: lookback,
                    reconfigure: true,
                },
                handed_out: false,
            }
        }
    }

    impl WindowPolicy for FixedPolicy {
        fn next_window_params(&mut self) -> WindowParams {
            let mut params = self.params;
            params.reconfigure = !self.handed_out;
            self.handed_out = true;
            params
        }
    }

    fn sampler(
        samples_per_window: u64,
        window_duration_ms: u64,
        lookback: u64,
    ) -> AdaptiveSampler<FixedPolicy> {
        AdaptiveSampler::new(
            FixedPolicy::new(samples_per_window, window_duration_ms, lookback),
            MillisTimebase,
            7,
        )
    }

    #[test]
    fn test_first_call_rotates_and_returns_false() {
        let sampler = sampler(10, 100, 1);
        assert!(!sampler.sample(0));
        assert!(!sampler.active_window().is_expired(0));
    }

    #[test]
    fn test_small_population_samples_everything() {
        // Average population starts at 0, so the first live window has
        // interval 1 and ceiling samples_per_window
        let sampler = sampler(10, 100, 1);
        sampler.sample(0);
        let hits = (0..10).filter(|_| sampler.sample(1)).count();
        assert_eq!(hits, 10);
    }

    #[test]
    fn test_ceiling_bounds_burst() {
        let sampler = sampler(10, 100, 1);
        sampler.sample(0);
        // A burst far beyond the ceiling: no window may deliver more than
        // its max sample size
        let hits = (0..10_000).filter(|_| sampler.sample(1)).count();
        let max = sampler.active_window().max_sample_size();
        assert!(hits as u64 <= max, "{hits} > {max}");
    }

    #[test]
    fn test_rotation_adapts_interval_to_population() {
        let sampler = sampler(10, 100, 1);
        sampler.sample(0);
        // First window sees 1000 events; with lookback 1 the estimate jumps
        // straight to 1000 and the next interval must thin roughly 100:1
        for _ in 0..1_000 {
            sampler.sample(50);
        }
        assert!(!sampler.sample(100)); // rotating call
        let window = sampler.active_window();
        let projected = window.max_sample_size();
        assert!(projected >= 10, "ceiling {projected} below budget");
        assert!(
            window.population_size() == 0,
            "fresh window must restart its census"
        );
    }

    #[test]
    fn test_expired_window_rotates_once_per_expiry() {
        let sampler = sampler(5, 100, 1);
        sampler.sample(0);
        for _ in 0..20 {
            sampler.sample(10);
        }
        // Crossing the expiry tick installs exactly one fresh window; the
        // second call is served by it
        assert!(!sampler.sample(100));
        let before = sampler.active_window().population_size();
        sampler.sample(101);
        assert_eq!(sampler.active_window().population_size(), before + 1);
    }

    #[test]
    fn test_reconfigure_forces_rotation() {
        let sampler = sampler(10, 60_000, 1);
        sampler.sample(0);
        assert!(!sampler.active_window().is_expired(1));
        sampler.reconfigure();
        assert!(sampler.active_window().is_expired(1));
    }

    #[test]
    fn test_debt_carry_limit_for_subsecond_windows() {
        let sampler = sampler(10, 200, 25);
        sampler.sample(0);
        let limit = sampler.rotation.lock().debt_carry_limit;
        assert_eq!(limit, 5);
    }

    #[test]
    fn test_debt_carry_limit_for_long_windows() {
        let sampler = sampler(10, 60_000, 5);
        sampler.sample(0);
        let limit = sampler.rotation.lock().debt_carry_limit;
        assert_eq!(limit, 1);
    }

    #[test]
    fn test_ewma_alpha_from_lookback() {
        let sampler = sampler(10, 200, 25);
        sampler.sample(0);
        let alpha = sampler.rotation.lock().ewma_alpha;
        assert!((alpha - 0.04).abs() < 1e-12);
    }

    #[test]
    fn test_debt_repaid_once_per_carry_limit() {
        // 200 ms windows gate repayment to every 5th rotation. Feed 5 events
        // against a budget of 10 so every window runs a shortfall of 5; the
        // ceiling only grows on the rotations where the gate opens.
        let sampler = sampler(10, 200, 1);
        let mut now = 0;
        sampler.sample(now); // rotation 1, repays the empty initial window
        let mut repaid_at = Vec::new();
        for rotation in 2..=16 {
            for i in 0..5 {
                sampler.sample(now + i + 1);
            }
            now += 200;
            sampler.sample(now); // rotating call
            if sampler.active_window().max_sample_size() > 10 {
                repaid_at.push(rotation);
            }
        }
        assert_eq!(repaid_at, vec![6, 11, 16]);
    }

    #[test]
    fn test_disabled_params_never_sample() {
        let sampler = sampler(0, 0, 1);
        for now in 0..100 {
            assert!(!sampler.sample(now));
        }
    }
}
