//! # decimate
//!
//! Adaptive event sampling: decide, for a high-frequency stream of events,
//! which individual events are selected for expensive downstream processing
//! (recording, tracing) while holding a configured long-term budget of
//! samples per time period.
//!
//! The sampler adapts to bursty and fluctuating event populations without
//! manual tuning. Selection thins the stream geometrically: every k-th event
//! is taken, with k drawn so that the configured budget is met in expectation
//! against an exponentially-smoothed population estimate, and a hard
//! per-window ceiling bounds the damage when the estimate is wrong. Windows
//! that under-deliver carry their shortfall into a later window's budget.
//!
//! The per-event hot path is a single atomic fetch-and-increment: no locks,
//! no allocation, no blocking. Window rotation happens on the rare expiry
//! path behind a non-blocking try-lock; a thread that loses the rotation race
//! reports "not sampled" for that one event instead of waiting.
//!
//! ## Quick Start
//!
//! ```
//! use std::time::Duration;
//! use decimate::Throttler;
//!
//! let throttler = Throttler::new();
//! throttler.configure(100, Duration::from_secs(1)).unwrap();
//!
//! for _ in 0..1_000 {
//!     if throttler.sample() {
//!         // record this event
//!     }
//! }
//! ```
//!
//! ## Custom tick sources
//!
//! The core in [`decimate_core`] is `no_std`-compatible and takes ticks from
//! the caller, for embedding in runtimes that bring their own clock:
//!
//! ```
//! use decimate::core::{EventThrottler, MillisTimebase};
//!
//! let throttler = EventThrottler::new(MillisTimebase, 42);
//! throttler.configure(10, 1_000).unwrap();
//! let sampled = throttler.sample(17); // caller-supplied tick
//! # let _ = sampled;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod clock;
mod throttler;

/// The `no_std`-compatible sampling core, re-exported for callers that bring
/// their own tick source.
pub use decimate_core as core;

// Re-exports for the public API
pub use clock::TickClock;
pub use decimate_core::{
    derive_window_params, AdaptiveSampler, ConfigError, EventThrottler, MillisTimebase,
    SamplerWindow, Timebase, WindowParams, WindowPolicy, THROTTLE_OFF,
};
pub use throttler::Throttler;
