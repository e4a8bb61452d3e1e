//! Core algorithms for adaptive event sampling.
//!
//! This crate decides, for a high-frequency stream of discrete events, which
//! individual events are selected for expensive downstream processing while
//! holding a configured long-term budget of samples per time period. It adapts
//! to bursty populations with no manual tuning and is safe to call from many
//! concurrent producers: the per-event hot path is a single atomic fetch-add,
//! and the rare window-rotation path is guarded by a non-blocking try-lock.
//!
//! Designed to work in `no_std` environments with only 64-bit atomics.
//!
//! # Features
//!
//! - `std` (default): Enable standard library support and serde derives on
//!   parameter types
//!
//! # Usage
//!
//! This crate is typically used through the main `decimate` crate, which binds
//! the sampler to a monotonic clock. However, it can be used directly when the
//! caller supplies its own tick source:
//!
//! ```
//! use decimate_core::{EventThrottler, MillisTimebase};
//!
//! let throttler = EventThrottler::new(MillisTimebase, 42);
//! throttler.configure(100, 1_000).unwrap(); // 100 samples per second
//!
//! let mut now = 0;
//! for _ in 0..10_000 {
//!     if throttler.sample(now) {
//!         // record the event
//!     }
//!     now += 1;
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod constants;
pub mod lock;
pub mod math;
pub mod params;
pub mod sampler;
pub mod throttler;
pub mod window;

// Re-export commonly used items at crate root
pub use params::{ConfigError, WindowParams, DISABLED_PARAMS, THROTTLE_OFF};
pub use sampler::{AdaptiveSampler, MillisTimebase, Timebase, WindowPolicy};
pub use throttler::{derive_window_params, EventThrottler};
pub use window::SamplerWindow;
