//! Policy constants used throughout the crate.

/// Number of equal sub-windows a sampling period is split into, giving the
/// adaptation several opportunities to react within one period.
pub const WINDOW_DIVISOR: u64 = 5;

/// Highest per-period sample count that is still served by a single window
/// spanning the whole period. Splitting a budget this small into sub-windows
/// would round the per-window share down to zero.
pub const LOW_RATE_UPPER_BOUND: u64 = 9;

/// One second expressed in milliseconds.
pub const SECOND_MS: u64 = 1_000;

/// One minute expressed in milliseconds.
pub const MINUTE_MS: u64 = 60 * SECOND_MS;

/// One hour expressed in milliseconds.
pub const HOUR_MS: u64 = 60 * MINUTE_MS;

/// One day expressed in milliseconds.
pub const DAY_MS: u64 = 24 * HOUR_MS;

/// Rate thresholds at which a minute/hour/day target is normalized to the
/// next-smaller canonical unit. Each equals ten samples per second expressed
/// in the larger unit.
pub const TEN_PER_SECOND_IN_MINUTES: u64 = 600;

/// See [`TEN_PER_SECOND_IN_MINUTES`].
pub const TEN_PER_SECOND_IN_HOURS: u64 = 36_000;

/// See [`TEN_PER_SECOND_IN_MINUTES`].
pub const TEN_PER_SECOND_IN_DAYS: u64 = 864_000;

/// EWMA lookback for sub-second windows. Populations per short window are
/// noisy, so the estimate averages over the last ~5 seconds of 200 ms windows.
pub const SUB_SECOND_LOOKBACK: u64 = 25;

/// EWMA lookback for minute-long windows.
pub const MINUTE_LOOKBACK: u64 = 5;
