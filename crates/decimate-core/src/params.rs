//! Window parameter types and configuration errors.

use core::fmt;

use crate::constants::WINDOW_DIVISOR;

/// User-facing sentinel that disables sampling entirely when passed as the
/// sample size to [`EventThrottler::configure`](crate::EventThrottler::configure).
pub const THROTTLE_OFF: i64 = -2;

/// Parameters for one sampling window, copied between windows on
/// reconfiguration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowParams {
    /// Target sample count for one window.
    pub samples_per_window: u64,

    /// Epoch length in milliseconds; `0` means the sampler is disabled.
    pub window_duration_ms: u64,

    /// Number of recent windows the population EWMA effectively averages over.
    /// Always at least 1.
    pub window_lookback_count: u64,

    /// One-shot flag: apply these params into both windows and reset the
    /// averaging state at the next rotation.
    pub reconfigure: bool,
}

/// Parameters of a disabled sampler: zero-length windows that never sample.
pub const DISABLED_PARAMS: WindowParams = WindowParams {
    samples_per_window: 0,
    window_duration_ms: 0,
    window_lookback_count: 1,
    reconfigure: false,
};

/// Error rejected at the [`configure`](crate::EventThrottler::configure)
/// boundary.
///
/// All of these are caller contract violations. None can occur on the
/// steady-state sampling path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The sample size was negative and not the off sentinel.
    NegativeSampleSize(i64),

    /// The period, after normalization, is subdivided into sub-windows but is
    /// not evenly divisible by the sub-window divisor. Callers must choose
    /// canonical periods (seconds, minutes, hours, days).
    PeriodNotDivisible {
        /// The normalized period that failed the check.
        period_ms: u64,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NegativeSampleSize(size) => {
                write!(f, "sample size {size} is negative and not the off sentinel")
            }
            Self::PeriodNotDivisible { period_ms } => write!(
                f,
                "period of {period_ms} ms is not divisible into {WINDOW_DIVISOR} sub-windows"
            ),
        }
    }
}

impl core::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_params_never_sample() {
        assert_eq!(DISABLED_PARAMS.samples_per_window, 0);
        assert_eq!(DISABLED_PARAMS.window_duration_ms, 0);
        assert!(DISABLED_PARAMS.window_lookback_count >= 1);
        assert!(!DISABLED_PARAMS.reconfigure);
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::PeriodNotDivisible { period_ms: 1_001 };
        assert!(err.to_string().contains("1001 ms"));
    }
}
