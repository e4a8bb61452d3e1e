//! Math functions for no_std compatibility.
//!
//! In no_std mode, f64 doesn't have transcendental methods like ln or ceil.
//! This module provides the ones this crate needs using libm.

/// Natural logarithm.
#[inline]
pub fn ln(x: f64) -> f64 {
    libm::log(x)
}

/// Ceiling (round up).
#[inline]
pub fn ceil(x: f64) -> f64 {
    libm::ceil(x)
}

/// Exponentially weighted moving average step.
///
/// `alpha = 1` trusts the latest observation completely; values approaching 0
/// average over proportionally more history.
#[inline]
pub fn ewma(value: f64, alpha: f64, avg: f64) -> f64 {
    alpha * value + (1.0 - alpha) * avg
}

/// Draw from a geometric distribution with success probability `p`, given a
/// uniform draw `u` from `[0, 1)`.
///
/// Selecting every k-th event with k drawn this way accepts each event with
/// probability `p` in expectation. Draws of exactly 0 or 1 are clamped away
/// from the boundaries so the logarithm stays finite.
#[inline]
pub fn next_geometric(p: f64, mut u: f64) -> u64 {
    if u == 0.0 {
        u = 0.01;
    } else if u == 1.0 {
        u = 0.99;
    }
    ceil(ln(1.0 - u) / ln(1.0 - p)) as u64
}
