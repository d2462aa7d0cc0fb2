//! Decimal rounding used to keep simplex and accumulation drift out of
//! comparisons. Values are stored unrounded; rounding happens right before
//! they are compared or published.

/// Digits kept for utilities, encoded fields and criterion bounds
pub const UTILITY_DIGITS: i32 = 14;

/// Digits kept when comparing utilities for the Kendall matrix and when
/// flooring/ceiling feasible ranges
pub const RANGE_DIGITS: i32 = 10;

/// Slack kept below `delta_threshold` for a preserved tie. Ten steps of the
/// `RANGE_DIGITS` grid, so the gap still rounds below the threshold.
pub const TIE_MARGIN: f64 = 1e-9;

pub fn round_to(value: f64, digits: i32) -> f64 {
    let scale = 10f64.powi(digits);
    let scaled = value * scale;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / scale
}

pub fn floor_to(value: f64, digits: i32) -> f64 {
    let scale = 10f64.powi(digits);
    let scaled = value * scale;
    if !scaled.is_finite() {
        return value;
    }
    scaled.floor() / scale
}

pub fn ceil_to(value: f64, digits: i32) -> f64 {
    let scale = 10f64.powi(digits);
    let scaled = value * scale;
    if !scaled.is_finite() {
        return value;
    }
    scaled.ceil() / scale
}

/// Whether a utility gap counts as a strict preference at `delta`. Gaps are
/// compared at `RANGE_DIGITS`; anything smaller in magnitude is a tie.
pub fn separated(gap: f64, delta: f64) -> bool {
    round_to(gap, RANGE_DIGITS) >= delta
}
