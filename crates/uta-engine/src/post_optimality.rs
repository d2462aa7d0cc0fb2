//! Post-optimality analysis: how far each breakpoint may move while the
//! inferred ranking stays valid.
//!
//! Every coefficient is perturbed on its own against each pairwise
//! restriction. A non-final coefficient trades utility with the next segment
//! of its criterion, so the criterion weight is unchanged; a criterion's final
//! coefficient trades with the final coefficients of every other criterion,
//! spread evenly. The resulting coefficient intervals are intersected over all
//! rows, clipped to `[0, 1]` and finally shifted by the running sum of the
//! preceding segments to become breakpoint ordinate ranges.

use tracing::debug;

use crate::matrix::Restriction;
use crate::numeric::{ceil_to, floor_to, RANGE_DIGITS, TIE_MARGIN};
use crate::utility::Coefficients;

/// Closed interval of feasible values
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: f64,
    pub max: f64,
}

impl Interval {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn point(value: f64) -> Self {
        Self { min: value, max: value }
    }

    /// The unconstrained bound a single row may return
    fn unbounded() -> Self {
        Self { min: -1.0, max: 1.0 }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    /// Stretch the interval just enough to hold `value`
    fn include(&mut self, value: f64) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }
}

/// How a coefficient's perturbation is compensated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Compensation {
    /// Against the next segment of the same criterion
    NextSegment,
    /// Against the final segments of all other criteria
    OtherCriteria,
}

/// Bound on coefficient `k` implied by one restriction row.
///
/// Strict rows (`rhs > 0`) must keep their margin; tie rows must stay
/// `TIE_MARGIN` below `delta` so the tie survives Kendall rounding.
fn row_bound(
    restriction: &Restriction,
    k: usize,
    values: &[f64],
    compensation: Compensation,
    ends: &[usize],
    delta: f64,
) -> Interval {
    let row = &restriction.coefficients;
    let mut nominator = restriction.rhs - values.iter().zip(row).map(|(v, r)| v * r).sum::<f64>();

    let denominator = match compensation {
        Compensation::NextSegment => row[k] - row[k + 1],
        Compensation::OtherCriteria => {
            let others = ends.len().saturating_sub(1);
            if others == 0 {
                row[k]
            } else {
                row[k]
                    - ends
                        .iter()
                        .filter(|&&e| e != k)
                        .map(|&e| row[e] / others as f64)
                        .sum::<f64>()
            }
        }
    };

    if denominator == 0.0 {
        return Interval::unbounded();
    }

    if restriction.rhs > 0.0 {
        let shifted = values[k] + nominator / denominator;
        if denominator > 0.0 {
            Interval::new(shifted, 1.0)
        } else {
            Interval::new(-1.0, shifted)
        }
    } else {
        nominator += delta - TIE_MARGIN;
        let shifted = values[k] + nominator / denominator;
        if denominator > 0.0 {
            Interval::new(-1.0, shifted)
        } else {
            Interval::new(shifted, 1.0)
        }
    }
}

/// Raw per-coefficient intervals, intersected over every restriction
fn coefficient_intervals(
    coefficients: &Coefficients,
    restrictions: &[Restriction],
    delta: f64,
    preserve_kendall: bool,
) -> Vec<Interval> {
    let values = coefficients.as_slice();
    let ends = coefficients.end_indices();
    let mut intervals = vec![Interval::new(0.0, 1.0); values.len()];

    for restriction in restrictions {
        for c in 0..coefficients.num_criteria() {
            let last = coefficients.last_index(c);
            for k in coefficients.offset(c)..=last {
                let mut local = if preserve_kendall {
                    if k == last {
                        row_bound(restriction, k, values, Compensation::OtherCriteria, &ends, delta)
                    } else {
                        let mut bound = row_bound(restriction, k, values, Compensation::NextSegment, &ends, delta);
                        let pair = values[k] + values[k + 1];
                        bound.max = bound.max.min(pair);
                        bound
                    }
                } else if k == last {
                    Interval::new(0.0, 1.0)
                } else {
                    Interval::new(0.0, values[k] + values[k + 1])
                };

                local.min = local.min.max(0.0);
                local.max = local.max.min(1.0);
                let interval = &mut intervals[k];
                interval.min = interval.min.max(local.min);
                interval.max = interval.max.min(local.max);
            }
        }
    }

    intervals
}

/// Feasible ordinate range of every breakpoint after the first, in
/// coefficient order.
///
/// With `preserve_kendall` the ranges keep every strict pair at least
/// `delta` apart and every tie within `delta`; without it they only keep
/// the functions monotone and normalized.
pub fn feasible_ranges(
    coefficients: &Coefficients,
    restrictions: &[Restriction],
    delta: f64,
    preserve_kendall: bool,
) -> Vec<Interval> {
    let values = coefficients.as_slice();
    let mut raw = coefficient_intervals(coefficients, restrictions, delta, preserve_kendall);

    // A row the current values already miss only limits how far they move
    for (interval, &value) in raw.iter_mut().zip(values) {
        interval.include(value);
    }

    let mut ranges: Vec<Interval> = raw
        .iter()
        .zip(values)
        .map(|(interval, &value)| {
            let mut range = Interval::new(ceil_to(interval.min, RANGE_DIGITS), floor_to(interval.max, RANGE_DIGITS));
            range.include(value);
            range
        })
        .collect();

    // Moving a final coefficient shifts every other final coefficient by an
    // equal share, which must stay inside their own intervals
    let ends = coefficients.end_indices();
    let others = ends.len().saturating_sub(1) as f64;
    for &end in &ends {
        let mut room_up: f64 = 1.0;
        let mut room_down: f64 = 1.0;
        for &other in ends.iter().filter(|&&o| o != end) {
            room_up = room_up.min(floor_to(raw[other].max - values[other], RANGE_DIGITS).max(0.0));
            room_down = room_down.min(floor_to(values[other] - raw[other].min, RANGE_DIGITS).max(0.0));
        }
        let range = &mut ranges[end];
        range.min = range.min.max(values[end] - room_up * others);
        range.max = range.max.min(values[end] + room_down * others);
    }

    for c in 0..coefficients.num_criteria() {
        let mut sum = 0.0;
        for k in coefficients.offset(c)..=coefficients.last_index(c) {
            let ordinate = sum + values[k];
            let range = &mut ranges[k];
            range.min = (range.min + sum).min(1.0);
            range.max = (range.max + sum).min(1.0);
            range.include(ordinate);
            sum = ordinate;
        }
    }

    debug!(restrictions = restrictions.len(), preserve_kendall, "recomputed feasible ranges");
    ranges
}
