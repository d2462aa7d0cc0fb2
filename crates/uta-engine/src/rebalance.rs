//! Moving one breakpoint by hand while keeping the model normalized.

use crate::utility::Coefficients;

/// Lower the ordinate of point `index` of `criterion` by `delta`.
///
/// An inner point trades utility with the next segment, so the criterion's
/// weight is unchanged. The final point changes the weight itself; the
/// difference is spread evenly over the final points of all other criteria.
/// The first point is fixed at 0 and a lone criterion's weight is fixed at
/// 1, so neither moves.
pub fn shift_point(coefficients: &mut Coefficients, criterion: usize, index: usize, delta: f64) {
    let offset = coefficients.offset(criterion);
    let segments = coefficients.segments(criterion);
    if index == 0 || index > segments {
        return;
    }

    if index < segments {
        let values = coefficients.as_mut_slice();
        values[offset + index - 1] -= delta;
        values[offset + index] += delta;
        return;
    }

    let criteria = coefficients.num_criteria();
    if criteria < 2 {
        return;
    }
    let share = delta / (criteria - 1) as f64;
    let ends = coefficients.end_indices();
    let values = coefficients.as_mut_slice();
    for (c, &end) in ends.iter().enumerate() {
        if c == criterion {
            values[end] -= share * (criteria - 1) as f64;
        } else {
            values[end] += share;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Criterion, CriterionDirection};

    fn coefficients() -> Coefficients {
        let criteria = vec![
            Criterion::new("a", CriterionDirection::Gain, 2).with_range(0.0, 1.0),
            Criterion::new("b", CriterionDirection::Gain, 1).with_range(0.0, 1.0),
            Criterion::new("c", CriterionDirection::Cost, 1).with_range(0.0, 1.0),
        ];
        Coefficients::new(&criteria, vec![0.25, 0.25, 0.25, 0.25])
    }

    fn assert_close(actual: &[f64], expected: &[f64]) {
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-12, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn test_inner_point_keeps_weight() {
        let mut coefficients = coefficients();
        // point 1 of "a" from 0.25 down to 0.1
        shift_point(&mut coefficients, 0, 1, 0.15);
        assert_close(coefficients.as_slice(), &[0.1, 0.4, 0.25, 0.25]);
        assert!((coefficients.weights()[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_final_point_spreads_over_other_criteria() {
        let mut coefficients = coefficients();
        // weight of "b" from 0.25 up to 0.45
        shift_point(&mut coefficients, 1, 1, -0.2);
        assert_close(coefficients.as_slice(), &[0.25, 0.15, 0.45, 0.15]);
        let total: f64 = coefficients.weights().iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_first_point_is_fixed() {
        let mut coefficients = coefficients();
        shift_point(&mut coefficients, 0, 0, 0.1);
        assert_eq!(coefficients.as_slice(), &[0.25, 0.25, 0.25, 0.25]);
    }

    #[test]
    fn test_lone_criterion_weight_is_fixed() {
        let criteria = vec![Criterion::new("a", CriterionDirection::Gain, 1).with_range(0.0, 1.0)];
        let mut coefficients = Coefficients::new(&criteria, vec![1.0]);
        shift_point(&mut coefficients, 0, 1, 0.3);
        assert_eq!(coefficients.as_slice(), &[1.0]);
    }
}
