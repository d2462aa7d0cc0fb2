//! Kendall rank correlation between the reference ranking and the ranking
//! induced by the fitted utilities.
//!
//! Both rankings become an `n x n` preference matrix indexed by reference
//! position: entry `(i, j)` is `1` when `i` precedes `j`, `0.5` when they are
//! tied and `0` otherwise. Tau is `1 - 4L / (n(n-1))` where `L` is half the
//! summed absolute difference of the two matrices.

use crate::numeric::separated;

pub type PreferenceMatrix = Vec<Vec<f64>>;

/// Matrix of the reference ranks; lower rank is better
pub fn reference_matrix(ranks: &[usize]) -> PreferenceMatrix {
    let n = ranks.len();
    let mut matrix = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            matrix[i][j] = if i == j || ranks[i] > ranks[j] {
                0.0
            } else if ranks[i] == ranks[j] {
                0.5
            } else {
                1.0
            };
        }
    }
    matrix
}

/// Matrix of the inferred ranking. `utilities` is in reference order;
/// utilities closer than `delta` (at 10 digits) are ties.
pub fn inferred_matrix(utilities: &[f64], delta: f64) -> PreferenceMatrix {
    let n = utilities.len();
    let mut matrix = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            let gap = utilities[j] - utilities[i];
            matrix[i][j] = if i == j || separated(gap, delta) {
                0.0
            } else if !separated(-gap, delta) {
                0.5
            } else {
                1.0
            };
        }
    }
    matrix
}

/// Half the summed absolute entrywise difference
pub fn distance(a: &PreferenceMatrix, b: &PreferenceMatrix) -> f64 {
    let total: f64 = a
        .iter()
        .zip(b)
        .flat_map(|(ra, rb)| ra.iter().zip(rb).map(|(x, y)| (x - y).abs()))
        .sum();
    total / 2.0
}

/// Tau between `ranks` and `utilities`, both in reference order. Fewer than
/// two alternatives agree trivially.
pub fn kendall_tau(ranks: &[usize], utilities: &[f64], delta: f64) -> f64 {
    let n = ranks.len();
    if n < 2 {
        return 1.0;
    }
    let distance = distance(&reference_matrix(ranks), &inferred_matrix(utilities, delta));
    1.0 - 4.0 * distance / (n * (n - 1)) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELTA: f64 = 1e-6;

    #[test]
    fn test_reference_matrix() {
        let matrix = reference_matrix(&[0, 1, 1]);
        assert_eq!(matrix[0], vec![0.0, 1.0, 1.0]);
        assert_eq!(matrix[1], vec![0.0, 0.0, 0.5]);
        assert_eq!(matrix[2], vec![0.0, 0.5, 0.0]);
    }

    #[test]
    fn test_inferred_matrix_treats_close_utilities_as_ties() {
        let matrix = inferred_matrix(&[0.9, 0.5, 0.5 + 1e-9], DELTA);
        assert_eq!(matrix, reference_matrix(&[0, 1, 1]));
    }

    #[test]
    fn test_identical_orders() {
        let tau = kendall_tau(&[0, 1, 2, 3], &[0.8, 0.6, 0.4, 0.2], DELTA);
        assert_eq!(tau, 1.0);
    }

    #[test]
    fn test_reversed_order() {
        let tau = kendall_tau(&[0, 1, 2], &[0.1, 0.5, 0.9], DELTA);
        assert_eq!(tau, -1.0);
    }

    #[test]
    fn test_single_swap() {
        // one discordant pair out of three
        let tau = kendall_tau(&[0, 1, 2], &[0.9, 0.1, 0.5], DELTA);
        assert!((tau - 1.0 / 3.0).abs() < 1e-12, "tau = {tau}");
    }

    #[test]
    fn test_tie_against_strict_order_is_half_discordant() {
        let tau = kendall_tau(&[0, 1], &[0.5, 0.5], DELTA);
        assert_eq!(tau, 0.0);
    }

    #[test]
    fn test_tau_bounds() {
        let ranks = [0, 0, 1, 2, 2];
        let samples = [
            [0.1, 0.2, 0.3, 0.4, 0.5],
            [0.5, 0.5, 0.5, 0.5, 0.5],
            [0.9, 0.9, 0.5, 0.1, 0.1],
            [0.0, 1.0, 0.0, 1.0, 0.0],
        ];
        for utilities in samples {
            let tau = kendall_tau(&ranks, &utilities, DELTA);
            assert!((-1.0..=1.0).contains(&tau), "tau {tau} out of range for {utilities:?}");
        }
        assert_eq!(kendall_tau(&ranks, &samples[2], DELTA), 1.0);
    }
}
