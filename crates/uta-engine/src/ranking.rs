use crate::model::{Alternative, RankingEntry};
use crate::numeric::{round_to, UTILITY_DIGITS};

/// Global utility of an encoded row
pub fn utility(coefficients: &[f64], row: &[f64]) -> f64 {
    let score: f64 = coefficients.iter().zip(row).map(|(c, x)| c * x).sum();
    round_to(score, UTILITY_DIGITS)
}

pub fn utilities(coefficients: &[f64], rows: &[Vec<f64>]) -> Vec<f64> {
    rows.iter().map(|row| utility(coefficients, row)).collect()
}

/// Indices of `utilities` by descending value; equal values keep their
/// input order
pub fn inferred_order(utilities: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..utilities.len()).collect();
    order.sort_by(|&a, &b| utilities[b].total_cmp(&utilities[a]));
    order
}

/// Score `alternatives` (parallel to `rows`) and sort them by utility
pub fn rank(coefficients: &[f64], rows: &[Vec<f64>], alternatives: &[Alternative]) -> Vec<RankingEntry> {
    let utilities = utilities(coefficients, rows);
    let mut entries: Vec<RankingEntry> = inferred_order(&utilities)
        .into_iter()
        .map(|i| RankingEntry {
            alternative: alternatives[i].name.clone(),
            utility: utilities[i],
            position: 0,
            reference_rank: alternatives[i].reference_rank,
        })
        .collect();
    assign_positions(&mut entries);
    entries
}

/// Merge the ranked and unranked entries into one global ranking. Ranked
/// entries come first among equal utilities.
pub fn merge(ranked: Vec<RankingEntry>, unranked: Vec<RankingEntry>) -> Vec<RankingEntry> {
    let mut entries = ranked;
    entries.extend(unranked);
    entries.sort_by(|a, b| b.utility.total_cmp(&a.utility));
    assign_positions(&mut entries);
    entries
}

fn assign_positions(entries: &mut [RankingEntry]) {
    for (i, entry) in entries.iter_mut().enumerate() {
        entry.position = i + 1;
    }
}
