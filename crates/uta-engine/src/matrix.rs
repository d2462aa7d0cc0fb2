//! Constraint matrices: the linear program fitted by the simplex and the
//! pairwise restrictions bounding post-optimality ranges.

use tracing::debug;
use uta_simplex::{ConstraintOp, LpProblem};

use crate::model::{Alternative, Criterion};
use crate::numeric::{round_to, separated, UTILITY_DIGITS};

/// Dimensions of the simplex tableau (without the right-hand-side column)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimplexShape {
    pub rows: usize,
    pub columns: usize,
}

impl SimplexShape {
    /// `ranks` lists the reference rank of each ranked alternative in chain
    /// order. Rows are the adjacent pairs plus normalization; columns are the
    /// fields, two error columns per alternative, one surplus per strictly
    /// ordered pair and one artificial per row.
    pub fn for_chain(ranks: &[usize], fields: usize) -> Self {
        let n = ranks.len();
        let ties = ranks.windows(2).filter(|w| w[0] == w[1]).count();
        let equalities = ties + 1;
        Self {
            rows: n,
            columns: fields + 2 * n + n.saturating_sub(equalities) + n,
        }
    }
}

/// The fitted program: the first `fields` variables are the per-segment
/// coefficients, followed by the over/under-estimation error of each ranked
/// alternative.
#[derive(Debug, Clone)]
pub struct ConstraintMatrix {
    pub problem: LpProblem,
    pub fields: usize,
    pub shape: SimplexShape,
}

impl ConstraintMatrix {
    /// Build the program for a preference chain.
    ///
    /// `alternatives`, `rows` and `ranks` are parallel and sorted by reference
    /// rank. Consecutive alternatives with different ranks must differ in
    /// utility by at least `delta`; tied neighbours must have equal utility.
    /// Each alternative `i` carries errors `sigma+` (column `fields + 2i`) and
    /// `sigma-` (column `fields + 2i + 1`) at unit cost, so the optimum is the
    /// smallest total ranking violation. A final row makes the coefficients
    /// sum to 1.
    pub fn build(
        criteria: &[Criterion],
        alternatives: &[Alternative],
        rows: &[Vec<f64>],
        ranks: &[usize],
        delta: f64,
    ) -> Self {
        let n = alternatives.len();
        let fields = rows.first().map(|r| r.len()).unwrap_or(0);

        let mut variables = Vec::with_capacity(fields + 2 * n);
        for criterion in criteria {
            for s in 0..criterion.segments {
                variables.push(format!("{}[{}]", criterion.name, s));
            }
        }
        for alternative in alternatives {
            variables.push(format!("sigma+({})", alternative.name));
            variables.push(format!("sigma-({})", alternative.name));
        }

        let mut problem = LpProblem::new(variables);
        let mut costs = vec![0.0; fields + 2 * n];
        for cost in &mut costs[fields..] {
            *cost = 1.0;
        }
        problem.set_costs(costs);

        for r in 0..n.saturating_sub(1) {
            let mut coefficients = vec![0.0; fields + 2 * n];
            for c in 0..fields {
                coefficients[c] = rows[r][c] - rows[r + 1][c];
            }
            // U'(a) = U(a) - sigma+(a) + sigma-(a)
            coefficients[fields + 2 * r] = -1.0;
            coefficients[fields + 2 * r + 1] = 1.0;
            coefficients[fields + 2 * r + 2] = 1.0;
            coefficients[fields + 2 * r + 3] = -1.0;

            let (better, worse) = (&alternatives[r].name, &alternatives[r + 1].name);
            if ranks[r] == ranks[r + 1] {
                problem.add_constraint(format!("{better} = {worse}"), coefficients, ConstraintOp::Eq, 0.0);
            } else {
                problem.add_constraint(format!("{better} > {worse}"), coefficients, ConstraintOp::Ge, delta);
            }
        }

        let mut normalization = vec![0.0; fields + 2 * n];
        normalization[..fields].fill(1.0);
        problem.add_constraint("normalization", normalization, ConstraintOp::Eq, 1.0);

        let shape = SimplexShape::for_chain(ranks, fields);
        debug_assert_eq!(shape.columns, problem.num_columns());
        debug!(rows = shape.rows, columns = shape.columns, fields, "built constraint matrix");

        Self { problem, fields, shape }
    }
}

/// One pairwise restriction `coefficients . x >= rhs` over the per-segment
/// coefficients
#[derive(Debug, Clone, PartialEq)]
pub struct Restriction {
    pub coefficients: Vec<f64>,
    pub rhs: f64,
}

/// Exact number of restriction rows: one per pair separated by at least
/// `delta` (compared as the Kendall matrix does), two per tied pair. `utilities` must be sorted descending.
pub fn restriction_count(utilities: &[f64], delta: f64) -> usize {
    let mut count = 0;
    for (p, &better) in utilities.iter().enumerate() {
        for &worse in &utilities[p + 1..] {
            count += if separated(better - worse, delta) { 1 } else { 2 };
        }
    }
    count
}

/// Restrictions for every pair of ranked alternatives in inferred order.
///
/// `order` lists indices into `rows`/`utilities` sorted by descending
/// utility. A pair whose gap reaches `delta` must keep it (`rhs = delta`); a
/// pair inside the tie tolerance yields two opposite rows with `rhs = 0`.
pub fn pairwise_restrictions(rows: &[Vec<f64>], utilities: &[f64], order: &[usize], delta: f64) -> Vec<Restriction> {
    let sorted: Vec<f64> = order.iter().map(|&i| utilities[i]).collect();
    let mut restrictions = Vec::with_capacity(restriction_count(&sorted, delta));

    for (p, &i) in order.iter().enumerate() {
        for &j in &order[p + 1..] {
            let diff: Vec<f64> = rows[i]
                .iter()
                .zip(&rows[j])
                .map(|(a, b)| round_to(a - b, UTILITY_DIGITS))
                .collect();

            if separated(utilities[i] - utilities[j], delta) {
                restrictions.push(Restriction {
                    coefficients: diff,
                    rhs: delta,
                });
            } else {
                let reversed = diff.iter().map(|d| -d).collect();
                restrictions.push(Restriction {
                    coefficients: diff,
                    rhs: 0.0,
                });
                restrictions.push(Restriction {
                    coefficients: reversed,
                    rhs: 0.0,
                });
            }
        }
    }

    restrictions
}
