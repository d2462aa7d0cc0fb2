use thiserror::Error;
use tracing::debug;

use crate::problem::{ConstraintOp, LpProblem};
use crate::solution::{ConstraintViolation, Solution, SolutionStatus, SparseValues};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimplexError {
    #[error("Cost vector has {found} entries but the problem has {expected} variables")]
    CostMismatch { expected: usize, found: usize },
    #[error("Constraint {constraint} has {found} coefficients but the problem has {expected} variables")]
    DimensionMismatch {
        constraint: String,
        expected: usize,
        found: usize,
    },
    #[error("Constraint {constraint} has right-hand side {rhs}; expected a finite non-negative value")]
    InvalidRhs { constraint: String, rhs: f64 },
}

/// Tableau simplex for programs of the shape described by [`LpProblem`].
///
/// Every row starts with its own artificial column in the basis. Artificial
/// columns carry an infinite cost, which is resolved lexicographically: phase
/// one drives them to zero, phase two minimises the real objective with
/// artificial columns barred from re-entering. Pivoting follows Bland's rule,
/// so degenerate rows (ties with a zero right-hand side) cannot cycle.
pub struct Solver {
    /// Maximum pivots across both phases before giving up
    max_iterations: usize,
    /// Tolerance for floating point comparisons
    tolerance: f64,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            max_iterations: 250,
            tolerance: 1e-9,
        }
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Solve the LP problem using the two-phase simplex method.
    ///
    /// Reaching the iteration cap is not an error: the values of the last
    /// tableau are returned with [`SolutionStatus::IterationLimit`].
    pub fn solve(&self, problem: &LpProblem) -> Result<Solution, SimplexError> {
        let mut tableau = self.build_tableau(problem)?;
        let mut iterations = 0;
        debug!(
            rows = problem.num_constraints(),
            columns = problem.num_columns(),
            "built simplex tableau"
        );

        // Phase 1: drive the artificial columns out of the basis
        match self.phase1(&mut tableau, &mut iterations) {
            SimplexResult::Optimal => {}
            SimplexResult::IterationLimit => {
                debug!(iterations, phase = 1, "iteration limit reached");
                return Ok(self.extract_solution(&tableau, problem, SolutionStatus::IterationLimit, iterations));
            }
            // Phase 1 is bounded below by zero; an empty ratio test means the
            // tableau has degenerated numerically.
            SimplexResult::Unbounded => return Ok(self.infeasible(&tableau, problem, iterations)),
        }

        if !self.artificials_cleared(&tableau) {
            debug!(iterations, "artificial columns remain positive after phase 1");
            return Ok(self.infeasible(&tableau, problem, iterations));
        }
        self.drive_out_artificials(&mut tableau);
        debug!(iterations, "phase 1 complete");

        // Phase 2: minimise the real objective
        self.restore_objective(&mut tableau, problem);
        match self.iterate(&mut tableau, &mut iterations) {
            SimplexResult::Optimal => {}
            SimplexResult::IterationLimit => {
                debug!(iterations, phase = 2, "iteration limit reached");
                return Ok(self.extract_solution(&tableau, problem, SolutionStatus::IterationLimit, iterations));
            }
            SimplexResult::Unbounded => return Ok(Solution::unbounded(problem.num_columns(), iterations)),
        }

        debug!(iterations, "phase 2 complete");
        Ok(self.extract_solution(&tableau, problem, SolutionStatus::Optimal, iterations))
    }

    /// Find which constraints are violated by a given assignment of the
    /// structural variables
    fn find_violations(&self, problem: &LpProblem, values: &[f64]) -> Vec<ConstraintViolation> {
        let mut violations = Vec::new();

        for c in &problem.constraints {
            let lhs = c.activity(values);

            let violation = match c.op {
                ConstraintOp::Ge if lhs < c.rhs - self.tolerance => {
                    let amt = c.rhs - lhs;
                    Some((amt, format!("{} is below minimum of {:e} by {:e}", c.name, c.rhs, amt)))
                }
                ConstraintOp::Eq if (lhs - c.rhs).abs() > self.tolerance => {
                    let amt = (lhs - c.rhs).abs();
                    Some((amt, format!("{} requires exactly {:e} but got {:e}", c.name, c.rhs, lhs)))
                }
                _ => None,
            };

            if let Some((violation_amount, description)) = violation {
                violations.push(ConstraintViolation {
                    constraint: c.name.clone(),
                    required: c.rhs,
                    actual: lhs,
                    violation_amount,
                    description,
                });
            }
        }

        // Sort by violation amount (worst first)
        violations.sort_by(|a, b| b.violation_amount.total_cmp(&a.violation_amount));

        violations
    }

    fn build_tableau(&self, problem: &LpProblem) -> Result<Tableau, SimplexError> {
        let n_vars = problem.num_variables();
        let n_constraints = problem.num_constraints();

        if problem.costs.len() != n_vars {
            return Err(SimplexError::CostMismatch {
                expected: n_vars,
                found: problem.costs.len(),
            });
        }

        let n_slack = problem.num_surplus();
        let n_artificial = n_constraints;

        let total_cols = n_vars + n_slack + n_artificial + 1; // +1 for RHS
        let total_rows = n_constraints + 1; // +1 for objective

        let mut tableau = Tableau {
            data: vec![vec![0.0; total_cols]; total_rows],
            basic_vars: vec![0; n_constraints],
            n_vars,
            n_slack,
        };

        let mut slack_idx = n_vars;
        let art_start = n_vars + n_slack;

        for (i, c) in problem.constraints.iter().enumerate() {
            if c.coefficients.len() != n_vars {
                return Err(SimplexError::DimensionMismatch {
                    constraint: c.name.clone(),
                    expected: n_vars,
                    found: c.coefficients.len(),
                });
            }
            if !c.rhs.is_finite() || c.rhs < 0.0 {
                return Err(SimplexError::InvalidRhs {
                    constraint: c.name.clone(),
                    rhs: c.rhs,
                });
            }

            tableau.data[i][..n_vars].copy_from_slice(&c.coefficients);
            tableau.data[i][total_cols - 1] = c.rhs;

            if c.op == ConstraintOp::Ge {
                tableau.data[i][slack_idx] = -1.0; // surplus
                slack_idx += 1;
            }

            // Identity block: one artificial per row seeds the basis
            tableau.data[i][art_start + i] = 1.0;
            tableau.basic_vars[i] = art_start + i;
        }

        Ok(tableau)
    }

    fn phase1(&self, tableau: &mut Tableau, iterations: &mut usize) -> SimplexResult {
        // Auxiliary objective: maximize -sum(artificials)
        let obj_row = tableau.obj_row();
        let n_cols = tableau.data[0].len();
        let art_start = tableau.art_start();

        tableau.data[obj_row].fill(0.0);
        for j in art_start..(n_cols - 1) {
            tableau.data[obj_row][j] = -1.0;
        }

        // Every row starts with its artificial basic; add the rows to cancel
        // the -1 entries and express the objective in the current basis
        for i in 0..obj_row {
            if tableau.basic_vars[i] >= art_start {
                for j in 0..n_cols {
                    tableau.data[obj_row][j] += tableau.data[i][j];
                }
            }
        }

        self.iterate(tableau, iterations)
    }

    fn artificials_cleared(&self, tableau: &Tableau) -> bool {
        let rhs_col = tableau.rhs_col();
        let art_start = tableau.art_start();
        (0..tableau.obj_row())
            .filter(|&i| tableau.basic_vars[i] >= art_start)
            .all(|i| tableau.data[i][rhs_col].abs() <= self.tolerance)
    }

    /// Pivot zero-level artificials out of the basis wherever a structural or
    /// surplus column can replace them. Rows without such a column are
    /// redundant and keep their artificial at zero.
    fn drive_out_artificials(&self, tableau: &mut Tableau) {
        let art_start = tableau.art_start();
        for i in 0..tableau.obj_row() {
            if tableau.basic_vars[i] < art_start {
                continue;
            }
            if let Some(col) = (0..art_start).find(|&j| tableau.data[i][j].abs() > self.tolerance) {
                self.pivot(tableau, i, col);
            }
        }
    }

    fn restore_objective(&self, tableau: &mut Tableau, problem: &LpProblem) {
        // Simplex maximizes, so the minimised costs are stored negated
        let obj_row = tableau.obj_row();
        let n_cols = tableau.data[0].len();

        tableau.data[obj_row].fill(0.0);
        for (j, &coef) in problem.costs.iter().enumerate() {
            tableau.data[obj_row][j] = -coef;
        }

        for i in 0..obj_row {
            let basic = tableau.basic_vars[i];
            let ratio = tableau.data[obj_row][basic];
            if ratio.abs() > self.tolerance {
                for j in 0..n_cols {
                    tableau.data[obj_row][j] -= ratio * tableau.data[i][j];
                }
            }
        }
    }

    fn iterate(&self, tableau: &mut Tableau, iterations: &mut usize) -> SimplexResult {
        loop {
            let Some(pivot_col) = self.find_pivot_column(tableau) else {
                return SimplexResult::Optimal;
            };
            if *iterations >= self.max_iterations {
                return SimplexResult::IterationLimit;
            }
            let Some(pivot_row) = self.find_pivot_row(tableau, pivot_col) else {
                return SimplexResult::Unbounded;
            };
            self.pivot(tableau, pivot_row, pivot_col);
            *iterations += 1;
        }
    }

    /// Bland's rule: the lowest-index improving column. Artificial columns
    /// never enter.
    fn find_pivot_column(&self, tableau: &Tableau) -> Option<usize> {
        let obj_row = tableau.obj_row();
        (0..tableau.art_start()).find(|&j| tableau.data[obj_row][j] > self.tolerance)
    }

    /// Minimum-ratio test; ties go to the row whose basic variable has the
    /// lowest index.
    fn find_pivot_row(&self, tableau: &Tableau, col: usize) -> Option<usize> {
        let rhs_col = tableau.rhs_col();

        let mut best: Option<(usize, f64)> = None;
        for i in 0..tableau.obj_row() {
            let val = tableau.data[i][col];
            if val <= self.tolerance {
                continue;
            }
            let ratio = (tableau.data[i][rhs_col] / val).max(0.0);
            best = match best {
                None => Some((i, ratio)),
                Some((_, min)) if ratio < min - self.tolerance => Some((i, ratio)),
                Some((row, min))
                    if (ratio - min).abs() <= self.tolerance && tableau.basic_vars[i] < tableau.basic_vars[row] =>
                {
                    Some((i, ratio.min(min)))
                }
                keep => keep,
            };
        }

        best.map(|(row, _)| row)
    }

    fn pivot(&self, tableau: &mut Tableau, row: usize, col: usize) {
        let n_rows = tableau.data.len();
        let n_cols = tableau.data[0].len();

        // Update basic variable
        tableau.basic_vars[row] = col;

        // Scale pivot row
        let pivot_val = tableau.data[row][col];
        for j in 0..n_cols {
            tableau.data[row][j] /= pivot_val;
        }

        // Eliminate column in other rows
        for i in 0..n_rows {
            if i != row {
                let factor = tableau.data[i][col];
                if factor == 0.0 {
                    continue;
                }
                for j in 0..n_cols {
                    tableau.data[i][j] -= factor * tableau.data[row][j];
                }
            }
        }
    }

    fn infeasible(&self, tableau: &Tableau, problem: &LpProblem, iterations: usize) -> Solution {
        let solution = self.extract_solution(tableau, problem, SolutionStatus::Infeasible, iterations);
        Solution::infeasible(solution.values, iterations, solution.violations)
    }

    fn extract_solution(
        &self,
        tableau: &Tableau,
        problem: &LpProblem,
        status: SolutionStatus,
        iterations: usize,
    ) -> Solution {
        let rhs_col = tableau.rhs_col();

        let mut values = SparseValues::new(problem.num_columns());
        for (i, &basic) in tableau.basic_vars.iter().enumerate() {
            values.insert(basic, tableau.data[i][rhs_col]);
        }

        let structural = values.to_dense(tableau.n_vars);
        let objective_value = problem.cost(&structural);
        let violations = self.find_violations(problem, &structural);

        Solution {
            status,
            values,
            objective_value,
            iterations,
            violations,
        }
    }
}

struct Tableau {
    data: Vec<Vec<f64>>,
    basic_vars: Vec<usize>,
    n_vars: usize,
    n_slack: usize,
}

impl Tableau {
    fn obj_row(&self) -> usize {
        self.data.len() - 1
    }

    fn rhs_col(&self) -> usize {
        self.data[0].len() - 1
    }

    fn art_start(&self) -> usize {
        self.n_vars + self.n_slack
    }
}

enum SimplexResult {
    Optimal,
    Unbounded,
    IterationLimit,
}
