use std::collections::BTreeMap;

/// The result of solving an LP problem
#[derive(Debug, Clone)]
pub struct Solution {
    /// Solution status
    pub status: SolutionStatus,
    /// Values of the basic columns, keyed by tableau column index
    pub values: SparseValues,
    /// Objective value over the structural variables
    pub objective_value: f64,
    /// Number of pivots performed across both phases
    pub iterations: usize,
    /// Rows left unsatisfied by the returned values
    pub violations: Vec<ConstraintViolation>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    /// An optimal solution was found
    Optimal,
    /// The iteration cap was reached before optimality could be verified;
    /// the values are those of the last tableau
    IterationLimit,
    /// The problem is infeasible (no solution exists)
    Infeasible,
    /// The problem is unbounded
    Unbounded,
}

/// Column values read off the final right-hand side.
///
/// Keys lie in `0..columns`, where `columns` is the tableau width without the
/// right-hand side: structural variables first, then surplus columns, then one
/// artificial column per row. Columns without an entry are non-basic zeros.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseValues {
    entries: BTreeMap<usize, f64>,
    columns: usize,
}

/// Information about a violated constraint
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintViolation {
    /// Constraint name
    pub constraint: String,
    /// Required value (from constraint RHS)
    pub required: f64,
    /// Actual value achieved
    pub actual: f64,
    /// How much the constraint is violated by
    pub violation_amount: f64,
    /// Human-readable description of what's wrong
    pub description: String,
}

impl SparseValues {
    pub fn new(columns: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            columns,
        }
    }

    pub fn insert(&mut self, column: usize, value: f64) {
        debug_assert!(column < self.columns, "column {column} outside 0..{}", self.columns);
        self.entries.insert(column, value);
    }

    /// Value of a column; non-basic columns read as zero
    pub fn get(&self, column: usize) -> f64 {
        self.entries.get(&column).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, column: usize) -> bool {
        self.entries.contains_key(&column)
    }

    /// Total number of tableau columns the keys range over
    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.entries.iter().map(|(&k, &v)| (k, v))
    }

    /// Dense copy of the first `len` columns
    pub fn to_dense(&self, len: usize) -> Vec<f64> {
        (0..len).map(|j| self.get(j)).collect()
    }
}

impl Solution {
    pub fn infeasible(values: SparseValues, iterations: usize, violations: Vec<ConstraintViolation>) -> Self {
        Self {
            status: SolutionStatus::Infeasible,
            values,
            objective_value: f64::INFINITY,
            iterations,
            violations,
        }
    }

    pub fn unbounded(columns: usize, iterations: usize) -> Self {
        Self {
            status: SolutionStatus::Unbounded,
            values: SparseValues::new(columns),
            objective_value: f64::NEG_INFINITY,
            iterations,
            violations: Vec::new(),
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }
}
