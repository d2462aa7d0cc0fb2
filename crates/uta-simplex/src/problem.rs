/// A minimisation program over non-negative variables.
///
/// Preference disaggregation only ever produces two row shapes: a ranked pair
/// whose utility gap must reach a threshold (`Ge` with a non-negative
/// right-hand side) and ties or normalization (`Eq`). Costs are per variable;
/// there is no maximisation mode.
#[derive(Debug, Clone)]
pub struct LpProblem {
    pub variables: Vec<String>,
    /// One cost per variable, zero unless set
    pub costs: Vec<f64>,
    pub constraints: Vec<Constraint>,
}

/// `coefficients . x (op) rhs`
#[derive(Debug, Clone)]
pub struct Constraint {
    /// Shown in violation reports, e.g. `A > B`
    pub name: String,
    pub coefficients: Vec<f64>,
    pub op: ConstraintOp,
    pub rhs: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// `>=`; the tableau gives the row a surplus column
    Ge,
    /// `=`
    Eq,
}

impl Constraint {
    /// Left-hand side at `x`; missing trailing values count as zero
    pub fn activity(&self, x: &[f64]) -> f64 {
        self.coefficients.iter().zip(x).map(|(a, v)| a * v).sum()
    }
}

impl LpProblem {
    pub fn new(variables: Vec<String>) -> Self {
        let costs = vec![0.0; variables.len()];
        Self {
            variables,
            costs,
            constraints: Vec::new(),
        }
    }

    pub fn set_costs(&mut self, costs: Vec<f64>) {
        self.costs = costs;
    }

    pub fn add_constraint(&mut self, name: impl Into<String>, coefficients: Vec<f64>, op: ConstraintOp, rhs: f64) {
        self.constraints.push(Constraint {
            name: name.into(),
            coefficients,
            op,
            rhs,
        });
    }

    /// Total cost of `x` over the structural variables
    pub fn cost(&self, x: &[f64]) -> f64 {
        self.costs.iter().zip(x).map(|(c, v)| c * v).sum()
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn num_surplus(&self) -> usize {
        self.constraints.iter().filter(|c| c.op == ConstraintOp::Ge).count()
    }

    /// Tableau width without the right-hand side: structural, one surplus
    /// per `Ge` row, one artificial per row
    pub fn num_columns(&self) -> usize {
        self.num_variables() + self.num_surplus() + self.num_constraints()
    }
}
