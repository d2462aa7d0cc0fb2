mod problem;
mod simplex;
mod solution;

pub use problem::{Constraint, ConstraintOp, LpProblem};
pub use simplex::{SimplexError, Solver};
pub use solution::{ConstraintViolation, Solution, SolutionStatus, SparseValues};
