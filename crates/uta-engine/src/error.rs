use thiserror::Error;
use uta_simplex::{SimplexError, SolutionStatus};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum UtaError {
    // Configuration
    #[error("At least one criterion is required")]
    NoCriteria,
    #[error("Criterion '{criterion}' has {segments} linear segments; expected 1 to 99")]
    InvalidSegments { criterion: String, segments: usize },
    #[error("Criterion direction must be \"Gain\" or \"Cost\", got \"{0}\"")]
    InvalidDirection(String),
    #[error("Criterion '{criterion}' has a degenerate range [{min}, {max}]; at least two distinct values are required")]
    DegenerateCriterion { criterion: String, min: f64, max: f64 },
    #[error("Delta threshold must be between 0 and 1 inclusive, got {0}")]
    InvalidDeltaThreshold(f64),
    #[error("Duplicate criterion name: {0}")]
    DuplicateCriterion(String),
    #[error("Duplicate alternative name: {0}")]
    DuplicateAlternative(String),

    // Input consistency
    #[error("Reference ranking needs at least 2 ranks, got {0}")]
    TooFewRankGroups(usize),
    #[error("Rank {0} of the reference ranking is empty")]
    EmptyRankGroup(usize),
    #[error("Alternative '{alternative}' has no value for criterion '{criterion}'")]
    MissingValue { alternative: String, criterion: String },
    #[error("Unknown criterion: {0}")]
    UnknownCriterion(String),
    #[error("No utility function supplied for criterion '{0}'")]
    MissingUtilityFunction(String),
    #[error("Utility function for '{criterion}' has {found} points; expected {expected}")]
    MalformedUtilityFunction {
        criterion: String,
        expected: usize,
        found: usize,
    },
    #[error("Criterion '{criterion}' has no point {index} (it has {len})")]
    PointIndexOutOfRange { criterion: String, index: usize, len: usize },

    // Range violation
    #[error("Value {value} for point {index} of '{criterion}' is outside its feasible range [{min}, {max}]")]
    ValueOutOfRange {
        criterion: String,
        index: usize,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("No utility functions yet; solve or load a state first")]
    NotSolved,

    // Solver
    #[error("Simplex error: {0}")]
    Simplex(#[from] SimplexError),
    #[error("Simplex ended with status {0:?}")]
    SolverFailure(SolutionStatus),
}
