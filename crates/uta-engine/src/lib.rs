pub mod encoder;
pub mod error;
pub mod instance;
pub mod kendall;
pub mod matrix;
pub mod model;
pub mod numeric;
pub mod options;
pub mod post_optimality;
pub mod ranking;
pub mod rebalance;
pub mod session;
pub mod utility;

pub use error::UtaError;
pub use instance::Instance;
pub use model::*;
pub use options::{Settings, SolverOptions};
pub use post_optimality::Interval;
pub use session::{LpReport, SolveContext, SolveResult, SolveStatus, UtaSolver};
pub use utility::Coefficients;
