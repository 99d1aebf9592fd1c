mod branch;
mod dual;
mod problem;
mod simplex;
mod solution;
mod tableau;

pub use branch::BranchStats;
pub use problem::{ConstraintOp, Model, Sense};
pub use simplex::{Method, Solver};
pub use solution::{Solution, SolveError};
