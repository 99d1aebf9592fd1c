use thiserror::Error;

/// The result of solving a model
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Solution {
    /// Optimal objective value, in the caller's sense
    pub objective_value: f64,
    /// Value of every column: decision variables first, then one slack per row
    /// in the order the rows were added
    pub plan: Vec<f64>,
    /// Number of leading plan entries that are decision variables
    pub num_variables: usize,
}

/// Why a solve did not produce a solution
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error("Problem is unbounded: the objective grows without limit")]
    Unbounded,
    #[error("Problem is infeasible: no plan satisfies every constraint")]
    Infeasible,
    /// Every child of a fractional incumbent was pruned. Children whose
    /// objective is exactly zero are pruned too, so a model whose integer
    /// optimum is zero also ends here.
    #[error("No integer solution: every branch was pruned while the incumbent is still fractional")]
    NoIntegerSolution,
    #[error("Iteration limit of {0} pivots reached")]
    IterationLimit(usize),
    #[error("Invalid model: {0}")]
    InvalidModel(String),
}

impl Solution {
    /// Values of the decision variables
    pub fn values(&self) -> &[f64] {
        &self.plan[..self.num_variables]
    }

    /// Values of the slack variables, one per constraint row
    pub fn slacks(&self) -> &[f64] {
        &self.plan[self.num_variables..]
    }
}
