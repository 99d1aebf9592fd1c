use crate::solution::SolveError;

/// Represents an integer linear program in inequality form.
///
/// Every decision variable is implicitly non-negative. The objective
/// direction is not part of the model; it is passed alongside it as a
/// [`Sense`] so the same model can be solved both ways.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Model {
    /// Coefficient rows, one per constraint
    pub constraints: Vec<Vec<f64>>,
    /// Comparison operator of each row
    pub ops: Vec<ConstraintOp>,
    /// Right-hand side of each row
    pub rhs: Vec<f64>,
    /// Objective coefficients, one per decision variable
    pub objective: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ConstraintOp {
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
}

/// Direction of optimization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Sense {
    #[default]
    Maximize,
    Minimize,
}

impl ConstraintOp {
    /// Maps the boolean row flag used by matrix-style callers (`true` = ">=").
    pub fn from_ge_flag(ge: bool) -> Self {
        if ge { ConstraintOp::Ge } else { ConstraintOp::Le }
    }
}

impl Sense {
    pub fn from_maximize(maximize: bool) -> Self {
        if maximize { Sense::Maximize } else { Sense::Minimize }
    }

    pub fn is_maximize(self) -> bool {
        self == Sense::Maximize
    }

    /// Converts an objective value between the caller's sense and the
    /// maximize form the tableau works in. The mapping is its own inverse.
    pub(crate) fn to_maximize_form(self, value: f64) -> f64 {
        match self {
            Sense::Maximize => value,
            Sense::Minimize => -value,
        }
    }
}

impl Model {
    pub fn new(num_variables: usize) -> Self {
        Self {
            constraints: Vec::new(),
            ops: Vec::new(),
            rhs: Vec::new(),
            objective: vec![0.0; num_variables],
        }
    }

    /// Builds a model from the raw matrix form: rows, one `>=` flag per row,
    /// right-hand sides and objective coefficients.
    pub fn from_signs(constraints: Vec<Vec<f64>>, signs: &[bool], rhs: Vec<f64>, objective: Vec<f64>) -> Self {
        Self {
            constraints,
            ops: signs.iter().map(|&ge| ConstraintOp::from_ge_flag(ge)).collect(),
            rhs,
            objective,
        }
    }

    pub fn set_objective(&mut self, coefficients: Vec<f64>) {
        self.objective = coefficients;
    }

    pub fn add_constraint(&mut self, coefficients: Vec<f64>, op: ConstraintOp, rhs: f64) {
        self.constraints.push(coefficients);
        self.ops.push(op);
        self.rhs.push(rhs);
    }

    pub fn num_variables(&self) -> usize {
        self.objective.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Checks the shape of the model before any pivoting happens.
    pub fn validate(&self) -> Result<(), SolveError> {
        let n_vars = self.num_variables();
        let n_rows = self.num_constraints();

        if n_vars == 0 {
            return Err(SolveError::InvalidModel("objective has no coefficients".to_string()));
        }
        if n_rows == 0 {
            return Err(SolveError::InvalidModel("model has no constraints".to_string()));
        }
        if self.ops.len() != n_rows {
            return Err(SolveError::InvalidModel(format!(
                "{} constraint rows but {} operators",
                n_rows,
                self.ops.len()
            )));
        }
        if self.rhs.len() != n_rows {
            return Err(SolveError::InvalidModel(format!(
                "{} constraint rows but {} right-hand sides",
                n_rows,
                self.rhs.len()
            )));
        }
        for (i, row) in self.constraints.iter().enumerate() {
            if row.len() != n_vars {
                return Err(SolveError::InvalidModel(format!(
                    "row {} has {} coefficients, expected {}",
                    i,
                    row.len(),
                    n_vars
                )));
            }
            if row.iter().any(|c| !c.is_finite()) {
                return Err(SolveError::InvalidModel(format!("row {} has a non-finite coefficient", i)));
            }
        }
        if let Some(i) = self.rhs.iter().position(|b| !b.is_finite()) {
            return Err(SolveError::InvalidModel(format!("right-hand side {} is not finite", i)));
        }
        if self.objective.iter().any(|c| !c.is_finite()) {
            return Err(SolveError::InvalidModel("objective has a non-finite coefficient".to_string()));
        }

        Ok(())
    }

    /// Returns a copy of this model with one extra row bounding a single
    /// decision variable: `x[column] <op> bound`.
    pub(crate) fn with_bound(&self, column: usize, op: ConstraintOp, bound: f64) -> Model {
        let mut unit = vec![0.0; self.num_variables()];
        unit[column] = 1.0;

        let mut model = self.clone();
        model.add_constraint(unit, op, bound);
        model
    }
}
