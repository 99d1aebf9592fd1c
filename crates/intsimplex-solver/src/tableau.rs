use std::fmt;

use crate::problem::{ConstraintOp, Model, Sense};
use crate::solution::{Solution, SolveError};

/// Canonical form of a model: every row is `<=`, the objective is maximized
/// and one slack column per row forms the starting basis.
///
/// A tableau owns copies of the model's data and is mutated in place by
/// pivoting for the duration of a single solve.
#[derive(Debug, Clone)]
pub(crate) struct Tableau {
    /// Constraint coefficients, decision columns followed by the slack block
    pub(crate) rows: Vec<Vec<f64>>,
    pub(crate) rhs: Vec<f64>,
    /// Maximize-form objective, zero on slack columns
    pub(crate) objective: Vec<f64>,
    /// Column that is basic in each row
    pub(crate) basic_vars: Vec<usize>,
    /// Objective coefficient of each row's basic column
    pub(crate) basic_costs: Vec<f64>,
    pub(crate) n_vars: usize,
}

impl Tableau {
    pub(crate) fn canonical(model: &Model, sense: Sense) -> Self {
        let n_vars = model.num_variables();
        let n_rows = model.num_constraints();
        let n_cols = n_vars + n_rows;

        let objective = (0..n_cols)
            .map(|j| match model.objective.get(j) {
                Some(&coef) => sense.to_maximize_form(coef),
                None => 0.0,
            })
            .collect();

        let mut rows = Vec::with_capacity(n_rows);
        let mut rhs = Vec::with_capacity(n_rows);
        for (i, coefficients) in model.constraints.iter().enumerate() {
            // >= rows are negated into <= rows; this may leave a negative rhs
            let flip = if model.ops[i] == ConstraintOp::Ge { -1.0 } else { 1.0 };

            let mut row = vec![0.0; n_cols];
            for (j, &coef) in coefficients.iter().enumerate() {
                row[j] = flip * coef;
            }
            row[n_vars + i] = 1.0;

            rows.push(row);
            rhs.push(flip * model.rhs[i]);
        }

        Self {
            rows,
            rhs,
            objective,
            basic_vars: (n_vars..n_cols).collect(),
            basic_costs: vec![0.0; n_rows],
            n_vars,
        }
    }

    pub(crate) fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub(crate) fn num_cols(&self) -> usize {
        self.objective.len()
    }

    /// Reduced cost of every column under the current basis
    pub(crate) fn index_row(&self) -> Vec<f64> {
        (0..self.num_cols())
            .map(|j| {
                let weighted: f64 = self
                    .rows
                    .iter()
                    .zip(&self.basic_costs)
                    .map(|(row, &cost)| cost * row[j])
                    .sum();
                weighted - self.objective[j]
            })
            .collect()
    }

    /// Whether some row starts with a negative right-hand side, i.e. the
    /// slack basis is not primal feasible
    pub(crate) fn has_negative_rhs(&self) -> bool {
        self.rhs.iter().any(|&b| b < 0.0)
    }

    /// Gauss-Jordan pivot on `(row, col)`, making `col` basic in `row`.
    pub(crate) fn pivot(&mut self, row: usize, col: usize) {
        let pivot_val = self.rows[row][col];
        for value in self.rows[row].iter_mut() {
            *value /= pivot_val;
        }
        self.rhs[row] /= pivot_val;

        let pivot_row = self.rows[row].clone();
        let pivot_rhs = self.rhs[row];
        for i in 0..self.rows.len() {
            if i == row {
                continue;
            }
            let factor = self.rows[i][col];
            if factor == 0.0 {
                continue;
            }
            for (value, &p) in self.rows[i].iter_mut().zip(&pivot_row) {
                *value -= factor * p;
            }
            self.rhs[i] -= factor * pivot_rhs;
        }

        self.basic_vars[row] = col;
        self.basic_costs[row] = self.objective[col];
    }

    /// Objective value of the current basis in maximize form
    pub(crate) fn objective_value(&self) -> f64 {
        self.basic_costs.iter().zip(&self.rhs).map(|(c, b)| c * b).sum()
    }

    /// Value of every column under the current basis
    pub(crate) fn plan(&self) -> Vec<f64> {
        let mut plan = vec![0.0; self.num_cols()];
        for (i, &basic) in self.basic_vars.iter().enumerate() {
            plan[basic] = self.rhs[i];
        }
        plan
    }

    /// Reads the solution off a finished tableau. A basis that still holds a
    /// negative value is not a plan at all and is reported as infeasible.
    pub(crate) fn into_solution(self, sense: Sense, tolerance: f64) -> Result<Solution, SolveError> {
        if self.rhs.iter().any(|&b| b < -tolerance) {
            return Err(SolveError::Infeasible);
        }

        Ok(Solution {
            objective_value: sense.to_maximize_form(self.objective_value()),
            plan: self.plan(),
            num_variables: self.n_vars,
        })
    }
}

impl fmt::Display for Tableau {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>6} {:>10}", "basis", "rhs")?;
        for j in 0..self.num_cols() {
            let label = if j < self.n_vars {
                format!("x{}", j)
            } else {
                format!("s{}", j - self.n_vars)
            };
            write!(f, " {:>10}", label)?;
        }
        writeln!(f)?;

        for (i, row) in self.rows.iter().enumerate() {
            write!(f, "{:>6} {:>10.4}", self.basic_vars[i], self.rhs[i])?;
            for value in row {
                write!(f, " {:>10.4}", value)?;
            }
            writeln!(f)?;
        }

        write!(f, "{:>6} {:>10.4}", "delta", self.objective_value())?;
        for value in self.index_row() {
            write!(f, " {:>10.4}", value)?;
        }
        Ok(())
    }
}
