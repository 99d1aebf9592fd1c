use log::{debug, trace};

use crate::branch::{BranchAndBound, BranchStats};
use crate::dual;
use crate::problem::{Model, Sense};
use crate::solution::{Solution, SolveError};
use crate::tableau::Tableau;

/// Simplex solver for integer linear programming problems
#[derive(Debug, Clone)]
pub struct Solver {
    /// Maximum pivots per simplex loop before giving up
    max_iterations: usize,
    /// Tolerance for floating point comparisons during pivoting
    tolerance: f64,
    /// Fractional part below which a value counts as an integer
    integrality_tolerance: f64,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            max_iterations: 10000,
            tolerance: 1e-9,
            integrality_tolerance: 1e-10,
        }
    }
}

/// Which simplex variant solves a relaxation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    /// Pick from the shape of the canonical form, falling back to the other
    /// variant once on failure
    #[default]
    Auto,
    Primal,
    Dual,
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

    pub fn with_integrality_tolerance(mut self, tol: f64) -> Self {
        self.integrality_tolerance = tol;
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn integrality_tolerance(&self) -> f64 {
        self.integrality_tolerance
    }

    /// Solve the model with every decision variable restricted to integers
    pub fn solve(&self, model: &Model, sense: Sense) -> Result<Solution, SolveError> {
        self.solve_with_stats(model, sense).map(|(solution, _)| solution)
    }

    /// Like [`Solver::solve`], also reporting how much branching it took
    pub fn solve_with_stats(&self, model: &Model, sense: Sense) -> Result<(Solution, BranchStats), SolveError> {
        model.validate()?;
        debug!(
            "solving integer model: vars: {}, constraints: {}, sense: {:?}",
            model.num_variables(),
            model.num_constraints(),
            sense
        );
        BranchAndBound::new(self, model, sense).run()
    }

    /// Solve the linear relaxation only
    pub fn solve_relaxation(&self, model: &Model, sense: Sense, method: Method) -> Result<Solution, SolveError> {
        model.validate()?;
        match method {
            Method::Auto => self.solve_lp(model, sense),
            Method::Primal => self.solve_primal(model, sense),
            Method::Dual => self.solve_dual(model, sense),
        }
    }

    /// Solve the relaxation with the variant that fits the model's shape,
    /// retrying once with the other variant on a typed failure.
    pub(crate) fn solve_lp(&self, model: &Model, sense: Sense) -> Result<Solution, SolveError> {
        let dual_shaped = Tableau::canonical(model, sense).has_negative_rhs();

        if dual_shaped {
            match self.solve_dual(model, sense) {
                Err(SolveError::Infeasible) => {
                    debug!("dual simplex found no entering column, retrying with primal");
                    self.solve_primal(model, sense)
                }
                result => result,
            }
        } else {
            match self.solve_primal(model, sense) {
                Err(SolveError::Unbounded) => {
                    debug!("primal simplex reported unbounded, retrying with dual");
                    self.solve_dual(model, sense)
                }
                result => result,
            }
        }
    }

    pub(crate) fn solve_primal(&self, model: &Model, sense: Sense) -> Result<Solution, SolveError> {
        let mut tableau = Tableau::canonical(model, sense);
        optimize(&mut tableau, self.max_iterations, self.tolerance)?;
        tableau.into_solution(sense, self.tolerance)
    }

    pub(crate) fn solve_dual(&self, model: &Model, sense: Sense) -> Result<Solution, SolveError> {
        let mut tableau = Tableau::canonical(model, sense);
        dual::restore_feasibility(&mut tableau, self.max_iterations, self.tolerance)?;
        // no-op when the starting basis was dual feasible
        optimize(&mut tableau, self.max_iterations, self.tolerance)?;
        tableau.into_solution(sense, self.tolerance)
    }
}

/// Primal simplex: pivot until no column has a negative reduced cost.
/// Returns the number of pivots performed.
pub(crate) fn optimize(tableau: &mut Tableau, max_iterations: usize, tolerance: f64) -> Result<usize, SolveError> {
    let mut iter = 0;
    loop {
        let index_row = tableau.index_row();
        let Some(pivot_col) = find_pivot_column(&index_row, tolerance) else {
            debug!("primal optimum in {} pivots, obj.: {}", iter, tableau.objective_value());
            return Ok(iter);
        };
        if iter == max_iterations {
            return Err(SolveError::IterationLimit(max_iterations));
        }
        let Some(pivot_row) = find_pivot_row(tableau, pivot_col, tolerance) else {
            debug!("column {} improves without limit", pivot_col);
            return Err(SolveError::Unbounded);
        };
        tableau.pivot(pivot_row, pivot_col);
        trace!("primal pivot {} at ({}, {}):\n{}", iter, pivot_row, pivot_col, tableau);
        iter += 1;
    }
}

/// Entering column: most negative reduced cost, first one on ties
fn find_pivot_column(index_row: &[f64], tolerance: f64) -> Option<usize> {
    let mut min_val = -tolerance;
    let mut min_col = None;

    for (j, &value) in index_row.iter().enumerate() {
        if value < min_val {
            min_val = value;
            min_col = Some(j);
        }
    }

    min_col
}

/// Leaving row: smallest rhs ratio over strictly positive entries of the
/// entering column, first one on ties
fn find_pivot_row(tableau: &Tableau, col: usize, tolerance: f64) -> Option<usize> {
    let mut min_ratio = f64::INFINITY;
    let mut min_row = None;

    for i in 0..tableau.num_rows() {
        let val = tableau.rows[i][col];
        if val > tolerance {
            let ratio = tableau.rhs[i] / val;
            if ratio < min_ratio {
                min_ratio = ratio;
                min_row = Some(i);
            }
        }
    }

    min_row
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn primal(constraints: Vec<Vec<f64>>, rhs: Vec<f64>, objective: Vec<f64>) -> Result<Solution, SolveError> {
        init();
        let signs = vec![false; constraints.len()];
        let model = Model::from_signs(constraints, &signs, rhs, objective);
        Solver::new().solve_relaxation(&model, Sense::Maximize, Method::Primal)
    }

    fn assert_consistent(solution: &Solution, objective: &[f64]) {
        let recomputed: f64 = objective.iter().zip(solution.values()).map(|(c, x)| c * x).sum();
        assert!(
            approx_eq(recomputed, solution.objective_value),
            "objective {} but plan gives {}",
            solution.objective_value,
            recomputed
        );
    }

    #[test]
    fn test_simple_maximization() {
        let solution = primal(vec![vec![7.0, 3.0], vec![4.0, 1.0]], vec![21.0, 8.0], vec![8.0, 5.0]).unwrap();

        println!("Plan: {:?}", solution.plan);
        assert!(approx_eq(solution.objective_value, 35.0), "obj = {} (expected 35)", solution.objective_value);
        assert!(approx_eq(solution.plan[1], 7.0), "x1 = {} (expected 7)", solution.plan[1]);
        assert_eq!(solution.plan.len(), 4);
        assert_consistent(&solution, &[8.0, 5.0]);
    }

    #[test]
    fn test_negative_row_coefficients() {
        let solution = primal(
            vec![vec![-2.0, -3.0], vec![1.0, 1.0], vec![3.0, 1.0]],
            vec![15.0, 9.0, 24.0],
            vec![2.0, 5.0],
        )
        .unwrap();

        assert!(approx_eq(solution.objective_value, 45.0), "obj = {} (expected 45)", solution.objective_value);
        assert!(approx_eq(solution.values()[1], 9.0));
        assert_consistent(&solution, &[2.0, 5.0]);
    }

    #[test]
    fn test_negative_objective_coefficient() {
        let solution = primal(
            vec![vec![2.0, 5.0], vec![-3.0, 4.0], vec![2.0, 4.0]],
            vec![18.0, 10.0, 8.0],
            vec![1.0, -1.0],
        )
        .unwrap();
        assert!(approx_eq(solution.objective_value, 4.0), "obj = {} (expected 4)", solution.objective_value);

        let solution = primal(
            vec![vec![3.0, 1.0], vec![-1.0, -5.0], vec![2.0, 4.0]],
            vec![9.0, 6.0, 8.0],
            vec![5.0, -1.0],
        )
        .unwrap();
        assert!(approx_eq(solution.objective_value, 15.0), "obj = {} (expected 15)", solution.objective_value);
    }

    #[test]
    fn test_redundant_bound_row() {
        let solution = primal(
            vec![vec![5.0, 3.0], vec![3.0, 5.0], vec![0.0, 1.0]],
            vec![15.0, 15.0, 8.0],
            vec![3.0, 1.0],
        )
        .unwrap();
        assert!(approx_eq(solution.objective_value, 9.0), "obj = {} (expected 9)", solution.objective_value);
        assert_consistent(&solution, &[3.0, 1.0]);
    }

    #[test]
    fn test_unbounded() {
        let result = primal(vec![vec![1.0, -1.0]], vec![4.0], vec![1.0, 1.0]);
        assert_eq!(result, Err(SolveError::Unbounded));
    }

    #[test]
    fn test_iteration_limit() {
        init();
        let model = Model::from_signs(vec![vec![7.0, 3.0], vec![4.0, 1.0]], &[false, false], vec![21.0, 8.0], vec![8.0, 5.0]);
        let result = Solver::new()
            .with_max_iterations(1)
            .solve_relaxation(&model, Sense::Maximize, Method::Primal);
        assert_eq!(result, Err(SolveError::IterationLimit(1)));
    }

    #[test]
    fn test_pivot_column_prefers_first_on_ties() {
        assert_eq!(find_pivot_column(&[-1.0, -3.0, -3.0, 0.0], 1e-9), Some(1));
        assert_eq!(find_pivot_column(&[0.0, 2.0, -1e-12], 1e-9), None);
    }

    #[test]
    fn test_pivot_row_skips_non_positive_entries() {
        let model = Model::from_signs(
            vec![vec![2.0, 1.0], vec![0.0, 1.0], vec![-1.0, 1.0], vec![1.0, 0.0]],
            &[false; 4],
            vec![8.0, 3.0, 5.0, 4.0],
            vec![1.0, 1.0],
        );
        let tableau = Tableau::canonical(&model, Sense::Maximize);
        // ratios 8/2 = 4 and 4/1 = 4 tie; row 2 has a negative entry
        assert_eq!(find_pivot_row(&tableau, 0, 1e-9), Some(0));
        assert_eq!(find_pivot_row(&tableau, 1, 1e-9), Some(1));
    }

    #[test]
    fn test_minimize_with_primal_feasible_start() {
        init();
        // Minimize x - 2y subject to x + y <= 4, y <= 3 -> y = 3, x = 0, obj = -6
        let model = Model::from_signs(vec![vec![1.0, 1.0], vec![0.0, 1.0]], &[false, false], vec![4.0, 3.0], vec![1.0, -2.0]);
        let solution = Solver::new()
            .solve_relaxation(&model, Sense::Minimize, Method::Primal)
            .unwrap();
        assert!(approx_eq(solution.objective_value, -6.0), "obj = {} (expected -6)", solution.objective_value);
        assert_consistent(&solution, &model.objective);
    }

    #[test]
    fn test_auto_dispatches_dual_shape() {
        init();
        // Minimize x + 2y subject to 2x + y <= 18, x + 2y >= 14, x - 2y <= 10
        let model = Model::from_signs(
            vec![vec![2.0, 1.0], vec![1.0, 2.0], vec![1.0, -2.0]],
            &[false, true, false],
            vec![18.0, 14.0, 10.0],
            vec![1.0, 2.0],
        );
        let solver = Solver::new();

        let auto = solver.solve_relaxation(&model, Sense::Minimize, Method::Auto).unwrap();
        let dual = solver.solve_relaxation(&model, Sense::Minimize, Method::Dual).unwrap();
        assert_eq!(auto, dual);
        assert!(approx_eq(auto.objective_value, 14.0), "obj = {} (expected 14)", auto.objective_value);
    }

    #[test]
    fn test_methods_agree_on_primal_fixtures() {
        init();
        let fixtures: Vec<(Vec<Vec<f64>>, Vec<f64>, Vec<f64>, f64)> = vec![
            (vec![vec![7.0, 3.0], vec![4.0, 1.0]], vec![21.0, 8.0], vec![8.0, 5.0], 35.0),
            (vec![vec![-2.0, -3.0], vec![1.0, 1.0], vec![3.0, 1.0]], vec![15.0, 9.0, 24.0], vec![2.0, 5.0], 45.0),
            (vec![vec![2.0, 5.0], vec![-3.0, 4.0], vec![2.0, 4.0]], vec![18.0, 10.0, 8.0], vec![1.0, -1.0], 4.0),
            (vec![vec![3.0, 1.0], vec![-1.0, -5.0], vec![2.0, 4.0]], vec![9.0, 6.0, 8.0], vec![5.0, -1.0], 15.0),
            (vec![vec![5.0, 3.0], vec![3.0, 5.0], vec![0.0, 1.0]], vec![15.0, 15.0, 8.0], vec![3.0, 1.0], 9.0),
            (vec![vec![1.0, 1.0], vec![1.0, 3.0]], vec![7.0, 12.0], vec![2.0, 5.0], 21.5),
        ];
        let solver = Solver::new();

        for (constraints, rhs, objective, expected) in fixtures {
            let signs = vec![false; constraints.len()];
            let model = Model::from_signs(constraints, &signs, rhs, objective);

            let primal = solver.solve_relaxation(&model, Sense::Maximize, Method::Primal).unwrap();
            assert!(approx_eq(primal.objective_value, expected), "obj = {} (expected {})", primal.objective_value, expected);

            for method in [Method::Dual, Method::Auto] {
                let other = solver.solve_relaxation(&model, Sense::Maximize, method).unwrap();
                assert!(
                    approx_eq(other.objective_value, primal.objective_value),
                    "{:?} obj = {} (primal {})",
                    method,
                    other.objective_value,
                    primal.objective_value
                );
                for (a, b) in other.plan.iter().zip(&primal.plan) {
                    assert!(approx_eq(*a, *b), "{:?} plan = {:?} (primal {:?})", method, other.plan, primal.plan);
                }
            }
        }
    }

    #[test]
    fn test_auto_retries_dual_after_unbounded_primal() {
        init();
        // Maximize x + y subject to x - y <= 4: primal gives up first, the
        // dual pass has no negative row to repair and reaches the same verdict
        let model = Model::from_signs(vec![vec![1.0, -1.0]], &[false], vec![4.0], vec![1.0, 1.0]);
        let solver = Solver::new();

        assert_eq!(solver.solve_relaxation(&model, Sense::Maximize, Method::Auto), Err(SolveError::Unbounded));
        assert_eq!(solver.solve_relaxation(&model, Sense::Maximize, Method::Dual), Err(SolveError::Unbounded));
    }

    #[test]
    fn test_auto_retries_primal_after_infeasible_dual() {
        init();
        // Maximize -5x + 4y subject to x - y >= -7, 2x + 3y <= 17, 7x - 2y <= 28, y >= 6
        let model = Model::from_signs(
            vec![vec![1.0, -1.0], vec![2.0, 3.0], vec![7.0, -2.0], vec![0.0, 1.0]],
            &[true, false, false, true],
            vec![-7.0, 17.0, 28.0, 6.0],
            vec![-5.0, 4.0],
        );
        let solver = Solver::new();

        assert_eq!(solver.solve_relaxation(&model, Sense::Maximize, Method::Dual), Err(SolveError::Infeasible));
        assert_eq!(solver.solve_relaxation(&model, Sense::Maximize, Method::Primal), Err(SolveError::Infeasible));
        assert_eq!(solver.solve_relaxation(&model, Sense::Maximize, Method::Auto), Err(SolveError::Infeasible));
    }

    #[test]
    fn test_invalid_model_fails_before_pivoting() {
        let model = Model::from_signs(vec![vec![1.0, 1.0], vec![1.0]], &[false, false], vec![1.0, 1.0], vec![1.0, 1.0]);
        let solver = Solver::new();
        assert!(matches!(
            solver.solve_relaxation(&model, Sense::Maximize, Method::Auto),
            Err(SolveError::InvalidModel(_))
        ));
        assert!(matches!(solver.solve(&model, Sense::Maximize), Err(SolveError::InvalidModel(_))));
    }
}
