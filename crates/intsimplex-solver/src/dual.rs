//! Dual simplex: drives every right-hand side to non-negative while keeping
//! the reduced costs as they are.

use log::{debug, trace};

use crate::solution::SolveError;
use crate::tableau::Tableau;

/// Pivot until no right-hand side is negative. Returns the number of pivots.
///
/// Fails with [`SolveError::Infeasible`] when a negative row has no negative
/// coefficient to pivot on: no non-negative plan can satisfy that row.
pub(crate) fn restore_feasibility(tableau: &mut Tableau, max_iterations: usize, tolerance: f64) -> Result<usize, SolveError> {
    let mut iter = 0;
    loop {
        let Some(pivot_row) = find_leaving_row(tableau, tolerance) else {
            debug!("restored feasibility in {} pivots, obj.: {}", iter, tableau.objective_value());
            return Ok(iter);
        };
        if iter == max_iterations {
            return Err(SolveError::IterationLimit(max_iterations));
        }

        let index_row = tableau.index_row();
        let Some(pivot_col) = find_entering_column(tableau, &index_row, pivot_row, tolerance) else {
            debug!("row {} cannot be made non-negative", pivot_row);
            return Err(SolveError::Infeasible);
        };
        tableau.pivot(pivot_row, pivot_col);
        trace!("dual pivot {} at ({}, {}):\n{}", iter, pivot_row, pivot_col, tableau);
        iter += 1;
    }
}

/// Row with the most negative right-hand side, first one on ties
fn find_leaving_row(tableau: &Tableau, tolerance: f64) -> Option<usize> {
    let mut min_val = -tolerance;
    let mut min_row = None;

    for (i, &b) in tableau.rhs.iter().enumerate() {
        if b < min_val {
            min_val = b;
            min_row = Some(i);
        }
    }

    min_row
}

/// Column with the smallest estimate `-delta[j] / a[row][j]` among columns
/// where the leaving row is strictly negative.
///
/// Equal estimates are resolved with the next row: the current pick is kept
/// only when its next-row ratio is positive and smaller than the
/// candidate's, otherwise the later column wins. On the last row there is
/// nothing to compare and the current pick stays.
fn find_entering_column(tableau: &Tableau, index_row: &[f64], row: usize, tolerance: f64) -> Option<usize> {
    let leaving = &tableau.rows[row];
    let next = tableau.rows.get(row + 1);

    let mut best: Option<(usize, f64)> = None;
    for (j, &a) in leaving.iter().enumerate() {
        if a >= -tolerance {
            continue;
        }
        let estimate = -index_row[j] / a;

        match best {
            None => best = Some((j, estimate)),
            Some((_, current)) if estimate < current - tolerance => best = Some((j, estimate)),
            Some((kept, current)) if (estimate - current).abs() <= tolerance => {
                let keep = match next {
                    Some(next) => {
                        let kept_ratio = next[kept] / leaving[kept];
                        let new_ratio = next[j] / a;
                        kept_ratio > 0.0 && kept_ratio < new_ratio
                    }
                    None => true,
                };
                if !keep {
                    best = Some((j, estimate));
                }
            }
            Some(_) => {}
        }
    }

    best.map(|(j, _)| j)
}
