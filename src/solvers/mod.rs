use serde::{Deserialize, Serialize};

use crate::error::Result;

#[cfg(feature = "gurobi")]
pub mod gurobi;
#[cfg(feature = "highs")]
pub mod highs;

/// Restricted master problem in column-major form.
///
/// Column `j` has its non-zeros in
/// `row_index[column_start[j]..column_start[j + 1]]`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MasterLp {
    pub objective: Vec<f64>,
    pub column_lower: Vec<f64>,
    pub column_upper: Vec<f64>,
    pub is_integer: Vec<bool>,
    pub column_start: Vec<usize>,
    pub row_index: Vec<usize>,
    pub coefficients: Vec<f64>,
    pub row_lower: Vec<f64>,
    pub row_upper: Vec<f64>,
    /// Previous values of the columns, usable as a warm start
    pub initial_primal: Vec<f64>,
    /// Previous duals of the rows
    pub initial_duals: Vec<f64>,
}

impl MasterLp {
    pub fn num_columns(&self) -> usize {
        self.objective.len()
    }

    pub fn num_rows(&self) -> usize {
        self.row_lower.len()
    }

    /// Non-zeros of column `j` as `(row, coefficient)`
    pub fn column(&self, j: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.column_start[j]..self.column_start[j + 1];
        self.row_index[range.clone()]
            .iter()
            .copied()
            .zip(self.coefficients[range].iter().copied())
    }

    /// Objective of a primal solution
    pub fn evaluate(&self, primal: &[f64]) -> f64 {
        self.objective
            .iter()
            .zip(primal)
            .map(|(c, x)| c * x)
            .sum()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MasterSolution {
    pub objective: f64,
    /// One value per master column
    pub primal: Vec<f64>,
    /// One dual per row, reduced costs are `c - A^T duals`
    pub duals: Vec<f64>,
}

/// Solver for restricted master problems.
/// Should fail with [`ColgenError::MasterSolveFailed`] if no optimal
/// solution is found.
///
/// [`ColgenError::MasterSolveFailed`]: crate::error::ColgenError::MasterSolveFailed
pub trait MasterSolver {
    fn solve(&mut self, lp: &MasterLp, use_integer_variables: bool) -> Result<MasterSolution>;

    fn set_time_limit(&mut self, seconds: f64) {
        // nop default
    }
}
