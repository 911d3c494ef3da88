use highs::{ColProblem, HighsModelStatus, Sense};

use crate::error::{ColgenError, Result};
use crate::solvers::{MasterLp, MasterSolution, MasterSolver};

/// Master solver backed by HiGHS
pub struct HighsSolver {
    time_limit: Option<f64>,
    threads: Option<i32>,
}

impl Default for HighsSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl HighsSolver {
    pub fn new() -> Self {
        HighsSolver {
            time_limit: None,
            threads: Some(1),
        }
    }

    pub fn with_threads(mut self, threads: i32) -> Self {
        self.threads = Some(threads);
        self
    }
}

impl MasterSolver for HighsSolver {
    fn solve(&mut self, lp: &MasterLp, use_integer_variables: bool) -> Result<MasterSolution> {
        let mut problem = ColProblem::default();
        let rows: Vec<_> = lp
            .row_lower
            .iter()
            .zip(&lp.row_upper)
            .map(|(&lower, &upper)| problem.add_row(lower..=upper))
            .collect();

        for j in 0..lp.num_columns() {
            let factors: Vec<_> = lp.column(j).map(|(row, coef)| (rows[row], coef)).collect();
            let bounds = lp.column_lower[j]..=lp.column_upper[j];
            if use_integer_variables && lp.is_integer[j] {
                problem.add_integer_column(lp.objective[j], bounds, factors);
            } else {
                problem.add_column(lp.objective[j], bounds, factors);
            }
        }

        log::debug!(
            "highs master with {} rows, {} columns",
            lp.num_rows(),
            lp.num_columns()
        );

        let mut model = problem.optimise(Sense::Minimise);
        model.make_quiet();
        if let Some(threads) = self.threads {
            model.set_option("threads", threads);
        }
        if let Some(seconds) = self.time_limit {
            model.set_option("time_limit", seconds);
        }

        let solved = model
            .try_solve()
            .map_err(|status| ColgenError::MasterSolveFailed(format!("{status:?}")))?;
        if solved.status() != HighsModelStatus::Optimal {
            return Err(ColgenError::MasterSolveFailed(format!(
                "model status {:?}",
                solved.status()
            )));
        }

        let solution = solved.get_solution();
        let primal = solution.columns().to_vec();
        let duals = if use_integer_variables {
            vec![0.0; lp.num_rows()]
        } else {
            solution.dual_rows().to_vec()
        };

        Ok(MasterSolution {
            objective: lp.evaluate(&primal),
            primal,
            duals,
        })
    }

    fn set_time_limit(&mut self, seconds: f64) {
        self.time_limit = Some(seconds);
    }
}
