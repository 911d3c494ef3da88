use gurobi::{attr, param, ConstrSense, LinExpr, Status, VarType};

use crate::error::{ColgenError, Result};
use crate::solvers::{MasterLp, MasterSolution, MasterSolver};

pub struct GurobiSolver(pub gurobi::Env);

fn gurobi_error(e: gurobi::Error) -> ColgenError {
    ColgenError::MasterSolveFailed(format!("{e:?}"))
}

impl GurobiSolver {
    pub fn new_with_seed(seed: i32) -> Result<Self> {
        let mut env = gurobi::Env::new("").map_err(gurobi_error)?;
        env.set(param::Threads, 1).map_err(gurobi_error)?;
        env.set(param::Seed, seed).map_err(gurobi_error)?;
        env.set(param::OutputFlag, 0).map_err(gurobi_error)?;
        Ok(GurobiSolver(env))
    }
}

impl MasterSolver for GurobiSolver {
    fn solve(&mut self, lp: &MasterLp, use_integer_variables: bool) -> Result<MasterSolution> {
        let mut model = gurobi::Model::new("master", &self.0).map_err(gurobi_error)?;

        let mut vars = Vec::with_capacity(lp.num_columns());
        for j in 0..lp.num_columns() {
            let vtype = if use_integer_variables && lp.is_integer[j] {
                VarType::Integer
            } else {
                VarType::Continuous
            };
            vars.push(
                model
                    .add_var(
                        &format!("c{j}"),
                        vtype,
                        lp.objective[j],
                        lp.column_lower[j],
                        lp.column_upper[j],
                        &[],
                        &[],
                    )
                    .map_err(gurobi_error)?,
            );
        }
        model.update().map_err(gurobi_error)?;

        let mut row_exprs: Vec<LinExpr> = (0..lp.num_rows()).map(|_| LinExpr::new()).collect();
        for (j, var) in vars.iter().enumerate() {
            for (row, coef) in lp.column(j) {
                let expr = std::mem::replace(&mut row_exprs[row], LinExpr::new());
                row_exprs[row] = expr.add_term(coef, var.clone());
            }
        }

        // ranged rows become two constraints whose duals are summed
        let mut constrs: Vec<Vec<gurobi::Constr>> = Vec::with_capacity(lp.num_rows());
        for (i, expr) in row_exprs.into_iter().enumerate() {
            let (lower, upper) = (lp.row_lower[i], lp.row_upper[i]);
            let mut row_constrs = Vec::new();
            if lower == upper {
                row_constrs.push(
                    model
                        .add_constr(&format!("r{i}"), expr, ConstrSense::Equal, lower)
                        .map_err(gurobi_error)?,
                );
            } else {
                if lower.is_finite() {
                    row_constrs.push(
                        model
                            .add_constr(
                                &format!("r{i}_lb"),
                                expr.clone(),
                                ConstrSense::Greater,
                                lower,
                            )
                            .map_err(gurobi_error)?,
                    );
                }
                if upper.is_finite() {
                    row_constrs.push(
                        model
                            .add_constr(&format!("r{i}_ub"), expr, ConstrSense::Less, upper)
                            .map_err(gurobi_error)?,
                    );
                }
            }
            constrs.push(row_constrs);
        }

        model.update().map_err(gurobi_error)?;
        model.optimize().map_err(gurobi_error)?;

        let status = model.status().map_err(gurobi_error)?;
        if status != Status::Optimal {
            return Err(ColgenError::MasterSolveFailed(format!("gurobi status {status:?}")));
        }

        let primal = model.get_values(attr::X, &vars).map_err(gurobi_error)?;
        let mut duals = vec![0.0; lp.num_rows()];
        if !use_integer_variables {
            for (i, row_constrs) in constrs.iter().enumerate() {
                if !row_constrs.is_empty() {
                    let pi = model.get_values(attr::Pi, row_constrs).map_err(gurobi_error)?;
                    duals[i] = pi.iter().sum();
                }
            }
        }

        Ok(MasterSolution {
            objective: model.get(attr::ObjVal).map_err(gurobi_error)?,
            primal,
            duals,
        })
    }

    fn set_time_limit(&mut self, seconds: f64) {
        if let Err(e) = self.0.set(param::TimeLimit, seconds) {
            log::warn!("could not set gurobi time limit: {e:?}");
        }
    }
}
