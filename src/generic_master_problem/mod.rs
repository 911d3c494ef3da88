use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::column_pool::ColumnPool;
use crate::error::{ColgenError, Result};
use crate::log_entry::{Event, LogEntry, LogWriter};
use crate::misc::IndexSet;
use crate::solvers::{MasterLp, MasterSolver};
use crate::ui::{IterationUIState, UISender, UIUserMessage};

pub mod column;
pub mod column_pool;
pub mod log_entry;
pub mod pricing;
pub mod set_partitioning;

/// Integer tolerance. Same as gurobi
pub const INT_FEAS_TOL: f64 = 1e-5;

/// Columns below this value count as unused in the master solution
const INACTIVE_TOL: f64 = 1e-6;

/// Passed to [`ColumnGenerator::fix`] once per super iteration
#[derive(Clone, Copy, Debug)]
pub struct FixInformation {
    /// Super iteration, starting at 1
    pub iteration: usize,
    /// Change of the objective since the previous super iteration.
    /// NaN in the first one.
    pub objective_change: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
/// Reason why [`Problem::solve`] returned
pub enum StopReason {
    /// The master solution is integral
    IntegerSolution,
    /// `fix` returned a negative count
    FixingComplete,
    /// `fix` fixed nothing and the pool had no improving column
    Stagnated,
    /// Super or pricing iteration cap reached
    IterationLimit,
    /// The interrupt handler asked to stop
    Interrupted,
}

impl Display for StopReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::IntegerSolution => write!(f, "Integer feasible solution found."),
            StopReason::FixingComplete => write!(f, "Requested by fixing."),
            StopReason::Stagnated => write!(f, "Nothing fixed and no improving columns."),
            StopReason::IterationLimit => write!(f, "Iteration limit reached."),
            StopReason::Interrupted => write!(f, "Interrupted."),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SolveOutcome {
    /// Objective of the last master solution, including the objective constant
    pub objective: f64,
    pub status: StopReason,
    pub super_iterations: usize,
    pub pricing_iterations: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
/// Settings of the column generation loop
pub struct ColgenSettings {
    pub max_super_iterations: usize,
    /// Total number of master solves per call to solve
    pub max_pricing_iterations: usize,
    /// Rounds a zero column stays in the master problem
    pub column_inactive_limit: usize,
    /// Columns need a reduced cost below the negated tolerance to count as improving
    pub reduced_cost_tolerance: f64,
    /// Writes one [`LogEntry`] per pricing iteration
    pub log_file: Option<PathBuf>,
    /// Writes every master problem into this directory
    pub save_master_directory: Option<PathBuf>,
}

impl Default for ColgenSettings {
    fn default() -> Self {
        ColgenSettings {
            max_super_iterations: 10_000,
            max_pricing_iterations: 100_000,
            column_inactive_limit: 5,
            reduced_cost_tolerance: 1e-9,
            log_file: None,
            save_master_directory: None,
        }
    }
}

/// Problem specific part of the column generation.
///
/// Every method gets the [`Problem`] that is being solved.
pub trait ColumnGenerator {
    /// Add zero or more columns to the pool given the duals of the last master problem.
    /// Not adding an improving column ends the pricing loop.
    fn generate(&mut self, problem: &mut Problem, duals: &[f64]) -> Result<()>;

    /// Fix columns based on the current master solution.
    /// Returns the number of columns fixed, negative to stop.
    fn fix(&mut self, problem: &mut Problem, information: &FixInformation) -> Result<i64>;

    /// True while `fix` declines to fix for the given iteration. A zero
    /// returned by a delayed `fix` does not count as stagnation.
    fn fixing_delayed(&self, problem: &Problem, information: &FixInformation) -> bool {
        false
    }

    /// Value of a rounded solution, reporting only
    fn integral_solution_value(&mut self, problem: &mut Problem) -> Result<f64> {
        Ok(f64::NAN)
    }

    /// Extra data for the iteration log
    fn create_log_entry(&self, problem: &Problem) -> LogEntry {
        LogEntry::default()
    }

    /// Called when the interrupt flag was raised.
    /// Return `Ok(true)` to continue and `Ok(false)` to stop.
    fn interrupt_handler(&mut self, problem: &mut Problem) -> Result<bool> {
        Err(ColgenError::Interrupted)
    }
}

/// Column generation state: the pool, the row bounds and the active columns
pub struct Problem {
    pool: ColumnPool,
    number_of_rows: usize,
    row_lower: Vec<f64>,
    row_upper: Vec<f64>,
    active_columns: Vec<usize>,
    dual_solution: Vec<f64>,
    initial_column_count: usize,
    column_inactive_count: Vec<usize>,
    objective_constant: f64,
    settings: ColgenSettings,
    ui: UISender,
    log: Option<LogWriter>,
    current_events: Vec<Event>,
    interrupt: Arc<AtomicBool>,
    saved_masters: usize,
    pricing_iterations: usize,
}

impl Problem {
    pub fn new(number_of_rows: usize, settings: ColgenSettings, ui: UISender) -> Result<Self> {
        let log = match settings.log_file {
            Some(ref path) => Some(LogWriter::create(path)?),
            None => None,
        };
        if let Some(ref directory) = settings.save_master_directory {
            std::fs::create_dir_all(directory)?;
        }

        Ok(Problem {
            pool: ColumnPool::new(),
            number_of_rows,
            row_lower: vec![f64::NEG_INFINITY; number_of_rows],
            row_upper: vec![f64::INFINITY; number_of_rows],
            active_columns: Vec::new(),
            dual_solution: vec![0.0; number_of_rows],
            initial_column_count: 0,
            column_inactive_count: Vec::new(),
            objective_constant: 0.0,
            settings,
            ui,
            log,
            current_events: Vec::new(),
            interrupt: Arc::new(AtomicBool::new(false)),
            saved_masters: 0,
            pricing_iterations: 0,
        })
    }

    pub fn pool(&self) -> &ColumnPool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut ColumnPool {
        &mut self.pool
    }

    pub fn number_of_rows(&self) -> usize {
        self.number_of_rows
    }

    pub fn settings(&self) -> &ColgenSettings {
        &self.settings
    }

    pub fn ui(&self) -> &UISender {
        &self.ui
    }

    /// Pricing iterations over all calls to solve
    pub fn pricing_iterations(&self) -> usize {
        self.pricing_iterations
    }

    fn check_row(&self, row: usize) -> Result<()> {
        if row >= self.number_of_rows {
            return Err(ColgenError::RowOutOfRange {
                row,
                number_of_rows: self.number_of_rows,
            });
        }
        Ok(())
    }

    // Rows of the pool columns from `first` on, checked before reduced costs are taken
    fn check_column_rows(&self, first: usize) -> Result<()> {
        for i in first..self.pool.size() {
            for entry in self.pool.at(i).rows() {
                self.check_row(entry.row)?;
            }
        }
        Ok(())
    }

    pub fn set_row_lower_bound(&mut self, row: usize, lower: f64) -> Result<()> {
        self.check_row(row)?;
        self.row_lower[row] = lower;
        Ok(())
    }

    pub fn set_row_upper_bound(&mut self, row: usize, upper: f64) -> Result<()> {
        self.check_row(row)?;
        self.row_upper[row] = upper;
        Ok(())
    }

    pub fn row_bounds(&self, row: usize) -> (f64, f64) {
        (self.row_lower[row], self.row_upper[row])
    }

    /// Constant added to every reported objective
    pub fn set_objective_constant(&mut self, constant: f64) {
        self.objective_constant = constant;
    }

    pub fn objective_constant(&self) -> f64 {
        self.objective_constant
    }

    /// Pool indices of the columns in the last master problem, ascending
    pub fn active_columns(&self) -> &[usize] {
        &self.active_columns
    }

    /// Duals of the last master problem
    pub fn dual_solution(&self) -> &[f64] {
        &self.dual_solution
    }

    /// Raising the flag calls [`ColumnGenerator::interrupt_handler`] after the current round
    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        self.interrupt.clone()
    }

    /// Event for the next log entry
    pub fn attach_event(&mut self, event: Event) {
        self.current_events.push(event);
    }

    /// Builds the restricted master problem over the active columns
    pub fn create_master_lp(&self, use_integer_variables: bool) -> Result<MasterLp> {
        if self.active_columns.is_empty() {
            return Err(ColgenError::EmptyPool);
        }

        let mut lp = MasterLp {
            row_lower: self.row_lower.clone(),
            row_upper: self.row_upper.clone(),
            initial_duals: self.dual_solution.clone(),
            ..MasterLp::default()
        };
        let mut row_used = vec![false; self.number_of_rows];
        lp.column_start.push(0);

        for &i in &self.active_columns {
            let column = self.pool.at(i);
            if column.lower_bound() < 0.0 {
                return Err(ColgenError::NegativeLowerBound(i));
            }

            lp.objective.push(column.cost());
            lp.column_lower.push(column.lower_bound());
            lp.column_upper.push(column.upper_bound());
            lp.is_integer.push(use_integer_variables && column.is_integer());
            lp.initial_primal.push(column.solution_value);

            for entry in column.rows() {
                self.check_row(entry.row)?;
                row_used[entry.row] = true;
                lp.row_index.push(entry.row);
                lp.coefficients.push(entry.coef);
            }
            lp.column_start.push(lp.row_index.len());
        }

        if let Some(row) = row_used.iter().position(|used| !used) {
            return Err(ColgenError::EmptyRow(row));
        }

        Ok(lp)
    }

    // Pick columns to include in the next master problem.
    fn pick_columns(&mut self, reuse_active: bool) {
        if self.active_columns.is_empty() {
            self.column_inactive_count.clear();
            self.active_columns = (0..self.initial_column_count).collect();
            return;
        }
        if reuse_active {
            // repeated call to solve, the previous active set is still optimal
            self.column_inactive_count.clear();
            return;
        }

        self.column_inactive_count.resize(self.pool.size(), 0);

        // non-zero columns must stay to keep the master feasible
        let mut next = Vec::with_capacity(self.active_columns.len());
        for &i in &self.active_columns {
            let column = self.pool.at(i);
            debug_assert!(column.solution_value >= -INT_FEAS_TOL);

            if column.solution_value < INACTIVE_TOL {
                self.column_inactive_count[i] += 1;
            } else {
                self.column_inactive_count[i] = 0;
            }

            let initial_column = i < self.initial_column_count;
            let recently_active =
                self.column_inactive_count[i] < self.settings.column_inactive_limit;
            let fixed_to_zero = column.is_fixed() && column.upper_bound() == 0.0;
            if initial_column || (recently_active && !fixed_to_zero) {
                next.push(i);
            }
        }

        // limit new columns, a restart could add the whole pool
        let limit = self.active_columns.len().max(1);
        let kept: IndexSet<usize> = next.iter().copied().collect();
        let candidates: Vec<usize> = self
            .pool
            .get_sorted(&self.dual_solution, 0)
            .iter()
            .filter(|score| !kept.contains(&score.index))
            .take(limit)
            .map(|score| score.index)
            .collect();
        next.extend(candidates);

        next.sort_unstable();
        next.dedup();
        self.active_columns = next;
    }

    fn has_improving_column(&mut self) -> bool {
        let active: IndexSet<usize> = self.active_columns.iter().copied().collect();
        let tolerance = self.settings.reduced_cost_tolerance;
        self.pool
            .get_sorted(&self.dual_solution, 0)
            .iter()
            .any(|score| score.reduced_cost < -tolerance && !active.contains(&score.index))
    }

    fn save_master(&mut self, lp: &MasterLp) -> Result<()> {
        if let Some(ref directory) = self.settings.save_master_directory {
            let path = directory.join(format!("{}.master", self.saved_masters));
            self.saved_masters += 1;
            bincode::serialize_into(BufWriter::new(File::create(&path)?), lp)?;
            log::debug!("saved master problem to {}", path.display());
        }
        Ok(())
    }

    fn solve_master<S: MasterSolver + ?Sized>(&mut self, solver: &mut S) -> Result<f64> {
        let lp = self.create_master_lp(false)?;
        self.save_master(&lp)?;

        let solution = solver.solve(&lp, false)?;
        if !solution.objective.is_finite() {
            return Err(ColgenError::MasterSolveFailed(format!(
                "objective is {}",
                solution.objective
            )));
        }
        if solution.primal.len() != self.active_columns.len()
            || solution.duals.len() != self.number_of_rows
        {
            return Err(ColgenError::MasterSolveFailed(format!(
                "solution has {} values and {} duals for {} columns and {} rows",
                solution.primal.len(),
                solution.duals.len(),
                self.active_columns.len(),
                self.number_of_rows
            )));
        }

        self.dual_solution = solution.duals;
        for (&i, &value) in self.active_columns.iter().zip(&solution.primal) {
            let column = self.pool.at_mut(i);
            let (lower, upper) = (column.lower_bound(), column.upper_bound());
            column.solution_value = value.max(lower).min(upper);
        }

        Ok(solution.objective + self.objective_constant)
    }

    // (integer columns, fractional integer columns) of the active set
    fn integrality_counts(&self) -> (usize, usize) {
        self.active_columns
            .iter()
            .map(|&i| self.pool.at(i))
            .filter(|c| c.is_integer())
            .fold((0, 0), |(integer, fractional), c| {
                let residual = (c.solution_value - c.solution_value.round()).abs();
                (integer + 1, fractional + usize::from(residual > INT_FEAS_TOL))
            })
    }

    fn write_log_entry(&mut self, mut entry: LogEntry) -> Result<()> {
        entry.events.append(&mut self.current_events);
        if let Some(ref mut log) = self.log {
            log.write(&entry)?;
        }
        Ok(())
    }

    /// Runs column generation until the generator signals completion,
    /// the master solution is integral or nothing changes anymore.
    ///
    /// Each super iteration prices until the pool has no improving column
    /// and then calls [`ColumnGenerator::fix`].
    pub fn solve<G, S>(&mut self, generator: &mut G, solver: &mut S) -> Result<SolveOutcome>
    where
        G: ColumnGenerator + ?Sized,
        S: MasterSolver + ?Sized,
    {
        let global_start_time = Instant::now();

        if self.initial_column_count == 0 {
            self.initial_column_count = self.pool.size();
        }
        if self.pool.is_empty() {
            return Err(ColgenError::EmptyPool);
        }
        self.check_column_rows(0)?;

        self.ui.send(UIUserMessage::StartSolve {
            rows: self.number_of_rows,
            columns: self.pool.size(),
        });

        #[cfg(feature = "validity_assertions")]
        self.ui.send(UIUserMessage::LogS("Validity Assertions Active"));

        let mut objective = f64::NAN;
        let mut previous_objective = f64::NAN;

        let mut reuse_active = !self.active_columns.is_empty();
        let mut fixed_columns: i64 = 0;
        let mut fix_time = f64::NAN;

        let mut pricing_iterations = 0;
        let mut super_iteration = 0;

        let status = 'outer: loop {
            if super_iteration >= self.settings.max_super_iterations {
                break StopReason::IterationLimit;
            }
            super_iteration += 1;

            let mut rounds = 0;
            let mut integer_solution = false;

            loop {
                if pricing_iterations >= self.settings.max_pricing_iterations {
                    break 'outer StopReason::IterationLimit;
                }
                pricing_iterations += 1;
                self.pricing_iterations += 1;
                rounds += 1;

                let start_time = Instant::now();
                let previous_active_size = self.active_columns.len();
                self.pick_columns(reuse_active);
                reuse_active = false;
                #[allow(clippy::cast_possible_wrap)]
                let active_size_change =
                    self.active_columns.len() as i64 - previous_active_size as i64;

                objective = self.solve_master(solver)?;
                let solve_time = start_time.elapsed().as_secs_f64();

                let start_time = Instant::now();
                let old_size = self.pool.size();
                let duals = self.dual_solution.clone();
                generator.generate(self, &duals)?;
                self.check_column_rows(old_size)?;
                let generated_columns = self.pool.size() - old_size;
                let generate_time = start_time.elapsed().as_secs_f64();

                let (integer_columns, fractional_columns) = self.integrality_counts();
                let improving = self.has_improving_column();

                let start_time = Instant::now();
                let rounded_value =
                    generator.integral_solution_value(self)? + self.objective_constant;
                fix_time += start_time.elapsed().as_secs_f64();

                integer_solution = !improving && fractional_columns == 0;
                if integer_solution {
                    self.attach_event(Event::IntegerSolution);
                }

                #[allow(clippy::cast_precision_loss)]
                let fractional_percent = 100.0 * fractional_columns as f64 / integer_columns as f64;
                let state = IterationUIState {
                    iteration: self.pricing_iterations,
                    fractional_objective: objective,
                    rounded_objective: rounded_value,
                    active_size: self
                        .active_columns
                        .len()
                        .saturating_sub(self.initial_column_count),
                    active_size_change,
                    pool_size: self.pool.allowed_size(),
                    generated: generated_columns,
                    fixed: fixed_columns,
                    fix_time,
                    generate_time,
                    solve_time,
                    cumulative_time: global_start_time.elapsed().as_secs_f64(),
                    fractional_percent,
                };

                if self.log.is_some() {
                    let mut entry = generator.create_log_entry(self);
                    entry.iteration = state.iteration;
                    entry.fractional_objective = state.fractional_objective;
                    entry.integer_objective = state.rounded_objective;
                    entry.active_set_size = state.active_size;
                    entry.active_set_size_change = state.active_size_change;
                    entry.pool_size = state.pool_size;
                    entry.pool_size_change = state.generated;
                    entry.fixed_column_count = state.fixed;
                    entry.cumulative_time = state.cumulative_time;
                    self.write_log_entry(entry)?;
                } else {
                    self.current_events.clear();
                }
                self.ui.send(UIUserMessage::IterationFinish(state));

                fixed_columns = 0;
                fix_time = f64::NAN;

                if self.interrupt.swap(false, Ordering::SeqCst)
                    && !generator.interrupt_handler(self)?
                {
                    break 'outer StopReason::Interrupted;
                }

                if !improving {
                    break;
                }
            }

            let objective_change = objective - previous_objective;
            previous_objective = objective;

            if integer_solution {
                break StopReason::IntegerSolution;
            }

            let start_time = Instant::now();
            let information = FixInformation {
                iteration: super_iteration,
                objective_change,
            };
            fixed_columns = generator.fix(self, &information)?;
            fix_time = start_time.elapsed().as_secs_f64();

            if fixed_columns < 0 {
                break StopReason::FixingComplete;
            }
            if fixed_columns == 0 && rounds == 1 && !generator.fixing_delayed(self, &information) {
                break StopReason::Stagnated;
            }
        };

        self.ui.send(UIUserMessage::Stopping(status));

        Ok(SolveOutcome {
            objective,
            status,
            super_iterations: super_iteration,
            pricing_iterations,
        })
    }
}
