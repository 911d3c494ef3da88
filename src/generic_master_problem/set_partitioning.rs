//! Set partitioning on top of [`Problem`].
//!
//! Row `p < number_of_members` requires member `p` to pick exactly one of its
//! columns. Row `number_of_members + c` is coverage constraint `c`, kept within
//! `[min, max]` through penalized slack columns.
//!
//! Integer solutions are found by fixing: members are tied to constraints they
//! cover with a high fractional value, and as a fallback single columns are
//! fixed to one.

use std::io::{Read, Write};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::column::Column;
use crate::column_pool::ColumnPool;
use crate::error::{ColgenError, Result};
use crate::log_entry::{ConstraintLog, Event, LogEntry, MemberLog, SetPartitioningLog};
use crate::solvers::MasterSolver;
use crate::ui::{UISender, UIUserMessage};
use crate::{ColgenSettings, ColumnGenerator, FixInformation, Problem, SolveOutcome};

/// Exponential smoothing factor of the fractional history
const HISTORY_UPDATE_FRACTION: f64 = 0.95;
const INITIAL_HISTORY: f64 = 0.5;
/// The fixing threshold is lowered while it stays above this
const MINIMUM_FIX_THRESHOLD: f64 = 0.51;
const THRESHOLD_DECAY: f64 = 0.9;
const NONZERO_TOL: f64 = 1e-6;
const FIX_STATE_TOL: f64 = 1e-3;
/// Steps used to approximate quadratic slack costs
const QUADRATIC_STEPS: usize = 4;

#[derive(Clone, Debug, Serialize, Deserialize)]
/// Settings of the fixing heuristic
pub struct FixSettings {
    /// Fractional coverage needed to fix a constraint to a member
    pub fix_threshold: f64,
    /// No fixing while the objective drops by more than this
    pub objective_change_before_fixing: f64,
    /// Smoothed coverage at which a constraint is forbidden for a member
    pub zero_fix_threshold: f64,
    /// First super iteration that may fix
    pub first_fix_iteration: usize,
}

impl Default for FixSettings {
    fn default() -> Self {
        FixSettings {
            fix_threshold: 0.75,
            objective_change_before_fixing: 1.0,
            zero_fix_threshold: 0.05,
            first_fix_iteration: 1,
        }
    }
}

#[derive(Clone, Debug)]
struct CoverConstraint {
    min_value: f64,
    max_value: f64,
    under_cost: f64,
    over_cost: f64,
    under_quadratic_cost: f64,
    over_quadratic_cost: f64,
}

impl Default for CoverConstraint {
    fn default() -> Self {
        CoverConstraint {
            min_value: f64::NAN,
            max_value: f64::NAN,
            under_cost: f64::NAN,
            over_cost: f64::NAN,
            under_quadratic_cost: 0.0,
            over_quadratic_cost: 0.0,
        }
    }
}

impl CoverConstraint {
    fn penalty(&self, value: f64) -> f64 {
        if value > self.max_value {
            let over = value - self.max_value;
            self.over_cost * over + self.over_quadratic_cost * over * over
        } else if value < self.min_value {
            let under = self.min_value - value;
            self.under_cost * under + self.under_quadratic_cost * under * under
        } else {
            0.0
        }
    }
}

/// Fix state and fractional solutions of a set partitioning problem
pub struct PartitioningState {
    number_of_members: usize,
    number_of_constraints: usize,
    constraints: Vec<CoverConstraint>,
    columns_for_member: Vec<Vec<usize>>,
    // None: free, Some(true): every column must cover, Some(false): no column may cover
    fixes: Vec<Vec<Option<bool>>>,
    num_fixes_for_member: Vec<usize>,
    fractional_solution: Vec<Vec<f64>>,
    fractional_solution_history: Vec<Vec<f64>>,
    rounded_columns: Vec<usize>,
    member_names: Vec<String>,
    settings: FixSettings,
    ui: UISender,
}

impl PartitioningState {
    fn new(
        number_of_members: usize,
        number_of_constraints: usize,
        settings: FixSettings,
        ui: UISender,
    ) -> Self {
        PartitioningState {
            number_of_members,
            number_of_constraints,
            constraints: vec![CoverConstraint::default(); number_of_constraints],
            columns_for_member: vec![Vec::new(); number_of_members],
            fixes: vec![vec![None; number_of_constraints]; number_of_members],
            num_fixes_for_member: vec![0; number_of_members],
            fractional_solution: vec![vec![0.0; number_of_constraints]; number_of_members],
            fractional_solution_history: vec![
                vec![INITIAL_HISTORY; number_of_constraints];
                number_of_members
            ],
            rounded_columns: Vec::new(),
            member_names: (0..number_of_members).map(|p| p.to_string()).collect(),
            settings,
            ui,
        }
    }

    pub fn number_of_members(&self) -> usize {
        self.number_of_members
    }

    pub fn number_of_constraints(&self) -> usize {
        self.number_of_constraints
    }

    pub fn number_of_rows(&self) -> usize {
        self.number_of_members + self.number_of_constraints
    }

    pub fn settings(&self) -> &FixSettings {
        &self.settings
    }

    pub fn member_name(&self, member: usize) -> &str {
        &self.member_names[member]
    }

    pub fn fixes_for_member(&self, member: usize) -> &[Option<bool>] {
        &self.fixes[member]
    }

    pub fn member_fully_fixed(&self, member: usize) -> bool {
        self.num_fixes_for_member[member] >= self.number_of_constraints
    }

    pub fn fractional_solution(&self, member: usize, constraint: usize) -> f64 {
        self.fractional_solution[member][constraint]
    }

    pub fn columns_for_member(&self, member: usize) -> &[usize] {
        &self.columns_for_member[member]
    }

    fn constraint_of_row(&self, row: usize) -> Option<usize> {
        row.checked_sub(self.number_of_members)
    }

    /// Whether a column respects the fixes of its member
    pub fn column_allowed(&self, problem: &Problem, column: usize) -> bool {
        let column = problem.pool().at(column);
        let Some(member) = column.member() else {
            return true;
        };
        let fixes = &self.fixes[member];
        let mut found = vec![false; fixes.len()];
        for c in column.rows().iter().filter_map(|e| self.constraint_of_row(e.row)) {
            if fixes[c] == Some(false) {
                return false;
            }
            found[c] = true;
        }
        fixes
            .iter()
            .zip(&found)
            .all(|(fix, &found)| *fix != Some(true) || found)
    }

    fn initialize_constraint(
        &mut self,
        problem: &mut Problem,
        c: usize,
        constraint: CoverConstraint,
    ) -> Result<()> {
        if c >= self.number_of_constraints {
            return Err(ColgenError::RowOutOfRange {
                row: self.number_of_members + c,
                number_of_rows: self.number_of_rows(),
            });
        }

        let row = self.number_of_members + c;
        problem.set_row_lower_bound(row, constraint.min_value)?;
        problem.set_row_upper_bound(row, constraint.max_value)?;

        let pool = problem.pool_mut();
        add_slack(pool, row, 1.0, constraint.under_cost, constraint.under_quadratic_cost)?;
        add_slack(pool, row, -1.0, constraint.over_cost, constraint.over_quadratic_cost)?;

        self.constraints[c] = constraint;
        Ok(())
    }

    fn add_column(&mut self, problem: &mut Problem, column: Column) -> Result<bool> {
        if column.lower_bound() != 0.0 || column.upper_bound() != 1.0 {
            return Err(ColgenError::InvalidColumn("only 0/1 columns accepted".to_string()));
        }

        let mut member = None;
        for entry in column.rows() {
            if entry.row >= self.number_of_rows() {
                return Err(ColgenError::RowOutOfRange {
                    row: entry.row,
                    number_of_rows: self.number_of_rows(),
                });
            }
            if entry.coef != 1.0 {
                // the fixing logic relies on unit coefficients
                return Err(ColgenError::InvalidColumn(format!(
                    "coefficient {} in row {}, only 1 is accepted",
                    entry.coef, entry.row
                )));
            }
            if entry.row < self.number_of_members {
                if member.is_some() {
                    return Err(ColgenError::InvalidColumn(
                        "column has several member rows".to_string(),
                    ));
                }
                member = Some(entry.row);
            }
        }

        let Some(member) = member else {
            return Err(ColgenError::InvalidColumn(
                "column has no member row, slack columns go to the pool directly".to_string(),
            ));
        };
        if column.member().is_some_and(|explicit| explicit != member) {
            return Err(ColgenError::InvalidColumn(format!(
                "column is marked for member {:?} but covers member row {member}",
                column.member()
            )));
        }

        let mut column = column;
        column.set_member(member);

        let index = problem.pool().size();
        if !problem.pool_mut().add(column) {
            return Ok(false);
        }
        self.columns_for_member[member].push(index);

        if !self.column_allowed(problem, index) {
            log::debug!("column {index} violates the fixes of member {member}");
            problem.pool_mut().at_mut(index).fix(0)?;
        }
        Ok(true)
    }

    // Checks the member bookkeeping against the pool.
    #[cfg(feature = "validity_assertions")]
    fn sanity_check(&self, problem: &Problem) {
        for (p, columns) in self.columns_for_member.iter().enumerate() {
            for &i in columns {
                assert_eq!(problem.pool().at(i).member(), Some(p));
            }
        }
        for (i, column) in problem.pool().iter().enumerate() {
            if let Some(p) = column.member() {
                assert_eq!(self.columns_for_member[p].iter().filter(|&&j| j == i).count(), 1);
            }
        }
    }

    /// Recomputes the coverage of every constraint by `member`.
    ///
    /// Normalizes the solution values of the member's active columns to sum to one.
    pub fn compute_fractional_solution_for_member(
        &mut self,
        problem: &mut Problem,
        member: usize,
        active_columns: &[usize],
    ) -> Result<()> {
        self.fractional_solution[member].fill(0.0);

        let member_columns: Vec<usize> = active_columns
            .iter()
            .copied()
            .filter(|&i| problem.pool().at(i).member() == Some(member))
            .collect();
        let member_sum: f64 = member_columns
            .iter()
            .map(|&i| problem.pool().at(i).solution_value)
            .sum();

        let number_of_members = self.number_of_members;
        let fractional = &mut self.fractional_solution[member];
        for &i in &member_columns {
            // an inexact master solution or a fix may move the sum away from one
            if member_sum <= NONZERO_TOL {
                return Err(ColgenError::MemberSumTooSmall { member, sum: member_sum });
            }

            let column = problem.pool_mut().at_mut(i);
            let value = (column.solution_value / member_sum)
                .max(column.lower_bound())
                .min(column.upper_bound());
            column.solution_value = value;

            for c in column.rows().iter().filter_map(|e| e.row.checked_sub(number_of_members)) {
                fractional[c] += value;
            }
        }
        Ok(())
    }

    /// Recomputes the coverage for all members and checks it against the fixes
    pub fn compute_fractional_solution(
        &mut self,
        problem: &mut Problem,
        active_columns: &[usize],
    ) -> Result<()> {
        for p in 0..self.number_of_members {
            self.compute_fractional_solution_for_member(problem, p, active_columns)?;
            for c in 0..self.number_of_constraints {
                if let Some(fix) = self.fixes[p][c] {
                    let expected = if fix { 1.0 } else { 0.0 };
                    if (expected - self.fractional_solution[p][c]).abs() > FIX_STATE_TOL {
                        return Err(ColgenError::FixStateMismatch { member: p, constraint: c });
                    }
                }
            }
        }
        Ok(())
    }

    fn update_fractional_history(&mut self) {
        for (history, fractional) in self
            .fractional_solution_history
            .iter_mut()
            .zip(&self.fractional_solution)
        {
            for (h, f) in history.iter_mut().zip(fractional) {
                *h = HISTORY_UPDATE_FRACTION * *h + (1.0 - HISTORY_UPDATE_FRACTION) * f;
            }
        }
    }

    // Ties (or forbids) `constraint` to `member` and fixes the member's columns
    // that disagree to zero. Returns the number of columns fixed.
    fn fix_constraint_to_member(
        &mut self,
        problem: &mut Problem,
        member: usize,
        constraint: usize,
        value: bool,
    ) -> Result<usize> {
        if self.fixes[member][constraint] == Some(value) {
            return Ok(0);
        }
        debug_assert!(self.fixes[member][constraint].is_none());
        self.fixes[member][constraint] = Some(value);
        self.num_fixes_for_member[member] += 1;

        let row = self.number_of_members + constraint;
        let mut fixed_columns = 0;
        let mut at_least_one_column_left = false;
        for &i in &self.columns_for_member[member] {
            let column = problem.pool_mut().at_mut(i);
            if column.is_fixed() {
                if column.upper_bound() > 0.5 {
                    at_least_one_column_left = true;
                }
                continue;
            }

            let has_constraint = column.rows().iter().any(|e| e.row == row);
            if has_constraint == value {
                at_least_one_column_left = true;
            } else {
                column.fix(0)?;
                fixed_columns += 1;
            }
        }

        if !at_least_one_column_left {
            return Err(ColgenError::InfeasibleFix { member, constraint });
        }
        Ok(fixed_columns)
    }

    // One pass of constraint fixing at `threshold`. Returns the number of
    // columns fixed while tying constraints to members.
    fn fix_constraints(
        &mut self,
        problem: &mut Problem,
        threshold: f64,
        active_columns: &[usize],
    ) -> Result<usize> {
        let mut fixed = 0;
        let mut fixed_for_members = Vec::new();
        let mut fixed_for_members_to_zero = Vec::new();

        for p in 0..self.number_of_members {
            let mut member_fixes = 0;
            let mut member_fixes_to_zero = 0;
            for c in 0..self.number_of_constraints {
                if self.fixes[p][c].is_some() {
                    continue;
                }
                // the fractional solution changes with every fix, e.g. fixing one
                // constraint can remove the column that pushed another over the threshold
                if self.fractional_solution[p][c] >= threshold {
                    fixed += self.fix_constraint_to_member(problem, p, c, true)?;
                    self.compute_fractional_solution_for_member(problem, p, active_columns)?;
                    member_fixes += 1;
                } else if self.fractional_solution_history[p][c]
                    <= self.settings.zero_fix_threshold
                {
                    self.fix_constraint_to_member(problem, p, c, false)?;
                    self.compute_fractional_solution_for_member(problem, p, active_columns)?;
                    member_fixes_to_zero += 1;
                }
            }
            if member_fixes > 0 {
                fixed_for_members.push(format!("{}: {}", self.member_names[p], member_fixes));
            }
            if member_fixes_to_zero > 0 {
                fixed_for_members_to_zero
                    .push(format!("{}: {}", self.member_names[p], member_fixes_to_zero));
            }
        }

        if !fixed_for_members.is_empty() {
            self.ui.send(UIUserMessage::Log(format!(
                "-- Fixed for [{}] at level {threshold:.3}.",
                fixed_for_members.iter().join(", ")
            )));
            problem.attach_event(Event::FixConstraints { level: threshold });
        }
        if !fixed_for_members_to_zero.is_empty() {
            self.ui.send(UIUserMessage::Log(format!(
                "-- Fixed to zero for [{}] at level {}.",
                fixed_for_members_to_zero.iter().join(", "),
                self.settings.zero_fix_threshold
            )));
        }

        Ok(fixed)
    }

    fn fix_single_column(
        &mut self,
        problem: &mut Problem,
        active_columns: &[usize],
    ) -> Result<i64> {
        for &i in active_columns {
            let column = problem.pool().at(i);
            let value = column.solution_value;
            let Some(p) = column.member() else { continue };
            if column.upper_bound() == 1.0 && value >= 0.5 && value < 1.0 - 1e-7 {
                self.ui.send(UIUserMessage::Log(format!(
                    "-- Fixing column {i} to 1 for member {}, was {value}",
                    self.member_names[p]
                )));
                problem.attach_event(Event::FixColumn { fractional_value: value });
                problem.pool_mut().at_mut(i).fix(1)?;
                self.num_fixes_for_member[p] = self.number_of_constraints;
                return Ok(1);
            }
        }
        Ok(0)
    }

    // Fixes any fractional member to one of its columns.
    fn fix_as_last_resort(&mut self, problem: &mut Problem) -> Result<i64> {
        for p in 0..self.number_of_members {
            let pool = problem.pool();
            let nonzeros = self.columns_for_member[p]
                .iter()
                .filter(|&&i| pool.at(i).solution_value > NONZERO_TOL)
                .count();
            if nonzeros <= 1 {
                continue;
            }

            let chosen = self.columns_for_member[p].iter().copied().find(|&i| {
                let column = pool.at(i);
                !column.is_fixed() && column.solution_value > NONZERO_TOL
            });
            let Some(i) = chosen else { continue };

            let value = pool.at(i).solution_value;
            self.ui.send(UIUserMessage::Log(format!(
                "-- Fixing column {i} to 1 for member {} as a last resort, was {value}",
                self.member_names[p]
            )));
            problem.attach_event(Event::FixColumn { fractional_value: value });

            let mut fixed = 1;
            problem.pool_mut().at_mut(i).fix(1)?;
            self.num_fixes_for_member[p] = self.number_of_constraints;
            for &j in &self.columns_for_member[p] {
                if j != i {
                    problem.pool_mut().at_mut(j).fix(0)?;
                    fixed += 1;
                }
            }
            return Ok(fixed);
        }
        Ok(0)
    }

    fn log_fractionality(&self, problem: &Problem) {
        let remaining: Vec<String> = (0..self.number_of_members)
            .filter_map(|p| {
                let nonzeros = self.columns_for_member[p]
                    .iter()
                    .filter(|&&i| problem.pool().at(i).solution_value > NONZERO_TOL)
                    .count();
                (nonzeros > 1).then(|| format!("({}, {nonzeros})", self.member_names[p]))
            })
            .collect();
        self.ui.send(UIUserMessage::Log(format!(
            "-- Members remaining: {} and total is {}.",
            remaining.iter().join(" "),
            remaining.len()
        )));
    }

    /// No fixing before `first_fix_iteration` or while the objective still
    /// drops quickly. NaN objective changes (first super iteration) do not block.
    pub fn fixing_delayed(&self, information: &FixInformation) -> bool {
        information.iteration < self.settings.first_fix_iteration
            || information.objective_change < -self.settings.objective_change_before_fixing
    }

    /// Fixing heuristic over the given columns. Returns the number of
    /// columns fixed, `-1` once nothing is left to fix.
    pub fn fix_using_columns(
        &mut self,
        problem: &mut Problem,
        information: &FixInformation,
        active_columns: &[usize],
    ) -> Result<i64> {
        #[cfg(feature = "validity_assertions")]
        self.sanity_check(problem);

        self.compute_fractional_solution(problem, active_columns)?;
        self.update_fractional_history();

        if self.fixing_delayed(information) {
            return Ok(0);
        }

        let mut fixed = 0;
        let mut threshold = self.settings.fix_threshold;
        // lower the threshold until something is fixed
        while fixed == 0 && threshold > MINIMUM_FIX_THRESHOLD {
            let columns = self.fix_constraints(problem, threshold, active_columns)?;
            fixed = i64::try_from(columns).unwrap_or(i64::MAX);
            threshold *= THRESHOLD_DECAY;
        }

        // fixing a whole column removes the member from further optimization
        if fixed == 0 {
            fixed = self.fix_single_column(problem, active_columns)?;
        }
        if fixed == 0 {
            fixed = self.fix_as_last_resort(problem)?;
        }

        self.log_fractionality(problem);

        if fixed == 0 {
            self.ui.send(UIUserMessage::LogS("-- Not able to fix anything."));
            fixed = -1;
        }
        Ok(fixed)
    }

    /// Reverts every fix
    pub fn unfix_all(&mut self, problem: &mut Problem) {
        for fixes in &mut self.fixes {
            fixes.fill(None);
        }
        for history in &mut self.fractional_solution_history {
            history.fill(INITIAL_HISTORY);
        }
        for column in problem.pool_mut().iter_mut() {
            column.unfix();
        }
        self.num_fixes_for_member.fill(0);
    }

    /// Rounds by picking the column with the largest value for every member
    /// and returns the cost of that solution. The rounded coverage replaces the
    /// fractional solution, column solution values are left unchanged.
    pub fn integral_solution_value_for(
        &mut self,
        problem: &mut Problem,
        active_columns: &[usize],
    ) -> Result<f64> {
        let mut best_column: Vec<Option<(usize, f64)>> = vec![None; self.number_of_members];
        let mut saved_solution_values = Vec::new();

        for &i in active_columns {
            let column = problem.pool().at(i);
            let Some(p) = column.member() else { continue };
            let value = column.solution_value;
            if value > best_column[p].map_or(0.0, |(_, best)| best) {
                best_column[p] = Some((i, value));
            }
            saved_solution_values.push((i, value));
        }

        let chosen = best_column
            .iter()
            .enumerate()
            .map(|(p, best)| best.map(|(i, _)| i).ok_or(ColgenError::MemberWithoutSolution(p)))
            .collect::<Result<Vec<usize>>>()?;

        for &(i, _) in &saved_solution_values {
            problem.pool_mut().at_mut(i).solution_value = 0.0;
        }
        let mut column_cost = 0.0;
        for &i in &chosen {
            let column = problem.pool_mut().at_mut(i);
            column.solution_value = 1.0;
            column_cost += column.cost();
        }

        let rounded = (0..self.number_of_members)
            .try_for_each(|p| {
                self.compute_fractional_solution_for_member(problem, p, active_columns)
            });

        for &(i, value) in &saved_solution_values {
            problem.pool_mut().at_mut(i).solution_value = value;
        }
        rounded?;

        self.rounded_columns = chosen;
        Ok(column_cost + self.cover_cost())
    }

    // Penalty of the coverage stored in the fractional solution.
    fn cover_cost(&self) -> f64 {
        self.constraints
            .iter()
            .enumerate()
            .map(|(c, constraint)| {
                let value: f64 = self.fractional_solution.iter().map(|member| member[c]).sum();
                constraint.penalty(value)
            })
            .sum()
    }

    pub fn rounded_solution(&self) -> &[usize] {
        &self.rounded_columns
    }

    pub fn create_log_entry(&self) -> LogEntry {
        let members = (0..self.number_of_members)
            .map(|p| MemberLog {
                id: self.member_names[p].clone(),
                constraints: self.fixes[p]
                    .iter()
                    .zip(&self.fractional_solution[p])
                    .map(|(fix, &value)| match fix {
                        Some(true) => ConstraintLog { fixed: true, value: 1.0 },
                        Some(false) => ConstraintLog { fixed: true, value: 0.0 },
                        None => ConstraintLog { fixed: false, value },
                    })
                    .collect(),
            })
            .collect();

        LogEntry {
            set_partitioning: Some(SetPartitioningLog { members }),
            ..LogEntry::default()
        }
    }
}

// Adds an always present slack for `row`. A quadratic cost is approximated by
// bounded steps of increasing marginal cost followed by an unbounded tail.
fn add_slack(
    pool: &mut ColumnPool,
    row: usize,
    sign: f64,
    cost: f64,
    quadratic_cost: f64,
) -> Result<()> {
    if quadratic_cost == 0.0 {
        let mut slack = Column::new(cost, 0.0, f64::INFINITY)?.add_coefficient(row, sign);
        slack.set_integer(false)?;
        pool.add(slack);
        return Ok(());
    }

    // distinct widths keep the steps distinct as row patterns
    let mut start = 0.0;
    for k in 0..QUADRATIC_STEPS {
        #[allow(clippy::cast_precision_loss)]
        let width = k as f64 + 0.5;
        let marginal = cost + quadratic_cost * (2.0 * start + width);
        let mut step = Column::new(marginal * width, 0.0, 1.0)?.add_coefficient(row, sign * width);
        step.set_integer(false)?;
        pool.add(step);
        start += width;
    }

    let tail_cost = cost + 2.0 * quadratic_cost * start;
    let mut tail = Column::new(tail_cost, 0.0, f64::INFINITY)?.add_coefficient(row, sign);
    tail.set_integer(false)?;
    pool.add(tail);
    Ok(())
}

/// Access to the problem during pricing
pub struct PricingContext<'a> {
    problem: &'a mut Problem,
    partitioning: &'a mut PartitioningState,
}

impl<'a> PricingContext<'a> {
    pub fn new(problem: &'a mut Problem, partitioning: &'a mut PartitioningState) -> Self {
        PricingContext { problem, partitioning }
    }

    /// Adds a member column, see [`SetPartitioningProblem::add_column`]
    pub fn add_column(&mut self, column: Column) -> Result<bool> {
        self.partitioning.add_column(self.problem, column)
    }

    pub fn problem(&self) -> &Problem {
        self.problem
    }

    pub fn pool(&self) -> &ColumnPool {
        self.problem.pool()
    }

    pub fn partitioning(&self) -> &PartitioningState {
        self.partitioning
    }

    pub fn number_of_members(&self) -> usize {
        self.partitioning.number_of_members
    }

    pub fn number_of_constraints(&self) -> usize {
        self.partitioning.number_of_constraints
    }

    pub fn member_fully_fixed(&self, member: usize) -> bool {
        self.partitioning.member_fully_fixed(member)
    }

    pub fn fixes_for_member(&self, member: usize) -> &[Option<bool>] {
        self.partitioning.fixes_for_member(member)
    }

    /// Pricing iterations so far, usable to vary random streams per round
    pub fn pricing_iteration(&self) -> usize {
        self.problem.pricing_iterations()
    }

    pub fn ui(&self) -> &UISender {
        self.problem.ui()
    }
}

/// Pricing oracle of a set partitioning problem
pub trait MemberPricing {
    /// Adds improving member columns through [`PricingContext::add_column`]
    fn generate(&mut self, context: &mut PricingContext<'_>, duals: &[f64]) -> Result<()>;

    /// See [`ColumnGenerator::interrupt_handler`]
    fn interrupt_handler(&mut self, context: &mut PricingContext<'_>) -> Result<bool> {
        Err(ColgenError::Interrupted)
    }
}

struct PartitioningGenerator<'a, P> {
    partitioning: &'a mut PartitioningState,
    pricing: &'a mut P,
}

impl<P: MemberPricing> ColumnGenerator for PartitioningGenerator<'_, P> {
    fn generate(&mut self, problem: &mut Problem, duals: &[f64]) -> Result<()> {
        let mut context = PricingContext::new(problem, self.partitioning);
        self.pricing.generate(&mut context, duals)
    }

    fn fix(&mut self, problem: &mut Problem, information: &FixInformation) -> Result<i64> {
        let active = problem.active_columns().to_vec();
        self.partitioning.fix_using_columns(problem, information, &active)
    }

    fn fixing_delayed(&self, problem: &Problem, information: &FixInformation) -> bool {
        self.partitioning.fixing_delayed(information)
    }

    fn integral_solution_value(&mut self, problem: &mut Problem) -> Result<f64> {
        let active = problem.active_columns().to_vec();
        self.partitioning.integral_solution_value_for(problem, &active)
    }

    fn create_log_entry(&self, problem: &Problem) -> LogEntry {
        self.partitioning.create_log_entry()
    }

    fn interrupt_handler(&mut self, problem: &mut Problem) -> Result<bool> {
        let mut context = PricingContext::new(problem, self.partitioning);
        self.pricing.interrupt_handler(&mut context)
    }
}

/// Set partitioning problem with `number_of_members` member rows followed by
/// `number_of_constraints` coverage rows, priced by `P`
pub struct SetPartitioningProblem<P: MemberPricing> {
    problem: Problem,
    partitioning: PartitioningState,
    pricing: P,
}

impl<P: MemberPricing> SetPartitioningProblem<P> {
    pub fn new(
        number_of_members: usize,
        number_of_constraints: usize,
        settings: ColgenSettings,
        fix_settings: FixSettings,
        ui: UISender,
        pricing: P,
    ) -> Result<Self> {
        let number_of_rows = number_of_members + number_of_constraints;
        let mut problem = Problem::new(number_of_rows, settings, ui.clone())?;
        for member in 0..number_of_members {
            problem.set_row_lower_bound(member, 1.0)?;
            problem.set_row_upper_bound(member, 1.0)?;
        }

        Ok(SetPartitioningProblem {
            problem,
            partitioning: PartitioningState::new(
                number_of_members,
                number_of_constraints,
                fix_settings,
                ui,
            ),
            pricing,
        })
    }

    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    pub fn problem_mut(&mut self) -> &mut Problem {
        &mut self.problem
    }

    pub fn partitioning(&self) -> &PartitioningState {
        &self.partitioning
    }

    pub fn pricing(&self) -> &P {
        &self.pricing
    }

    pub fn pricing_mut(&mut self) -> &mut P {
        &mut self.pricing
    }

    /// Context for pricing outside of [`Self::solve`], e.g. to create initial columns
    pub fn pricing_context(&mut self) -> PricingContext<'_> {
        PricingContext::new(&mut self.problem, &mut self.partitioning)
    }

    pub fn pool(&self) -> &ColumnPool {
        self.problem.pool()
    }

    pub fn pool_mut(&mut self) -> &mut ColumnPool {
        self.problem.pool_mut()
    }

    pub fn number_of_rows(&self) -> usize {
        self.partitioning.number_of_rows()
    }

    pub fn number_of_members(&self) -> usize {
        self.partitioning.number_of_members
    }

    pub fn number_of_constraints(&self) -> usize {
        self.partitioning.number_of_constraints
    }

    pub fn set_member_name(&mut self, member: usize, name: impl Into<String>) {
        self.partitioning.member_names[member] = name.into();
    }

    pub fn member_name(&self, member: usize) -> &str {
        self.partitioning.member_name(member)
    }

    /// Sets the coverage interval of constraint `c` and adds its under and
    /// over slack columns. Quadratic costs apply to the squared violation.
    #[allow(clippy::too_many_arguments)]
    pub fn initialize_constraint(
        &mut self,
        c: usize,
        min_value: f64,
        max_value: f64,
        under_cost: f64,
        over_cost: f64,
        under_quadratic_cost: f64,
        over_quadratic_cost: f64,
    ) -> Result<()> {
        let constraint = CoverConstraint {
            min_value,
            max_value,
            under_cost,
            over_cost,
            under_quadratic_cost,
            over_quadratic_cost,
        };
        self.partitioning.initialize_constraint(&mut self.problem, c, constraint)
    }

    /// Adds a member column. It needs bounds `[0, 1]`, exactly one member row
    /// and unit coefficients. Returns false for duplicates.
    pub fn add_column(&mut self, column: Column) -> Result<bool> {
        self.partitioning.add_column(&mut self.problem, column)
    }

    pub fn fix(&mut self, information: &FixInformation) -> Result<i64> {
        let active = self.problem.active_columns().to_vec();
        self.fix_using_columns(information, &active)
    }

    pub fn fix_using_columns(
        &mut self,
        information: &FixInformation,
        active_columns: &[usize],
    ) -> Result<i64> {
        self.partitioning.fix_using_columns(&mut self.problem, information, active_columns)
    }

    pub fn unfix_all(&mut self) {
        self.partitioning.unfix_all(&mut self.problem);
    }

    pub fn member_fully_fixed(&self, member: usize) -> bool {
        self.partitioning.member_fully_fixed(member)
    }

    /// Member of a pool column, `None` for slack columns
    pub fn column_member(&self, column: usize) -> Option<usize> {
        self.problem.pool().at(column).member()
    }

    pub fn column_allowed(&self, column: usize) -> bool {
        self.partitioning.column_allowed(&self.problem, column)
    }

    pub fn fixes_for_member(&self, member: usize) -> &[Option<bool>] {
        self.partitioning.fixes_for_member(member)
    }

    pub fn fractional_solution(&self, member: usize, constraint: usize) -> f64 {
        self.partitioning.fractional_solution(member, constraint)
    }

    pub fn compute_fractional_solution(&mut self, active_columns: &[usize]) -> Result<()> {
        self.partitioning.compute_fractional_solution(&mut self.problem, active_columns)
    }

    pub fn compute_fractional_solution_for_member(
        &mut self,
        member: usize,
        active_columns: &[usize],
    ) -> Result<()> {
        self.partitioning
            .compute_fractional_solution_for_member(&mut self.problem, member, active_columns)
    }

    /// Rounded solution value over the active columns
    pub fn integral_solution_value(&mut self) -> Result<f64> {
        let active = self.problem.active_columns().to_vec();
        self.integral_solution_value_for(&active)
    }

    pub fn integral_solution_value_for(&mut self, active_columns: &[usize]) -> Result<f64> {
        self.partitioning
            .integral_solution_value_for(&mut self.problem, active_columns)
    }

    /// Chosen column per member of the last rounding
    pub fn rounded_solution(&self) -> &[usize] {
        self.partitioning.rounded_solution()
    }

    pub fn create_log_entry(&self) -> LogEntry {
        self.partitioning.create_log_entry()
    }

    /// Adds the columns of a saved pool, member columns go through [`Self::add_column`].
    /// Returns the number of columns added.
    pub fn load_pool<R: Read>(&mut self, input: &mut R) -> Result<usize> {
        let loaded = ColumnPool::load_from_stream(input)?;
        let mut added = 0;
        for column in loaded {
            let is_member_column = column.rows().iter().any(|e| e.row < self.number_of_members());
            let new = if is_member_column {
                self.add_column(column)?
            } else {
                let mut column = column;
                column.set_integer(false)?;
                self.problem.pool_mut().add(column)
            };
            added += usize::from(new);
        }
        log::debug!("added {added} saved columns");
        Ok(added)
    }

    pub fn save_pool<W: Write>(&self, out: &mut W) -> Result<()> {
        self.problem.pool().save_to_stream(out)
    }

    /// Runs column generation with fixing until an integer solution is found
    pub fn solve<S: MasterSolver + ?Sized>(&mut self, solver: &mut S) -> Result<SolveOutcome> {
        let mut generator = PartitioningGenerator {
            partitioning: &mut self.partitioning,
            pricing: &mut self.pricing,
        };
        self.problem.solve(&mut generator, solver)
    }
}
