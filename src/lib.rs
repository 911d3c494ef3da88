#![warn(warnings)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::needless_return)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::module_name_repetitions)]
#![allow(unused_variables)]

//! Column generation for linear programs with many columns.
//!
//! A [`Problem`] holds the [`ColumnPool`] and the row bounds. [`Problem::solve`]
//! alternates between solving the restricted master problem through a
//! [`MasterSolver`](solvers::MasterSolver), pricing new columns with a
//! [`ColumnGenerator`] and fixing columns until an integer solution is reached.
//! [`SetPartitioningProblem`] provides the fixing heuristic for set
//! partitioning with soft coverage constraints.

pub mod error;
pub mod misc;
mod generic_master_problem;
mod ui;
pub mod solvers;

pub use generic_master_problem::*;
pub use ui::*;

pub use column::{Column, RowEntry};
pub use column_pool::{ColumnPool, ColumnScore};
pub use error::{ColgenError, Result};
pub use log_entry::{read_log_entries, Event, LogEntry};
pub use pricing::{price_members_in_parallel, MemberPricingInput, PricingSettings, PricingSummary};
pub use set_partitioning::{
    FixSettings, MemberPricing, PartitioningState, PricingContext, SetPartitioningProblem,
};
