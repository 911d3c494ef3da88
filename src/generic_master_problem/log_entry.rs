use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::misc::record_stream::{try_read_record, write_record};

/// Something noteworthy that happened during a pricing iteration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Event {
    IntegerSolution,
    /// Constraints were fixed to members at this threshold
    FixConstraints { level: f64 },
    /// A single column was fixed to one
    FixColumn { fractional_value: f64 },
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstraintLog {
    pub fixed: bool,
    pub value: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberLog {
    pub id: String,
    pub constraints: Vec<ConstraintLog>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SetPartitioningLog {
    pub members: Vec<MemberLog>,
}

/// Record written for every pricing iteration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub iteration: usize,
    pub fractional_objective: f64,
    /// NaN if no rounded solution is available
    pub integer_objective: f64,
    pub active_set_size: usize,
    pub active_set_size_change: i64,
    pub pool_size: usize,
    pub pool_size_change: usize,
    pub fixed_column_count: i64,
    pub cumulative_time: f64,
    pub set_partitioning: Option<SetPartitioningLog>,
    pub events: Vec<Event>,
}

pub(crate) struct LogWriter {
    out: BufWriter<File>,
}

impl LogWriter {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(LogWriter {
            out: BufWriter::new(File::create(path)?),
        })
    }

    pub fn write(&mut self, entry: &LogEntry) -> Result<()> {
        write_record(&mut self.out, &bincode::serialize(entry)?)?;
        self.out.flush()?;
        Ok(())
    }
}

/// Reads all entries of an iteration log
pub fn read_log_entries<P: AsRef<Path>>(path: P) -> Result<Vec<LogEntry>> {
    let mut input = BufReader::new(File::open(path)?);
    let mut entries = Vec::new();
    while let Some(data) = try_read_record(&mut input)? {
        entries.push(bincode::deserialize(&data)?);
    }
    Ok(entries)
}
