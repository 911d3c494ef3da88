use serde::{Deserialize, Serialize};

use crate::error::{ColgenError, Result};

/// A single non-zero entry of a column in the master problem
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RowEntry {
    pub row: usize,
    pub coef: f64,
}

impl RowEntry {
    pub fn new(row: usize, coef: f64) -> Self {
        RowEntry { row, coef }
    }
}

/// One pattern of the master problem: a decision variable, its cost
/// and its column of the constraint matrix.
///
/// Rows can only be added to an owned column through the consuming
/// builders. Once the column is moved into a [`ColumnPool`](crate::column_pool::ColumnPool)
/// only bounds and the fix state can change.
///
/// Columns are never cloned, a pool holds the only copy.
#[derive(Debug)]
pub struct Column {
    /// Value of the column in the most recent master solution
    pub solution_value: f64,

    cost: f64,
    lower_bound: f64,
    upper_bound: f64,
    fixed_value: Option<u32>,
    is_integer: bool,
    rows: Vec<RowEntry>,
    member: Option<usize>,
}

impl Column {
    pub fn new(cost: f64, lower_bound: f64, upper_bound: f64) -> Result<Self> {
        // also rejects NaN bounds
        if !(lower_bound <= upper_bound) {
            return Err(ColgenError::InvertedBounds {
                lower: lower_bound,
                upper: upper_bound,
            });
        }

        Ok(Column {
            solution_value: 0.0,
            cost,
            lower_bound,
            upper_bound,
            fixed_value: None,
            is_integer: true,
            rows: Vec::new(),
            member: None,
        })
    }

    /// Adds a coefficient for `row`. Zero coefficients are skipped.
    #[must_use]
    pub fn add_coefficient(mut self, row: usize, coef: f64) -> Self {
        if coef != 0.0 {
            self.rows.push(RowEntry { row, coef });
        }
        self
    }

    #[must_use]
    pub fn with_coefficients<I: IntoIterator<Item = (usize, f64)>>(self, entries: I) -> Self {
        entries
            .into_iter()
            .fold(self, |column, (row, coef)| column.add_coefficient(row, coef))
    }

    /// Marks the column as belonging to a member, e.g. a worker in a
    /// set partitioning problem
    #[must_use]
    pub fn with_member(mut self, member: usize) -> Self {
        self.member = Some(member);
        self
    }

    #[must_use]
    pub fn with_solution_value(mut self, value: f64) -> Self {
        self.solution_value = value;
        self
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn lower_bound(&self) -> f64 {
        match self.fixed_value {
            Some(value) => f64::from(value),
            None => self.lower_bound,
        }
    }

    pub fn upper_bound(&self) -> f64 {
        match self.fixed_value {
            Some(value) => f64::from(value),
            None => self.upper_bound,
        }
    }

    pub fn rows(&self) -> &[RowEntry] {
        &self.rows
    }

    pub fn member(&self) -> Option<usize> {
        self.member
    }

    pub(crate) fn set_member(&mut self, member: usize) {
        self.member = Some(member);
    }

    pub fn is_integer(&self) -> bool {
        self.is_integer
    }

    pub fn set_integer(&mut self, is_integer: bool) -> Result<()> {
        if !is_integer && self.is_fixed() {
            return Err(ColgenError::RealValuedFixedColumn);
        }
        self.is_integer = is_integer;
        Ok(())
    }

    pub fn is_fixed(&self) -> bool {
        self.fixed_value.is_some()
    }

    pub fn fixed_value(&self) -> Option<u32> {
        self.fixed_value
    }

    /// Fixes the column to `value`, which also becomes its solution value
    pub fn fix(&mut self, value: i64) -> Result<()> {
        if !self.is_integer {
            return Err(ColgenError::FixRealValuedColumn);
        }
        let value = u32::try_from(value).map_err(|_| ColgenError::NegativeFixValue(value))?;
        self.fixed_value = Some(value);
        self.solution_value = f64::from(value);
        Ok(())
    }

    pub fn unfix(&mut self) {
        self.fixed_value = None;
    }

    pub fn reduced_cost(&self, duals: &[f64]) -> f64 {
        self.rows
            .iter()
            .fold(self.cost, |rc, entry| rc - entry.coef * duals[entry.row])
    }

    /// Row entries sorted by row, the form used for equality
    pub(crate) fn canonical_rows(&self) -> Vec<RowEntry> {
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| a.row.cmp(&b.row).then(a.coef.total_cmp(&b.coef)));
        rows
    }

    pub(crate) fn to_record(&self) -> ColumnRecord {
        ColumnRecord {
            cost: self.cost,
            lower_bound: self.lower_bound,
            upper_bound: self.upper_bound,
            entries: self.rows.iter().map(|e| (e.row, e.coef)).collect(),
        }
    }

    pub(crate) fn from_record(record: ColumnRecord) -> Result<Self> {
        Ok(Column::new(record.cost, record.lower_bound, record.upper_bound)?
            .with_coefficients(record.entries))
    }
}

/// Two columns are equal if they have the same row pattern.
/// Cost, bounds and fix state are not compared.
impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.rows.len() == other.rows.len() && self.canonical_rows() == other.canonical_rows()
    }
}

/// Persisted form of a column
#[derive(Serialize, Deserialize, Debug)]
pub(crate) struct ColumnRecord {
    pub cost: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub entries: Vec<(usize, f64)>,
}
