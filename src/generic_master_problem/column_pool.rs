use std::fs::File;
use std::hash::{BuildHasher, BuildHasherDefault, Hash, Hasher};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::slice::{Iter, IterMut};

use twox_hash::XxHash64;

use crate::column::{Column, ColumnRecord};
use crate::error::{ColgenError, Result};
use crate::misc::record_stream::{read_record, write_record};
use crate::misc::FullHashMap;

/// Columns with an upper bound at or below this are ignored
pub const ALLOWED_EPS: f64 = 1e-9;

const POOL_TAG: &[u8] = b"ColumnPool";

/// Reduced cost of a pool column under some dual solution
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColumnScore {
    pub index: usize,
    pub reduced_cost: f64,
}

/// Holds all columns generated so far.
///
/// Indices are stable, columns are never removed.
pub struct ColumnPool {
    columns: Vec<Column>,
    // pattern hash -> indices of columns with that hash
    pattern_index: FullHashMap<u64, Vec<usize>>,
    sorted: Vec<ColumnScore>,
}

impl Default for ColumnPool {
    fn default() -> Self {
        Self::new()
    }
}

fn pattern_hash(column: &Column) -> u64 {
    let mut hasher = BuildHasherDefault::<XxHash64>::default().build_hasher();
    for entry in column.canonical_rows() {
        entry.row.hash(&mut hasher);
        entry.coef.to_bits().hash(&mut hasher);
    }
    hasher.finish()
}

impl ColumnPool {
    pub fn new() -> Self {
        ColumnPool {
            columns: Vec::new(),
            pattern_index: FullHashMap::default(),
            sorted: Vec::new(),
        }
    }

    /// Adds a column to the column pool.
    /// Returns false and drops the column if a column with
    /// the same row pattern is already present.
    pub fn add(&mut self, column: Column) -> bool {
        let hash = pattern_hash(&column);
        let bucket = self.pattern_index.entry(hash).or_default();

        if bucket.iter().any(|&i| self.columns[i] == column) {
            return false;
        }

        #[cfg(feature = "validity_assertions")]
        {
            // the hash index must agree with a full scan
            assert!(self.columns.iter().all(|c| *c != column));
        }

        bucket.push(self.columns.len());
        self.columns.push(column);
        true
    }

    /// Total number of columns in pool
    pub fn size(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Number of columns that may take a non-zero value
    pub fn allowed_size(&self) -> usize {
        self.columns
            .iter()
            .filter(|c| c.upper_bound() > ALLOWED_EPS)
            .count()
    }

    pub fn at(&self, index: usize) -> &Column {
        &self.columns[index]
    }

    pub fn at_mut(&mut self, index: usize) -> &mut Column {
        &mut self.columns[index]
    }

    pub fn get(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn iter(&self) -> Iter<'_, Column> {
        self.columns.iter()
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, Column> {
        self.columns.iter_mut()
    }

    pub fn clear(&mut self) {
        self.columns.clear();
        self.pattern_index.clear();
        self.sorted.clear();
    }

    /// Returns the allowed columns with negative reduced cost, most negative first.
    /// At most `max_count` entries are returned unless `max_count` is zero.
    ///
    /// The slice is backed by a buffer owned by the pool.
    pub fn get_sorted(&mut self, duals: &[f64], max_count: usize) -> &[ColumnScore] {
        self.sorted.clear();
        self.sorted.extend(
            self.columns
                .iter()
                .enumerate()
                .filter(|(_, c)| c.upper_bound() > ALLOWED_EPS)
                .map(|(index, c)| ColumnScore {
                    index,
                    reduced_cost: c.reduced_cost(duals),
                }),
        );

        self.sorted.sort_by(|a, b| {
            a.reduced_cost
                .total_cmp(&b.reduced_cost)
                .then(a.index.cmp(&b.index))
        });

        if max_count > 0 {
            self.sorted.truncate(max_count);
        }
        let first_non_negative = self
            .sorted
            .iter()
            .position(|s| !(s.reduced_cost < 0.0))
            .unwrap_or(self.sorted.len());
        self.sorted.truncate(first_non_negative);

        &self.sorted
    }

    /// Writes all columns as length prefixed records.
    /// Fix state, member and solution values are not saved.
    pub fn save_to_stream<W: Write>(&self, out: &mut W) -> Result<()> {
        write_record(out, POOL_TAG)?;
        for column in &self.columns {
            write_record(out, &bincode::serialize(&column.to_record())?)?;
        }
        write_record(out, &[])?;
        out.flush()?;
        Ok(())
    }

    pub fn load_from_stream<R: Read>(input: &mut R) -> Result<Self> {
        let tag = read_record(input)?;
        if tag != POOL_TAG {
            return Err(ColgenError::CorruptPool("missing ColumnPool tag".to_string()));
        }

        let mut pool = ColumnPool::new();
        loop {
            let data = read_record(input)?;
            if data.is_empty() {
                break;
            }
            let record: ColumnRecord = bincode::deserialize(&data)?;
            pool.add(Column::from_record(record)?);
        }
        log::debug!("loaded {} columns", pool.size());
        Ok(pool)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.save_to_stream(&mut out)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut input = BufReader::new(File::open(path)?);
        Self::load_from_stream(&mut input)
    }
}

impl<'a> IntoIterator for &'a ColumnPool {
    type Item = &'a Column;
    type IntoIter = Iter<'a, Column>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}

impl<'a> IntoIterator for &'a mut ColumnPool {
    type Item = &'a mut Column;
    type IntoIter = IterMut<'a, Column>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter_mut()
    }
}

impl IntoIterator for ColumnPool {
    type Item = Column;
    type IntoIter = std::vec::IntoIter<Column>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.into_iter()
    }
}
