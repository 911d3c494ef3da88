use thiserror::Error;

/// Errors raised while building columns, solving the master problem
/// or reading persisted pools and logs.
#[derive(Debug, Error)]
pub enum ColgenError {
    #[error("column bounds are inverted: lower bound {lower} > upper bound {upper}")]
    InvertedBounds { lower: f64, upper: f64 },

    #[error("columns can only be fixed to non-negative values, got {0}")]
    NegativeFixValue(i64),

    #[error("a real-valued column can not be fixed")]
    FixRealValuedColumn,

    #[error("a fixed column can not be made real-valued")]
    RealValuedFixedColumn,

    #[error("row {row} is out of range, the problem has {number_of_rows} rows")]
    RowOutOfRange { row: usize, number_of_rows: usize },

    #[error("row {0} is not covered by any active column")]
    EmptyRow(usize),

    #[error("column {0} has a negative lower bound")]
    NegativeLowerBound(usize),

    #[error("no columns are available for the master problem")]
    EmptyPool,

    #[error("solving the master problem failed: {0}")]
    MasterSolveFailed(String),

    #[error("invalid column: {0}")]
    InvalidColumn(String),

    #[error("member {member} has a solution sum of {sum}")]
    MemberSumTooSmall { member: usize, sum: f64 },

    #[error("fix state of member {member} does not match the coverage of constraint {constraint}")]
    FixStateMismatch { member: usize, constraint: usize },

    #[error("fixing constraint {constraint} for member {member} leaves no column")]
    InfeasibleFix { member: usize, constraint: usize },

    #[error("member {0} has no column with a positive solution value")]
    MemberWithoutSolution(usize),

    #[error("interrupted")]
    Interrupted,

    #[error("corrupt column pool: {0}")]
    CorruptPool(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialization(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, ColgenError>;
