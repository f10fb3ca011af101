//! Error types for tally-sheets-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tally-sheets-core
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed cell or range reference text
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Column number outside `1..=max`
    #[error("Column number {0} out of range (max: {1})")]
    ColumnOutOfRange(i64, u32),

    /// Row number outside `1..=max`
    #[error("Row number {0} out of range (max: {1})")]
    RowOutOfRange(i64, u32),

    /// A structural edit would push a cell past the last column
    #[error("Column limit exceeded: column {0} would pass the maximum of {1}")]
    ColumnLimitExceeded(i64, u32),

    /// A structural edit would push a row past the last row
    #[error("Row limit exceeded: row {0} would pass the maximum of {1}")]
    RowLimitExceeded(i64, u32),

    /// Structural edits are anchored on a 1-based line number
    #[error("Invalid pivot {0}: row and column numbers start at 1")]
    InvalidPivot(u32),

    /// Sheet index out of bounds
    #[error("Sheet index {0} out of bounds (count: {1})")]
    SheetOutOfBounds(usize, usize),

    /// Sheet not found by name
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// Invalid sheet name
    #[error("Invalid sheet name: {0}")]
    InvalidSheetName(String),

    /// Duplicate sheet name
    #[error("Sheet name already exists: {0}")]
    DuplicateSheetName(String),

    /// Merged cell conflict
    #[error("Range {0} overlaps an existing merged region")]
    MergedCellConflict(String),

    /// Column style ranges must not overlap
    #[error("Column range {0}:{1} overlaps an existing column range")]
    ColumnRangeConflict(u32, u32),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Shorthand for an [`Error::InvalidReference`] carrying the offending text
    pub(crate) fn invalid_reference<S: AsRef<str>>(reference: S) -> Self {
        Error::InvalidReference(reference.as_ref().to_string())
    }
}
