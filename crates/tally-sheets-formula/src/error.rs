//! Formula error types

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur while working with formula references
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormulaError {
    /// Error from the document model
    #[error(transparent)]
    Core(#[from] tally_sheets_core::Error),
}
