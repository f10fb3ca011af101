//! Error type for the tally-sheets facade

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by [`Document`](crate::Document) operations
#[derive(Debug, Error)]
pub enum Error {
    /// Document model error (references, bounds, sheets, merges)
    #[error(transparent)]
    Core(#[from] tally_sheets_core::Error),

    /// Formula reference error
    #[error(transparent)]
    Formula(#[from] tally_sheets_formula::FormulaError),

    /// Package or part codec error
    #[error(transparent)]
    Xlsx(#[from] tally_sheets_xlsx::XlsxError),
}

impl Error {
    /// The document model error behind this error, if there is one
    pub fn as_core(&self) -> Option<&tally_sheets_core::Error> {
        match self {
            Error::Core(e) => Some(e),
            Error::Formula(tally_sheets_formula::FormulaError::Core(e)) => Some(e),
            Error::Xlsx(tally_sheets_xlsx::XlsxError::Core(e)) => Some(e),
            Error::Xlsx(_) => None,
        }
    }
}
