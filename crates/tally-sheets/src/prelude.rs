//! Prelude module - common imports for tally-sheets users
//!
//! ```rust
//! use tally_sheets::prelude::*;
//! ```

pub use crate::{
    // Cell types
    CellAddress,
    CellValue,
    Formula,
    RangeRef,

    // Structural edits
    Direction,
    Document,

    // Error types
    Error,
    Result,

    // Main types
    Workbook,
    WorkbookExt,
    WorkbookSettings,
    Worksheet,
};
