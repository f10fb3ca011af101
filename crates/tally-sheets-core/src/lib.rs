//! # tally-sheets-core
//!
//! Core document model for the tally-sheets spreadsheet engine.
//!
//! This crate provides the types every other tally-sheets crate builds on:
//! - [`CellAddress`] and [`RangeRef`] - the coordinate model (1-based, A1 notation)
//! - [`Cell`], [`CellValue`] and [`Formula`] - cell contents
//! - [`Row`], [`ColumnRange`], [`Hyperlink`], [`AutoFilter`], [`TablePart`] - sheet structures
//! - [`Worksheet`], [`Workbook`] and [`CalcChain`] - the document itself
//!
//! ## Example
//!
//! ```rust
//! use tally_sheets_core::{Formula, Workbook};
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//!
//! sheet.set_cell_number("A1", 10.0).unwrap();
//! sheet.set_cell_formula("B1", Formula::normal("A1*2")).unwrap();
//! sheet.merge_cells("C1:D2").unwrap();
//!
//! assert_eq!(sheet.last_row(), Some(1));
//! assert_eq!(sheet.merged_cells(), &["C1:D2".to_string()]);
//! ```

pub mod calc_chain;
pub mod cell;
pub mod column;
pub mod error;
pub mod filter;
pub mod hyperlink;
pub mod range;
pub mod row;
pub mod table;
pub mod workbook;
pub mod worksheet;

// Re-exports for convenience
pub use calc_chain::{CalcChain, CalcChainEntry};
pub use cell::{
    cell_ref_to_coordinates, coordinates_to_cell_ref, Cell, CellAddress, CellType, CellValue,
    Formula, FormulaKind, SharedStringTable,
};
pub use column::ColumnRange;
pub use error::{Error, Result};
pub use filter::{AutoFilter, FilterColumn};
pub use hyperlink::{Hyperlink, HyperlinkTarget};
pub use range::{range_ref_to_coordinates, RangeRef};
pub use row::Row;
pub use table::{Table, TableColumn, TablePart, TableStyleInfo};
pub use workbook::{SheetLimits, Workbook, WorkbookSettings, WorkbookSheetMut};
pub use worksheet::Worksheet;

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u32 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
