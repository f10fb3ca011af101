//! # tally-sheets
//!
//! A Rust library for editing spreadsheet packages.
//!
//! Tally-sheets inserts and deletes whole rows and columns of an `.xlsx`
//! workbook while keeping everything that points at sheet coordinates
//! consistent: cells and formula extents, row and column records,
//! hyperlinks, tables, the autofilter, merged cells and the calculation
//! chain.
//!
//! ## Features
//!
//! - Open and save `.xlsx` packages, carrying unmodeled parts through
//! - Structural row/column edits with bounds checks against sheet limits
//! - Shared formula creation and per-cell resolution
//! - Tables and URL hyperlinks backed by package parts
//!
//! ## Example
//!
//! ```rust
//! use tally_sheets::prelude::*;
//!
//! let mut doc = Document::new().unwrap();
//! doc.set_cell_string("Sheet1", "A1", "Region").unwrap();
//! doc.worksheet_mut("Sheet1").unwrap().merge_cells("B2:C3").unwrap();
//!
//! // Delete row 3: the merge collapses to a single row
//! doc.remove_rows("Sheet1", 3, 1).unwrap();
//! assert_eq!(doc.worksheet("Sheet1").unwrap().merged_cells(), &["B2:C2".to_string()]);
//!
//! // Save to file
//! // doc.save("output.xlsx").unwrap();
//! ```

mod document;
mod error;
pub mod prelude;
pub mod structure;

pub use document::Document;
pub use error::{Error, Result};

// Re-export core types
pub use tally_sheets_core::{
    // Coordinates
    cell_ref_to_coordinates,
    coordinates_to_cell_ref,
    range_ref_to_coordinates,
    CellAddress,
    RangeRef,

    // Cell types
    Cell,
    CellType,
    CellValue,
    Formula,
    FormulaKind,
    SharedStringTable,

    // Sheet structures
    AutoFilter,
    FilterColumn,
    CalcChain,
    CalcChainEntry,
    ColumnRange,
    Hyperlink,
    HyperlinkTarget,
    Row,
    Table,
    TableColumn,
    TablePart,
    TableStyleInfo,

    // Main types
    SheetLimits,
    Workbook,
    WorkbookSettings,
    WorkbookSheetMut,
    Worksheet,

    // Constants
    MAX_COLS,
    MAX_ROWS,
    MAX_SHEET_NAME_LEN,
};

// Re-export formula helpers
pub use tally_sheets_formula::{
    establish_shared_formula, next_shared_group_index, resolve_shared_formula,
    resolve_shared_formula_within, shift_cell_token, shift_cell_token_within, shift_formula_text,
    shift_formula_text_within, shift_reference_range, Direction, FormulaError,
};

// Re-export package types
pub use tally_sheets_xlsx::{Package, PartStore, XlsxError, XlsxReader, XlsxWriter};

use std::path::Path;

/// Extension trait for Workbook to add file I/O without keeping the package
///
/// Parts the model does not cover are lost on save; use [`Document`] to
/// edit an existing file.
pub trait WorkbookExt {
    /// Open a workbook from a file
    fn open<P: AsRef<Path>>(path: P) -> Result<Workbook>;

    /// Save the workbook to a new file
    fn save<P: AsRef<Path>>(&self, path: P) -> Result<()>;
}

impl WorkbookExt for Workbook {
    fn open<P: AsRef<Path>>(path: P) -> Result<Workbook> {
        let path = path.as_ref();
        check_extension(path)?;
        let package = Package::read_file(path)?;
        Ok(XlsxReader::read(&package, WorkbookSettings::default())?.workbook)
    }

    fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        check_extension(path)?;
        XlsxWriter::write_file(self, path)?;
        Ok(())
    }
}

fn check_extension(path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match extension.as_deref() {
        Some("xlsx") | Some("xlsm") => Ok(()),
        _ => Err(tally_sheets_core::Error::other(format!(
            "Unsupported file format: {}",
            path.display()
        ))
        .into()),
    }
}
