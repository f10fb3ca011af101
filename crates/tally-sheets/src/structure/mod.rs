//! Row and column insertion and deletion
//!
//! [`edit_structure`] inserts or deletes whole lines of a worksheet and keeps
//! every structure that refers to sheet coordinates in step: cells and their
//! formula extents, row records, column style ranges, hyperlinks, tables, the
//! autofilter, merged cells and the calculation chain.
//!
//! A deletion of several lines runs as that many single-line deletions at the
//! same pivot, so each adjuster only has to know what happens to a structure
//! when one line disappears.

mod auto_filter;
mod calc_chain;
mod dimensions;
mod hyperlinks;
mod merged_cells;
mod tables;

use log::{debug, warn};

use tally_sheets_core::{Error as CoreError, RangeRef, SheetLimits, WorkbookSheetMut, Worksheet};
use tally_sheets_formula::{shift_line, shift_reference_range, Direction};
use tally_sheets_xlsx::PartStore;

use crate::error::Result;

pub(crate) use tables::materialize_header;

/// One step of a structural edit: `offset` lines at `pivot` along `direction`
///
/// Deletions handed to the adjusters always remove a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineEdit {
    /// Edited axis
    pub direction: Direction,
    /// First line affected (1-based)
    pub pivot: u32,
    /// Lines inserted (positive) or removed (negative)
    pub offset: i64,
}

impl LineEdit {
    /// Check if this edit removes lines
    pub fn is_deletion(&self) -> bool {
        self.offset < 0
    }

    /// Check if `line` is removed by this edit
    pub fn deletes(&self, line: u32) -> bool {
        self.is_deletion() && line >= self.pivot && (line as i64) < self.pivot as i64 - self.offset
    }

    /// Coordinate of `(col, row)` on the edited axis
    pub fn coordinate(&self, col: u32, row: u32) -> u32 {
        self.direction.coordinate(col, row)
    }

    /// New position of a line coordinate
    pub fn shift(&self, line: u32, is_upper_bound: bool) -> u32 {
        shift_line(line, self.pivot, self.offset, is_upper_bound)
    }

    /// Range shifted along the edited axis
    pub fn shift_range(&self, range: RangeRef) -> RangeRef {
        shift_reference_range(range, self.direction, self.pivot, self.offset)
    }

    /// Range shifted along the edited axis and cut back at `limit`
    ///
    /// Returns `None` when an insertion pushes the whole range past the last
    /// line.
    pub fn shift_range_within(&self, range: RangeRef, limit: u32) -> Option<RangeRef> {
        let mut shifted = self.shift_range(range);
        let (near, far) = match self.direction {
            Direction::Rows => (shifted.y1, &mut shifted.y2),
            Direction::Columns => (shifted.x1, &mut shifted.x2),
        };
        if near > limit {
            return None;
        }
        *far = (*far).min(limit);
        Some(shifted)
    }

    fn limit(&self, limits: &SheetLimits) -> u32 {
        match self.direction {
            Direction::Rows => limits.max_rows,
            Direction::Columns => limits.max_cols,
        }
    }
}

/// Insert (`offset > 0`) or delete (`offset < 0`) whole lines of a sheet
///
/// `sheet_part` is the package part of the worksheet; its relationships are
/// used to reach table parts and are released when a table or an external
/// hyperlink goes away. `pivot` is the 1-based row or column the edit starts
/// at, and a zero `offset` does nothing.
///
/// Bounds are checked before anything changes: an insertion that would move
/// a cell or row past the sheet limits fails with
/// [`RowLimitExceeded`](CoreError::RowLimitExceeded) or
/// [`ColumnLimitExceeded`](CoreError::ColumnLimitExceeded). Ranges that run
/// into the last line are cut back to it, and a range pushed off the sheet
/// entirely goes away with its structure.
///
/// Once the cells have moved the edit always completes. A structure whose
/// stored data cannot be read, or whose package parts are damaged, is
/// logged and left as it was while the others are still adjusted.
///
/// # Examples
/// ```
/// use tally_sheets::structure::edit_structure;
/// use tally_sheets::{Direction, Package, Workbook};
///
/// let mut workbook = Workbook::new();
/// let mut package = Package::new();
/// {
///     let sheet = workbook.worksheet_mut(0).unwrap();
///     sheet.set_cell_number("A3", 1.0).unwrap();
///     sheet.merge_cells("B2:C4").unwrap();
/// }
///
/// let mut edit = workbook.sheet_edit_mut(0).unwrap();
/// edit_structure(&mut edit, &mut package, "xl/worksheets/sheet1.xml", Direction::Rows, 2, 2)
///     .unwrap();
///
/// let sheet = workbook.worksheet(0).unwrap();
/// assert!(sheet.cell("A5").unwrap().is_some());
/// assert_eq!(sheet.merged_cells(), &["B4:C6".to_string()]);
/// ```
pub fn edit_structure<S: PartStore + ?Sized>(
    sheet: &mut WorkbookSheetMut<'_>,
    parts: &mut S,
    sheet_part: &str,
    direction: Direction,
    pivot: u32,
    offset: i64,
) -> Result<()> {
    if pivot == 0 {
        return Err(CoreError::InvalidPivot(pivot).into());
    }
    if offset == 0 {
        return Ok(());
    }

    let limits = sheet.limits;
    match direction {
        Direction::Rows => limits.check_row(pivot as i64)?,
        Direction::Columns => limits.check_col(pivot as i64)?,
    };
    check_bounds(sheet.worksheet, &limits, direction, pivot, offset)?;

    debug!(
        "{} {} {} at {} on sheet {}",
        if offset > 0 { "inserting" } else { "deleting" },
        offset.unsigned_abs(),
        direction.as_str(),
        pivot,
        sheet.worksheet.name()
    );

    if offset > 0 {
        let edit = LineEdit {
            direction,
            pivot,
            offset,
        };
        apply(sheet, parts, sheet_part, &edit);
        return Ok(());
    }

    let edit = LineEdit {
        direction,
        pivot,
        offset: -1,
    };
    // Nothing lives past the last line, so repeating beyond it is a no-op
    let remaining = (edit.limit(&limits) - pivot) as u64 + 1;
    for _ in 0..offset.unsigned_abs().min(remaining) {
        apply(sheet, parts, sheet_part, &edit);
    }
    Ok(())
}

/// Reject edits that would move content past the sheet limits
fn check_bounds(
    worksheet: &Worksheet,
    limits: &SheetLimits,
    direction: Direction,
    pivot: u32,
    offset: i64,
) -> Result<()> {
    match direction {
        Direction::Rows => {
            if let Some(last) = worksheet.last_row().filter(|&last| last >= pivot) {
                let moved = last as i64 + offset;
                if moved > limits.max_rows as i64 {
                    return Err(CoreError::RowLimitExceeded(moved, limits.max_rows).into());
                }
            }
        }
        Direction::Columns => {
            let last = worksheet
                .iter_cells()
                .map(|(col, _, _)| col)
                .filter(|&col| col >= pivot)
                .max();
            if let Some(last) = last {
                let moved = last as i64 + offset;
                if moved > limits.max_cols as i64 {
                    return Err(CoreError::ColumnLimitExceeded(moved, limits.max_cols).into());
                }
            }
        }
    }
    Ok(())
}

/// Run every adjuster for one insertion or one single-line deletion
fn apply<S: PartStore + ?Sized>(
    sheet: &mut WorkbookSheetMut<'_>,
    parts: &mut S,
    sheet_part: &str,
    edit: &LineEdit,
) {
    let limits = sheet.limits;
    let limit = edit.limit(&limits);

    dimensions::adjust_cells(sheet.worksheet, edit, &limits);
    if edit.direction == Direction::Columns {
        dimensions::adjust_column_styles(sheet.worksheet, edit, limits.max_cols);
    }
    hyperlinks::adjust(sheet.worksheet, parts, sheet_part, edit, limit);
    tables::adjust(sheet, parts, sheet_part, edit, limit);
    auto_filter::adjust(sheet.worksheet, edit, limit);
    merged_cells::adjust(sheet.worksheet, edit, limit);
    calc_chain::adjust(sheet.calc_chain, sheet.worksheet.sheet_id(), edit);
}

/// Parse a stored range, logging and skipping it when it is malformed
fn parse_stored_range(kind: &str, reference: &str) -> Option<RangeRef> {
    match RangeRef::parse(reference) {
        Ok(range) => Some(range.normalized()),
        Err(e) => {
            warn!("leaving {} {:?} unchanged: {}", kind, reference, e);
            None
        }
    }
}
