//! Sheet autofilter

use log::debug;

use tally_sheets_core::{AutoFilter, RangeRef, Worksheet};
use tally_sheets_formula::Direction;

use super::{parse_stored_range, LineEdit};

/// Shift the autofilter range, or clear it when its header line goes away
///
/// A range pushed past the last line (`limit`) is cut back to it, or cleared
/// when it leaves the sheet. Rows hidden by a filter cleared through a
/// deletion are shown again.
pub(super) fn adjust(worksheet: &mut Worksheet, edit: &LineEdit, limit: u32) {
    let Some(filter) = worksheet.auto_filter() else {
        return;
    };
    let Some(range) = parse_stored_range("autofilter", &filter.reference) else {
        return;
    };

    let header_deleted = match edit.direction {
        Direction::Rows => edit.deletes(range.y1),
        Direction::Columns => range.x1 == range.x2 && edit.deletes(range.x1),
    };

    if !header_deleted {
        match edit.shift_range_within(range, limit) {
            Some(shifted) => {
                if let Some(filter) = worksheet.auto_filter_mut() {
                    follow_range(filter, range, shifted, edit);
                }
            }
            None => {
                debug!("autofilter {} moved off the sheet", range);
                worksheet.clear_auto_filter();
            }
        }
        return;
    }

    debug!("clearing autofilter {}", range);
    worksheet.clear_auto_filter();

    // Data rows of the old filter, numbered after the edit
    let (first, last) = match edit.direction {
        Direction::Rows => (range.y1, range.y2.saturating_sub(1)),
        Direction::Columns => (range.y1 + 1, range.y2),
    };
    for row in first..=last {
        if worksheet.is_row_hidden(row) {
            worksheet.set_row_hidden(row, false);
        }
    }
}

/// Move `filter` from `range` to `shifted`
///
/// Column criteria follow their columns; criteria of a deleted column, or of
/// a column cut off at the edge of the sheet, are dropped.
pub(super) fn follow_range(
    filter: &mut AutoFilter,
    range: RangeRef,
    shifted: RangeRef,
    edit: &LineEdit,
) {
    filter.reference = shifted.to_a1_string();
    if matches!(edit.direction, Direction::Rows) {
        return;
    }

    let width = shifted.x2 - shifted.x1 + 1;
    filter.columns.retain_mut(|column| {
        let col = range.x1 + column.col_id;
        if edit.deletes(col) {
            return false;
        }
        let moved = edit.shift(col, false);
        if moved < shifted.x1 {
            return false;
        }
        column.col_id = moved - shifted.x1;
        column.col_id < width
    });
}
