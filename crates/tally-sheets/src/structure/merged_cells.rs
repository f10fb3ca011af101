//! Merged cell ranges

use log::debug;

use tally_sheets_core::Worksheet;
use tally_sheets_formula::Direction;

use super::{parse_stored_range, LineEdit};

/// Grow, shrink or drop merges crossed by the edit
///
/// A merge reduced to a single cell is no longer a merge and is removed, as
/// is one pushed entirely past `limit`.
pub(super) fn adjust(worksheet: &mut Worksheet, edit: &LineEdit, limit: u32) {
    worksheet.merged_cells_mut().retain_mut(|reference| {
        let Some(mut range) = parse_stored_range("merged range", reference) else {
            return true;
        };

        let (start, end) = match edit.direction {
            Direction::Rows => (&mut range.y1, &mut range.y2),
            Direction::Columns => (&mut range.x1, &mut range.x2),
        };
        if !shift_span(start, end, edit, limit) || range.is_single_cell() {
            debug!("removing merged range {}", reference);
            return false;
        }

        *reference = range.to_a1_string();
        true
    });
}

/// Move the span `start..=end` along the edit; false when it vanishes
fn shift_span(start: &mut u32, end: &mut u32, edit: &LineEdit, limit: u32) -> bool {
    let pivot = edit.pivot;

    if edit.is_deletion() {
        if *start == pivot && *end == pivot {
            return false;
        }
        if pivot < *start {
            *start -= 1;
            *end -= 1;
        } else if pivot <= *end {
            *end -= 1;
        }
        return true;
    }

    let grow = |value: u32| (value as i64 + edit.offset).min(limit as i64) as u32;
    if pivot <= *start {
        if *start as i64 + edit.offset > limit as i64 {
            return false;
        }
        *start = grow(*start);
        *end = grow(*end);
    } else if pivot <= *end {
        *end = grow(*end);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn merges(ws: &Worksheet) -> Vec<&str> {
        ws.merged_cells().iter().map(String::as_str).collect()
    }

    fn rows(pivot: u32, offset: i64) -> LineEdit {
        LineEdit {
            direction: Direction::Rows,
            pivot,
            offset,
        }
    }

    #[test]
    fn test_insert_rows() {
        let mut ws = Worksheet::new("S");
        ws.merge_cells("A1:B2").unwrap();
        ws.merge_cells("D2:E4").unwrap();
        ws.merge_cells("G5:H5").unwrap();

        adjust(&mut ws, &rows(3, 2), 1_048_576);

        assert_eq!(merges(&ws), vec!["A1:B2", "D2:E6", "G7:H7"]);
    }

    #[test]
    fn test_delete_collapses_to_single_cell() {
        let mut ws = Worksheet::new("S");
        ws.merge_cells("B2:B3").unwrap();
        ws.merge_cells("C2:D3").unwrap();

        adjust(&mut ws, &rows(3, -1), 1_048_576);

        assert_eq!(merges(&ws), vec!["C2:D2"]);
    }

    #[test]
    fn test_delete_only_line_of_merge() {
        let mut ws = Worksheet::new("S");
        ws.merge_cells("A4:C4").unwrap();
        ws.merge_cells("A6:C7").unwrap();

        adjust(&mut ws, &rows(4, -1), 1_048_576);

        assert_eq!(merges(&ws), vec!["A5:C6"]);
    }

    #[test]
    fn test_insert_columns_clamps_to_limit() {
        let mut ws = Worksheet::new("S");
        ws.merge_cells("B1:D1").unwrap();
        ws.merge_cells("H1:I1").unwrap();

        let edit = LineEdit {
            direction: Direction::Columns,
            pivot: 3,
            offset: 4,
        };
        adjust(&mut ws, &edit, 10);

        assert_eq!(merges(&ws), vec!["B1:H1"]);
    }
}
