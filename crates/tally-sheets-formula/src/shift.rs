//! Formula reference shifting
//!
//! Moves the relative cell references inside formula text by a column/row
//! offset, the way a spreadsheet does when a formula is filled into another
//! cell, and shifts stored range references across inserted or deleted lines.

use tally_sheets_core::{CellAddress, RangeRef, SheetLimits};

/// Axis of a structural edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Whole rows are inserted or deleted
    Rows,
    /// Whole columns are inserted or deleted
    Columns,
}

impl Direction {
    /// Coordinate of `(col, row)` along this axis
    pub fn coordinate(self, col: u32, row: u32) -> u32 {
        match self {
            Direction::Rows => row,
            Direction::Columns => col,
        }
    }

    /// Lowercase name used in log output
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Rows => "rows",
            Direction::Columns => "columns",
        }
    }
}

/// Shift one line coordinate across an edit at `pivot`
///
/// Insertion (`offset > 0`) moves every coordinate at or after the pivot.
/// Deletion removes the lines `pivot..pivot + |offset|`: later coordinates
/// move back, and a coordinate on a removed line lands on `pivot` when it is
/// the lower bound of a range (the next surviving line slides into place) or
/// on `pivot - 1` when it is the upper bound.
pub fn shift_line(value: u32, pivot: u32, offset: i64, is_upper_bound: bool) -> u32 {
    if offset >= 0 {
        if value >= pivot {
            return saturating_add(value, offset);
        }
        return value;
    }

    let removed = offset.unsigned_abs();
    let end = pivot as u64 + removed;
    if (value as u64) >= end {
        (value as u64 - removed) as u32
    } else if value >= pivot {
        if is_upper_bound {
            pivot - 1
        } else {
            pivot
        }
    } else {
        value
    }
}

fn saturating_add(value: u32, offset: i64) -> u32 {
    (value as i64 + offset).clamp(0, u32::MAX as i64) as u32
}

/// Shift a range across an edit at `pivot` along `direction`
///
/// Only the bounds on the edited axis change. The range is normalized
/// first. After a deletion the result may be empty along the axis
/// (upper bound below lower bound); callers decide what that means for the
/// structure the range belongs to.
///
/// # Examples
/// ```
/// use tally_sheets_core::RangeRef;
/// use tally_sheets_formula::{shift_reference_range, Direction};
///
/// let table = RangeRef::parse("A1:C5").unwrap();
/// let shifted = shift_reference_range(table, Direction::Rows, 5, -1);
/// assert_eq!(shifted.to_string(), "A1:C4");
///
/// let shifted = shift_reference_range(table, Direction::Columns, 2, 2);
/// assert_eq!(shifted.to_string(), "A1:E5");
/// ```
pub fn shift_reference_range(
    range: RangeRef,
    direction: Direction,
    pivot: u32,
    offset: i64,
) -> RangeRef {
    let mut r = range.normalized();
    match direction {
        Direction::Rows => {
            r.y1 = shift_line(r.y1, pivot, offset, false);
            r.y2 = shift_line(r.y2, pivot, offset, true);
        }
        Direction::Columns => {
            r.x1 = shift_line(r.x1, pivot, offset, false);
            r.x2 = shift_line(r.x2, pivot, offset, true);
        }
    }
    r
}

/// Shift a single cell token (`B1`, `$A2`, `C$3`, `$D$4`) by an offset
///
/// Components marked absolute with `$` stay put, and the markers are kept.
/// A token that is not a cell reference, or whose shifted position would
/// leave the sheet, comes back unchanged.
///
/// # Examples
/// ```
/// use tally_sheets_formula::shift_cell_token;
///
/// assert_eq!(shift_cell_token("B1", 2, 3), "D4");
/// assert_eq!(shift_cell_token("$B1", 2, 3), "$B4");
/// assert_eq!(shift_cell_token("A1", -1, 0), "A1");
/// ```
pub fn shift_cell_token(token: &str, col_offset: i64, row_offset: i64) -> String {
    shift_cell_token_within(token, col_offset, row_offset, &SheetLimits::default())
}

/// [`shift_cell_token`] against custom sheet limits
pub fn shift_cell_token_within(
    token: &str,
    col_offset: i64,
    row_offset: i64,
    limits: &SheetLimits,
) -> String {
    let Ok(addr) = CellAddress::parse(token) else {
        return token.to_string();
    };

    let col = if addr.col_absolute {
        addr.col as i64
    } else {
        addr.col as i64 + col_offset
    };
    let row = if addr.row_absolute {
        addr.row as i64
    } else {
        addr.row as i64 + row_offset
    };

    if limits.check_col(col).is_err() || limits.check_row(row).is_err() {
        return token.to_string();
    }

    CellAddress::with_absolute(col as u32, row as u32, addr.col_absolute, addr.row_absolute)
        .to_a1_string()
}

/// Shift every relative cell reference in a formula by `(col_offset, row_offset)`
///
/// String literals, quoted sheet names and structured-reference brackets are
/// copied through untouched. A name followed by `(` is a function call and is
/// never shifted, so `LOG10(A1)` only moves `A1`.
///
/// # Examples
/// ```
/// use tally_sheets_formula::shift_formula_text;
///
/// assert_eq!(shift_formula_text("=$A$1+B1", 2, 3), "=$A$1+D4");
/// assert_eq!(shift_formula_text("SUM(A1:A3)&\"A1\"", 0, 1), "SUM(A2:A4)&\"A1\"");
/// ```
pub fn shift_formula_text(text: &str, col_offset: i64, row_offset: i64) -> String {
    shift_formula_text_within(text, col_offset, row_offset, &SheetLimits::default())
}

/// [`shift_formula_text`] against custom sheet limits
///
/// A reference whose shifted position falls outside `limits` is left as it
/// was.
pub fn shift_formula_text_within(
    text: &str,
    col_offset: i64,
    row_offset: i64,
    limits: &SheetLimits,
) -> String {
    if col_offset == 0 && row_offset == 0 {
        return text.to_string();
    }
    ReferenceShifter::new(text, col_offset, row_offset, limits).run()
}

/// Single left-to-right pass over formula text
struct ReferenceShifter<'a> {
    input: &'a str,
    pos: usize,
    col_offset: i64,
    row_offset: i64,
    limits: &'a SheetLimits,
    output: String,
}

impl<'a> ReferenceShifter<'a> {
    fn new(input: &'a str, col_offset: i64, row_offset: i64, limits: &'a SheetLimits) -> Self {
        Self {
            input,
            pos: 0,
            col_offset,
            row_offset,
            limits,
            output: String::with_capacity(input.len()),
        }
    }

    fn run(mut self) -> String {
        while let Some(c) = self.peek_char() {
            match c {
                '"' => self.copy_delimited('"', '"'),
                '\'' => self.copy_delimited('\'', '\''),
                '[' => self.copy_delimited('[', ']'),
                c if is_token_char(c) => self.scan_token(),
                _ => {
                    self.output.push(c);
                    self.advance();
                }
            }
        }
        self.output
    }

    /// Copy a quoted or bracketed span verbatim, including its delimiters
    ///
    /// A doubled quote inside a literal reads as a close followed by a
    /// reopen, which copies the same characters. Brackets nest.
    fn copy_delimited(&mut self, open: char, close: char) {
        let start = self.pos;
        self.advance();
        let mut depth = 1usize;
        while let Some(c) = self.peek_char() {
            self.advance();
            if c == close && open != close {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            } else if c == open && open != close {
                depth += 1;
            } else if c == close {
                break;
            }
        }
        self.output.push_str(&self.input[start..self.pos]);
    }

    fn scan_token(&mut self) {
        let start = self.pos;
        while self.peek_char().map_or(false, is_token_char) {
            self.advance();
        }
        let token = &self.input[start..self.pos];

        // Function names and sheet prefixes are copied as they are
        let next = self.peek_char();
        if next != Some('(') && next != Some('!') && is_cell_reference(token) {
            let shifted =
                shift_cell_token_within(token, self.col_offset, self.row_offset, self.limits);
            self.output.push_str(&shifted);
        } else {
            self.output.push_str(token);
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '.'
}

/// `[$]LETTERS[$]DIGITS` with uppercase letters
fn is_cell_reference(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut i = 0;

    if bytes.get(i) == Some(&b'$') {
        i += 1;
    }

    let letter_start = i;
    while i < bytes.len() && bytes[i].is_ascii_uppercase() {
        i += 1;
    }
    if i == letter_start {
        return false;
    }

    if bytes.get(i) == Some(&b'$') {
        i += 1;
    }

    let digit_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    i > digit_start && i == bytes.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_shift_cell_token_markers() {
        assert_eq!(shift_cell_token("B1", 2, 3), "D4");
        assert_eq!(shift_cell_token("$B1", 2, 3), "$B4");
        assert_eq!(shift_cell_token("B$1", 2, 3), "D$1");
        assert_eq!(shift_cell_token("$B$1", 2, 3), "$B$1");
    }

    #[test]
    fn test_shift_cell_token_out_of_bounds_is_unchanged() {
        assert_eq!(shift_cell_token("A1", 0, -1), "A1");
        assert_eq!(shift_cell_token("XFD1", 1, 0), "XFD1");
        assert_eq!(shift_cell_token("A1048576", 0, 1), "A1048576");
        assert_eq!(shift_cell_token("NAME", 1, 1), "NAME");
    }

    #[test]
    fn test_shift_formula_text_absolute_and_relative() {
        assert_eq!(shift_formula_text("=$A$1+B1", 2, 3), "=$A$1+D4");
        assert_eq!(shift_formula_text("A1+B1", 0, 2), "A3+B3");
        assert_eq!(shift_formula_text("SUM(A1:B2)", 1, 0), "SUM(B1:C2)");
    }

    #[test]
    fn test_function_names_are_not_shifted() {
        assert_eq!(shift_formula_text("LOG10(A1)", 0, 1), "LOG10(A2)");
        assert_eq!(shift_formula_text("ATAN2(B1,C1)", 1, 0), "ATAN2(C1,D1)");
    }

    #[test]
    fn test_string_literals_pass_through() {
        assert_eq!(
            shift_formula_text("IF(A1=\"B2\",C3,\"say \"\"D4\"\"\")", 0, 1),
            "IF(A2=\"B2\",C4,\"say \"\"D4\"\"\")"
        );
    }

    #[test]
    fn test_character_after_token_is_kept() {
        // A token directly followed by a quote must not swallow it
        assert_eq!(shift_formula_text("A1&\"x\"&B1", 0, 1), "A2&\"x\"&B2");
    }

    #[test]
    fn test_sheet_prefixes() {
        assert_eq!(shift_formula_text("Sheet2!A1+1", 0, 1), "Sheet2!A2+1");
        assert_eq!(
            shift_formula_text("'Q1 A1'!B2*2", 1, 0),
            "'Q1 A1'!C2*2"
        );
    }

    #[test]
    fn test_non_references_pass_through() {
        assert_eq!(shift_formula_text("1E5+A1", 0, 1), "1E5+A2");
        assert_eq!(shift_formula_text("SUM(A:A)", 1, 1), "SUM(A:A)");
        assert_eq!(shift_formula_text("TRUE+my_name", 1, 1), "TRUE+my_name");
        assert_eq!(shift_formula_text("Table1[@Col1]+B1", 0, 1), "Table1[@Col1]+B2");
        assert_eq!(shift_formula_text("a1+B1", 0, 1), "a1+B2");
    }

    #[test]
    fn test_zero_offset_is_identity() {
        assert_eq!(shift_formula_text("=A1+\"", 0, 0), "=A1+\"");
    }

    #[test]
    fn test_shift_reference_range_insertion() {
        let range = RangeRef::parse("B2:D4").unwrap();
        assert_eq!(
            shift_reference_range(range, Direction::Rows, 2, 1).to_string(),
            "B3:D5"
        );
        assert_eq!(
            shift_reference_range(range, Direction::Rows, 3, 2).to_string(),
            "B2:D6"
        );
        assert_eq!(
            shift_reference_range(range, Direction::Rows, 5, 2).to_string(),
            "B2:D4"
        );
        assert_eq!(
            shift_reference_range(range, Direction::Columns, 1, 1).to_string(),
            "C2:E4"
        );
    }

    #[test]
    fn test_shift_reference_range_deletion() {
        let range = RangeRef::parse("B2:D4").unwrap();
        assert_eq!(
            shift_reference_range(range, Direction::Rows, 1, -1).to_string(),
            "B1:D3"
        );
        // Deleting the first line keeps the lower bound in place
        assert_eq!(
            shift_reference_range(range, Direction::Rows, 2, -1).to_string(),
            "B2:D3"
        );
        assert_eq!(
            shift_reference_range(range, Direction::Columns, 4, -1).to_string(),
            "B2:C4"
        );
        assert_eq!(
            shift_reference_range(range, Direction::Rows, 3, -5).to_string(),
            "B2:D2"
        );
    }

    #[test]
    fn test_shift_reference_range_normalizes() {
        let range = RangeRef::new(4, 4, 2, 2);
        assert_eq!(
            shift_reference_range(range, Direction::Rows, 1, 1).to_string(),
            "B3:D5"
        );
    }

    #[test]
    fn test_custom_limits() {
        let small = SheetLimits {
            max_rows: 10,
            max_cols: 4,
        };
        assert_eq!(shift_cell_token_within("A10", 0, 1, &small), "A10");
        assert_eq!(shift_cell_token_within("D1", 1, 0, &small), "D1");
        assert_eq!(shift_formula_text_within("A9+C3", 1, 1, &small), "B10+D4");
        assert_eq!(shift_formula_text_within("B9+A1", 0, 2, &small), "B9+A3");
    }

    #[test]
    fn test_shift_line() {
        assert_eq!(shift_line(5, 3, 2, false), 7);
        assert_eq!(shift_line(2, 3, 2, false), 2);
        assert_eq!(shift_line(3, 3, -1, false), 3);
        assert_eq!(shift_line(3, 3, -1, true), 2);
        assert_eq!(shift_line(9, 3, -4, true), 5);
    }

    use proptest::prelude::*;

    fn relative_cell() -> impl Strategy<Value = (u32, u32)> {
        (1u32..=200, 1u32..=5000)
    }

    proptest! {
        #[test]
        fn shifting_back_restores_text(
            a in relative_cell(),
            b in relative_cell(),
            dc in -100i64..=100,
            dr in -1000i64..=1000,
        ) {
            // Only references that stay on the sheet both ways
            prop_assume!(a.0 as i64 + dc >= 1 && b.0 as i64 + dc >= 1);
            prop_assume!(a.1 as i64 + dr >= 1 && b.1 as i64 + dr >= 1);

            let text = format!(
                "SUM({}:{})*$A$1+\"{}\"",
                CellAddress::new(a.0, a.1),
                CellAddress::new(b.0, b.1),
                CellAddress::new(a.0, a.1)
            );
            let there = shift_formula_text(&text, dc, dr);
            prop_assert_eq!(shift_formula_text(&there, -dc, -dr), text);
        }
    }
}
