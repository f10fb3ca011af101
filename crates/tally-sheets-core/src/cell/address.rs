//! Cell address type and A1-notation conversions

use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};
use std::fmt;
use std::str::FromStr;

/// A cell address (e.g., "A1", "$B$2")
///
/// Cell addresses use a combination of column letters (A-XFD) and row numbers (1-1048576).
/// Both coordinates are 1-based, exactly as they appear in A1 notation.
/// The optional `$` prefix makes a component absolute (it doesn't change when a
/// formula is copied or shifted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellAddress {
    /// Column number (1-based, A=1, B=2, ..., XFD=16384)
    pub col: u32,
    /// Row number (1-based)
    pub row: u32,
    /// Whether the column reference is absolute ($)
    pub col_absolute: bool,
    /// Whether the row reference is absolute ($)
    pub row_absolute: bool,
}

impl CellAddress {
    /// Create a new cell address with relative references
    pub fn new(col: u32, row: u32) -> Self {
        Self {
            col,
            row,
            col_absolute: false,
            row_absolute: false,
        }
    }

    /// Create a new cell address with specified absolute/relative flags
    pub fn with_absolute(col: u32, row: u32, col_absolute: bool, row_absolute: bool) -> Self {
        Self {
            col,
            row,
            col_absolute,
            row_absolute,
        }
    }

    /// Parse a cell address from A1-style notation
    ///
    /// # Examples
    /// ```
    /// use tally_sheets_core::CellAddress;
    ///
    /// let addr = CellAddress::parse("B6").unwrap();
    /// assert_eq!((addr.col, addr.row), (2, 6));
    ///
    /// let addr = CellAddress::parse("$C$2").unwrap();
    /// assert!(addr.col_absolute && addr.row_absolute);
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let bytes = s.as_bytes();
        if bytes.is_empty() {
            return Err(Error::invalid_reference(s));
        }

        let mut pos = 0;

        let col_absolute = bytes[pos] == b'$';
        if col_absolute {
            pos += 1;
        }

        let col_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
            pos += 1;
        }
        if pos == col_start {
            return Err(Error::invalid_reference(s));
        }
        let col_letters = &s[col_start..pos];

        let row_absolute = bytes.get(pos) == Some(&b'$');
        if row_absolute {
            pos += 1;
        }

        let row_digits = &s[pos..];
        if row_digits.is_empty() || !row_digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::invalid_reference(s));
        }

        let col = Self::letters_to_column(col_letters)?;
        let row: u64 = row_digits
            .parse()
            .map_err(|_| Error::invalid_reference(s))?;
        if row == 0 {
            return Err(Error::invalid_reference(s));
        }
        if row > MAX_ROWS as u64 {
            return Err(Error::RowOutOfRange(row.min(i64::MAX as u64) as i64, MAX_ROWS));
        }

        Ok(Self {
            col,
            row: row as u32,
            col_absolute,
            row_absolute,
        })
    }

    /// Convert a column number to letters (1 = A, 26 = Z, 27 = AA, etc.)
    ///
    /// Column 0 has no letter form and yields an empty string.
    pub fn column_to_letters(col: u32) -> String {
        let mut result = String::new();
        let mut n = col;

        while n > 0 {
            n -= 1;
            let c = ((n % 26) as u8 + b'A') as char;
            result.insert(0, c);
            n /= 26;
        }

        result
    }

    /// Convert column letters to a number (A = 1, Z = 26, AA = 27, etc.)
    ///
    /// Letters are case-insensitive.
    pub fn letters_to_column(letters: &str) -> Result<u32> {
        if letters.is_empty() {
            return Err(Error::invalid_reference(letters));
        }

        let mut col: u64 = 0;
        for c in letters.chars() {
            if !c.is_ascii_alphabetic() {
                return Err(Error::invalid_reference(letters));
            }
            col = col * 26 + (c.to_ascii_uppercase() as u64 - 'A' as u64 + 1);
            if col > MAX_COLS as u64 {
                return Err(Error::ColumnOutOfRange(col as i64, MAX_COLS));
            }
        }

        Ok(col as u32)
    }

    /// Format as A1-style string, keeping `$` markers
    pub fn to_a1_string(&self) -> String {
        let mut result = String::new();

        if self.col_absolute {
            result.push('$');
        }
        result.push_str(&Self::column_to_letters(self.col));

        if self.row_absolute {
            result.push('$');
        }
        result.push_str(&self.row.to_string());

        result
    }

    /// The same address with both `$` markers dropped
    pub fn to_relative(&self) -> Self {
        Self::new(self.col, self.row)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Parse a cell reference into its `(col, row)` coordinates
///
/// `$` markers are accepted and ignored.
pub fn cell_ref_to_coordinates(reference: &str) -> Result<(u32, u32)> {
    let addr = CellAddress::parse(reference)?;
    Ok((addr.col, addr.row))
}

/// Format `(col, row)` coordinates as a relative cell reference
///
/// Fails when either coordinate is outside the sheet's maximum dimensions.
pub fn coordinates_to_cell_ref(col: u32, row: u32) -> Result<String> {
    crate::SheetLimits::default().cell_ref(col as i64, row as i64)
}
