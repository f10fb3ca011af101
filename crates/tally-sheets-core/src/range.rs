//! Range references (e.g. "A1:C5")

use crate::cell::CellAddress;
use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A rectangular range as 1-based `(x1, y1, x2, y2)` column/row bounds
///
/// Parsing keeps the corners in the order they were written; call
/// [`RangeRef::normalized`] to get `x1 <= x2` and `y1 <= y2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RangeRef {
    /// First column
    pub x1: u32,
    /// First row
    pub y1: u32,
    /// Second column
    pub x2: u32,
    /// Second row
    pub y2: u32,
}

impl RangeRef {
    /// Create a range from its four bounds, as given
    pub fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// A degenerate range covering a single cell
    pub fn single(col: u32, row: u32) -> Self {
        Self::new(col, row, col, row)
    }

    /// Parse "A1:B2" or "A1" notation
    ///
    /// A single cell expands to a degenerate range. `$` markers are ignored.
    ///
    /// # Examples
    /// ```
    /// use tally_sheets_core::RangeRef;
    ///
    /// let range = RangeRef::parse("C5:A1").unwrap();
    /// assert_eq!(range, RangeRef::new(3, 5, 1, 1));
    /// assert_eq!(range.normalized().to_string(), "A1:C5");
    ///
    /// assert_eq!(RangeRef::parse("B2").unwrap(), RangeRef::single(2, 2));
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = s.split(':');
        let first = parts.next().unwrap_or_default();
        let second = parts.next();
        if parts.next().is_some() {
            return Err(Error::invalid_reference(s));
        }

        let start = CellAddress::parse(first).map_err(|_| Error::invalid_reference(s))?;
        let end = match second {
            Some(part) => CellAddress::parse(part).map_err(|_| Error::invalid_reference(s))?,
            None => start,
        };

        Ok(Self::new(start.col, start.row, end.col, end.row))
    }

    /// Swap bounds so that `x1 <= x2` and `y1 <= y2`
    pub fn normalized(self) -> Self {
        Self {
            x1: self.x1.min(self.x2),
            y1: self.y1.min(self.y2),
            x2: self.x1.max(self.x2),
            y2: self.y1.max(self.y2),
        }
    }

    /// Number of columns covered (normalized)
    pub fn width(&self) -> u32 {
        self.x1.abs_diff(self.x2) + 1
    }

    /// Number of rows covered (normalized)
    pub fn height(&self) -> u32 {
        self.y1.abs_diff(self.y2) + 1
    }

    /// Total number of cells in the range
    pub fn cell_count(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Check if the range covers exactly one cell
    pub fn is_single_cell(&self) -> bool {
        self.x1 == self.x2 && self.y1 == self.y2
    }

    /// Check if `(col, row)` lies within the range
    pub fn contains(&self, col: u32, row: u32) -> bool {
        let r = self.normalized();
        col >= r.x1 && col <= r.x2 && row >= r.y1 && row <= r.y2
    }

    /// The four corners as `(col, row)` pairs
    pub fn corners(&self) -> [(u32, u32); 4] {
        [
            (self.x1, self.y1),
            (self.x2, self.y1),
            (self.x1, self.y2),
            (self.x2, self.y2),
        ]
    }

    /// Check if this range overlaps another
    ///
    /// Two ranges overlap when a corner of either one lies inside the other.
    pub fn overlaps(&self, other: &RangeRef) -> bool {
        let (a, b) = (self.normalized(), other.normalized());
        a.corners().iter().any(|&(c, r)| b.contains(c, r))
            || b.corners().iter().any(|&(c, r)| a.contains(c, r))
            || crosses(&a, &b)
            || crosses(&b, &a)
    }

    /// Iterate over all cells of the normalized range, row by row
    pub fn cells(&self) -> RangeCells {
        let range = self.normalized();
        RangeCells {
            range,
            current_col: range.x1,
            current_row: range.y1,
        }
    }

    /// Top-left cell of the normalized range
    pub fn top_left(&self) -> CellAddress {
        let r = self.normalized();
        CellAddress::new(r.x1, r.y1)
    }

    /// Format as "A1:B2", or "A1" for a single cell
    pub fn to_a1_string(&self) -> String {
        let start = CellAddress::new(self.x1, self.y1);
        if self.is_single_cell() {
            start.to_a1_string()
        } else {
            let end = CellAddress::new(self.x2, self.y2);
            format!("{}:{}", start, end)
        }
    }
}

/// A "plus sign" overlap where neither range has a corner inside the other
fn crosses(a: &RangeRef, b: &RangeRef) -> bool {
    a.x1 < b.x1 && a.x2 > b.x2 && b.y1 < a.y1 && b.y2 > a.y2
}

impl fmt::Display for RangeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for RangeRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Parse a range reference into raw `(x1, y1, x2, y2)` coordinates
pub fn range_ref_to_coordinates(reference: &str) -> Result<RangeRef> {
    RangeRef::parse(reference)
}

/// Iterator over the cells of a range
pub struct RangeCells {
    range: RangeRef,
    current_col: u32,
    current_row: u32,
}

impl Iterator for RangeCells {
    type Item = CellAddress;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_row > self.range.y2 {
            return None;
        }

        let addr = CellAddress::new(self.current_col, self.current_row);

        self.current_col += 1;
        if self.current_col > self.range.x2 {
            self.current_col = self.range.x1;
            self.current_row += 1;
        }

        Some(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_range_parse() {
        assert_eq!(RangeRef::parse("A1:B2").unwrap(), RangeRef::new(1, 1, 2, 2));
        assert_eq!(RangeRef::parse("$A$1:$C$5").unwrap(), RangeRef::new(1, 1, 3, 5));
        assert_eq!(RangeRef::parse("C3").unwrap(), RangeRef::single(3, 3));

        for bad in ["", ":", "A1:", "A1:B2:C3", "A1-B2", "1:2"] {
            assert!(
                matches!(RangeRef::parse(bad), Err(Error::InvalidReference(_))),
                "expected InvalidReference for {bad:?}"
            );
        }
    }

    #[test]
    fn test_range_normalize() {
        let range = RangeRef::parse("D4:B2").unwrap();
        assert_eq!(range.normalized(), RangeRef::new(2, 2, 4, 4));

        let range = RangeRef::parse("B4:D2").unwrap();
        assert_eq!(range.normalized(), RangeRef::new(2, 2, 4, 4));
        assert_eq!((range.width(), range.height()), (3, 3));
    }

    #[test]
    fn test_range_contains() {
        let range = RangeRef::parse("B2:D4").unwrap();

        assert!(range.contains(2, 2));
        assert!(range.contains(4, 4));
        assert!(range.contains(3, 3));
        assert!(!range.contains(1, 1));
        assert!(!range.contains(2, 5));
    }

    #[test]
    fn test_range_overlaps() {
        let a = RangeRef::parse("A1:C3").unwrap();

        assert!(a.overlaps(&RangeRef::parse("C3:E5").unwrap()));
        assert!(a.overlaps(&RangeRef::parse("B2").unwrap()));
        assert!(RangeRef::parse("B2").unwrap().overlaps(&a));
        assert!(!a.overlaps(&RangeRef::parse("D1:E3").unwrap()));
        assert!(!a.overlaps(&RangeRef::parse("A4:C4").unwrap()));

        // Crossing bars share cells without sharing corners
        let wide = RangeRef::parse("A2:E2").unwrap();
        let tall = RangeRef::parse("C1:C3").unwrap();
        assert!(wide.overlaps(&tall));
        assert!(tall.overlaps(&wide));
    }

    #[test]
    fn test_range_cells() {
        let cells: Vec<String> = RangeRef::parse("B2:A1")
            .unwrap()
            .cells()
            .map(|c| c.to_string())
            .collect();
        assert_eq!(cells, vec!["A1", "B1", "A2", "B2"]);
    }

    #[test]
    fn test_range_display() {
        assert_eq!(RangeRef::new(1, 1, 3, 5).to_string(), "A1:C5");
        assert_eq!(RangeRef::single(2, 6).to_string(), "B6");
    }

    proptest! {
        #[test]
        fn reserialized_range_is_normalized(
            x1 in 1u32..500, y1 in 1u32..5000, x2 in 1u32..500, y2 in 1u32..5000
        ) {
            let raw = RangeRef::new(x1, y1, x2, y2);
            let text = raw.normalized().to_string();
            let reparsed = RangeRef::parse(&text).unwrap();
            prop_assert_eq!(reparsed, raw.normalized());
        }
    }
}
