//! Cell data

use super::{CellValue, Formula};

/// Complete data for a single cell
///
/// A cell does not store its own reference: cells live in sorted maps keyed by
/// row and column number, so the reference always follows from the position.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cell {
    /// Index into the workbook style sheet (0 = default style)
    pub style_index: u32,
    /// The cell's raw value
    pub value: CellValue,
    /// Formula attached to the cell, if any
    pub formula: Option<Formula>,
}

impl Cell {
    /// Create a new cell with a value and default style
    pub fn new(value: CellValue) -> Self {
        Self {
            style_index: 0,
            value,
            formula: None,
        }
    }

    /// Create a cell holding a formula
    pub fn with_formula(formula: Formula) -> Self {
        Self {
            style_index: 0,
            value: CellValue::default(),
            formula: Some(formula),
        }
    }

    /// Check if this cell is effectively empty (no value, no formula, default style)
    pub fn is_empty(&self) -> bool {
        self.value.is_empty() && self.formula.is_none() && self.style_index == 0
    }
}
