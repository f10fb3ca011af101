//! Row records

use std::collections::BTreeMap;

use crate::cell::Cell;

/// A row dimension record together with the cells it holds
///
/// The row number itself is the key under which the worksheet stores the
/// record, and cells are keyed by column number.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Row {
    /// Custom height in points (None = default)
    pub height: Option<f64>,
    /// Row is hidden
    pub hidden: bool,
    /// Outline/grouping level (0-7)
    pub outline_level: u8,
    /// Row-level style index (None = no row style)
    pub style_index: Option<u32>,
    /// Cells keyed by column number
    pub cells: BTreeMap<u32, Cell>,
}

impl Row {
    /// Create a new row with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if this row has any custom settings
    pub fn has_custom_settings(&self) -> bool {
        self.height.is_some() || self.hidden || self.outline_level > 0 || self.style_index.is_some()
    }

    /// Check if the record carries neither settings nor cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty() && !self.has_custom_settings()
    }

    /// Get a cell by column number
    pub fn cell(&self, col: u32) -> Option<&Cell> {
        self.cells.get(&col)
    }

    /// Get a mutable cell by column number
    pub fn cell_mut(&mut self, col: u32) -> Option<&mut Cell> {
        self.cells.get_mut(&col)
    }

    /// Highest column number holding a cell
    pub fn last_col(&self) -> Option<u32> {
        self.cells.keys().next_back().copied()
    }
}
