//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellAddress`] - A cell's location (e.g., "B6", "$A$1")
//! - [`CellValue`] - The raw value slot of a cell
//! - [`Formula`] - A formula attached to a cell
//! - [`Cell`] - Complete cell data including style, value and formula

mod address;
mod formula;
mod storage;
mod value;

pub use address::{cell_ref_to_coordinates, coordinates_to_cell_ref, CellAddress};
pub use formula::{Formula, FormulaKind};
pub use storage::Cell;
pub use value::{CellType, CellValue, SharedStringTable};
