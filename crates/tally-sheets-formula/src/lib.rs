//! # tally-sheets-formula
//!
//! Formula reference handling for tally-sheets.
//!
//! This crate provides:
//! - Cell token and formula text shifting by a column/row offset
//! - Range shifting across inserted or deleted rows and columns
//! - Shared formula groups: resolution, index allocation and creation
//!
//! ## Example
//!
//! ```rust
//! use tally_sheets_formula::shift_formula_text;
//!
//! assert_eq!(shift_formula_text("=SUM($A$1:B1)", 1, 2), "=SUM($A$1:C3)");
//! ```

pub mod error;
pub mod shared;
pub mod shift;

pub use error::{FormulaError, FormulaResult};
pub use shared::{
    establish_shared_formula, find_anchor, next_shared_group_index, resolve_shared_formula,
    resolve_shared_formula_within,
};
pub use shift::{
    shift_cell_token, shift_cell_token_within, shift_formula_text, shift_formula_text_within,
    shift_line, shift_reference_range, Direction,
};
