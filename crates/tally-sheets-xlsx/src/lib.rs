//! # tally-sheets-xlsx
//!
//! OOXML package layer for tally-sheets.
//!
//! - [`Package`] holds every part of an `.xlsx` archive by name and keeps
//!   relationships and content types consistent when parts come and go.
//! - [`XlsxReader`] and [`XlsxWriter`] translate between worksheet parts,
//!   the shared string table, the calculation chain and the
//!   [`tally_sheets_core`] model.
//! - [`read_table`] and [`write_table`] handle table definition parts, which
//!   are loaded on demand through the [`PartStore`] trait.

pub mod calc_chain;
pub mod content_types;
pub mod error;
pub mod package;
pub mod reader;
pub mod relationships;
pub mod table;
pub mod writer;

mod filter;
mod xml;

pub use calc_chain::{read_calc_chain, write_calc_chain, CALC_CHAIN_PART};
pub use content_types::{ContentTypes, CONTENT_TYPES_PART, CT_TABLE};
pub use error::{XlsxError, XlsxResult};
pub use package::{Package, PartStore};
pub use reader::{LoadedWorkbook, SheetEntry, XlsxReader, WORKBOOK_PART};
pub use relationships::{
    rels_part_name, resolve_target, Relationship, Relationships, REL_TYPE_HYPERLINK,
    REL_TYPE_TABLE,
};
pub use table::{read_table, write_table};
pub use writer::{XlsxWriter, SHARED_STRINGS_PART};
