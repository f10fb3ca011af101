//! End-to-end tests for tally-sheets-xlsx.
//!
//! Each test builds the exact package it needs as a zip archive in a
//! temporary directory, then reads it back through [`Package`] and
//! [`XlsxReader`], or writes it with [`XlsxWriter`] and inspects the parts.
//!
//! [`Package`]: tally_sheets_xlsx::Package
//! [`XlsxReader`]: tally_sheets_xlsx::XlsxReader
//! [`XlsxWriter`]: tally_sheets_xlsx::XlsxWriter

mod common;
mod reading;
mod writing;

pub use common::*;
