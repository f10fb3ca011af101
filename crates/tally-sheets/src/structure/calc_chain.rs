//! Calculation chain entries

use tally_sheets_core::{CalcChain, CellAddress};
use tally_sheets_formula::Direction;

use super::LineEdit;

/// Drop the chain entries of deleted cells and renumber the rest
///
/// Only entries of `sheet_id` are touched. Entries whose reference does not
/// parse are kept as they are.
pub(super) fn adjust(chain: &mut CalcChain, sheet_id: u32, edit: &LineEdit) {
    chain.entries_mut().retain_mut(|entry| {
        if entry.sheet_id != sheet_id {
            return true;
        }
        let Ok(address) = CellAddress::parse(&entry.reference) else {
            return true;
        };

        let line = edit.coordinate(address.col, address.row);
        if edit.deletes(line) {
            return false;
        }
        if line < edit.pivot {
            return true;
        }

        let moved = line as i64 + edit.offset;
        if moved > 0 {
            let (col, row) = match edit.direction {
                Direction::Rows => (address.col, moved as u32),
                Direction::Columns => (moved as u32, address.row),
            };
            entry.reference = CellAddress::new(col, row).to_string();
        }
        true
    });
}
