//! Cells, row records and column style ranges

use std::collections::BTreeMap;

use log::debug;

use tally_sheets_core::{Cell, Formula, FormulaKind, RangeRef, SheetLimits, Worksheet};
use tally_sheets_formula::{shift_formula_text_within, Direction};

use super::LineEdit;

/// Move cells and row records across the edit and shift formula extents
///
/// Cells on a deleted line are dropped. Row records travel with their
/// cells when rows move; a row record left empty by a column deletion is
/// dropped. A shared formula anchor on a deleted line hands its group to
/// the first surviving member.
pub(super) fn adjust_cells(worksheet: &mut Worksheet, edit: &LineEdit, limits: &SheetLimits) {
    if edit.is_deletion() {
        promote_shared_anchors(worksheet, edit, limits);
    }

    match edit.direction {
        Direction::Rows => rekey(worksheet.rows_mut(), edit),
        Direction::Columns => {
            let rows = worksheet.rows_mut();
            let mut emptied = Vec::new();
            for (&row_num, row) in rows.iter_mut() {
                let had_cells = !row.cells.is_empty();
                rekey(&mut row.cells, edit);
                if had_cells && row.is_empty() {
                    emptied.push(row_num);
                }
            }
            for row_num in emptied {
                rows.remove(&row_num);
            }
        }
    }

    let limit = match edit.direction {
        Direction::Rows => limits.max_rows,
        Direction::Columns => limits.max_cols,
    };
    for row in worksheet.rows_mut().values_mut() {
        for cell in row.cells.values_mut() {
            shift_formula_extent(cell, edit, limit);
        }
    }
}

/// Move the anchor of each shared group whose anchor sits on the deleted
/// line to the group's first surviving member, in row-major order
///
/// The new anchor gets the formula text as seen from its own cell and the
/// old extent, which the extent shift then trims.
fn promote_shared_anchors(worksheet: &mut Worksheet, edit: &LineEdit, limits: &SheetLimits) {
    let on_deleted = |col: u32, row: u32| edit.deletes(edit.coordinate(col, row));

    let orphaned: Vec<(u32, u32, u32, Formula)> = worksheet
        .formula_cells()
        .filter(|&(col, row, _)| on_deleted(col, row))
        .filter_map(|(col, row, formula)| {
            let index = formula.shared_index()?;
            formula
                .is_shared_anchor_of(index)
                .then(|| (col, row, index, formula.clone()))
        })
        .collect();

    for (col, row, index, anchor) in orphaned {
        let heir = worksheet
            .formula_cells()
            .find(|&(c, r, f)| f.shared_index() == Some(index) && !on_deleted(c, r))
            .map(|(c, r, _)| (c, r));
        let Some((heir_col, heir_row)) = heir else {
            continue;
        };

        let text = shift_formula_text_within(
            &anchor.text,
            heir_col as i64 - col as i64,
            heir_row as i64 - row as i64,
            limits,
        );
        debug!(
            "shared group {} moves its anchor from column {} row {} to column {} row {}",
            index, col, row, heir_col, heir_row
        );
        worksheet.cell_entry(heir_col, heir_row).formula = Some(Formula::shared_anchor(
            index,
            text,
            anchor.reference.unwrap_or_default(),
        ));
    }
}

/// Re-key the entries of `map` at or after the pivot
fn rekey<V>(map: &mut BTreeMap<u32, V>, edit: &LineEdit) {
    let mut tail = map.split_off(&edit.pivot);
    if edit.is_deletion() {
        tail.retain(|&line, _| !edit.deletes(line));
    }
    map.extend(
        tail.into_iter()
            .map(|(line, value)| (edit.shift(line, false), value)),
    );
}

/// Shift a formula's `ref`, and the text of an array formula that is a
/// plain range
fn shift_formula_extent(cell: &mut Cell, edit: &LineEdit, limit: u32) {
    let Some(formula) = cell.formula.as_mut() else {
        return;
    };

    if let Some(reference) = formula.reference.as_mut() {
        if let Some(shifted) = shift_range_text(reference, edit, limit) {
            *reference = shifted;
        }
    }

    if formula.kind == FormulaKind::Array && !formula.text.contains('$') {
        if let Some(shifted) = shift_range_text(&formula.text, edit, limit) {
            formula.text = shifted;
        }
    }
}

/// Shifted text of a range, or `None` when it does not change
///
/// A range pushed entirely off the sheet is left as written; the cell that
/// owns it has already been checked against the limits.
fn shift_range_text(text: &str, edit: &LineEdit, limit: u32) -> Option<String> {
    let range = RangeRef::parse(text).ok()?;
    let shifted = edit.shift_range_within(range, limit)?;
    (shifted != range.normalized()).then(|| shifted.to_a1_string())
}

/// Adjust column style ranges for a column edit
///
/// Inserted columns inherit the style of the range they land in, or of the
/// range ending right before them. A range that is exactly the deleted
/// column goes away.
pub(super) fn adjust_column_styles(worksheet: &mut Worksheet, edit: &LineEdit, max_cols: u32) {
    let pivot = edit.pivot;
    let columns = worksheet.columns_mut();

    if edit.is_deletion() {
        columns.retain(|c| !(c.min == pivot && c.max == pivot));
        for c in columns.iter_mut() {
            if c.min > pivot {
                c.min -= 1;
            }
            if c.max >= pivot {
                c.max -= 1;
            }
        }
        return;
    }

    let grow = |value: u32| (value as i64 + edit.offset).min(max_cols as i64) as u32;
    columns.retain_mut(|c| {
        if c.max + 1 == pivot || (c.min < pivot && pivot <= c.max) {
            c.max = grow(c.max);
        } else if c.min >= pivot {
            if c.min as i64 + edit.offset > max_cols as i64 {
                return false;
            }
            c.min = grow(c.min);
            c.max = grow(c.max);
        }
        true
    });
}
