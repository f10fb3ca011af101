//! Table parts
//!
//! Table definitions live in their own package parts, so each one is loaded
//! through the sheet's relationship, adjusted and written back.

use log::{debug, warn};

use tally_sheets_core::{
    AutoFilter, CellType, CellValue, RangeRef, SharedStringTable, Table, TableColumn, TablePart,
    WorkbookSheetMut, Worksheet,
};
use tally_sheets_formula::Direction;
use tally_sheets_xlsx::{read_table, write_table, PartStore};

use super::auto_filter::follow_range;
use super::{parse_stored_range, LineEdit};

/// Shift every table of the sheet, removing the ones the edit destroys
///
/// A table whose relationship or part cannot be read is logged and left
/// alone.
pub(super) fn adjust<S: PartStore + ?Sized>(
    sheet: &mut WorkbookSheetMut<'_>,
    parts: &mut S,
    sheet_part: &str,
    edit: &LineEdit,
    limit: u32,
) {
    let table_parts: Vec<TablePart> = sheet.worksheet.table_parts().to_vec();

    for part in &table_parts {
        let target = match parts.relationship_target(sheet_part, &part.relationship_id) {
            Ok(Some(target)) => target,
            Ok(None) => {
                warn!(
                    "table relationship {} of {} has no target",
                    part.relationship_id, sheet_part
                );
                continue;
            }
            Err(e) => {
                warn!(
                    "cannot resolve table relationship {} of {}: {}",
                    part.relationship_id, sheet_part, e
                );
                continue;
            }
        };
        let Some(data) = parts.load_part(&target) else {
            warn!("table part {} is missing", target);
            continue;
        };
        let mut table = match read_table(data) {
            Ok(table) => table,
            Err(e) => {
                warn!("leaving table part {} unchanged: {}", target, e);
                continue;
            }
        };
        let Some(range) = parse_stored_range("table", &table.reference) else {
            continue;
        };

        let header_deleted = edit.direction == Direction::Rows
            && table.has_header_row()
            && edit.deletes(range.y1);
        let shifted = edit.shift_range_within(range, limit);
        // A table keeps its header plus at least one data row
        let degenerate = shifted.map_or(true, |r| {
            (r.y2 as i64 - r.y1 as i64) < 1 || r.x2 < r.x1
        });

        let Some(shifted) = shifted.filter(|_| !header_deleted && !degenerate) else {
            debug!("removing table {} ({})", table.name, table.reference);
            remove_table(sheet.worksheet, parts, sheet_part, part, &target);
            continue;
        };

        table.reference = shifted.to_a1_string();
        if let Some(filter) = table.auto_filter.as_mut() {
            match parse_stored_range("table filter", &filter.reference)
                .and_then(|r| edit.shift_range_within(r, limit).map(|s| (r, s)))
            {
                Some((old, new)) => follow_range(filter, old, new, edit),
                None => *filter = AutoFilter::new(table.reference.clone()),
            }
        }
        if edit.direction == Direction::Columns {
            realign_columns(&mut table, range, shifted, edit);
        }
        materialize_header(sheet.worksheet, sheet.shared_strings, &mut table, shifted);
        parts.save_part(&target, write_table(&table).into_bytes());
    }
}

fn remove_table<S: PartStore + ?Sized>(
    worksheet: &mut Worksheet,
    parts: &mut S,
    sheet_part: &str,
    part: &TablePart,
    target: &str,
) {
    worksheet
        .table_parts_mut()
        .retain(|p| p.relationship_id != part.relationship_id);
    if let Err(e) = parts.delete_relationship(sheet_part, &part.relationship_id) {
        warn!(
            "cannot release table relationship {} of {}: {}",
            part.relationship_id, sheet_part, e
        );
    }
    if let Err(e) = parts.remove_part(target) {
        warn!("cannot remove table part {}: {}", target, e);
    }
}

/// Move column definitions to the positions their columns take after the
/// edit; inserted columns get blank definitions
fn realign_columns(table: &mut Table, range: RangeRef, shifted: RangeRef, edit: &LineEdit) {
    let mut columns: Vec<TableColumn> = (0..shifted.width())
        .map(|_| TableColumn::new(0, ""))
        .collect();

    for (idx, column) in std::mem::take(&mut table.columns).into_iter().enumerate() {
        let col = range.x1 + idx as u32;
        if edit.deletes(col) {
            continue;
        }
        let slot = edit
            .shift(col, false)
            .checked_sub(shifted.x1)
            .and_then(|i| columns.get_mut(i as usize));
        if let Some(slot) = slot {
            *slot = column;
        }
    }

    table.columns = columns;
}

/// Rebuild the columns of `table` from the header row of `range`
///
/// Header cells become the column names. An empty header cell is filled
/// with `ColumnN` and a numeric one is rewritten as text, both through the
/// shared string table. Tables without a header row get `ColumnN` names
/// and leave the sheet alone. Existing column definitions keep their other
/// settings (totals functions, calculated formulas) by position.
pub(crate) fn materialize_header(
    worksheet: &mut Worksheet,
    strings: &mut SharedStringTable,
    table: &mut Table,
    range: RangeRef,
) {
    let range = range.normalized();
    let mut previous = std::mem::take(&mut table.columns).into_iter();
    let mut columns = Vec::with_capacity(range.width() as usize);

    for (idx, col) in (range.x1..=range.x2).enumerate() {
        let id = idx as u32 + 1;
        let name = if table.has_header_row() {
            header_name(worksheet, strings, col, range.y1, id)
        } else {
            default_column_name(id)
        };
        let mut column = previous.next().unwrap_or_else(|| TableColumn::new(id, ""));
        column.id = id;
        column.name = name;
        columns.push(column);
    }

    table.columns = columns;
}

fn header_name(
    worksheet: &mut Worksheet,
    strings: &mut SharedStringTable,
    col: u32,
    row: u32,
    id: u32,
) -> String {
    let cell = worksheet.cell_entry(col, row);
    let text = cell.value.text(strings).unwrap_or_default().to_string();

    if text.is_empty() {
        let name = default_column_name(id);
        cell.value = CellValue::shared_string(strings.get_or_insert(&name));
        return name;
    }
    if cell.value.kind == CellType::Number {
        cell.value = CellValue::shared_string(strings.get_or_insert(&text));
    }
    text
}

fn default_column_name(id: u32) -> String {
    format!("Column{}", id)
}
