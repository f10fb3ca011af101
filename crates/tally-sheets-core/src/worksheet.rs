//! Worksheet type

use std::collections::BTreeMap;

use crate::cell::{Cell, CellAddress, CellValue, Formula};
use crate::column::ColumnRange;
use crate::error::{Error, Result};
use crate::filter::AutoFilter;
use crate::hyperlink::Hyperlink;
use crate::range::RangeRef;
use crate::row::Row;
use crate::table::TablePart;

/// A worksheet (single sheet in a workbook)
///
/// Rows are kept in a sorted map keyed by row number and each row keeps its
/// cells in a sorted map keyed by column number, so iteration is always in
/// sheet order and a cell's reference is implied by where it is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Worksheet {
    /// Sheet name
    name: String,
    /// `sheetId` from `workbook.xml`; keys calculation chain entries
    sheet_id: u32,
    /// Row records keyed by row number
    rows: BTreeMap<u32, Row>,
    /// Column style ranges, pairwise non-overlapping
    columns: Vec<ColumnRange>,
    /// Merged ranges as stored ("B2:C3")
    merged_cells: Vec<String>,
    /// Hyperlinks
    hyperlinks: Vec<Hyperlink>,
    /// References to table parts
    table_parts: Vec<TablePart>,
    /// Sheet-level autofilter
    auto_filter: Option<AutoFilter>,
}

impl Worksheet {
    /// Create a new worksheet with the given name
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            sheet_id: 1,
            rows: BTreeMap::new(),
            columns: Vec::new(),
            merged_cells: Vec::new(),
            hyperlinks: Vec::new(),
            table_parts: Vec::new(),
            auto_filter: None,
        }
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the sheet id
    pub fn sheet_id(&self) -> u32 {
        self.sheet_id
    }

    /// Set the sheet id
    pub fn set_sheet_id(&mut self, sheet_id: u32) {
        self.sheet_id = sheet_id;
    }

    // === Cell Access ===

    /// Get a cell by address string (e.g., "A1")
    pub fn cell(&self, address: &str) -> Result<Option<&Cell>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.cell_at(addr.col, addr.row))
    }

    /// Get a cell by column and row numbers
    pub fn cell_at(&self, col: u32, row: u32) -> Option<&Cell> {
        self.rows.get(&row).and_then(|r| r.cell(col))
    }

    /// Get a mutable cell by column and row numbers
    pub fn cell_at_mut(&mut self, col: u32, row: u32) -> Option<&mut Cell> {
        self.rows.get_mut(&row).and_then(|r| r.cell_mut(col))
    }

    /// Get a cell, materializing an empty one (and its row) if needed
    pub fn cell_entry(&mut self, col: u32, row: u32) -> &mut Cell {
        self.rows
            .entry(row)
            .or_default()
            .cells
            .entry(col)
            .or_default()
    }

    /// Get the formula of a cell by address string
    pub fn formula(&self, address: &str) -> Result<Option<&Formula>> {
        Ok(self.cell(address)?.and_then(|c| c.formula.as_ref()))
    }

    /// Get the formula of a cell by column and row numbers
    pub fn formula_at(&self, col: u32, row: u32) -> Option<&Formula> {
        self.cell_at(col, row).and_then(|c| c.formula.as_ref())
    }

    // === Cell Modification ===

    /// Replace a cell by address string
    pub fn set_cell(&mut self, address: &str, cell: Cell) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        *self.cell_entry(addr.col, addr.row) = cell;
        Ok(())
    }

    /// Set a cell's raw value, keeping its style and formula
    pub fn set_cell_value(&mut self, address: &str, value: CellValue) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.cell_entry(addr.col, addr.row).value = value;
        Ok(())
    }

    /// Set a numeric cell value
    pub fn set_cell_number(&mut self, address: &str, value: f64) -> Result<()> {
        self.set_cell_value(address, CellValue::number(value))
    }

    /// Set an inline string cell value
    pub fn set_cell_inline_string(&mut self, address: &str, value: &str) -> Result<()> {
        self.set_cell_value(address, CellValue::inline_string(value))
    }

    /// Attach a formula to a cell
    ///
    /// A leading `=` in the formula text is dropped, since the package stores
    /// formulas without it.
    pub fn set_cell_formula(&mut self, address: &str, mut formula: Formula) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        if let Some(stripped) = formula.text.strip_prefix('=') {
            formula.text = stripped.to_string();
        }
        self.cell_entry(addr.col, addr.row).formula = Some(formula);
        Ok(())
    }

    /// Set a cell's style index
    pub fn set_cell_style(&mut self, address: &str, style_index: u32) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.cell_entry(addr.col, addr.row).style_index = style_index;
        Ok(())
    }

    /// Clear a cell
    pub fn clear_cell(&mut self, address: &str) -> Result<Option<Cell>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.clear_cell_at(addr.col, addr.row))
    }

    /// Clear a cell by column and row numbers
    ///
    /// A row record left without cells or settings is dropped as well.
    pub fn clear_cell_at(&mut self, col: u32, row: u32) -> Option<Cell> {
        let record = self.rows.get_mut(&row)?;
        let removed = record.cells.remove(&col);
        if record.is_empty() {
            self.rows.remove(&row);
        }
        removed
    }

    // === Rows ===

    /// Get all row records keyed by row number
    pub fn rows(&self) -> &BTreeMap<u32, Row> {
        &self.rows
    }

    /// Get a mutable reference to all row records
    pub fn rows_mut(&mut self) -> &mut BTreeMap<u32, Row> {
        &mut self.rows
    }

    /// Get a row record
    pub fn row(&self, row: u32) -> Option<&Row> {
        self.rows.get(&row)
    }

    /// Get a mutable row record
    pub fn row_mut(&mut self, row: u32) -> Option<&mut Row> {
        self.rows.get_mut(&row)
    }

    /// Get a row record, creating it if needed
    pub fn row_entry(&mut self, row: u32) -> &mut Row {
        self.rows.entry(row).or_default()
    }

    /// Check if a row is hidden
    pub fn is_row_hidden(&self, row: u32) -> bool {
        self.rows.get(&row).map(|r| r.hidden).unwrap_or(false)
    }

    /// Set row hidden state
    pub fn set_row_hidden(&mut self, row: u32, hidden: bool) {
        self.row_entry(row).hidden = hidden;
    }

    /// Set a custom row height
    pub fn set_row_height(&mut self, row: u32, height: f64) {
        self.row_entry(row).height = Some(height);
    }

    /// Highest row number with a row record
    pub fn last_row(&self) -> Option<u32> {
        self.rows.keys().next_back().copied()
    }

    /// Get the used range (bounds of all stored cells)
    pub fn used_range(&self) -> Option<RangeRef> {
        let mut bounds: Option<RangeRef> = None;
        for (&row, record) in &self.rows {
            let (Some(&first), Some(&last)) =
                (record.cells.keys().next(), record.cells.keys().next_back())
            else {
                continue;
            };
            bounds = Some(match bounds {
                None => RangeRef::new(first, row, last, row),
                Some(b) => RangeRef::new(b.x1.min(first), b.y1, b.x2.max(last), row),
            });
        }
        bounds
    }

    /// Iterate over all stored cells as `(col, row, cell)` in sheet order
    pub fn iter_cells(&self) -> impl Iterator<Item = (u32, u32, &Cell)> {
        self.rows.iter().flat_map(|(&row, record)| {
            record
                .cells
                .iter()
                .map(move |(&col, cell)| (col, row, cell))
        })
    }

    /// Iterate over all formulas as `(col, row, formula)` in sheet order
    pub fn formula_cells(&self) -> impl Iterator<Item = (u32, u32, &Formula)> {
        self.iter_cells()
            .filter_map(|(col, row, cell)| cell.formula.as_ref().map(|f| (col, row, f)))
    }

    /// Get the number of stored cells
    pub fn cell_count(&self) -> usize {
        self.rows.values().map(|r| r.cells.len()).sum()
    }

    /// Check if the worksheet holds no cells
    pub fn is_empty(&self) -> bool {
        self.cell_count() == 0
    }

    // === Column Style Ranges ===

    /// Get column style ranges
    pub fn columns(&self) -> &[ColumnRange] {
        &self.columns
    }

    /// Get a mutable reference to the column style ranges
    pub fn columns_mut(&mut self) -> &mut Vec<ColumnRange> {
        &mut self.columns
    }

    /// Add a column style range; it must not overlap an existing one
    pub fn add_column_range(&mut self, range: ColumnRange) -> Result<()> {
        if self.columns.iter().any(|c| c.overlaps(&range)) {
            return Err(Error::ColumnRangeConflict(range.min, range.max));
        }
        let pos = self.columns.partition_point(|c| c.min < range.min);
        self.columns.insert(pos, range);
        Ok(())
    }

    /// Get the column style range covering `col`
    pub fn column_range_at(&self, col: u32) -> Option<&ColumnRange> {
        self.columns.iter().find(|c| c.contains(col))
    }

    // === Merged Cells ===

    /// Get merged ranges as stored
    pub fn merged_cells(&self) -> &[String] {
        &self.merged_cells
    }

    /// Get a mutable reference to the merged ranges
    pub fn merged_cells_mut(&mut self) -> &mut Vec<String> {
        &mut self.merged_cells
    }

    /// Merge cells
    ///
    /// The range is normalized before it is stored. It must span at least two
    /// cells and must not overlap an existing merge.
    pub fn merge_cells(&mut self, reference: &str) -> Result<()> {
        let range = RangeRef::parse(reference)?.normalized();
        if range.is_single_cell() {
            return Err(Error::other(format!(
                "merged range {} must span at least two cells",
                reference
            )));
        }

        for existing in &self.merged_cells {
            if let Ok(other) = RangeRef::parse(existing) {
                if range.overlaps(&other) {
                    return Err(Error::MergedCellConflict(range.to_string()));
                }
            }
        }

        self.merged_cells.push(range.to_string());
        Ok(())
    }

    /// Unmerge cells; returns whether a matching merge was found
    pub fn unmerge_cells(&mut self, reference: &str) -> Result<bool> {
        let range = RangeRef::parse(reference)?.normalized();
        let before = self.merged_cells.len();
        self.merged_cells.retain(|existing| {
            RangeRef::parse(existing)
                .map(|r| r.normalized() != range)
                .unwrap_or(true)
        });
        Ok(self.merged_cells.len() != before)
    }

    // === Hyperlinks ===

    /// Get hyperlinks
    pub fn hyperlinks(&self) -> &[Hyperlink] {
        &self.hyperlinks
    }

    /// Get a mutable reference to the hyperlinks
    pub fn hyperlinks_mut(&mut self) -> &mut Vec<Hyperlink> {
        &mut self.hyperlinks
    }

    /// Add a hyperlink, replacing any link with the same anchor
    pub fn add_hyperlink(&mut self, link: Hyperlink) -> Result<()> {
        RangeRef::parse(&link.reference)?;
        self.hyperlinks.retain(|h| h.reference != link.reference);
        self.hyperlinks.push(link);
        Ok(())
    }

    /// Get the hyperlink anchored at `reference`
    pub fn hyperlink(&self, reference: &str) -> Option<&Hyperlink> {
        self.hyperlinks.iter().find(|h| h.reference == reference)
    }

    // === Tables ===

    /// Get table part references
    pub fn table_parts(&self) -> &[TablePart] {
        &self.table_parts
    }

    /// Get a mutable reference to the table part references
    pub fn table_parts_mut(&mut self) -> &mut Vec<TablePart> {
        &mut self.table_parts
    }

    /// Add a table part reference
    pub fn add_table_part(&mut self, part: TablePart) {
        self.table_parts.push(part);
    }

    // === AutoFilter ===

    /// Get the sheet autofilter
    pub fn auto_filter(&self) -> Option<&AutoFilter> {
        self.auto_filter.as_ref()
    }

    /// Get a mutable reference to the sheet autofilter slot
    pub fn auto_filter_mut(&mut self) -> &mut Option<AutoFilter> {
        &mut self.auto_filter
    }

    /// Set the sheet autofilter range
    pub fn set_auto_filter(&mut self, reference: &str) -> Result<()> {
        let range = RangeRef::parse(reference)?.normalized();
        self.auto_filter = Some(AutoFilter::new(range.to_string()));
        Ok(())
    }

    /// Remove the sheet autofilter
    pub fn clear_auto_filter(&mut self) -> Option<AutoFilter> {
        self.auto_filter.take()
    }
}
