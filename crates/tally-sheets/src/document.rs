//! A workbook together with the package it is stored in

use std::io::{Read, Seek, Write};
use std::path::Path;

use log::debug;

use tally_sheets_core::{
    CellAddress, CellValue, Error as CoreError, Hyperlink, RangeRef, Table, TablePart, Workbook,
    WorkbookSettings, WorkbookSheetMut, Worksheet,
};
use tally_sheets_formula::Direction;
use tally_sheets_xlsx::{
    read_table, write_table, Package, PartStore, XlsxReader, XlsxWriter, CT_TABLE,
    REL_TYPE_HYPERLINK, REL_TYPE_TABLE, WORKBOOK_PART,
};

use crate::error::Result;
use crate::structure::{self, materialize_header};

/// An editable spreadsheet document
///
/// The [`Workbook`] holds the modeled content; the [`Package`] holds every
/// part of the file, including the ones the model does not cover, which are
/// carried through a save unchanged. Sheets are addressed by name.
///
/// # Example
///
/// ```rust
/// use tally_sheets::Document;
///
/// let mut doc = Document::new().unwrap();
/// doc.establish_shared_formula("Sheet1", "C1:C5", "A1+B1").unwrap();
///
/// doc.insert_rows("Sheet1", 2, 1).unwrap();
/// assert_eq!(doc.resolve_shared_formula("Sheet1", 0, "C4").unwrap(), "=A4+B4");
/// ```
#[derive(Debug)]
pub struct Document {
    workbook: Workbook,
    package: Package,
    workbook_part: String,
    sheet_parts: Vec<String>,
}

impl Document {
    /// Create a document with a single empty sheet named `Sheet1`
    pub fn new() -> Result<Self> {
        Self::with_sheet_names(&["Sheet1"])
    }

    /// Create a document with one empty sheet per name
    pub fn with_sheet_names(names: &[&str]) -> Result<Self> {
        if names.is_empty() {
            return Err(CoreError::other("a document needs at least one sheet").into());
        }

        let mut workbook = Workbook::empty();
        for name in names {
            workbook.add_worksheet_with_name(name)?;
        }
        let (package, sheet_parts) = XlsxWriter::new_package(&workbook)?;

        Ok(Self {
            workbook,
            package,
            workbook_part: WORKBOOK_PART.to_string(),
            sheet_parts,
        })
    }

    /// Open an `.xlsx` file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_package(Package::read_file(path)?, WorkbookSettings::default())
    }

    /// Read an `.xlsx` package from a reader
    pub fn read<R: Read + Seek>(reader: R) -> Result<Self> {
        Self::from_package(Package::read(reader)?, WorkbookSettings::default())
    }

    /// Load the workbook model out of an already opened package
    pub fn from_package(package: Package, settings: WorkbookSettings) -> Result<Self> {
        let loaded = XlsxReader::read(&package, settings)?;
        debug!(
            "loaded {} sheet(s) from {}",
            loaded.sheet_parts.len(),
            loaded.workbook_part
        );

        Ok(Self {
            workbook: loaded.workbook,
            package,
            workbook_part: loaded.workbook_part,
            sheet_parts: loaded.sheet_parts,
        })
    }

    /// Store the model into the package and write it to `path`
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.store()?;
        self.package.write_file(path)?;
        Ok(())
    }

    /// Store the model into the package and write it to `writer`
    pub fn write<W: Write + Seek>(&mut self, writer: W) -> Result<()> {
        self.store()?;
        self.package.write(writer)?;
        Ok(())
    }

    fn store(&mut self) -> Result<()> {
        XlsxWriter::store_workbook(
            &mut self.package,
            &self.workbook,
            &self.workbook_part,
            &self.sheet_parts,
        )?;
        Ok(())
    }

    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    /// Mutable access to the model
    ///
    /// Sheets must not be added or removed through it: each sheet is tied to
    /// the package part it was loaded from.
    pub fn workbook_mut(&mut self) -> &mut Workbook {
        &mut self.workbook
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    /// Get a worksheet by name
    pub fn worksheet(&self, sheet: &str) -> Result<&Worksheet> {
        self.workbook
            .worksheet_by_name(sheet)
            .ok_or_else(|| CoreError::SheetNotFound(sheet.to_string()).into())
    }

    /// Get a mutable worksheet by name
    pub fn worksheet_mut(&mut self, sheet: &str) -> Result<&mut Worksheet> {
        self.workbook
            .worksheet_by_name_mut(sheet)
            .ok_or_else(|| CoreError::SheetNotFound(sheet.to_string()).into())
    }

    /// Package part that holds a sheet
    pub fn sheet_part(&self, sheet: &str) -> Result<&str> {
        let index = self.workbook.require_sheet_index(sheet)?;
        self.part_of(index, sheet)
    }

    /// Part of the sheet at `index`; sheets added through
    /// [`workbook_mut`](Self::workbook_mut) have none
    fn part_of(&self, index: usize, sheet: &str) -> Result<&str> {
        self.sheet_parts
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| CoreError::other(format!("sheet {} has no package part", sheet)).into())
    }

    // === Structural edits ===

    /// Insert (`offset > 0`) or delete (`offset < 0`) whole rows or columns
    ///
    /// See [`structure::edit_structure`] for what is kept in step.
    pub fn edit_structure(
        &mut self,
        sheet: &str,
        direction: Direction,
        pivot: u32,
        offset: i64,
    ) -> Result<()> {
        let index = self.workbook.require_sheet_index(sheet)?;
        let sheet_part = self.part_of(index, sheet)?.to_string();
        let mut edit = self.workbook.sheet_edit_mut(index)?;
        structure::edit_structure(
            &mut edit,
            &mut self.package,
            &sheet_part,
            direction,
            pivot,
            offset,
        )
    }

    /// Insert `count` rows before `row`
    pub fn insert_rows(&mut self, sheet: &str, row: u32, count: u32) -> Result<()> {
        self.edit_structure(sheet, Direction::Rows, row, count as i64)
    }

    /// Delete `count` rows starting at `row`
    pub fn remove_rows(&mut self, sheet: &str, row: u32, count: u32) -> Result<()> {
        self.edit_structure(sheet, Direction::Rows, row, -(count as i64))
    }

    /// Insert `count` columns before `column` (letters, e.g. `"C"`)
    pub fn insert_cols(&mut self, sheet: &str, column: &str, count: u32) -> Result<()> {
        let col = CellAddress::letters_to_column(column)?;
        self.edit_structure(sheet, Direction::Columns, col, count as i64)
    }

    /// Delete `count` columns starting at `column` (letters, e.g. `"C"`)
    pub fn remove_cols(&mut self, sheet: &str, column: &str, count: u32) -> Result<()> {
        let col = CellAddress::letters_to_column(column)?;
        self.edit_structure(sheet, Direction::Columns, col, -(count as i64))
    }

    // === Shared formulas ===

    /// Tag every cell of `range` with a new shared formula group
    ///
    /// Returns the group index.
    pub fn establish_shared_formula(&mut self, sheet: &str, range: &str, text: &str) -> Result<u32> {
        let worksheet = self.worksheet_mut(sheet)?;
        Ok(tally_sheets_formula::establish_shared_formula(
            worksheet, range, text,
        )?)
    }

    /// Formula text of group `index` as seen from `cell`
    pub fn resolve_shared_formula(&self, sheet: &str, index: u32, cell: &str) -> Result<String> {
        let worksheet = self.worksheet(sheet)?;
        let limits = self.workbook.settings().limits;
        Ok(tally_sheets_formula::resolve_shared_formula_within(
            worksheet, index, cell, &limits,
        )?)
    }

    // === Cells ===

    /// Store text in a cell through the shared string table
    pub fn set_cell_string(&mut self, sheet: &str, cell: &str, text: &str) -> Result<()> {
        let index = self.workbook.shared_strings_mut().get_or_insert(text);
        self.worksheet_mut(sheet)?
            .set_cell_value(cell, CellValue::shared_string(index))?;
        Ok(())
    }

    /// Displayed text of a cell, if it has a value
    pub fn cell_text(&self, sheet: &str, cell: &str) -> Result<Option<String>> {
        let strings = self.workbook.shared_strings();
        Ok(self
            .worksheet(sheet)?
            .cell(cell)?
            .and_then(|c| c.value.text(strings))
            .map(str::to_string))
    }

    // === Tables and hyperlinks ===

    /// Create a table over `range` with its header in the first row
    ///
    /// Column names are taken from the header cells (empty ones are filled
    /// with `ColumnN`). The table is named `TableN` after its id unless a
    /// name is given. Returns the table id.
    pub fn add_table(&mut self, sheet: &str, range: &str, name: Option<&str>) -> Result<u32> {
        let index = self.workbook.require_sheet_index(sheet)?;
        let sheet_part = self.part_of(index, sheet)?.to_string();
        let range = RangeRef::parse(range)?.normalized();
        if range.height() < 2 {
            return Err(CoreError::other(format!(
                "table range {} needs a header row and at least one data row",
                range
            ))
            .into());
        }

        let settings = self.workbook.settings().clone();
        let id = self.next_table_id(&settings.table_dir);
        let mut number = 1;
        while self.package.contains(&settings.table_part_name(number)) {
            number += 1;
        }
        let part = settings.table_part_name(number);

        let relationship_id = self
            .package
            .add_relationship(&sheet_part, REL_TYPE_TABLE, &part)?;
        self.package.add_content_type_override(&part, CT_TABLE)?;

        let name = name.map_or_else(|| format!("Table{}", id), str::to_string);
        let mut table = Table::new(id, name, range.to_a1_string());

        let WorkbookSheetMut {
            worksheet,
            shared_strings,
            ..
        } = self.workbook.sheet_edit_mut(index)?;
        worksheet.add_table_part(TablePart::new(relationship_id));
        materialize_header(worksheet, shared_strings, &mut table, range);

        debug!("adding table {} over {} as {}", table.name, table.reference, part);
        self.package.save_part(&part, write_table(&table).into_bytes());
        Ok(id)
    }

    /// One past the highest table id in the package
    fn next_table_id(&self, table_dir: &str) -> u32 {
        let prefix = format!("{}/", table_dir);
        self.package
            .part_names()
            .filter(|name| name.starts_with(&prefix) && name.ends_with(".xml"))
            .filter_map(|name| self.package.part(name))
            .filter_map(|data| read_table(data).ok())
            .map(|table| table.id)
            .max()
            .map_or(1, |id| id + 1)
    }

    /// Link `cell` to an external URL
    pub fn add_url_hyperlink(&mut self, sheet: &str, cell: &str, url: &str) -> Result<()> {
        let index = self.workbook.require_sheet_index(sheet)?;
        let sheet_part = self.part_of(index, sheet)?.to_string();
        // Reject a bad anchor before the relationship is created
        RangeRef::parse(cell)?;

        let relationship_id =
            self.package
                .add_external_relationship(&sheet_part, REL_TYPE_HYPERLINK, url)?;
        self.worksheet_mut(sheet)?
            .add_hyperlink(Hyperlink::external(cell, relationship_id))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    #[test]
    fn test_new_document() {
        let doc = Document::with_sheet_names(&["Data", "Notes"]).unwrap();

        assert_eq!(doc.workbook().sheet_count(), 2);
        assert_eq!(doc.sheet_part("Notes").unwrap(), "xl/worksheets/sheet2.xml");
        assert!(doc.package().contains(WORKBOOK_PART));
    }

    #[test]
    fn test_no_sheets_is_rejected() {
        assert!(Document::with_sheet_names(&[]).is_err());
    }

    #[test]
    fn test_unknown_sheet() {
        let mut doc = Document::new().unwrap();
        let err = doc.insert_rows("Missing", 1, 1).unwrap_err();
        assert_eq!(err.as_core(), Some(&CoreError::SheetNotFound("Missing".into())));
    }

    #[test]
    fn test_insert_and_remove_columns_by_letter() {
        let mut doc = Document::new().unwrap();
        doc.set_cell_string("Sheet1", "C2", "moved").unwrap();

        doc.insert_cols("Sheet1", "B", 2).unwrap();
        assert_eq!(doc.cell_text("Sheet1", "E2").unwrap().as_deref(), Some("moved"));

        doc.remove_cols("Sheet1", "A", 3).unwrap();
        assert_eq!(doc.cell_text("Sheet1", "B2").unwrap().as_deref(), Some("moved"));
        assert_eq!(doc.cell_text("Sheet1", "E2").unwrap(), None);
    }

    #[test]
    fn test_add_table() {
        let mut doc = Document::new().unwrap();
        doc.set_cell_string("Sheet1", "B2", "Item").unwrap();
        doc.set_cell_string("Sheet1", "C2", "Count").unwrap();

        let first = doc.add_table("Sheet1", "B2:C6", None).unwrap();
        let second = doc.add_table("Sheet1", "E2:E3", Some("Extra")).unwrap();
        assert_eq!((first, second), (1, 2));

        let sheet = doc.worksheet("Sheet1").unwrap();
        assert_eq!(sheet.table_parts().len(), 2);

        let table = read_table(doc.package().part("xl/tables/table1.xml").unwrap()).unwrap();
        assert_eq!(table.name, "Table1");
        assert_eq!(table.reference, "B2:C6");
        let names: Vec<_> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Item", "Count"]);

        let extra = read_table(doc.package().part("xl/tables/table2.xml").unwrap()).unwrap();
        assert_eq!(extra.name, "Extra");
        assert_eq!(doc.cell_text("Sheet1", "E2").unwrap().as_deref(), Some("Column1"));
    }

    #[test]
    fn test_sheet_added_to_model_has_no_part() {
        let mut doc = Document::new().unwrap();
        doc.workbook_mut().add_worksheet_with_name("Loose").unwrap();

        assert!(doc.sheet_part("Loose").is_err());
        assert!(doc.insert_rows("Loose", 1, 1).is_err());
        assert!(doc.add_table("Loose", "A1:B3", None).is_err());
        assert!(doc
            .add_url_hyperlink("Loose", "A1", "https://example.com/")
            .is_err());
        assert!(doc.worksheet("Loose").unwrap().table_parts().is_empty());
    }

    #[test]
    fn test_resolve_uses_workbook_limits() {
        let mut source = Document::new().unwrap();
        source.set_cell_string("Sheet1", "A1", "x").unwrap();
        let mut buf = Cursor::new(Vec::new());
        source.write(&mut buf).unwrap();
        buf.set_position(0);

        let settings = WorkbookSettings {
            limits: tally_sheets_core::SheetLimits {
                max_rows: 20,
                max_cols: 10,
            },
            ..WorkbookSettings::default()
        };
        let mut doc = Document::from_package(Package::read(buf).unwrap(), settings).unwrap();
        doc.establish_shared_formula("Sheet1", "B1:B2", "A19+C1").unwrap();

        // A20 is the last row; A21 would leave the sheet and stays as written
        assert_eq!(doc.resolve_shared_formula("Sheet1", 0, "B2").unwrap(), "=A20+C2");
        assert_eq!(doc.resolve_shared_formula("Sheet1", 0, "B3").unwrap(), "=A19+C3");
    }

    #[test]
    fn test_add_table_needs_data_row() {
        let mut doc = Document::new().unwrap();
        assert!(doc.add_table("Sheet1", "A1:C1", None).is_err());
        assert!(doc.worksheet("Sheet1").unwrap().table_parts().is_empty());
    }

    #[test]
    fn test_url_hyperlink_released_on_delete() {
        let mut doc = Document::new().unwrap();
        doc.add_url_hyperlink("Sheet1", "A3", "https://example.com/")
            .unwrap();
        let part = doc.sheet_part("Sheet1").unwrap().to_string();
        assert_eq!(doc.package().relationships(&part).unwrap().len(), 1);

        doc.remove_rows("Sheet1", 3, 1).unwrap();

        assert!(doc.worksheet("Sheet1").unwrap().hyperlinks().is_empty());
        assert!(doc.package().relationships(&part).unwrap().is_empty());
    }

    #[test]
    fn test_bad_hyperlink_anchor_adds_nothing() {
        let mut doc = Document::new().unwrap();
        assert!(doc.add_url_hyperlink("Sheet1", "A0", "https://example.com/").is_err());
        let part = doc.sheet_part("Sheet1").unwrap().to_string();
        assert!(doc.package().relationships(&part).unwrap().is_empty());
    }

    #[test]
    fn test_write_then_read() {
        let mut doc = Document::new().unwrap();
        doc.set_cell_string("Sheet1", "A1", "Name").unwrap();
        doc.worksheet_mut("Sheet1")
            .unwrap()
            .set_cell_number("A2", 3.5)
            .unwrap();
        doc.worksheet_mut("Sheet1").unwrap().merge_cells("B1:C1").unwrap();

        let mut buf = Cursor::new(Vec::new());
        doc.write(&mut buf).unwrap();
        buf.set_position(0);

        let read = Document::read(buf).unwrap();
        assert_eq!(read.cell_text("Sheet1", "A1").unwrap().as_deref(), Some("Name"));
        assert_eq!(read.cell_text("Sheet1", "A2").unwrap().as_deref(), Some("3.5"));
        assert_eq!(read.worksheet("Sheet1").unwrap().merged_cells(), &["B1:C1".to_string()]);
    }
}
