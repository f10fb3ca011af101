//! Workbook type - the main document structure

use crate::calc_chain::CalcChain;
use crate::cell::{CellAddress, SharedStringTable};
use crate::error::{Error, Result};
use crate::worksheet::Worksheet;
use crate::{MAX_COLS, MAX_ROWS, MAX_SHEET_NAME_LEN};

/// A workbook (spreadsheet document)
///
/// A workbook contains one or more worksheets together with the
/// document-wide tables they share: the shared-string table and the
/// calculation chain.
#[derive(Debug)]
pub struct Workbook {
    /// Worksheets in the workbook
    worksheets: Vec<Worksheet>,
    /// Workbook settings
    settings: WorkbookSettings,
    /// Shared strings, owned by this document only
    shared_strings: SharedStringTable,
    /// Calculation chain
    calc_chain: CalcChain,
    /// Active sheet index
    active_sheet: usize,
}

impl Workbook {
    /// Create a new empty workbook with one worksheet
    pub fn new() -> Self {
        let mut wb = Self::empty();
        wb.worksheets.push(Worksheet::new("Sheet1"));
        wb
    }

    /// Create an empty workbook with no worksheets
    pub fn empty() -> Self {
        Self::with_settings(WorkbookSettings::default())
    }

    /// Create an empty workbook with custom settings
    pub fn with_settings(settings: WorkbookSettings) -> Self {
        Self {
            worksheets: Vec::new(),
            settings,
            shared_strings: SharedStringTable::new(),
            calc_chain: CalcChain::new(),
            active_sheet: 0,
        }
    }

    /// Get the number of worksheets
    pub fn sheet_count(&self) -> usize {
        self.worksheets.len()
    }

    /// Check if the workbook has no worksheets
    pub fn is_empty(&self) -> bool {
        self.worksheets.is_empty()
    }

    /// Get a worksheet by index
    pub fn worksheet(&self, index: usize) -> Option<&Worksheet> {
        self.worksheets.get(index)
    }

    /// Get a mutable worksheet by index
    pub fn worksheet_mut(&mut self, index: usize) -> Option<&mut Worksheet> {
        self.worksheets.get_mut(index)
    }

    /// Get a worksheet by name
    pub fn worksheet_by_name(&self, name: &str) -> Option<&Worksheet> {
        self.worksheets.iter().find(|ws| ws.name() == name)
    }

    /// Get a mutable worksheet by name
    pub fn worksheet_by_name_mut(&mut self, name: &str) -> Option<&mut Worksheet> {
        self.worksheets.iter_mut().find(|ws| ws.name() == name)
    }

    /// Get the index of a worksheet by name
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.worksheets.iter().position(|ws| ws.name() == name)
    }

    /// Get the index of a worksheet by name, failing if it does not exist
    pub fn require_sheet_index(&self, name: &str) -> Result<usize> {
        self.sheet_index(name)
            .ok_or_else(|| Error::SheetNotFound(name.to_string()))
    }

    /// Iterate over all worksheets
    pub fn worksheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.worksheets.iter()
    }

    /// Add a new worksheet with specified name
    ///
    /// The sheet gets the next free sheet id.
    pub fn add_worksheet_with_name(&mut self, name: &str) -> Result<usize> {
        self.validate_sheet_name(name)?;

        let mut worksheet = Worksheet::new(name);
        worksheet.set_sheet_id(self.next_sheet_id());

        let index = self.worksheets.len();
        self.worksheets.push(worksheet);
        Ok(index)
    }

    /// Add an existing worksheet to the workbook, keeping its sheet id
    pub fn add_existing_worksheet(&mut self, worksheet: Worksheet) -> Result<usize> {
        self.validate_sheet_name(worksheet.name())?;
        let index = self.worksheets.len();
        self.worksheets.push(worksheet);
        Ok(index)
    }

    /// Get the active sheet index
    pub fn active_sheet(&self) -> usize {
        self.active_sheet
    }

    /// Set the active sheet index
    pub fn set_active_sheet(&mut self, index: usize) -> Result<()> {
        if index >= self.worksheets.len() {
            return Err(Error::SheetOutOfBounds(index, self.worksheets.len()));
        }
        self.active_sheet = index;
        Ok(())
    }

    /// Get workbook settings
    pub fn settings(&self) -> &WorkbookSettings {
        &self.settings
    }

    // ==================== Document-wide tables ====================

    /// Get the shared-string table
    pub fn shared_strings(&self) -> &SharedStringTable {
        &self.shared_strings
    }

    /// Get a mutable reference to the shared-string table
    pub fn shared_strings_mut(&mut self) -> &mut SharedStringTable {
        &mut self.shared_strings
    }

    /// Replace the shared-string table
    pub fn set_shared_strings(&mut self, table: SharedStringTable) {
        self.shared_strings = table;
    }

    /// Get the calculation chain
    pub fn calc_chain(&self) -> &CalcChain {
        &self.calc_chain
    }

    /// Get a mutable reference to the calculation chain
    pub fn calc_chain_mut(&mut self) -> &mut CalcChain {
        &mut self.calc_chain
    }

    /// Replace the calculation chain
    pub fn set_calc_chain(&mut self, chain: CalcChain) {
        self.calc_chain = chain;
    }

    /// Borrow one worksheet together with the document-wide tables an edit
    /// of that sheet has to keep in step
    pub fn sheet_edit_mut(&mut self, index: usize) -> Result<WorkbookSheetMut<'_>> {
        let count = self.worksheets.len();
        let worksheet = self
            .worksheets
            .get_mut(index)
            .ok_or(Error::SheetOutOfBounds(index, count))?;

        Ok(WorkbookSheetMut {
            worksheet,
            shared_strings: &mut self.shared_strings,
            calc_chain: &mut self.calc_chain,
            limits: self.settings.limits,
        })
    }

    /// Next free sheet id (one past the highest in use)
    fn next_sheet_id(&self) -> u32 {
        self.worksheets
            .iter()
            .map(Worksheet::sheet_id)
            .max()
            .map_or(1, |id| id + 1)
    }

    /// Check a new sheet name against Excel's naming rules and the
    /// existing sheets (compared case-insensitively)
    fn validate_sheet_name(&self, name: &str) -> Result<()> {
        const FORBIDDEN: &[char] = &[':', '\\', '/', '?', '*', '[', ']'];

        let problem = if name.is_empty() {
            Some("name is empty".to_string())
        } else if name.chars().count() > MAX_SHEET_NAME_LEN {
            Some(format!("longer than {} characters", MAX_SHEET_NAME_LEN))
        } else {
            name.chars()
                .find(|c| FORBIDDEN.contains(c))
                .map(|c| format!("contains '{}'", c))
        };
        if let Some(problem) = problem {
            return Err(Error::InvalidSheetName(format!("{:?}: {}", name, problem)));
        }

        let lower = name.to_lowercase();
        if self.worksheets.iter().any(|ws| ws.name().to_lowercase() == lower) {
            return Err(Error::DuplicateSheetName(name.into()));
        }
        Ok(())
    }
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

/// A worksheet borrowed together with the document-wide state its edits touch
///
/// Obtained from [`Workbook::sheet_edit_mut`]. The fields are disjoint
/// borrows of the workbook, so an edit can update the sheet, the shared
/// strings and the calculation chain at the same time.
#[derive(Debug)]
pub struct WorkbookSheetMut<'a> {
    pub worksheet: &'a mut Worksheet,
    pub shared_strings: &'a mut SharedStringTable,
    pub calc_chain: &'a mut CalcChain,
    pub limits: SheetLimits,
}

/// Maximum sheet dimensions used for bounds checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SheetLimits {
    /// Last valid row number
    pub max_rows: u32,
    /// Last valid column number
    pub max_cols: u32,
}

impl Default for SheetLimits {
    fn default() -> Self {
        Self {
            max_rows: MAX_ROWS,
            max_cols: MAX_COLS,
        }
    }
}

impl SheetLimits {
    /// Check that `col` is a valid column number
    pub fn check_col(&self, col: i64) -> Result<u32> {
        if col < 1 || col > self.max_cols as i64 {
            return Err(Error::ColumnOutOfRange(col, self.max_cols));
        }
        Ok(col as u32)
    }

    /// Check that `row` is a valid row number
    pub fn check_row(&self, row: i64) -> Result<u32> {
        if row < 1 || row > self.max_rows as i64 {
            return Err(Error::RowOutOfRange(row, self.max_rows));
        }
        Ok(row as u32)
    }

    /// Format `(col, row)` as a relative A1 reference after bounds checks
    pub fn cell_ref(&self, col: i64, row: i64) -> Result<String> {
        let col = self.check_col(col)?;
        let row = self.check_row(row)?;
        Ok(CellAddress::new(col, row).to_a1_string())
    }
}

/// Workbook-level settings
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorkbookSettings {
    /// Sheet dimensions enforced by structural edits
    pub limits: SheetLimits,
    /// Package folder that new worksheet parts are created in
    pub worksheet_dir: String,
    /// Package folder that new table parts are created in
    pub table_dir: String,
}

impl Default for WorkbookSettings {
    fn default() -> Self {
        Self {
            limits: SheetLimits::default(),
            worksheet_dir: "xl/worksheets".into(),
            table_dir: "xl/tables".into(),
        }
    }
}

impl WorkbookSettings {
    /// Part name for a new worksheet part (`xl/worksheets/sheet3.xml`)
    pub fn worksheet_part_name(&self, number: usize) -> String {
        format!("{}/sheet{}.xml", self.worksheet_dir, number)
    }

    /// Part name for a new table part (`xl/tables/table1.xml`)
    pub fn table_part_name(&self, number: u32) -> String {
        format!("{}/table{}.xml", self.table_dir, number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc_chain::CalcChainEntry;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_workbook() {
        let wb = Workbook::new();
        assert_eq!(wb.sheet_count(), 1);
        assert_eq!(wb.worksheet(0).unwrap().name(), "Sheet1");
        assert_eq!(wb.worksheet(0).unwrap().sheet_id(), 1);

        let mut wb = wb;
        assert_eq!(wb.set_active_sheet(1), Err(Error::SheetOutOfBounds(1, 1)));
        assert_eq!(wb.active_sheet(), 0);
    }

    #[test]
    fn test_add_worksheet_with_name() {
        let mut wb = Workbook::new();

        let idx = wb.add_worksheet_with_name("Data").unwrap();
        assert_eq!(idx, 1);
        assert_eq!(wb.worksheet(1).unwrap().name(), "Data");
        assert_eq!(wb.worksheet(1).unwrap().sheet_id(), 2);
        assert_eq!(wb.worksheet_by_name("Data").unwrap().sheet_id(), 2);
    }

    #[test]
    fn test_sheet_ids_skip_past_highest() {
        let mut wb = Workbook::empty();
        let mut ws = Worksheet::new("Imported");
        ws.set_sheet_id(7);
        wb.add_existing_worksheet(ws).unwrap();

        let idx = wb.add_worksheet_with_name("Next").unwrap();
        assert_eq!(wb.worksheet(idx).unwrap().sheet_id(), 8);
    }

    #[test]
    fn test_duplicate_name() {
        let mut wb = Workbook::new();

        // Case-insensitive duplicate check
        assert!(wb.add_worksheet_with_name("SHEET1").is_err());
        assert!(wb.add_worksheet_with_name("sheet1").is_err());
    }

    #[test]
    fn test_invalid_sheet_name() {
        let mut wb = Workbook::new();

        assert!(wb.add_worksheet_with_name("").is_err());
        assert!(wb.add_worksheet_with_name("Sheet/1").is_err());
        assert!(wb.add_worksheet_with_name("Sheet:1").is_err());
        assert!(wb.add_worksheet_with_name("Sheet[1]").is_err());

        let long_name = "A".repeat(MAX_SHEET_NAME_LEN + 1);
        assert!(wb.add_worksheet_with_name(&long_name).is_err());
    }

    #[test]
    fn test_require_sheet_index() {
        let wb = Workbook::new();
        assert_eq!(wb.require_sheet_index("Sheet1").unwrap(), 0);
        assert_eq!(
            wb.require_sheet_index("Missing"),
            Err(Error::SheetNotFound("Missing".into()))
        );
    }

    #[test]
    fn test_sheet_edit_mut_borrows_disjoint_state() {
        let mut wb = Workbook::new();
        let edit = wb.sheet_edit_mut(0).unwrap();

        edit.worksheet.set_cell_number("A1", 1.0).unwrap();
        let idx = edit.shared_strings.get_or_insert("Header");
        edit.calc_chain.push(CalcChainEntry::new(1, "A1"));
        assert_eq!(edit.limits, SheetLimits::default());

        assert_eq!(idx, 0);
        assert_eq!(wb.calc_chain().len(), 1);
        assert!(wb.sheet_edit_mut(3).is_err());
    }

    #[test]
    fn test_limits_cell_ref() {
        let limits = SheetLimits::default();
        assert_eq!(limits.cell_ref(3, 5).unwrap(), "C5");
        assert_eq!(limits.cell_ref(16384, 1_048_576).unwrap(), "XFD1048576");
        assert_eq!(limits.cell_ref(0, 1), Err(Error::ColumnOutOfRange(0, MAX_COLS)));
        assert_eq!(
            limits.cell_ref(1, 1_048_577),
            Err(Error::RowOutOfRange(1_048_577, MAX_ROWS))
        );

        let small = SheetLimits {
            max_rows: 10,
            max_cols: 4,
        };
        assert!(small.cell_ref(5, 1).is_err());
    }

    #[test]
    fn test_part_names() {
        let settings = WorkbookSettings::default();
        assert_eq!(settings.worksheet_part_name(2), "xl/worksheets/sheet2.xml");
        assert_eq!(settings.table_part_name(1), "xl/tables/table1.xml");
    }
}
