//! Calculation chain
//!
//! The calculation chain (`xl/calcChain.xml`) lists, in order, the cells the
//! last calculation visited. It is document-wide, so every entry names the
//! sheet it belongs to.

/// One calculation chain entry
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CalcChainEntry {
    /// Sheet id (`sheetId` in `workbook.xml`) of the owning worksheet
    pub sheet_id: u32,
    /// Cell reference ("B6")
    pub reference: String,
}

impl CalcChainEntry {
    /// Create an entry
    pub fn new<S: Into<String>>(sheet_id: u32, reference: S) -> Self {
        Self {
            sheet_id,
            reference: reference.into(),
        }
    }
}

/// Ordered list of calculation chain entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalcChain {
    entries: Vec<CalcChainEntry>,
}

impl CalcChain {
    /// Create an empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a chain from entries in order
    pub fn from_entries(entries: Vec<CalcChainEntry>) -> Self {
        Self { entries }
    }

    /// Append an entry
    pub fn push(&mut self, entry: CalcChainEntry) {
        self.entries.push(entry);
    }

    /// Get all entries
    pub fn entries(&self) -> &[CalcChainEntry] {
        &self.entries
    }

    /// Get a mutable reference to all entries
    pub fn entries_mut(&mut self) -> &mut Vec<CalcChainEntry> {
        &mut self.entries
    }

    /// Entries belonging to sheet `sheet_id`
    pub fn entries_for_sheet(&self, sheet_id: u32) -> impl Iterator<Item = &CalcChainEntry> {
        self.entries.iter().filter(move |e| e.sheet_id == sheet_id)
    }

    /// Remove the entry for one cell, if present
    pub fn remove_cell(&mut self, sheet_id: u32, reference: &str) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|e| !(e.sheet_id == sheet_id && e.reference == reference));
        self.entries.len() != before
    }

    /// Get the number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the chain is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
