//! Table definitions
//!
//! A table lives in its own package part (`xl/tables/tableN.xml`). The
//! worksheet only holds a [`TablePart`] pointing at that part through a sheet
//! relationship; the [`Table`] definition is loaded on demand.

use crate::filter::AutoFilter;

/// Reference from a worksheet to a table part (`<tablePart r:id="..."/>`)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TablePart {
    /// Relationship id in the sheet's relationship part
    pub relationship_id: String,
}

impl TablePart {
    /// Create a table part reference
    pub fn new<S: Into<String>>(relationship_id: S) -> Self {
        Self {
            relationship_id: relationship_id.into(),
        }
    }
}

/// One column of a table
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TableColumn {
    /// 1-based column id within the table
    pub id: u32,
    /// Column name, mirrored by the header cell
    pub name: String,
    /// Other attributes (`totalsRowFunction`, `dataDxfId`, ...), in document
    /// order
    pub attributes: Vec<(String, String)>,
    /// Child elements (`calculatedColumnFormula`, `totalsRowFormula`, ...),
    /// as XML
    pub content: String,
}

impl TableColumn {
    /// Create a column with nothing but an id and a name
    pub fn new<S: Into<String>>(id: u32, name: S) -> Self {
        Self {
            id,
            name: name.into(),
            attributes: Vec::new(),
            content: String::new(),
        }
    }
}

/// Table style settings (`<tableStyleInfo>`)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TableStyleInfo {
    /// Style name, e.g. `TableStyleMedium2`
    pub name: Option<String>,
    pub show_first_column: bool,
    pub show_last_column: bool,
    pub show_row_stripes: bool,
    pub show_column_stripes: bool,
}

impl Default for TableStyleInfo {
    fn default() -> Self {
        Self {
            name: Some("TableStyleMedium2".into()),
            show_first_column: false,
            show_last_column: false,
            show_row_stripes: true,
            show_column_stripes: false,
        }
    }
}

/// A table definition
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Table {
    /// Workbook-unique table id
    pub id: u32,
    /// Table name
    pub name: String,
    /// Name shown in the UI and used by structured references
    pub display_name: String,
    /// Covered range, header row included
    pub reference: String,
    /// Number of header rows (0 or 1)
    pub header_row_count: u32,
    /// Whether a totals row has ever been shown
    pub totals_row_shown: bool,
    /// Autofilter attached to the table; tracks `reference`
    pub auto_filter: Option<AutoFilter>,
    /// Table columns, left to right
    pub columns: Vec<TableColumn>,
    /// Style settings
    pub style: Option<TableStyleInfo>,
    /// Other attributes of `<table>` (`totalsRowCount`, namespace
    /// declarations, ...), in document order
    pub attributes: Vec<(String, String)>,
    /// `<sortState>`, as XML
    pub sort_state: Option<String>,
    /// Trailing child elements (`extLst`), as XML
    pub extra: Vec<String>,
}

impl Table {
    /// Create a table over `reference` with a header row and an autofilter
    pub fn new<S: Into<String>, R: Into<String>>(id: u32, name: S, reference: R) -> Self {
        let name = name.into();
        let reference = reference.into();
        Self {
            id,
            display_name: name.clone(),
            name,
            auto_filter: Some(AutoFilter::new(reference.clone())),
            reference,
            header_row_count: 1,
            totals_row_shown: false,
            columns: Vec::new(),
            style: Some(TableStyleInfo::default()),
            attributes: Vec::new(),
            sort_state: None,
            extra: Vec::new(),
        }
    }

    /// Check if the table shows a header row
    pub fn has_header_row(&self) -> bool {
        self.header_row_count > 0
    }
}
