//! Worksheet autofilter

/// The autofilter range of a worksheet (or of a table)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AutoFilter {
    /// Filtered range, header row included ("A1:D20")
    pub reference: String,
    /// Criteria of individual columns
    pub columns: Vec<FilterColumn>,
    /// Other child elements (`sortState`, `extLst`), as XML
    pub extra: Vec<String>,
}

impl AutoFilter {
    /// Create a filter over `reference`
    pub fn new<S: Into<String>>(reference: S) -> Self {
        Self {
            reference: reference.into(),
            columns: Vec::new(),
            extra: Vec::new(),
        }
    }
}

/// Criteria of one filtered column (`<filterColumn>`)
///
/// The criteria themselves are not interpreted; they are kept as XML and
/// written back as read.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FilterColumn {
    /// 0-based column offset from the first column of the filter range
    pub col_id: u32,
    /// Attributes other than `colId`, in document order
    pub attributes: Vec<(String, String)>,
    /// Child elements (`filters`, `customFilters`, ...), as XML
    pub content: String,
}

impl FilterColumn {
    /// Create an empty criteria entry for column `col_id`
    pub fn new(col_id: u32) -> Self {
        Self {
            col_id,
            attributes: Vec::new(),
            content: String::new(),
        }
    }
}
