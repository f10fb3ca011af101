//! Cell value slot and the shared string table

use ahash::AHashMap;
use std::sync::Arc;

/// Type tag of a cell's raw value, as stored in the `t` attribute of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellType {
    /// Numeric value (`n`, also the default when `t` is absent)
    #[default]
    Number,
    /// Index into the workbook's shared string table (`s`)
    SharedString,
    /// String stored inline in the cell (`inlineStr`)
    InlineString,
    /// Boolean stored as `0`/`1` (`b`)
    Boolean,
    /// Error literal such as `#REF!` (`e`)
    Error,
    /// Cached string result of a formula (`str`)
    FormulaString,
}

impl CellType {
    /// Parse the OOXML `t` attribute value
    pub fn from_xlsx(s: &str) -> Option<Self> {
        match s {
            "n" => Some(CellType::Number),
            "s" => Some(CellType::SharedString),
            "inlineStr" => Some(CellType::InlineString),
            "b" => Some(CellType::Boolean),
            "e" => Some(CellType::Error),
            "str" => Some(CellType::FormulaString),
            _ => None,
        }
    }

    /// The OOXML `t` attribute value
    pub fn to_xlsx(self) -> &'static str {
        match self {
            CellType::Number => "n",
            CellType::SharedString => "s",
            CellType::InlineString => "inlineStr",
            CellType::Boolean => "b",
            CellType::Error => "e",
            CellType::FormulaString => "str",
        }
    }
}

/// The raw value slot of a cell: text as stored in the package plus its type tag
///
/// Interpreting the raw text (number parsing, date conversion, number formats)
/// is left to callers; the document engine only moves values around.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellValue {
    /// Type tag
    pub kind: CellType,
    /// Raw text (empty for a blank cell)
    pub raw: String,
}

impl CellValue {
    /// Create a value from a type tag and raw text
    pub fn new<S: Into<String>>(kind: CellType, raw: S) -> Self {
        Self {
            kind,
            raw: raw.into(),
        }
    }

    /// A numeric value
    pub fn number(n: f64) -> Self {
        Self::new(CellType::Number, n.to_string())
    }

    /// A boolean value
    pub fn boolean(b: bool) -> Self {
        Self::new(CellType::Boolean, if b { "1" } else { "0" })
    }

    /// An inline string value
    pub fn inline_string<S: Into<String>>(s: S) -> Self {
        Self::new(CellType::InlineString, s)
    }

    /// A reference to entry `index` of the shared string table
    pub fn shared_string(index: u32) -> Self {
        Self::new(CellType::SharedString, index.to_string())
    }

    /// Check if the slot is empty
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Resolve the value to display text, looking shared strings up in `strings`
    pub fn text<'a>(&'a self, strings: &'a SharedStringTable) -> Option<&'a str> {
        match self.kind {
            CellType::SharedString => self.raw.parse::<u32>().ok().and_then(|i| strings.get(i)),
            _ if self.raw.is_empty() => None,
            _ => Some(self.raw.as_str()),
        }
    }
}

/// Workbook-wide shared string table
///
/// Each unique string is stored once and addressed by its insertion index,
/// matching the layout of `xl/sharedStrings.xml`. The table is owned by its
/// workbook, so separately opened documents never share entries.
#[derive(Debug, Default, Clone)]
pub struct SharedStringTable {
    strings: Vec<Arc<str>>,
    index: AHashMap<Arc<str>, u32>,
}

impl SharedStringTable {
    /// Create a new empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from strings in index order (e.g. when loading a package)
    ///
    /// Duplicate entries keep their own slot; lookups resolve to the first one.
    pub fn from_strings<I, S>(strings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = Self::new();
        for s in strings {
            let arc: Arc<str> = Arc::from(s.as_ref());
            let idx = table.strings.len() as u32;
            table.index.entry(arc.clone()).or_insert(idx);
            table.strings.push(arc);
        }
        table
    }

    /// Get the index of `s`, inserting it if it is not present yet
    ///
    /// Two calls with the same text always converge on a single entry.
    pub fn get_or_insert<S: AsRef<str>>(&mut self, s: S) -> u32 {
        let s = s.as_ref();
        if let Some(&idx) = self.index.get(s) {
            return idx;
        }
        let arc: Arc<str> = Arc::from(s);
        let idx = self.strings.len() as u32;
        self.strings.push(arc.clone());
        self.index.insert(arc, idx);
        idx
    }

    /// Get a string by index
    pub fn get(&self, index: u32) -> Option<&str> {
        self.strings.get(index as usize).map(|s| s.as_ref())
    }

    /// Look up the index of an existing string
    pub fn position(&self, s: &str) -> Option<u32> {
        self.index.get(s).copied()
    }

    /// Iterate over strings in index order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.strings.iter().map(|s| s.as_ref())
    }

    /// Get the number of entries
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
