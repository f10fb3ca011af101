//! Column style ranges

/// Column metadata applying to the interval `min..=max` (a `<col>` element)
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColumnRange {
    /// First column (1-based)
    pub min: u32,
    /// Last column (inclusive)
    pub max: u32,
    /// Width in characters
    pub width: Option<f64>,
    /// Hidden
    pub hidden: bool,
    /// Outline level
    pub outline_level: u8,
    /// Style index shared by every column in the interval
    pub style_index: Option<u32>,
}

impl ColumnRange {
    /// Column data for a single column
    pub fn single(index: u32) -> Self {
        Self::range(index, index)
    }

    /// Column data for an interval of columns
    pub fn range(min: u32, max: u32) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
            width: None,
            hidden: false,
            outline_level: 0,
            style_index: None,
        }
    }

    /// Set width
    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    /// Set hidden
    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Set style
    pub fn with_style(mut self, style_index: u32) -> Self {
        self.style_index = Some(style_index);
        self
    }

    /// Check if `col` falls inside the interval
    pub fn contains(&self, col: u32) -> bool {
        col >= self.min && col <= self.max
    }

    /// Check if two intervals share a column
    pub fn overlaps(&self, other: &ColumnRange) -> bool {
        self.min <= other.max && other.min <= self.max
    }
}
