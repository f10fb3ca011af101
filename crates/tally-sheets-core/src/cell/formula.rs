//! Cell formulas

/// Kind of a cell formula, as stored in the `t` attribute of `<f>`
///
/// The set of kinds is fixed by the file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FormulaKind {
    /// A formula owned by a single cell
    #[default]
    Normal,
    /// Member of a shared formula group identified by `index` (the `si` attribute)
    Shared {
        /// Group index shared by every cell of the group
        index: u32,
    },
    /// Legacy array (CSE) formula spanning `Formula::reference`
    Array,
    /// What-if data table
    DataTable,
}

/// A formula attached to a cell
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Formula {
    /// Formula kind
    pub kind: FormulaKind,
    /// Formula text, without the leading `=` as stored in the package.
    ///
    /// Only the anchor of a shared group carries text; other members are empty.
    pub text: String,
    /// Declared extent (`ref` attribute) for shared, array and data table formulas
    pub reference: Option<String>,
}

impl Formula {
    /// A plain single-cell formula
    pub fn normal<S: Into<String>>(text: S) -> Self {
        Self {
            kind: FormulaKind::Normal,
            text: text.into(),
            reference: None,
        }
    }

    /// An array formula covering `reference`
    pub fn array<S: Into<String>, R: Into<String>>(text: S, reference: R) -> Self {
        Self {
            kind: FormulaKind::Array,
            text: text.into(),
            reference: Some(reference.into()),
        }
    }

    /// The anchor of shared group `index`, covering `reference`
    pub fn shared_anchor<S: Into<String>, R: Into<String>>(
        index: u32,
        text: S,
        reference: R,
    ) -> Self {
        Self {
            kind: FormulaKind::Shared { index },
            text: text.into(),
            reference: Some(reference.into()),
        }
    }

    /// A dependent member of shared group `index` (no text, no extent)
    pub fn shared_member(index: u32) -> Self {
        Self {
            kind: FormulaKind::Shared { index },
            text: String::new(),
            reference: None,
        }
    }

    /// Group index if this is a shared formula
    pub fn shared_index(&self) -> Option<u32> {
        match self.kind {
            FormulaKind::Shared { index } => Some(index),
            _ => None,
        }
    }

    /// The declared extent, if present and non-empty
    pub fn range_ref(&self) -> Option<&str> {
        self.reference.as_deref().filter(|r| !r.is_empty())
    }

    /// Whether this formula is the anchor of shared group `index`
    pub fn is_shared_anchor_of(&self, index: u32) -> bool {
        self.shared_index() == Some(index) && self.range_ref().is_some()
    }
}
