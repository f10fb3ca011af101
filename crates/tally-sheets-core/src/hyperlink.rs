//! Worksheet hyperlinks

/// Where a hyperlink points
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HyperlinkTarget {
    /// External URL, held by a relationship of the sheet part
    External {
        /// Relationship id (`r:id`)
        relationship_id: String,
    },
    /// Location inside the workbook, e.g. `Sheet2!A1` or a defined name
    Internal {
        /// Location string
        location: String,
    },
}

/// A hyperlink anchored on a cell or a range
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Hyperlink {
    /// Anchor reference ("B2" or "B2:C4")
    pub reference: String,
    /// Link target
    pub target: HyperlinkTarget,
    /// Display text
    pub display: Option<String>,
    /// Tooltip shown on hover
    pub tooltip: Option<String>,
}

impl Hyperlink {
    /// A link to an external resource through relationship `relationship_id`
    pub fn external<R: Into<String>, I: Into<String>>(reference: R, relationship_id: I) -> Self {
        Self {
            reference: reference.into(),
            target: HyperlinkTarget::External {
                relationship_id: relationship_id.into(),
            },
            display: None,
            tooltip: None,
        }
    }

    /// A link to a location inside the workbook
    pub fn internal<R: Into<String>, L: Into<String>>(reference: R, location: L) -> Self {
        Self {
            reference: reference.into(),
            target: HyperlinkTarget::Internal {
                location: location.into(),
            },
            display: None,
            tooltip: None,
        }
    }

    /// Set the display text
    pub fn with_display<S: Into<String>>(mut self, display: S) -> Self {
        self.display = Some(display.into());
        self
    }

    /// Relationship id for external links
    pub fn relationship_id(&self) -> Option<&str> {
        match &self.target {
            HyperlinkTarget::External { relationship_id } => Some(relationship_id),
            HyperlinkTarget::Internal { .. } => None,
        }
    }
}
