//! Package and part codec errors

use thiserror::Error;

/// Result type for package operations
pub type XlsxResult<T> = std::result::Result<T, XlsxError>;

/// Errors raised while reading, editing or writing an OOXML package
#[derive(Debug, Error)]
pub enum XlsxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The ZIP container could not be read or written
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A part is not well-formed XML
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The package as a whole is not a spreadsheet package
    #[error("Invalid package: {0}")]
    InvalidFormat(String),

    /// A part the package refers to is absent
    #[error("Missing part: {0}")]
    MissingPart(String),

    /// A part is well-formed but its content is not understood
    #[error("Malformed part content: {0}")]
    Parse(String),

    /// The document model rejected a value read from a part
    #[error(transparent)]
    Core(#[from] tally_sheets_core::Error),
}
