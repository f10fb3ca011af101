//! `[Content_Types].xml`

use std::io::BufRead;

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use crate::xml::{attr, attribute, XML_DECLARATION};

/// Name of the content types part
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// Content type of the workbook part
pub const CT_WORKBOOK: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
/// Content type of a worksheet part
pub const CT_WORKSHEET: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
/// Content type of a table part
pub const CT_TABLE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.table+xml";
/// Content type of the shared-string part
pub const CT_SHARED_STRINGS: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml";
/// Content type of the calculation chain part
pub const CT_CALC_CHAIN: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.calcChain+xml";

const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

/// Default (by extension) and override (by part name) content types
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentTypes {
    defaults: Vec<(String, String)>,
    overrides: Vec<(String, String)>,
}

impl ContentTypes {
    /// The defaults every spreadsheet package declares
    pub fn new() -> Self {
        Self {
            defaults: vec![
                (
                    "rels".into(),
                    "application/vnd.openxmlformats-package.relationships+xml".into(),
                ),
                ("xml".into(), "application/xml".into()),
            ],
            overrides: Vec::new(),
        }
    }

    /// Parse `[Content_Types].xml`
    pub fn parse<R: BufRead>(reader: R) -> XlsxResult<Self> {
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut types = Self::default();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"Default" => {
                        if let (Some(ext), Some(ct)) =
                            (attr(&e, b"Extension"), attr(&e, b"ContentType"))
                        {
                            types.defaults.push((ext, ct));
                        }
                    }
                    b"Override" => {
                        if let (Some(part), Some(ct)) =
                            (attr(&e, b"PartName"), attr(&e, b"ContentType"))
                        {
                            types.overrides.push((part, ct));
                        }
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(types)
    }

    /// Serialize as `[Content_Types].xml`
    pub fn to_xml(&self) -> String {
        let mut content = format!("{}\n<Types xmlns=\"{}\">", XML_DECLARATION, NS_CONTENT_TYPES);
        for (ext, ct) in &self.defaults {
            content.push_str("<Default");
            content.push_str(&attribute("Extension", ext));
            content.push_str(&attribute("ContentType", ct));
            content.push_str("/>");
        }
        for (part, ct) in &self.overrides {
            content.push_str("<Override");
            content.push_str(&attribute("PartName", part));
            content.push_str(&attribute("ContentType", ct));
            content.push_str("/>");
        }
        content.push_str("</Types>");
        content
    }

    /// Declare the content type of `part_name` (`xl/tables/table1.xml`)
    pub fn add_override(&mut self, part_name: &str, content_type: &str) {
        let key = override_key(part_name);
        match self.overrides.iter_mut().find(|(p, _)| *p == key) {
            Some(entry) => entry.1 = content_type.to_string(),
            None => self.overrides.push((key, content_type.to_string())),
        }
    }

    /// Drop the override for `part_name`; returns whether one existed
    pub fn remove_override(&mut self, part_name: &str) -> bool {
        let key = override_key(part_name);
        let before = self.overrides.len();
        self.overrides.retain(|(p, _)| *p != key);
        self.overrides.len() != before
    }

    /// Content type declared for `part_name`, by override or extension
    pub fn content_type(&self, part_name: &str) -> Option<&str> {
        let key = override_key(part_name);
        if let Some((_, ct)) = self.overrides.iter().find(|(p, _)| *p == key) {
            return Some(ct);
        }
        let ext = part_name.rsplit_once('.').map(|(_, ext)| ext)?;
        self.defaults
            .iter()
            .find(|(e, _)| e.eq_ignore_ascii_case(ext))
            .map(|(_, ct)| ct.as_str())
    }
}

/// Override part names are absolute (`/xl/...`)
fn override_key(part_name: &str) -> String {
    if part_name.starts_with('/') {
        part_name.to_string()
    } else {
        format!("/{}", part_name)
    }
}
