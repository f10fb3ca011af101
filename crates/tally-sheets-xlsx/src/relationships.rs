//! Relationship parts (`_rels/*.rels`)
//!
//! Every package part may own a relationship part listing the parts (or
//! external resources) it points at. Targets are stored relative to the
//! folder of the source part.

use std::io::BufRead;

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use crate::xml::{attr, attribute, XML_DECLARATION};

/// Namespace of relationship parts
const NS_PACKAGE_RELATIONSHIPS: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships";

/// Relationship type of the main workbook part
pub const REL_TYPE_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
/// Relationship type of a worksheet part
pub const REL_TYPE_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
/// Relationship type of a table part
pub const REL_TYPE_TABLE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/table";
/// Relationship type of an external hyperlink target
pub const REL_TYPE_HYPERLINK: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
/// Relationship type of the shared-string part
pub const REL_TYPE_SHARED_STRINGS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings";
/// Relationship type of the calculation chain part
pub const REL_TYPE_CALC_CHAIN: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/calcChain";

/// One `<Relationship>` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship id (`rId3`)
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target, relative to the source part's folder unless external
    pub target: String,
    /// `External` for targets outside the package
    pub target_mode: Option<String>,
}

impl Relationship {
    /// Check if the target lives outside the package
    pub fn is_external(&self) -> bool {
        self.target_mode.as_deref() == Some("External")
    }
}

/// The relationships owned by one source part
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relationships {
    items: Vec<Relationship>,
}

impl Relationships {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a relationship part
    pub fn parse<R: BufRead>(reader: R) -> XlsxResult<Self> {
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut items = Vec::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    let id = attr(&e, b"Id");
                    let target = attr(&e, b"Target");
                    let rel_type = attr(&e, b"Type");

                    match (id, target, rel_type) {
                        (Some(id), Some(target), Some(rel_type)) => items.push(Relationship {
                            id,
                            rel_type,
                            target,
                            target_mode: attr(&e, b"TargetMode"),
                        }),
                        _ => {
                            return Err(XlsxError::Parse(
                                "Relationship without Id, Type or Target".into(),
                            ))
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(Self { items })
    }

    /// Serialize as a relationship part
    pub fn to_xml(&self) -> String {
        let mut content = format!(
            "{}\n<Relationships xmlns=\"{}\">",
            XML_DECLARATION, NS_PACKAGE_RELATIONSHIPS
        );
        for rel in &self.items {
            content.push_str("<Relationship");
            content.push_str(&attribute("Id", &rel.id));
            content.push_str(&attribute("Type", &rel.rel_type));
            content.push_str(&attribute("Target", &rel.target));
            if let Some(mode) = &rel.target_mode {
                content.push_str(&attribute("TargetMode", mode));
            }
            content.push_str("/>");
        }
        content.push_str("</Relationships>");
        content
    }

    /// Get a relationship by id
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.items.iter().find(|r| r.id == id)
    }

    /// Find the first relationship of a type
    pub fn find_by_type(&self, rel_type: &str) -> Option<&Relationship> {
        self.items.iter().find(|r| r.rel_type == rel_type)
    }

    /// Remove a relationship by id
    pub fn remove(&mut self, id: &str) -> Option<Relationship> {
        let pos = self.items.iter().position(|r| r.id == id)?;
        Some(self.items.remove(pos))
    }

    /// Add an internal relationship and return its new id
    pub fn add(&mut self, rel_type: &str, target: &str) -> String {
        self.push(rel_type, target, None)
    }

    /// Add a relationship to an external resource and return its new id
    pub fn add_external(&mut self, rel_type: &str, target: &str) -> String {
        self.push(rel_type, target, Some("External".into()))
    }

    fn push(&mut self, rel_type: &str, target: &str, target_mode: Option<String>) -> String {
        let id = format!("rId{}", self.next_id());
        self.items.push(Relationship {
            id: id.clone(),
            rel_type: rel_type.into(),
            target: target.into(),
            target_mode,
        });
        id
    }

    /// One past the highest numeric `rIdN` in use
    fn next_id(&self) -> u32 {
        self.items
            .iter()
            .filter_map(|r| r.id.strip_prefix("rId").and_then(|n| n.parse::<u32>().ok()))
            .max()
            .map_or(1, |n| n + 1)
    }

    /// Iterate over all relationships
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.items.iter()
    }

    /// Get the number of relationships
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if there are no relationships
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Name of the relationship part owned by `source_part`
///
/// `xl/worksheets/sheet1.xml` owns `xl/worksheets/_rels/sheet1.xml.rels`.
pub fn rels_part_name(source_part: &str) -> String {
    match source_part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", source_part),
    }
}

/// Resolve a relationship target against the folder of its source part
///
/// Absolute targets (`/xl/...`) are taken from the package root.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return normalize_path(absolute);
    }
    let dir = source_part.rsplit_once('/').map_or("", |(dir, _)| dir);
    if dir.is_empty() {
        normalize_path(target)
    } else {
        normalize_path(&format!("{}/{}", dir, target))
    }
}

/// Target of `target_part` written relative to the folder of `source_part`
pub fn relative_target(source_part: &str, target_part: &str) -> String {
    let source_dir: Vec<&str> = source_part
        .rsplit_once('/')
        .map_or(Vec::new(), |(dir, _)| dir.split('/').collect());
    let target: Vec<&str> = target_part.split('/').collect();

    let common = source_dir
        .iter()
        .zip(&target)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = vec![".."; source_dir.len() - common];
    parts.extend(&target[common..]);
    parts.join("/")
}

fn normalize_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}
