//! In-memory OOXML package
//!
//! A [`Package`] holds every part of a spreadsheet file as raw bytes, keyed
//! by part name. Parts this library does not model are carried through
//! unchanged when the package is written back.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use log::debug;

use crate::content_types::{ContentTypes, CONTENT_TYPES_PART};
use crate::error::{XlsxError, XlsxResult};
use crate::relationships::{
    relative_target, rels_part_name, resolve_target, Relationships,
};

/// Access to package parts and the relationships between them
///
/// Structural edits only need this narrow view of a package: they load and
/// rewrite table parts and release relationships of removed structures.
pub trait PartStore {
    /// Raw bytes of a part
    fn load_part(&self, path: &str) -> Option<&[u8]>;

    /// Create or replace a part
    fn save_part(&mut self, path: &str, data: Vec<u8>);

    /// Remove a part together with its content type declaration
    fn remove_part(&mut self, path: &str) -> XlsxResult<()>;

    /// Resolved part name (or external URL) of relationship `id` of `source_part`
    fn relationship_target(&self, source_part: &str, id: &str) -> XlsxResult<Option<String>>;

    /// Remove relationship `id` from `source_part`
    fn delete_relationship(&mut self, source_part: &str, id: &str) -> XlsxResult<()>;
}

/// All parts of a spreadsheet package
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Package {
    parts: BTreeMap<String, Vec<u8>>,
}

impl Package {
    /// Create an empty package
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a package from a file path
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<Self> {
        let file = File::open(path)?;
        Self::read(BufReader::new(file))
    }

    /// Read a package from a ZIP stream
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Self> {
        let mut archive = zip::ZipArchive::new(reader)?;

        // Verify this is an OOXML package
        if archive.by_name(CONTENT_TYPES_PART).is_err() {
            return Err(XlsxError::InvalidFormat(format!(
                "Missing {}",
                CONTENT_TYPES_PART
            )));
        }

        let mut parts = BTreeMap::new();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().trim_start_matches('/').to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            parts.insert(name, data);
        }

        debug!("read package with {} parts", parts.len());
        Ok(Self { parts })
    }

    /// Write the package to a file path
    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> XlsxResult<()> {
        let file = File::create(path)?;
        self.write(BufWriter::new(file))
    }

    /// Write the package as a ZIP stream
    ///
    /// `[Content_Types].xml` is stored first, as consumers expect.
    pub fn write<W: Write + Seek>(&self, writer: W) -> XlsxResult<()> {
        let mut zip = zip::ZipWriter::new(writer);
        let options = zip::write::SimpleFileOptions::default();

        if let Some(data) = self.parts.get(CONTENT_TYPES_PART) {
            zip.start_file(CONTENT_TYPES_PART, options)?;
            zip.write_all(data)?;
        }

        for (name, data) in &self.parts {
            if name == CONTENT_TYPES_PART {
                continue;
            }
            zip.start_file(name.as_str(), options)?;
            zip.write_all(data)?;
        }

        zip.finish()?;
        Ok(())
    }

    /// Get a part's bytes
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts.get(name).map(Vec::as_slice)
    }

    /// Get a required part's bytes
    pub fn require_part(&self, name: &str) -> XlsxResult<&[u8]> {
        self.part(name)
            .ok_or_else(|| XlsxError::MissingPart(name.to_string()))
    }

    /// Check if a part exists
    pub fn contains(&self, name: &str) -> bool {
        self.parts.contains_key(name)
    }

    /// Create or replace a part
    pub fn set_part<N: Into<String>, D: Into<Vec<u8>>>(&mut self, name: N, data: D) {
        self.parts.insert(name.into(), data.into());
    }

    /// Remove a part's bytes only, leaving its content type declaration
    pub fn take_part(&mut self, name: &str) -> Option<Vec<u8>> {
        self.parts.remove(name)
    }

    /// Iterate over all part names in order
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.keys().map(String::as_str)
    }

    /// Relationships owned by `source_part` (empty if it owns none)
    pub fn relationships(&self, source_part: &str) -> XlsxResult<Relationships> {
        match self.part(&rels_part_name(source_part)) {
            Some(data) => Relationships::parse(data),
            None => Ok(Relationships::new()),
        }
    }

    /// Store the relationships of `source_part`, dropping the part when empty
    pub fn set_relationships(&mut self, source_part: &str, rels: &Relationships) {
        let name = rels_part_name(source_part);
        if rels.is_empty() {
            self.parts.remove(&name);
        } else {
            self.set_part(name, rels.to_xml());
        }
    }

    /// Add a relationship from `source_part` to the part `target_part`
    pub fn add_relationship(
        &mut self,
        source_part: &str,
        rel_type: &str,
        target_part: &str,
    ) -> XlsxResult<String> {
        let mut rels = self.relationships(source_part)?;
        let id = rels.add(rel_type, &relative_target(source_part, target_part));
        self.set_relationships(source_part, &rels);
        Ok(id)
    }

    /// Add a relationship from `source_part` to an external URL
    pub fn add_external_relationship(
        &mut self,
        source_part: &str,
        rel_type: &str,
        url: &str,
    ) -> XlsxResult<String> {
        let mut rels = self.relationships(source_part)?;
        let id = rels.add_external(rel_type, url);
        self.set_relationships(source_part, &rels);
        Ok(id)
    }

    /// Parsed `[Content_Types].xml` (defaults only if the part is missing)
    pub fn content_types(&self) -> XlsxResult<ContentTypes> {
        match self.part(CONTENT_TYPES_PART) {
            Some(data) => ContentTypes::parse(data),
            None => Ok(ContentTypes::new()),
        }
    }

    /// Store `[Content_Types].xml`
    pub fn set_content_types(&mut self, types: &ContentTypes) {
        self.set_part(CONTENT_TYPES_PART, types.to_xml());
    }

    /// Declare the content type of a part
    pub fn add_content_type_override(
        &mut self,
        part_name: &str,
        content_type: &str,
    ) -> XlsxResult<()> {
        let mut types = self.content_types()?;
        types.add_override(part_name, content_type);
        self.set_content_types(&types);
        Ok(())
    }

    /// Make sure `source_part` has a relationship of `rel_type` to `target_part`
    /// and the target's content type is declared
    pub fn register_part(
        &mut self,
        source_part: &str,
        target_part: &str,
        rel_type: &str,
        content_type: &str,
    ) -> XlsxResult<()> {
        let rels = self.relationships(source_part)?;
        let linked = rels
            .iter()
            .any(|r| !r.is_external() && resolve_target(source_part, &r.target) == target_part);
        if !linked {
            self.add_relationship(source_part, rel_type, target_part)?;
        }
        self.add_content_type_override(target_part, content_type)
    }

    /// Remove a part along with every relationship of `source_part` pointing
    /// at it
    pub fn unregister_part(&mut self, source_part: &str, target_part: &str) -> XlsxResult<()> {
        let mut rels = self.relationships(source_part)?;
        let ids: Vec<String> = rels
            .iter()
            .filter(|r| !r.is_external() && resolve_target(source_part, &r.target) == target_part)
            .map(|r| r.id.clone())
            .collect();
        for id in &ids {
            rels.remove(id);
        }
        self.set_relationships(source_part, &rels);
        self.remove_part(target_part)
    }
}

impl PartStore for Package {
    fn load_part(&self, path: &str) -> Option<&[u8]> {
        self.part(path)
    }

    fn save_part(&mut self, path: &str, data: Vec<u8>) {
        self.set_part(path, data);
    }

    fn remove_part(&mut self, path: &str) -> XlsxResult<()> {
        if self.parts.remove(path).is_none() {
            debug!("part {} was already absent", path);
        }
        // A removed part also drops the relationships it owned
        self.parts.remove(&rels_part_name(path));

        let mut types = self.content_types()?;
        if types.remove_override(path) {
            self.set_content_types(&types);
        }
        Ok(())
    }

    fn relationship_target(&self, source_part: &str, id: &str) -> XlsxResult<Option<String>> {
        let rels = self.relationships(source_part)?;
        Ok(rels.get(id).map(|rel| {
            if rel.is_external() {
                rel.target.clone()
            } else {
                resolve_target(source_part, &rel.target)
            }
        }))
    }

    fn delete_relationship(&mut self, source_part: &str, id: &str) -> XlsxResult<()> {
        let mut rels = self.relationships(source_part)?;
        if rels.remove(id).is_none() {
            debug!("relationship {} of {} was already absent", id, source_part);
            return Ok(());
        }
        self.set_relationships(source_part, &rels);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content_types::CT_TABLE;
    use crate::relationships::{REL_TYPE_HYPERLINK, REL_TYPE_TABLE};
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    const SHEET: &str = "xl/worksheets/sheet1.xml";

    fn package_with_table() -> Package {
        let mut package = Package::new();
        package.set_content_types(&ContentTypes::new());
        package.set_part(SHEET, "<worksheet/>");
        package.set_part("xl/tables/table1.xml", "<table/>");
        package
            .register_part(SHEET, "xl/tables/table1.xml", REL_TYPE_TABLE, CT_TABLE)
            .unwrap();
        package
    }

    #[test]
    fn test_register_and_resolve() {
        let package = package_with_table();

        assert_eq!(
            package.relationship_target(SHEET, "rId1").unwrap().as_deref(),
            Some("xl/tables/table1.xml")
        );
        assert_eq!(package.relationship_target(SHEET, "rId9").unwrap(), None);
        assert_eq!(
            package.content_types().unwrap().content_type("xl/tables/table1.xml"),
            Some(CT_TABLE)
        );
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut package = package_with_table();
        package
            .register_part(SHEET, "xl/tables/table1.xml", REL_TYPE_TABLE, CT_TABLE)
            .unwrap();
        assert_eq!(package.relationships(SHEET).unwrap().len(), 1);
    }

    #[test]
    fn test_remove_part_drops_content_type() {
        let mut package = package_with_table();
        package.remove_part("xl/tables/table1.xml").unwrap();

        assert!(!package.contains("xl/tables/table1.xml"));
        assert_eq!(
            package.content_types().unwrap().content_type("xl/tables/table1.xml"),
            Some("application/xml")
        );
    }

    #[test]
    fn test_delete_last_relationship_drops_rels_part() {
        let mut package = package_with_table();
        let link = package
            .add_external_relationship(SHEET, REL_TYPE_HYPERLINK, "https://example.com")
            .unwrap();
        assert_eq!(
            package.relationship_target(SHEET, &link).unwrap().as_deref(),
            Some("https://example.com")
        );

        package.delete_relationship(SHEET, &link).unwrap();
        package.delete_relationship(SHEET, "rId1").unwrap();
        assert!(!package.contains("xl/worksheets/_rels/sheet1.xml.rels"));
    }

    #[test]
    fn test_unregister_part() {
        let mut package = package_with_table();
        package
            .unregister_part(SHEET, "xl/tables/table1.xml")
            .unwrap();

        assert!(package.relationships(SHEET).unwrap().is_empty());
        assert!(!package.contains("xl/tables/table1.xml"));
    }

    #[test]
    fn test_zip_roundtrip() {
        let package = package_with_table();

        let mut buffer = Cursor::new(Vec::new());
        package.write(&mut buffer).unwrap();
        buffer.set_position(0);

        let reread = Package::read(buffer).unwrap();
        assert_eq!(reread, package);
    }

    #[test]
    fn test_read_rejects_non_package() {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buffer);
            zip.start_file("hello.txt", zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(b"hi").unwrap();
            zip.finish().unwrap();
        }
        buffer.set_position(0);

        assert!(matches!(
            Package::read(buffer),
            Err(XlsxError::InvalidFormat(_))
        ));
    }
}
