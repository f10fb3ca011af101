//! Package-level reading: part discovery, relationships, content types.

use crate::{sales_parts, write_fixture};
use pretty_assertions::assert_eq;
use tally_sheets_xlsx::{
    Package, PartStore, XlsxError, XlsxReader, CT_TABLE, REL_TYPE_HYPERLINK,
};

#[test]
fn test_package_opens() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "sales.xlsx", &sales_parts());

    let package = Package::read_file(&path).unwrap();
    assert!(package.contains("xl/styles.xml"));
    assert_eq!(XlsxReader::workbook_part(&package).unwrap(), "xl/workbook.xml");

    let types = package.content_types().unwrap();
    assert_eq!(types.content_type("xl/tables/table1.xml"), Some(CT_TABLE));
}

#[test]
fn test_relationship_targets_resolve() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "sales.xlsx", &sales_parts());
    let package = Package::read_file(&path).unwrap();

    let sheet = "xl/worksheets/sheet1.xml";
    assert_eq!(
        package.relationship_target(sheet, "rId1").unwrap().as_deref(),
        Some("xl/tables/table1.xml")
    );
    let rels = package.relationships(sheet).unwrap();
    let link = rels.get("rId2").unwrap();
    assert_eq!(link.rel_type, REL_TYPE_HYPERLINK);
    assert!(link.is_external());
}

#[test]
fn test_missing_content_types_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let parts: Vec<_> = sales_parts()
        .into_iter()
        .filter(|(name, _)| *name != "[Content_Types].xml")
        .collect();
    let path = write_fixture(dir.path(), "broken.xlsx", &parts);

    assert!(Package::read_file(&path).is_err());
}

#[test]
fn test_missing_worksheet_part() {
    let dir = tempfile::tempdir().unwrap();
    let parts: Vec<_> = sales_parts()
        .into_iter()
        .filter(|(name, _)| *name != "xl/worksheets/sheet1.xml")
        .collect();
    let path = write_fixture(dir.path(), "no-sheet.xlsx", &parts);
    let package = Package::read_file(&path).unwrap();

    let result = XlsxReader::read(&package, Default::default());
    assert!(matches!(result, Err(XlsxError::MissingPart(_))));
}
