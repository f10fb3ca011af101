//! Writing tests - store a model back into a package and re-read it.

use crate::{sales_parts, write_fixture};
use pretty_assertions::assert_eq;
use tally_sheets_core::{CalcChainEntry, CellValue, Workbook};
use tally_sheets_xlsx::{
    Package, PartStore, XlsxReader, XlsxWriter, CALC_CHAIN_PART, SHARED_STRINGS_PART,
    WORKBOOK_PART,
};

#[test]
fn test_untouched_parts_survive_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "sales.xlsx", &sales_parts());
    let mut package = Package::read_file(&path).unwrap();
    let loaded = XlsxReader::read(&package, Default::default()).unwrap();

    XlsxWriter::store_workbook(
        &mut package,
        &loaded.workbook,
        &loaded.workbook_part,
        &loaded.sheet_parts,
    )
    .unwrap();
    let out = dir.path().join("saved.xlsx");
    package.write_file(&out).unwrap();

    let reopened = Package::read_file(&out).unwrap();
    assert_eq!(reopened.part("xl/styles.xml"), Some(&b"<styleSheet/>"[..]));
    assert_eq!(reopened.part("xl/tables/table1.xml"), package.part("xl/tables/table1.xml"));

    let again = XlsxReader::read(&reopened, Default::default()).unwrap();
    let before = loaded.workbook.worksheet(0).unwrap();
    let after = again.workbook.worksheet(0).unwrap();
    assert_eq!(after, before);
    assert_eq!(again.workbook.calc_chain(), loaded.workbook.calc_chain());
}

#[test]
fn test_emptied_calc_chain_is_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "sales.xlsx", &sales_parts());
    let mut package = Package::read_file(&path).unwrap();
    let mut loaded = XlsxReader::read(&package, Default::default()).unwrap();

    loaded.workbook.calc_chain_mut().entries_mut().clear();
    XlsxWriter::store_workbook(
        &mut package,
        &loaded.workbook,
        &loaded.workbook_part,
        &loaded.sheet_parts,
    )
    .unwrap();

    assert!(package.load_part(CALC_CHAIN_PART).is_none());
    let types = package.content_types().unwrap();
    assert_eq!(types.content_type(CALC_CHAIN_PART), Some("application/xml"));
}

#[test]
fn test_new_workbook_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("new.xlsx");

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.worksheet_mut(0).unwrap();
        sheet.set_cell_number("A1", 2.0).unwrap();
    }
    let idx = workbook.shared_strings_mut().get_or_insert("label");
    workbook
        .worksheet_mut(0)
        .unwrap()
        .set_cell_value("B1", CellValue::shared_string(idx))
        .unwrap();
    workbook.calc_chain_mut().push(CalcChainEntry::new(1, "A1"));

    XlsxWriter::write_file(&workbook, &out).unwrap();

    let package = Package::read_file(&out).unwrap();
    assert!(package.contains(WORKBOOK_PART));
    assert!(package.contains(SHARED_STRINGS_PART));
    assert!(package.contains(CALC_CHAIN_PART));

    let loaded = XlsxReader::read(&package, Default::default()).unwrap();
    let sheet = loaded.workbook.worksheet(0).unwrap();
    let text = sheet
        .cell("B1")
        .unwrap()
        .unwrap()
        .value
        .text(loaded.workbook.shared_strings());
    assert_eq!(text, Some("label"));
}
