//! Model reading: sheets, shared strings, formulas and the calc chain.

use crate::{sales_parts, write_fixture};
use pretty_assertions::assert_eq;
use tally_sheets_core::{CalcChainEntry, CellValue, Formula};
use tally_sheets_xlsx::{read_table, Package, XlsxReader};

fn load() -> tally_sheets_xlsx::LoadedWorkbook {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "sales.xlsx", &sales_parts());
    let package = Package::read_file(&path).unwrap();
    XlsxReader::read(&package, Default::default()).unwrap()
}

#[test]
fn test_sheet_entries() {
    let loaded = load();

    assert_eq!(loaded.workbook_part, "xl/workbook.xml");
    assert_eq!(loaded.sheet_parts, vec!["xl/worksheets/sheet1.xml"]);
    let sheet = loaded.workbook.worksheet(0).unwrap();
    assert_eq!(sheet.name(), "Sales");
    assert_eq!(sheet.sheet_id(), 3);
}

#[test]
fn test_header_text_through_shared_strings() {
    let loaded = load();
    let sheet = loaded.workbook.worksheet(0).unwrap();
    let strings = loaded.workbook.shared_strings();

    let header: Vec<_> = ["A1", "B1", "C1"]
        .iter()
        .map(|r| sheet.cell(r).unwrap().unwrap().value.text(strings).unwrap())
        .collect();
    assert_eq!(header, vec!["North", "South", "Total"]);
}

#[test]
fn test_shared_formula_group() {
    let loaded = load();
    let sheet = loaded.workbook.worksheet(0).unwrap();

    assert_eq!(
        sheet.formula("C2").unwrap(),
        Some(&Formula::shared_anchor(0, "A2+B2", "C2:C4"))
    );
    assert_eq!(sheet.formula("C4").unwrap(), Some(&Formula::shared_member(0)));
    assert_eq!(sheet.cell("C4").unwrap().unwrap().value, CellValue::number(11.0));
}

#[test]
fn test_calc_chain_and_structures() {
    let loaded = load();
    let sheet = loaded.workbook.worksheet(0).unwrap();

    assert_eq!(
        loaded.workbook.calc_chain().entries(),
        &[
            CalcChainEntry::new(3, "C2"),
            CalcChainEntry::new(3, "C3"),
            CalcChainEntry::new(3, "C4"),
        ]
    );
    assert_eq!(sheet.merged_cells(), &["E1:F2".to_string()]);
    assert_eq!(sheet.hyperlinks()[0].relationship_id(), Some("rId2"));
    assert_eq!(sheet.table_parts()[0].relationship_id, "rId1");
}

#[test]
fn test_table_part_on_demand() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "sales.xlsx", &sales_parts());
    let package = Package::read_file(&path).unwrap();

    let table = read_table(package.part("xl/tables/table1.xml").unwrap()).unwrap();
    assert_eq!(table.reference, "A1:C4");
    let names: Vec<_> = table.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["North", "South", "Total"]);
}
