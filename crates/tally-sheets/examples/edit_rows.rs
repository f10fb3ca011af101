//! Example: Build a small report, then insert and delete rows around it

use tally_sheets::prelude::*;

fn main() -> Result<()> {
    let mut doc = Document::new()?;

    // Header row
    doc.set_cell_string("Sheet1", "A1", "Name")?;
    doc.set_cell_string("Sheet1", "B1", "Value")?;
    doc.set_cell_string("Sheet1", "C1", "Double")?;

    // Data rows
    doc.set_cell_string("Sheet1", "A2", "Item 1")?;
    doc.set_cell_string("Sheet1", "A3", "Item 2")?;
    doc.set_cell_string("Sheet1", "A4", "Item 3")?;
    {
        let sheet = doc.worksheet_mut("Sheet1")?;
        sheet.set_cell_number("B2", 100.0)?;
        sheet.set_cell_number("B3", 200.0)?;
        sheet.set_cell_number("B4", 300.0)?;
    }
    doc.establish_shared_formula("Sheet1", "C2:C4", "=B2*2")?;
    doc.add_table("Sheet1", "A1:C4", Some("Report"))?;

    // Two rows for a title, then drop the middle item
    doc.insert_rows("Sheet1", 1, 2)?;
    doc.remove_rows("Sheet1", 5, 1)?;

    let sheet = doc.worksheet("Sheet1")?;
    println!("Used range: {:?}", sheet.used_range().map(|r| r.to_string()));
    if let Some(anchor) = sheet.formula("C4")? {
        println!("Shared formula now covers {:?}", anchor.reference);
    }

    doc.save("/tmp/report.xlsx")?;
    println!("Saved /tmp/report.xlsx");

    Ok(())
}
