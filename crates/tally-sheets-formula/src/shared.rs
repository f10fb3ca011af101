//! Shared formula groups
//!
//! A shared formula is stored once, on the anchor cell of its group, together
//! with the extent (`ref`) it covers. Every other member only records the group
//! index; its text is reconstructed by shifting the anchor's text by the
//! distance between the two cells.

use tally_sheets_core::{CellAddress, Formula, RangeRef, SheetLimits, Worksheet};

use crate::error::FormulaResult;
use crate::shift::shift_formula_text_within;

/// Reconstruct the formula of `target` as a member of shared group `index`
///
/// The result carries a leading `=`. Returns an empty string when the group
/// has no anchor.
///
/// # Examples
/// ```
/// use tally_sheets_core::{Formula, Worksheet};
/// use tally_sheets_formula::resolve_shared_formula;
///
/// let mut sheet = Worksheet::new("Sheet1");
/// sheet.set_cell_formula("C1", Formula::shared_anchor(0, "A1+B1", "C1:C5")).unwrap();
///
/// assert_eq!(resolve_shared_formula(&sheet, 0, "C3").unwrap(), "=A3+B3");
/// assert_eq!(resolve_shared_formula(&sheet, 7, "C3").unwrap(), "");
/// ```
pub fn resolve_shared_formula(
    worksheet: &Worksheet,
    index: u32,
    target: &str,
) -> FormulaResult<String> {
    resolve_shared_formula_within(worksheet, index, target, &SheetLimits::default())
}

/// [`resolve_shared_formula`] against custom sheet limits
pub fn resolve_shared_formula_within(
    worksheet: &Worksheet,
    index: u32,
    target: &str,
    limits: &SheetLimits,
) -> FormulaResult<String> {
    let target = CellAddress::parse(target)?;

    let Some((col, row, anchor)) = find_anchor(worksheet, index) else {
        return Ok(String::new());
    };

    let col_offset = target.col as i64 - col as i64;
    let row_offset = target.row as i64 - row as i64;
    let text = anchor.text.strip_prefix('=').unwrap_or(&anchor.text);

    Ok(format!(
        "={}",
        shift_formula_text_within(text, col_offset, row_offset, limits)
    ))
}

/// The anchor of shared group `index` as `(col, row, formula)`
pub fn find_anchor(worksheet: &Worksheet, index: u32) -> Option<(u32, u32, &Formula)> {
    worksheet
        .formula_cells()
        .find(|(_, _, formula)| formula.is_shared_anchor_of(index))
}

/// Next unused shared group index: one past the highest in use, or 0
pub fn next_shared_group_index(worksheet: &Worksheet) -> u32 {
    worksheet
        .formula_cells()
        .filter_map(|(_, _, formula)| formula.shared_index())
        .max()
        .map_or(0, |max| max + 1)
}

/// Fill `range` with a new shared formula group and return its index
///
/// The top-left cell becomes the anchor holding `text` and the normalized
/// range; every other cell joins the group without text. Cells are created
/// where missing and keep their values and styles.
pub fn establish_shared_formula(
    worksheet: &mut Worksheet,
    range: &str,
    text: &str,
) -> FormulaResult<u32> {
    let range = RangeRef::parse(range)?.normalized();
    let index = next_shared_group_index(worksheet);
    let text = text.strip_prefix('=').unwrap_or(text);
    let anchor = range.top_left();

    for addr in range.cells() {
        let formula = if addr == anchor {
            Formula::shared_anchor(index, text, range.to_string())
        } else {
            Formula::shared_member(index)
        };
        worksheet.cell_entry(addr.col, addr.row).formula = Some(formula);
    }

    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tally_sheets_core::FormulaKind;

    fn sheet_with_group() -> Worksheet {
        let mut sheet = Worksheet::new("Sheet1");
        sheet
            .set_cell_formula("C1", Formula::shared_anchor(0, "A1+B1", "C1:C5"))
            .unwrap();
        for row in 2..=5 {
            sheet.cell_entry(3, row).formula = Some(Formula::shared_member(0));
        }
        sheet
    }

    #[test]
    fn test_resolve_member() {
        let sheet = sheet_with_group();
        assert_eq!(resolve_shared_formula(&sheet, 0, "C3").unwrap(), "=A3+B3");
        assert_eq!(resolve_shared_formula(&sheet, 0, "C1").unwrap(), "=A1+B1");
        assert_eq!(resolve_shared_formula(&sheet, 0, "D5").unwrap(), "=B5+C5");
    }

    #[test]
    fn test_resolve_without_anchor_is_empty() {
        let sheet = sheet_with_group();
        assert_eq!(resolve_shared_formula(&sheet, 1, "C3").unwrap(), "");
    }

    #[test]
    fn test_resolve_rejects_bad_target() {
        let sheet = sheet_with_group();
        assert!(resolve_shared_formula(&sheet, 0, "3C").is_err());
    }

    #[test]
    fn test_member_with_empty_ref_is_not_an_anchor() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.cell_entry(1, 1).formula = Some(Formula::shared_anchor(0, "B1", ""));
        assert!(find_anchor(&sheet, 0).is_none());
    }

    #[test]
    fn test_next_shared_group_index() {
        let mut sheet = Worksheet::new("Sheet1");
        assert_eq!(next_shared_group_index(&sheet), 0);

        sheet.cell_entry(1, 1).formula = Some(Formula::shared_anchor(4, "B1", "A1:A2"));
        sheet.cell_entry(1, 2).formula = Some(Formula::shared_member(4));
        sheet.cell_entry(2, 2).formula = Some(Formula::normal("1+1"));
        assert_eq!(next_shared_group_index(&sheet), 5);
    }

    #[test]
    fn test_establish_shared_formula() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.set_cell_number("B3", 7.0).unwrap();
        sheet.cell_entry(9, 9).formula = Some(Formula::shared_anchor(2, "A1", "I9:I10"));

        let index = establish_shared_formula(&mut sheet, "C4:B2", "=A2*2").unwrap();
        assert_eq!(index, 3);

        let anchor = sheet.formula("B2").unwrap().unwrap();
        assert_eq!(anchor, &Formula::shared_anchor(3, "A2*2", "B2:C4"));

        let member = sheet.cell("B3").unwrap().unwrap();
        assert_eq!(member.formula, Some(Formula::shared_member(3)));
        assert_eq!(member.value.raw, "7");

        let members = sheet
            .formula_cells()
            .filter(|(_, _, f)| f.kind == FormulaKind::Shared { index: 3 })
            .count();
        assert_eq!(members, 6);

        assert_eq!(resolve_shared_formula(&sheet, 3, "C4").unwrap(), "=B4*2");
    }
}
