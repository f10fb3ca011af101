//! Hyperlink anchors

use log::{debug, warn};

use tally_sheets_core::Worksheet;
use tally_sheets_xlsx::PartStore;

use super::{parse_stored_range, LineEdit};

/// Remove links anchored on a deleted line or pushed off the sheet, and
/// shift the rest
///
/// The external relationship of a removed link is released from the sheet
/// part. A relationship that cannot be released is logged and left behind.
pub(super) fn adjust<S: PartStore + ?Sized>(
    worksheet: &mut Worksheet,
    parts: &mut S,
    sheet_part: &str,
    edit: &LineEdit,
    limit: u32,
) {
    let mut released = Vec::new();

    worksheet.hyperlinks_mut().retain_mut(|link| {
        let Some(range) = parse_stored_range("hyperlink", &link.reference) else {
            return true;
        };

        let shifted = if edit.deletes(edit.coordinate(range.x1, range.y1)) {
            None
        } else {
            edit.shift_range_within(range, limit)
        };
        let Some(shifted) = shifted else {
            debug!("removing hyperlink at {}", link.reference);
            if let Some(id) = link.relationship_id() {
                released.push(id.to_string());
            }
            return false;
        };

        if shifted != range {
            link.reference = shifted.to_a1_string();
        }
        true
    });

    for id in released {
        if let Err(e) = parts.delete_relationship(sheet_part, &id) {
            warn!("could not release hyperlink relationship {} of {}: {}", id, sheet_part, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tally_sheets_core::Hyperlink;
    use tally_sheets_formula::Direction;
    use tally_sheets_core::{MAX_COLS, MAX_ROWS};
    use tally_sheets_xlsx::{rels_part_name, Package, REL_TYPE_HYPERLINK};

    const PART: &str = "xl/worksheets/sheet1.xml";

    fn anchors(ws: &Worksheet) -> Vec<&str> {
        ws.hyperlinks().iter().map(|l| l.reference.as_str()).collect()
    }

    #[test]
    fn test_delete_releases_relationship() {
        let mut package = Package::new();
        let keep = package
            .add_external_relationship(PART, REL_TYPE_HYPERLINK, "https://a.example/")
            .unwrap();
        let gone = package
            .add_external_relationship(PART, REL_TYPE_HYPERLINK, "https://b.example/")
            .unwrap();

        let mut ws = Worksheet::new("S");
        ws.add_hyperlink(Hyperlink::external("A1", keep.clone())).unwrap();
        ws.add_hyperlink(Hyperlink::external("B3", gone.clone())).unwrap();
        ws.add_hyperlink(Hyperlink::internal("C5:D6", "Other!A1")).unwrap();

        let edit = LineEdit {
            direction: Direction::Rows,
            pivot: 3,
            offset: -1,
        };
        adjust(&mut ws, &mut package, PART, &edit, MAX_ROWS);

        assert_eq!(anchors(&ws), vec!["A1", "C4:D5"]);
        let rels = package.relationships(PART).unwrap();
        assert!(rels.get(&keep).is_some());
        assert!(rels.get(&gone).is_none());
    }

    #[test]
    fn test_insert_columns() {
        let mut package = Package::new();
        let mut ws = Worksheet::new("S");
        ws.add_hyperlink(Hyperlink::internal("A1", "x")).unwrap();
        ws.add_hyperlink(Hyperlink::internal("B2", "y")).unwrap();
        ws.add_hyperlink(Hyperlink::internal("A4:C4", "z")).unwrap();

        let edit = LineEdit {
            direction: Direction::Columns,
            pivot: 2,
            offset: 2,
        };
        adjust(&mut ws, &mut package, PART, &edit, MAX_COLS);

        assert_eq!(anchors(&ws), vec!["A1", "D2", "A4:E4"]);
    }

    #[test]
    fn test_malformed_anchor_is_left_alone() {
        let mut package = Package::new();
        let mut ws = Worksheet::new("S");
        ws.hyperlinks_mut().push(Hyperlink::internal("not a ref", "x"));

        let edit = LineEdit {
            direction: Direction::Rows,
            pivot: 1,
            offset: -1,
        };
        adjust(&mut ws, &mut package, PART, &edit, MAX_ROWS);

        assert_eq!(anchors(&ws), vec!["not a ref"]);
    }

    #[test]
    fn test_links_pushed_off_the_sheet() {
        let mut package = Package::new();
        let mut ws = Worksheet::new("S");
        ws.add_hyperlink(Hyperlink::internal("D1:D1048576", "x")).unwrap();
        ws.add_hyperlink(Hyperlink::internal("A1048576", "y")).unwrap();

        let edit = LineEdit {
            direction: Direction::Rows,
            pivot: 2,
            offset: 1,
        };
        adjust(&mut ws, &mut package, PART, &edit, MAX_ROWS);

        assert_eq!(anchors(&ws), vec!["D1:D1048576"]);
    }

    #[test]
    fn test_damaged_relationships_do_not_stop_the_shift() {
        let mut package = Package::new();
        package.set_part(
            rels_part_name(PART),
            r#"<Relationships><Relationship Id="rId1" Targ"#,
        );
        let mut ws = Worksheet::new("S");
        ws.add_hyperlink(Hyperlink::external("B2", "rId1")).unwrap();
        ws.add_hyperlink(Hyperlink::internal("C5", "x")).unwrap();

        let edit = LineEdit {
            direction: Direction::Columns,
            pivot: 2,
            offset: -1,
        };
        adjust(&mut ws, &mut package, PART, &edit, MAX_COLS);

        assert_eq!(anchors(&ws), vec!["B5"]);
    }
}
