//! Calculation chain codec (`xl/calcChain.xml`)
//!
//! Each `<c>` entry names a cell and, through `i`, the sheet id it belongs
//! to. An entry without `i` belongs to the same sheet as the entry before it.

use std::io::BufRead;

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use tally_sheets_core::{CalcChain, CalcChainEntry};

use crate::error::{XlsxError, XlsxResult};
use crate::xml::{attr, attr_u32, attribute, NS_MAIN, XML_DECLARATION};

/// Part name of the calculation chain
pub const CALC_CHAIN_PART: &str = "xl/calcChain.xml";

/// Read a calculation chain
pub fn read_calc_chain<R: BufRead>(reader: R) -> XlsxResult<CalcChain> {
    let mut xml_reader = Reader::from_reader(reader);
    xml_reader.trim_text(true);

    let mut buf = Vec::new();
    let mut chain = CalcChain::new();
    let mut sheet_id = 0;

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"c" => {
                if let Some(id) = attr_u32(&e, b"i") {
                    sheet_id = id;
                }
                let reference = attr(&e, b"r")
                    .ok_or_else(|| XlsxError::Parse("calcChain entry without r".into()))?;
                chain.push(CalcChainEntry::new(sheet_id, reference));
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(chain)
}

/// Serialize a calculation chain
///
/// `i` is written on the first entry and wherever the sheet changes.
pub fn write_calc_chain(chain: &CalcChain) -> String {
    let mut content = format!("{}\n<calcChain xmlns=\"{}\">", XML_DECLARATION, NS_MAIN);
    let mut previous: Option<u32> = None;
    for entry in chain.entries() {
        content.push_str("<c");
        content.push_str(&attribute("r", &entry.reference));
        if previous != Some(entry.sheet_id) {
            content.push_str(&attribute("i", &entry.sheet_id.to_string()));
            previous = Some(entry.sheet_id);
        }
        content.push_str("/>");
    }
    content.push_str("</calcChain>");
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_omitted_sheet_id_is_inherited() {
        let xml = r#"<calcChain xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
            <c r="B2" i="1"/><c r="B3"/><c r="A1" i="2" l="1"/><c r="A2"/>
        </calcChain>"#;

        let chain = read_calc_chain(xml.as_bytes()).unwrap();
        assert_eq!(
            chain.entries(),
            &[
                CalcChainEntry::new(1, "B2"),
                CalcChainEntry::new(1, "B3"),
                CalcChainEntry::new(2, "A1"),
                CalcChainEntry::new(2, "A2"),
            ]
        );
    }

    #[test]
    fn test_write_only_marks_sheet_changes() {
        let chain = CalcChain::from_entries(vec![
            CalcChainEntry::new(1, "C1"),
            CalcChainEntry::new(1, "C2"),
            CalcChainEntry::new(3, "D4"),
        ]);

        let xml = write_calc_chain(&chain);
        assert!(xml.ends_with(r#"<c r="C1" i="1"/><c r="C2"/><c r="D4" i="3"/></calcChain>"#));
        assert_eq!(read_calc_chain(xml.as_bytes()).unwrap(), chain);
    }

    #[test]
    fn test_entry_without_reference_is_rejected() {
        assert!(read_calc_chain(r#"<calcChain><c i="1"/></calcChain>"#.as_bytes()).is_err());
    }
}
