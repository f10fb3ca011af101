//! Table part codec (`xl/tables/tableN.xml`)

use std::io::BufRead;

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use tally_sheets_core::{Table, TableColumn, TableStyleInfo};

use crate::error::{XlsxError, XlsxResult};
use crate::filter::{read_auto_filter, write_auto_filter};
use crate::xml::{
    attr, attr_bool, attr_u32, attribute, bool_str, capture_element, other_attributes,
    push_attributes, read_inner_xml, NS_MAIN, XML_DECLARATION,
};

const TABLE_ATTRIBUTES: &[&[u8]] = &[
    b"xmlns",
    b"id",
    b"name",
    b"displayName",
    b"ref",
    b"headerRowCount",
    b"totalsRowShown",
];

/// Read a table definition
///
/// Attributes and elements the model does not cover are kept on the
/// [`Table`] so that [`write_table`] can put them back.
pub fn read_table<R: BufRead>(reader: R) -> XlsxResult<Table> {
    let mut xml_reader = Reader::from_reader(reader);
    xml_reader.trim_text(true);

    let mut buf = Vec::new();
    let mut table: Option<Table> = None;

    loop {
        buf.clear();
        let (e, empty) = match xml_reader.read_event_into(&mut buf)? {
            Event::Start(e) => (e, false),
            Event::Empty(e) => (e, true),
            Event::Eof => break,
            _ => continue,
        };

        match (e.name().as_ref(), table.as_mut()) {
            (b"table", None) => {
                let reference = attr(&e, b"ref")
                    .ok_or_else(|| XlsxError::Parse("table without ref".into()))?;
                let name = attr(&e, b"name").unwrap_or_default();
                let mut t = Table::new(attr_u32(&e, b"id").unwrap_or(1), name, reference);
                if let Some(display) = attr(&e, b"displayName") {
                    t.display_name = display;
                }
                t.header_row_count = attr_u32(&e, b"headerRowCount").unwrap_or(1);
                t.totals_row_shown = attr_bool(&e, b"totalsRowShown").unwrap_or(false);
                t.attributes = other_attributes(&e, TABLE_ATTRIBUTES);
                // Filter and style come from child elements only
                t.auto_filter = None;
                t.style = None;
                table = Some(t);
            }
            (b"autoFilter", Some(t)) => {
                t.auto_filter = read_auto_filter(&mut xml_reader, &e, empty)?;
            }
            (b"sortState", Some(t)) => {
                t.sort_state = Some(capture_element(&mut xml_reader, &e, empty)?);
            }
            // Children are read one by one
            (b"tableColumns", Some(_)) => {}
            (b"tableColumn", Some(t)) => {
                let id = attr_u32(&e, b"id").unwrap_or(t.columns.len() as u32 + 1);
                let mut column = TableColumn::new(id, attr(&e, b"name").unwrap_or_default());
                column.attributes = other_attributes(&e, &[b"id", b"name"]);
                if !empty {
                    column.content = read_inner_xml(&mut xml_reader)?;
                }
                t.columns.push(column);
            }
            (b"tableStyleInfo", Some(t)) => {
                t.style = Some(TableStyleInfo {
                    name: attr(&e, b"name"),
                    show_first_column: attr_bool(&e, b"showFirstColumn").unwrap_or(false),
                    show_last_column: attr_bool(&e, b"showLastColumn").unwrap_or(false),
                    show_row_stripes: attr_bool(&e, b"showRowStripes").unwrap_or(false),
                    show_column_stripes: attr_bool(&e, b"showColumnStripes").unwrap_or(false),
                });
            }
            (_, Some(t)) => t.extra.push(capture_element(&mut xml_reader, &e, empty)?),
            (_, None) => {}
        }
    }

    table.ok_or_else(|| XlsxError::Parse("missing <table> element".into()))
}

/// Serialize a table definition
pub fn write_table(table: &Table) -> String {
    let mut content = format!("{}\n<table xmlns=\"{}\"", XML_DECLARATION, NS_MAIN);
    content.push_str(&attribute("id", &table.id.to_string()));
    content.push_str(&attribute("name", &table.name));
    content.push_str(&attribute("displayName", &table.display_name));
    content.push_str(&attribute("ref", &table.reference));
    if table.header_row_count != 1 {
        content.push_str(&attribute(
            "headerRowCount",
            &table.header_row_count.to_string(),
        ));
    }
    content.push_str(&attribute("totalsRowShown", bool_str(table.totals_row_shown)));
    push_attributes(&mut content, &table.attributes);
    content.push('>');

    if let Some(filter) = &table.auto_filter {
        write_auto_filter(&mut content, filter);
    }
    if let Some(sort_state) = &table.sort_state {
        content.push_str(sort_state);
    }

    content.push_str(&format!("<tableColumns count=\"{}\">", table.columns.len()));
    for column in &table.columns {
        content.push_str("<tableColumn");
        content.push_str(&attribute("id", &column.id.to_string()));
        content.push_str(&attribute("name", &column.name));
        push_attributes(&mut content, &column.attributes);
        if column.content.is_empty() {
            content.push_str("/>");
        } else {
            content.push('>');
            content.push_str(&column.content);
            content.push_str("</tableColumn>");
        }
    }
    content.push_str("</tableColumns>");

    if let Some(style) = &table.style {
        content.push_str("<tableStyleInfo");
        if let Some(name) = &style.name {
            content.push_str(&attribute("name", name));
        }
        content.push_str(&attribute("showFirstColumn", bool_str(style.show_first_column)));
        content.push_str(&attribute("showLastColumn", bool_str(style.show_last_column)));
        content.push_str(&attribute("showRowStripes", bool_str(style.show_row_stripes)));
        content.push_str(&attribute(
            "showColumnStripes",
            bool_str(style.show_column_stripes),
        ));
        content.push_str("/>");
    }

    for element in &table.extra {
        content.push_str(element);
    }
    content.push_str("</table>");
    content
}
