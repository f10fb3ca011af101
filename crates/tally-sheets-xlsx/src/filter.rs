//! `<autoFilter>` codec, shared by worksheet and table parts

use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use tally_sheets_core::{AutoFilter, FilterColumn};

use crate::error::{XlsxError, XlsxResult};
use crate::xml::{
    attr, attr_u32, attribute, capture_element, other_attributes, push_attributes, read_inner_xml,
};

/// Read an `<autoFilter>` element whose start tag was just read
///
/// Returns `None` for a filter without a `ref`; its children are still
/// consumed.
pub(crate) fn read_auto_filter<R: BufRead>(
    reader: &mut Reader<R>,
    start: &BytesStart<'_>,
    empty: bool,
) -> XlsxResult<Option<AutoFilter>> {
    let mut filter = AutoFilter::new(attr(start, b"ref").unwrap_or_default());

    if !empty {
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) if e.name().as_ref() == b"filterColumn" => {
                    let mut column = filter_column(&e);
                    column.content = read_inner_xml(reader)?;
                    filter.columns.push(column);
                }
                Event::Empty(e) if e.name().as_ref() == b"filterColumn" => {
                    filter.columns.push(filter_column(&e));
                }
                Event::Start(e) => filter.extra.push(capture_element(reader, &e, false)?),
                Event::Empty(e) => filter.extra.push(capture_element(reader, &e, true)?),
                Event::End(_) => break,
                Event::Eof => {
                    return Err(XlsxError::Parse("unterminated <autoFilter>".into()));
                }
                _ => {}
            }
            buf.clear();
        }
    }

    Ok((!filter.reference.is_empty()).then_some(filter))
}

fn filter_column(e: &BytesStart<'_>) -> FilterColumn {
    let mut column = FilterColumn::new(attr_u32(e, b"colId").unwrap_or(0));
    column.attributes = other_attributes(e, &[b"colId"]);
    column
}

/// Serialize an `<autoFilter>` element
pub(crate) fn write_auto_filter(content: &mut String, filter: &AutoFilter) {
    content.push_str("<autoFilter");
    content.push_str(&attribute("ref", &filter.reference));
    if filter.columns.is_empty() && filter.extra.is_empty() {
        content.push_str("/>");
        return;
    }
    content.push('>');

    for column in &filter.columns {
        content.push_str("<filterColumn");
        content.push_str(&attribute("colId", &column.col_id.to_string()));
        push_attributes(content, &column.attributes);
        if column.content.is_empty() {
            content.push_str("/>");
        } else {
            content.push('>');
            content.push_str(&column.content);
            content.push_str("</filterColumn>");
        }
    }
    for element in &filter.extra {
        content.push_str(element);
    }
    content.push_str("</autoFilter>");
}
