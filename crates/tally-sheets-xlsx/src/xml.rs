//! Small helpers shared by the part codecs

use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;

use crate::error::{XlsxError, XlsxResult};

/// XML declaration written at the top of every part
pub(crate) const XML_DECLARATION: &str =
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// SpreadsheetML main namespace
pub(crate) const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

/// Office document relationships namespace (the `r:` prefix)
pub(crate) const NS_RELATIONSHIPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Escape text for use in element content or attribute values
pub(crate) fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Unescaped value of attribute `key`, if present
pub(crate) fn attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.to_string()))
}

/// Attribute `key` parsed as a number
pub(crate) fn attr_u32(e: &BytesStart<'_>, key: &[u8]) -> Option<u32> {
    attr(e, key).and_then(|v| v.parse().ok())
}

/// Attribute `key` read as an OOXML boolean (`1`/`true`)
pub(crate) fn attr_bool(e: &BytesStart<'_>, key: &[u8]) -> Option<bool> {
    attr(e, key).map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

/// `name="value"` with a leading space, escaped
pub(crate) fn attribute(name: &str, value: &str) -> String {
    format!(" {}=\"{}\"", name, escape_xml(value))
}

/// Attributes of `e` whose names are not in `known`, unescaped
pub(crate) fn other_attributes(e: &BytesStart<'_>, known: &[&[u8]]) -> Vec<(String, String)> {
    e.attributes()
        .flatten()
        .filter(|a| !known.contains(&a.key.as_ref()))
        .filter_map(|a| {
            let value = a.unescape_value().ok()?.to_string();
            Some((String::from_utf8_lossy(a.key.as_ref()).into_owned(), value))
        })
        .collect()
}

/// Append `attributes` to an open start tag
pub(crate) fn push_attributes(content: &mut String, attributes: &[(String, String)]) {
    for (name, value) in attributes {
        content.push_str(&attribute(name, value));
    }
}

/// Everything up to the end tag of the element just opened, as XML
///
/// The end tag is consumed but not included.
pub(crate) fn read_inner_xml<R: BufRead>(reader: &mut Reader<R>) -> XlsxResult<String> {
    let mut writer = Writer::new(Vec::new());
    let mut buf = Vec::new();
    let mut depth = 0usize;

    loop {
        let event = reader.read_event_into(&mut buf)?;
        match &event {
            Event::Start(_) => depth += 1,
            Event::End(_) if depth == 0 => break,
            Event::End(_) => depth -= 1,
            Event::Eof => return Err(XlsxError::Parse("unexpected end of part".into())),
            _ => {}
        }
        writer.write_event(event)?;
        buf.clear();
    }

    String::from_utf8(writer.into_inner()).map_err(|e| XlsxError::Parse(e.to_string()))
}

/// The element opened by `start`, tags included, as XML
///
/// `empty` tells whether `start` was a self-closing tag.
pub(crate) fn capture_element<R: BufRead>(
    reader: &mut Reader<R>,
    start: &BytesStart<'_>,
    empty: bool,
) -> XlsxResult<String> {
    let mut writer = Writer::new(Vec::new());
    if empty {
        writer.write_event(Event::Empty(start.borrow()))?;
    } else {
        writer.write_event(Event::Start(start.borrow()))?;
        let inner = read_inner_xml(reader)?;
        writer.get_mut().extend_from_slice(inner.as_bytes());
        writer.write_event(Event::End(start.to_end()))?;
    }
    String::from_utf8(writer.into_inner()).map_err(|e| XlsxError::Parse(e.to_string()))
}

/// OOXML boolean literal
pub(crate) fn bool_str(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml(r#"a<b & "c"'"#), "a&lt;b &amp; &quot;c&quot;&apos;");
    }

    #[test]
    fn test_attr_helpers() {
        let mut e = BytesStart::new("c");
        e.push_attribute(("r", "B2"));
        e.push_attribute(("s", "4"));
        e.push_attribute(("hidden", "true"));

        assert_eq!(attr(&e, b"r").as_deref(), Some("B2"));
        assert_eq!(attr_u32(&e, b"s"), Some(4));
        assert_eq!(attr_bool(&e, b"hidden"), Some(true));
        assert_eq!(attr(&e, b"t"), None);
    }

    #[test]
    fn test_other_attributes() {
        let mut e = BytesStart::new("tableColumn");
        e.push_attribute(("id", "1"));
        e.push_attribute(("name", "Total"));
        e.push_attribute(("totalsRowFunction", "sum"));

        assert_eq!(
            other_attributes(&e, &[b"id", b"name"]),
            vec![("totalsRowFunction".to_string(), "sum".to_string())]
        );
    }

    #[test]
    fn test_capture_element() {
        let xml = r#"<root><keep a="1"><x>t &amp; u</x><y/></keep><next/></root>"#;
        let mut reader = Reader::from_reader(xml.as_bytes());
        let mut buf = Vec::new();

        let mut captured = None;
        loop {
            match reader.read_event_into(&mut buf).unwrap() {
                Event::Start(e) if e.name().as_ref() == b"keep" => {
                    captured = Some(capture_element(&mut reader, &e, false).unwrap());
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        assert_eq!(
            captured.as_deref(),
            Some(r#"<keep a="1"><x>t &amp; u</x><y/></keep>"#)
        );
    }
}
