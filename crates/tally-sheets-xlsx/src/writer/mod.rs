//! XLSX writer

use std::fs::File;
use std::io::{Seek, Write};
use std::iter::Peekable;
use std::path::Path;
use std::vec::IntoIter;

use log::{debug, warn};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer as XmlWriter;

use tally_sheets_core::{
    Cell, CellAddress, CellType, ColumnRange, Formula, FormulaKind, HyperlinkTarget, Row,
    SharedStringTable, Workbook, Worksheet,
};

use crate::calc_chain::{write_calc_chain, CALC_CHAIN_PART};
use crate::content_types::{
    ContentTypes, CT_CALC_CHAIN, CT_SHARED_STRINGS, CT_WORKBOOK, CT_WORKSHEET,
};
use crate::error::{XlsxError, XlsxResult};
use crate::filter::write_auto_filter;
use crate::package::{Package, PartStore};
use crate::reader::WORKBOOK_PART;
use crate::relationships::{
    relative_target, resolve_target, Relationships, REL_TYPE_CALC_CHAIN, REL_TYPE_OFFICE_DOCUMENT,
    REL_TYPE_SHARED_STRINGS, REL_TYPE_WORKSHEET,
};
use crate::xml::{attribute, escape_xml, NS_MAIN, NS_RELATIONSHIPS, XML_DECLARATION};

/// Part name of the shared string table written for new packages
pub const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// XLSX file writer
pub struct XlsxWriter;

impl XlsxWriter {
    /// Write a workbook to a file path as a new package
    pub fn write_file<P: AsRef<Path>>(workbook: &Workbook, path: P) -> XlsxResult<()> {
        let file = File::create(path)?;
        Self::write(workbook, file)
    }

    /// Write a workbook to a writer as a new package
    pub fn write<W: Write + Seek>(workbook: &Workbook, writer: W) -> XlsxResult<()> {
        let (mut package, sheet_parts) = Self::new_package(workbook)?;
        Self::store_workbook(&mut package, workbook, WORKBOOK_PART, &sheet_parts)?;
        package.write(writer)
    }

    /// Build the skeleton of a package for `workbook`
    ///
    /// Content types, package relationships, the workbook part and its
    /// worksheet relationships are created; the worksheet parts themselves
    /// are left to [`XlsxWriter::store_workbook`]. Returns the package together
    /// with the worksheet part names, parallel to the workbook's sheets.
    pub fn new_package(workbook: &Workbook) -> XlsxResult<(Package, Vec<String>)> {
        let mut package = Package::new();
        let settings = workbook.settings();

        let sheet_parts: Vec<String> = (1..=workbook.sheet_count())
            .map(|n| settings.worksheet_part_name(n))
            .collect();

        // [Content_Types].xml
        let mut types = ContentTypes::new();
        types.add_override(WORKBOOK_PART, CT_WORKBOOK);
        for part in &sheet_parts {
            types.add_override(part, CT_WORKSHEET);
        }
        package.set_content_types(&types);

        // _rels/.rels
        package.add_relationship("", REL_TYPE_OFFICE_DOCUMENT, WORKBOOK_PART)?;

        // xl/_rels/workbook.xml.rels
        let mut rels = Relationships::new();
        let mut sheet_rel_ids = Vec::with_capacity(sheet_parts.len());
        for part in &sheet_parts {
            sheet_rel_ids.push(rels.add(REL_TYPE_WORKSHEET, &relative_target(WORKBOOK_PART, part)));
        }
        package.set_relationships(WORKBOOK_PART, &rels);

        // xl/workbook.xml
        package.set_part(WORKBOOK_PART, Self::workbook_xml(workbook, &sheet_rel_ids));

        Ok((package, sheet_parts))
    }

    /// Store the model parts of `workbook` into `package`
    ///
    /// Worksheets are written to `sheet_parts`, over the existing part when
    /// there is one (see [`XlsxWriter::merge_worksheet_xml`]). The shared
    /// string table and
    /// the calculation chain are written when they have entries; an empty
    /// calculation chain is removed from the package together with its
    /// workbook relationship.
    pub fn store_workbook(
        package: &mut Package,
        workbook: &Workbook,
        workbook_part: &str,
        sheet_parts: &[String],
    ) -> XlsxResult<()> {
        if sheet_parts.len() != workbook.sheet_count() {
            return Err(XlsxError::InvalidFormat(format!(
                "{} worksheet parts for {} sheets",
                sheet_parts.len(),
                workbook.sheet_count()
            )));
        }

        for (sheet, part) in workbook.worksheets().zip(sheet_parts) {
            let xml = match package.part(part) {
                Some(original) => Self::merge_worksheet_xml(original, sheet).unwrap_or_else(|e| {
                    warn!("rewriting {} from the model alone: {}", part, e);
                    Self::worksheet_xml(sheet)
                }),
                None => Self::worksheet_xml(sheet),
            };
            package.set_part(part.as_str(), xml);
        }

        let rels = package.relationships(workbook_part)?;

        let strings = workbook.shared_strings();
        if !strings.is_empty() {
            let part = rels
                .find_by_type(REL_TYPE_SHARED_STRINGS)
                .map(|r| resolve_target(workbook_part, &r.target))
                .unwrap_or_else(|| SHARED_STRINGS_PART.to_string());
            package.set_part(part.as_str(), Self::shared_strings_xml(strings));
            package.register_part(workbook_part, &part, REL_TYPE_SHARED_STRINGS, CT_SHARED_STRINGS)?;
        }

        let chain_part = rels
            .find_by_type(REL_TYPE_CALC_CHAIN)
            .map(|r| resolve_target(workbook_part, &r.target))
            .unwrap_or_else(|| CALC_CHAIN_PART.to_string());
        if workbook.calc_chain().is_empty() {
            if package.contains(&chain_part) {
                debug!("calculation chain is empty, removing {}", chain_part);
                package.unregister_part(workbook_part, &chain_part)?;
            }
        } else {
            package.save_part(&chain_part, write_calc_chain(workbook.calc_chain()).into_bytes());
            package.register_part(workbook_part, &chain_part, REL_TYPE_CALC_CHAIN, CT_CALC_CHAIN)?;
        }

        Ok(())
    }

    fn workbook_xml(workbook: &Workbook, sheet_rel_ids: &[String]) -> String {
        let mut content = format!(
            "{}\n<workbook xmlns=\"{}\" xmlns:r=\"{}\">",
            XML_DECLARATION, NS_MAIN, NS_RELATIONSHIPS
        );

        if workbook.active_sheet() != 0 {
            content.push_str(&format!(
                "<bookViews><workbookView activeTab=\"{}\"/></bookViews>",
                workbook.active_sheet()
            ));
        }

        content.push_str("<sheets>");
        for (sheet, id) in workbook.worksheets().zip(sheet_rel_ids) {
            content.push_str("<sheet");
            content.push_str(&attribute("name", sheet.name()));
            content.push_str(&attribute("sheetId", &sheet.sheet_id().to_string()));
            content.push_str(&attribute("r:id", id));
            content.push_str("/>");
        }
        content.push_str("</sheets></workbook>");
        content
    }

    /// Serialize the shared string table
    pub fn shared_strings_xml(strings: &SharedStringTable) -> String {
        let mut content = format!(
            "{}\n<sst xmlns=\"{}\" count=\"{}\" uniqueCount=\"{}\">",
            XML_DECLARATION,
            NS_MAIN,
            strings.len(),
            strings.len()
        );
        for s in strings.iter() {
            content.push_str("<si>");
            push_text_element(&mut content, s);
            content.push_str("</si>");
        }
        content.push_str("</sst>");
        content
    }

    /// Serialize a worksheet from the model alone
    pub fn worksheet_xml(sheet: &Worksheet) -> String {
        let mut content = format!(
            "{}\n<worksheet xmlns=\"{}\" xmlns:r=\"{}\">",
            XML_DECLARATION, NS_MAIN, NS_RELATIONSHIPS
        );
        for (_, fragment) in Self::modeled_elements(sheet) {
            content.push_str(&fragment);
        }
        content.push_str("</worksheet>");
        content
    }

    /// Serialize a worksheet over the part it was read from
    ///
    /// The elements the model covers are written from `sheet`; every other
    /// child of `<worksheet>` (views, conditional formats, validations, page
    /// setup, drawings, ...) and the root's own attributes are copied from
    /// `original` unchanged, in schema order.
    pub fn merge_worksheet_xml(original: &[u8], sheet: &Worksheet) -> XlsxResult<String> {
        let mut reader = Reader::from_reader(original);
        let mut modeled = Self::modeled_elements(sheet).into_iter().peekable();
        let mut content = String::with_capacity(original.len());
        let mut in_root = false;

        loop {
            let before = reader.buffer_position();
            match reader.read_event()? {
                Event::Start(e) if !in_root => {
                    if e.name().as_ref() != b"worksheet" {
                        return Err(XlsxError::Parse("root element is not <worksheet>".into()));
                    }
                    content.push_str(XML_DECLARATION);
                    content.push('\n');
                    content.push_str(&root_start_tag(&e)?);
                    in_root = true;
                }
                Event::Start(e) => {
                    let name = e.name();
                    reader.read_to_end(name)?;
                    let raw = &original[before..reader.buffer_position()];
                    splice_child(&mut content, &mut modeled, name.as_ref(), raw)?;
                }
                Event::Empty(e) if in_root => {
                    let raw = &original[before..reader.buffer_position()];
                    splice_child(&mut content, &mut modeled, e.name().as_ref(), raw)?;
                }
                Event::End(_) => {
                    for (_, fragment) in modeled {
                        content.push_str(&fragment);
                    }
                    content.push_str("</worksheet>");
                    return Ok(content);
                }
                Event::Eof => {
                    return Err(XlsxError::Parse("unterminated <worksheet>".into()));
                }
                _ => {}
            }
        }
    }

    /// Modeled children of `<worksheet>` with their schema positions
    fn modeled_elements(sheet: &Worksheet) -> Vec<(usize, String)> {
        let mut elements = Vec::new();
        let mut push = |name: &str, fragment: String| {
            if let Some(position) = schema_position(name.as_bytes()) {
                elements.push((position, fragment));
            }
        };

        let dimension = sheet
            .used_range()
            .map_or_else(|| "A1".to_string(), |r| r.to_a1_string());
        push("dimension", format!("<dimension{}/>", attribute("ref", &dimension)));

        if !sheet.columns().is_empty() {
            let mut content = String::from("<cols>");
            for col in sheet.columns() {
                Self::write_col(&mut content, col);
            }
            content.push_str("</cols>");
            push("cols", content);
        }

        // Write cell data (sparse, row-major)
        let mut content = String::from("<sheetData>");
        for (&row_num, row) in sheet.rows() {
            Self::write_row(&mut content, row_num, row);
        }
        content.push_str("</sheetData>");
        push("sheetData", content);

        if let Some(filter) = sheet.auto_filter() {
            let mut content = String::new();
            write_auto_filter(&mut content, filter);
            push("autoFilter", content);
        }

        let merged = sheet.merged_cells();
        if !merged.is_empty() {
            let mut content = format!("<mergeCells count=\"{}\">", merged.len());
            for range in merged {
                content.push_str(&format!("<mergeCell{}/>", attribute("ref", range)));
            }
            content.push_str("</mergeCells>");
            push("mergeCells", content);
        }

        if !sheet.hyperlinks().is_empty() {
            let mut content = String::from("<hyperlinks>");
            for link in sheet.hyperlinks() {
                content.push_str("<hyperlink");
                content.push_str(&attribute("ref", &link.reference));
                match &link.target {
                    HyperlinkTarget::External { relationship_id } => {
                        content.push_str(&attribute("r:id", relationship_id));
                    }
                    HyperlinkTarget::Internal { location } => {
                        content.push_str(&attribute("location", location));
                    }
                }
                if let Some(display) = &link.display {
                    content.push_str(&attribute("display", display));
                }
                if let Some(tooltip) = &link.tooltip {
                    content.push_str(&attribute("tooltip", tooltip));
                }
                content.push_str("/>");
            }
            content.push_str("</hyperlinks>");
            push("hyperlinks", content);
        }

        let tables = sheet.table_parts();
        if !tables.is_empty() {
            let mut content = format!("<tableParts count=\"{}\">", tables.len());
            for part in tables {
                content.push_str(&format!(
                    "<tablePart{}/>",
                    attribute("r:id", &part.relationship_id)
                ));
            }
            content.push_str("</tableParts>");
            push("tableParts", content);
        }

        elements
    }

    fn write_col(content: &mut String, col: &ColumnRange) {
        content.push_str("<col");
        content.push_str(&attribute("min", &col.min.to_string()));
        content.push_str(&attribute("max", &col.max.to_string()));
        if let Some(width) = col.width {
            content.push_str(&attribute("width", &width.to_string()));
            content.push_str(" customWidth=\"1\"");
        }
        if let Some(style) = col.style_index {
            content.push_str(&attribute("style", &style.to_string()));
        }
        if col.hidden {
            content.push_str(" hidden=\"1\"");
        }
        if col.outline_level > 0 {
            content.push_str(&attribute("outlineLevel", &col.outline_level.to_string()));
        }
        content.push_str("/>");
    }

    fn write_row(content: &mut String, row_num: u32, row: &Row) {
        content.push_str(&format!("<row r=\"{}\"", row_num));
        if let Some(style) = row.style_index {
            content.push_str(&format!(" s=\"{}\" customFormat=\"1\"", style));
        }
        if let Some(height) = row.height {
            content.push_str(&format!(" ht=\"{}\" customHeight=\"1\"", height));
        }
        if row.hidden {
            content.push_str(" hidden=\"1\"");
        }
        if row.outline_level > 0 {
            content.push_str(&format!(" outlineLevel=\"{}\"", row.outline_level));
        }

        if row.cells.is_empty() {
            content.push_str("/>");
            return;
        }
        content.push('>');
        for (&col, cell) in &row.cells {
            Self::write_cell(content, CellAddress::new(col, row_num), cell);
        }
        content.push_str("</row>");
    }

    fn write_cell(content: &mut String, addr: CellAddress, cell: &Cell) {
        content.push_str(&format!("<c r=\"{}\"", addr));
        if cell.style_index != 0 {
            content.push_str(&format!(" s=\"{}\"", cell.style_index));
        }
        let has_value = !cell.value.is_empty();
        if has_value && cell.value.kind != CellType::Number {
            content.push_str(&format!(" t=\"{}\"", cell.value.kind.to_xlsx()));
        }

        if cell.formula.is_none() && !has_value {
            content.push_str("/>");
            return;
        }
        content.push('>');

        if let Some(formula) = &cell.formula {
            Self::write_formula(content, formula);
        }

        if has_value {
            if cell.value.kind == CellType::InlineString {
                content.push_str("<is>");
                push_text_element(content, &cell.value.raw);
                content.push_str("</is>");
            } else {
                content.push_str(&format!("<v>{}</v>", escape_xml(&cell.value.raw)));
            }
        }
        content.push_str("</c>");
    }

    fn write_formula(content: &mut String, formula: &Formula) {
        content.push_str("<f");
        match formula.kind {
            FormulaKind::Normal => {}
            FormulaKind::Shared { index } => {
                content.push_str(" t=\"shared\"");
                if let Some(reference) = &formula.reference {
                    content.push_str(&attribute("ref", reference));
                }
                content.push_str(&format!(" si=\"{}\"", index));
            }
            FormulaKind::Array => {
                content.push_str(" t=\"array\"");
                if let Some(reference) = &formula.reference {
                    content.push_str(&attribute("ref", reference));
                }
            }
            FormulaKind::DataTable => {
                content.push_str(" t=\"dataTable\"");
                if let Some(reference) = &formula.reference {
                    content.push_str(&attribute("ref", reference));
                }
            }
        }

        if formula.text.is_empty() {
            content.push_str("/>");
        } else {
            content.push_str(&format!(">{}</f>", escape_xml(&formula.text)));
        }
    }
}

/// Children of `<worksheet>` in schema order
const WORKSHEET_CHILDREN: &[&str] = &[
    "sheetPr",
    "dimension",
    "sheetViews",
    "sheetFormatPr",
    "cols",
    "sheetData",
    "sheetCalcPr",
    "sheetProtection",
    "protectedRanges",
    "scenarios",
    "autoFilter",
    "sortState",
    "dataConsolidate",
    "customSheetViews",
    "mergeCells",
    "phoneticPr",
    "conditionalFormatting",
    "dataValidations",
    "hyperlinks",
    "printOptions",
    "pageMargins",
    "pageSetup",
    "headerFooter",
    "rowBreaks",
    "colBreaks",
    "customProperties",
    "cellWatches",
    "ignoredErrors",
    "smartTags",
    "drawing",
    "legacyDrawing",
    "legacyDrawingHF",
    "drawingHF",
    "picture",
    "oleObjects",
    "controls",
    "webPublishItems",
    "tableParts",
    "extLst",
];

/// Children of `<worksheet>` written from the model
const MODELED_CHILDREN: &[&str] = &[
    "dimension",
    "cols",
    "sheetData",
    "autoFilter",
    "mergeCells",
    "hyperlinks",
    "tableParts",
];

fn schema_position(name: &[u8]) -> Option<usize> {
    WORKSHEET_CHILDREN.iter().position(|child| child.as_bytes() == name)
}

/// Copy one child of the original `<worksheet>`, first writing the modeled
/// elements that come before it
///
/// A modeled child is replaced by its fragment from the model. Children
/// outside the schema list stay where they are.
fn splice_child(
    content: &mut String,
    modeled: &mut Peekable<IntoIter<(usize, String)>>,
    name: &[u8],
    raw: &[u8],
) -> XlsxResult<()> {
    let is_modeled = MODELED_CHILDREN.iter().any(|child| child.as_bytes() == name);

    if let Some(position) = schema_position(name) {
        while let Some((_, fragment)) =
            modeled.next_if(|(p, _)| *p < position || (is_modeled && *p == position))
        {
            content.push_str(&fragment);
        }
    }
    if !is_modeled {
        let raw = std::str::from_utf8(raw).map_err(|e| XlsxError::Parse(e.to_string()))?;
        content.push_str(raw);
    }
    Ok(())
}

/// The original `<worksheet>` start tag, declaring the `r:` prefix the
/// modeled elements use
fn root_start_tag(e: &BytesStart<'_>) -> XlsxResult<String> {
    let mut start = e.borrow();
    if !e.attributes().flatten().any(|a| a.key.as_ref() == b"xmlns:r") {
        start.push_attribute(("xmlns:r", NS_RELATIONSHIPS));
    }
    let mut writer = XmlWriter::new(Vec::new());
    writer.write_event(Event::Start(start))?;
    String::from_utf8(writer.into_inner()).map_err(|e| XlsxError::Parse(e.to_string()))
}

/// Write `<t>`, preserving surrounding whitespace
fn push_text_element(content: &mut String, text: &str) {
    if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        content.push_str(&format!("<t xml:space=\"preserve\">{}</t>", escape_xml(text)));
    } else {
        content.push_str(&format!("<t>{}</t>", escape_xml(text)));
    }
}
