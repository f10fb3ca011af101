//! XLSX reader

use std::io::BufRead;

use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use tally_sheets_core::{
    Cell, CellAddress, CellType, CellValue, ColumnRange, Formula, FormulaKind,
    Hyperlink, SharedStringTable, TablePart, Workbook, WorkbookSettings, Worksheet,
};

use crate::calc_chain::{read_calc_chain, CALC_CHAIN_PART};
use crate::error::{XlsxError, XlsxResult};
use crate::filter::read_auto_filter;
use crate::package::Package;
use crate::relationships::{
    resolve_target, REL_TYPE_CALC_CHAIN, REL_TYPE_OFFICE_DOCUMENT, REL_TYPE_SHARED_STRINGS,
    REL_TYPE_WORKSHEET,
};
use crate::xml::{attr, attr_bool, attr_u32};

/// Default location of the workbook part
pub const WORKBOOK_PART: &str = "xl/workbook.xml";

/// Decode Excel's `_xHHHH_` escape sequences in strings.
///
/// Excel uses this format to encode special characters in XML:
/// - `_x000d_` = CR (carriage return)
/// - `_x000a_` = LF (line feed)
/// - `_x0009_` = Tab
/// - `_x005f_` = Underscore (escaped underscore)
fn decode_excel_escapes(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '_' || chars.peek() != Some(&'x') {
            result.push(c);
            continue;
        }
        chars.next(); // consume 'x'

        let mut hex_chars = String::new();
        while hex_chars.len() < 4 {
            match chars.peek() {
                Some(&ch) if ch.is_ascii_hexdigit() => {
                    hex_chars.push(ch);
                    chars.next();
                }
                _ => break,
            }
        }

        let decoded = if hex_chars.len() == 4 && chars.peek() == Some(&'_') {
            u32::from_str_radix(&hex_chars, 16)
                .ok()
                .and_then(char::from_u32)
        } else {
            None
        };

        match decoded {
            Some(ch) => {
                chars.next(); // consume closing '_'
                result.push(ch);
            }
            None => {
                // Not an escape: keep what was consumed
                result.push_str("_x");
                result.push_str(&hex_chars);
            }
        }
    }

    result
}

/// A worksheet as listed by the workbook part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetEntry {
    /// Sheet name
    pub name: String,
    /// `sheetId`
    pub sheet_id: u32,
    /// Resolved worksheet part name
    pub part_name: String,
}

/// A workbook read from a package, with the part each worksheet came from
#[derive(Debug)]
pub struct LoadedWorkbook {
    /// The document model
    pub workbook: Workbook,
    /// Worksheet part names, parallel to the workbook's sheets
    pub sheet_parts: Vec<String>,
    /// Workbook part name
    pub workbook_part: String,
}

/// XLSX reader
pub struct XlsxReader;

impl XlsxReader {
    /// Read the workbook model out of a package
    ///
    /// Worksheets, shared strings and the calculation chain are loaded;
    /// every other part stays in the package untouched.
    pub fn read(package: &Package, settings: WorkbookSettings) -> XlsxResult<LoadedWorkbook> {
        let workbook_part = Self::workbook_part(package)?;
        let entries = Self::read_sheet_entries(package, &workbook_part)?;
        let workbook_rels = package.relationships(&workbook_part)?;

        let mut workbook = Workbook::with_settings(settings);
        let mut sheet_parts = Vec::with_capacity(entries.len());

        for entry in entries {
            let data = package.require_part(&entry.part_name)?;
            let worksheet = Self::read_worksheet(data, &entry.name, entry.sheet_id)?;
            workbook.add_existing_worksheet(worksheet)?;
            sheet_parts.push(entry.part_name);
        }

        // Shared strings (if present)
        let sst_part = workbook_rels
            .find_by_type(REL_TYPE_SHARED_STRINGS)
            .map(|r| resolve_target(&workbook_part, &r.target));
        match sst_part.as_deref().and_then(|p| package.part(p)) {
            Some(data) => workbook.set_shared_strings(Self::read_shared_strings(data)?),
            None => debug!("package has no shared strings"),
        }

        // Calculation chain (if present)
        let chain_part = workbook_rels
            .find_by_type(REL_TYPE_CALC_CHAIN)
            .map(|r| resolve_target(&workbook_part, &r.target))
            .unwrap_or_else(|| CALC_CHAIN_PART.to_string());
        match package.part(&chain_part) {
            Some(data) => workbook.set_calc_chain(read_calc_chain(data)?),
            None => debug!("package has no calculation chain"),
        }

        Ok(LoadedWorkbook {
            workbook,
            sheet_parts,
            workbook_part,
        })
    }

    /// Locate the workbook part through the package relationships
    pub fn workbook_part(package: &Package) -> XlsxResult<String> {
        let rels = package.relationships("")?;
        let part = rels
            .find_by_type(REL_TYPE_OFFICE_DOCUMENT)
            .map(|r| resolve_target("", &r.target))
            .unwrap_or_else(|| WORKBOOK_PART.to_string());
        if !package.contains(&part) {
            return Err(XlsxError::MissingPart(part));
        }
        Ok(part)
    }

    /// Read the sheet list of the workbook part, resolving each sheet's part
    pub fn read_sheet_entries(package: &Package, workbook_part: &str) -> XlsxResult<Vec<SheetEntry>> {
        let data = package.require_part(workbook_part)?;
        let rels = package.relationships(workbook_part)?;

        let mut xml_reader = Reader::from_reader(data);
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut sheets = Vec::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"sheet" => {
                    let name = attr(&e, b"name");
                    let r_id = attr(&e, b"r:id");
                    let sheet_id = attr_u32(&e, b"sheetId");

                    let (Some(name), Some(r_id)) = (name, r_id) else {
                        return Err(XlsxError::Parse("sheet without name or r:id".into()));
                    };
                    let rel = rels
                        .get(&r_id)
                        .filter(|r| r.rel_type == REL_TYPE_WORKSHEET);
                    match rel {
                        Some(rel) => sheets.push(SheetEntry {
                            sheet_id: sheet_id.unwrap_or(sheets.len() as u32 + 1),
                            part_name: resolve_target(workbook_part, &rel.target),
                            name,
                        }),
                        // Chart sheets and dialog sheets are not worksheets
                        None => debug!("skipping sheet {} ({}): not a worksheet", name, r_id),
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(sheets)
    }

    /// Read the shared strings table
    pub fn read_shared_strings<R: BufRead>(reader: R) -> XlsxResult<SharedStringTable> {
        let mut xml_reader = Reader::from_reader(reader);

        let mut buf = Vec::new();
        let mut strings = Vec::new();
        let mut current_string = String::new();
        let mut in_si = false;
        let mut in_t = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"si" => {
                        in_si = true;
                        current_string.clear();
                    }
                    b"t" if in_si => in_t = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) if e.name().as_ref() == b"si" => {
                    strings.push(String::new());
                }
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"si" => {
                        strings.push(decode_excel_escapes(&current_string));
                        in_si = false;
                    }
                    b"t" => in_t = false,
                    _ => {}
                },
                Ok(Event::Text(e)) if in_t => {
                    current_string.push_str(&e.unescape()?);
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(SharedStringTable::from_strings(strings))
    }

    /// Read a worksheet part
    ///
    /// Cells, row records, column ranges, merges, hyperlinks, the autofilter
    /// and table part references are read. Cell values keep their raw text.
    pub fn read_worksheet<R: BufRead>(reader: R, name: &str, sheet_id: u32) -> XlsxResult<Worksheet> {
        let mut worksheet = Worksheet::new(name);
        worksheet.set_sheet_id(sheet_id);

        let mut xml_reader = Reader::from_reader(reader);
        let mut buf = Vec::new();

        let mut current_row: u32 = 0;
        let mut last_col: u32 = 0;
        let mut cell: Option<PendingCell> = None;
        let mut in_value = false;
        let mut in_formula = false;
        let mut in_inline_text = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"row" => {
                        current_row = Self::read_row(&mut worksheet, &e, current_row)?;
                        last_col = 0;
                    }
                    b"c" => {
                        let pending = PendingCell::start(&e, current_row, last_col)?;
                        last_col = pending.col;
                        cell = Some(pending);
                    }
                    b"v" if cell.is_some() => in_value = true,
                    b"f" => {
                        if let Some(pending) = cell.as_mut() {
                            pending.formula = Some(Self::formula_attrs(&e));
                            in_formula = true;
                        }
                    }
                    b"t" if cell.is_some() => in_inline_text = true,
                    b"autoFilter" => {
                        *worksheet.auto_filter_mut() = read_auto_filter(&mut xml_reader, &e, false)?;
                    }
                    b"hyperlink" => Self::read_hyperlink(&mut worksheet, &e),
                    _ => {}
                },
                Ok(Event::Empty(e)) => match e.name().as_ref() {
                    b"row" => {
                        current_row = Self::read_row(&mut worksheet, &e, current_row)?;
                        last_col = 0;
                    }
                    b"c" => {
                        let pending = PendingCell::start(&e, current_row, last_col)?;
                        last_col = pending.col;
                        pending.finish(&mut worksheet);
                    }
                    b"f" => {
                        if let Some(pending) = cell.as_mut() {
                            pending.formula = Some(Self::formula_attrs(&e));
                        }
                    }
                    b"col" => Self::read_col(&mut worksheet, &e),
                    b"mergeCell" => {
                        if let Some(reference) = attr(&e, b"ref") {
                            worksheet.merged_cells_mut().push(reference);
                        }
                    }
                    b"hyperlink" => Self::read_hyperlink(&mut worksheet, &e),
                    b"autoFilter" => {
                        *worksheet.auto_filter_mut() = read_auto_filter(&mut xml_reader, &e, true)?;
                    }
                    b"tablePart" => {
                        if let Some(id) = attr(&e, b"r:id") {
                            worksheet.add_table_part(TablePart::new(id));
                        }
                    }
                    _ => {}
                },
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"c" => {
                        if let Some(pending) = cell.take() {
                            pending.finish(&mut worksheet);
                        }
                    }
                    b"v" => in_value = false,
                    b"f" => in_formula = false,
                    b"t" => in_inline_text = false,
                    _ => {}
                },
                Ok(Event::Text(e)) => {
                    if let Some(pending) = cell.as_mut() {
                        if in_value || in_inline_text {
                            pending.value.push_str(&e.unescape()?);
                        } else if in_formula {
                            if let Some(formula) = pending.formula.as_mut() {
                                formula.text.push_str(&e.unescape()?);
                            }
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(worksheet)
    }

    /// Apply a `<row>` element and return its row number
    fn read_row(worksheet: &mut Worksheet, e: &BytesStart<'_>, previous: u32) -> XlsxResult<u32> {
        // Rows without `r` follow the previous one
        let row_num = attr_u32(e, b"r").unwrap_or(previous + 1);
        if row_num == 0 {
            return Err(XlsxError::Parse("row number 0".into()));
        }

        let custom_height = attr_bool(e, b"customHeight").unwrap_or(false);
        let height = attr(e, b"ht").and_then(|s| s.parse::<f64>().ok());
        let hidden = attr_bool(e, b"hidden").unwrap_or(false);
        let custom_format = attr_bool(e, b"customFormat").unwrap_or(false);
        let style = attr_u32(e, b"s");
        let outline_level = attr_u32(e, b"outlineLevel").unwrap_or(0);

        let row = worksheet.row_entry(row_num);
        if custom_height {
            row.height = height;
        }
        row.hidden = hidden;
        if custom_format {
            row.style_index = style;
        }
        row.outline_level = outline_level.min(7) as u8;

        Ok(row_num)
    }

    fn read_col(worksheet: &mut Worksheet, e: &BytesStart<'_>) {
        let (Some(min), Some(max)) = (attr_u32(e, b"min"), attr_u32(e, b"max")) else {
            return;
        };
        let mut range = ColumnRange::range(min, max);
        range.width = attr(e, b"width").and_then(|s| s.parse::<f64>().ok());
        range.hidden = attr_bool(e, b"hidden").unwrap_or(false);
        range.style_index = attr_u32(e, b"style");
        range.outline_level = attr_u32(e, b"outlineLevel").unwrap_or(0).min(7) as u8;
        worksheet.columns_mut().push(range);
    }

    fn read_hyperlink(worksheet: &mut Worksheet, e: &BytesStart<'_>) {
        let Some(reference) = attr(e, b"ref") else {
            return;
        };
        let mut link = match attr(e, b"r:id") {
            Some(id) => Hyperlink::external(reference, id),
            None => Hyperlink::internal(reference, attr(e, b"location").unwrap_or_default()),
        };
        link.display = attr(e, b"display");
        link.tooltip = attr(e, b"tooltip");
        worksheet.hyperlinks_mut().push(link);
    }

    fn formula_attrs(e: &BytesStart<'_>) -> Formula {
        let kind = match attr(e, b"t").as_deref() {
            Some("shared") => FormulaKind::Shared {
                index: attr_u32(e, b"si").unwrap_or(0),
            },
            Some("array") => FormulaKind::Array,
            Some("dataTable") => FormulaKind::DataTable,
            _ => FormulaKind::Normal,
        };
        Formula {
            kind,
            text: String::new(),
            reference: attr(e, b"ref"),
        }
    }
}

/// A `<c>` element being read
struct PendingCell {
    col: u32,
    row: u32,
    kind: CellType,
    style: u32,
    value: String,
    formula: Option<Formula>,
}

impl PendingCell {
    fn start(e: &BytesStart<'_>, current_row: u32, last_col: u32) -> XlsxResult<Self> {
        // Cells without `r` follow the previous cell of the row
        let (col, row) = match attr(e, b"r") {
            Some(reference) => {
                let addr = CellAddress::parse(&reference).map_err(|err| {
                    XlsxError::Parse(format!("Invalid cell reference '{}': {}", reference, err))
                })?;
                (addr.col, addr.row)
            }
            None => (last_col + 1, current_row.max(1)),
        };

        Ok(Self {
            col,
            row,
            kind: attr(e, b"t")
                .as_deref()
                .and_then(CellType::from_xlsx)
                .unwrap_or_default(),
            style: attr_u32(e, b"s").unwrap_or(0),
            value: String::new(),
            formula: None,
        })
    }

    fn finish(self, worksheet: &mut Worksheet) {
        let value = match self.kind {
            CellType::InlineString | CellType::FormulaString => decode_excel_escapes(&self.value),
            _ => self.value,
        };
        *worksheet.cell_entry(self.col, self.row) = Cell {
            style_index: self.style,
            value: CellValue::new(self.kind, value),
            formula: self.formula,
        };
    }
}
