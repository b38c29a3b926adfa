//! Spreadsheets (SpreadsheetML)

use super::numfmt::{self, DateStyles};
use super::ooxml::{self, attr, Package, PackageWriter, XML_DECLARATION};
use crate::error::{ExtractError, Result};
use crate::kind::DocumentKind;
use crate::result::{Row, Sheet, TableModel};

use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::BTreeMap;
use tracing::warn;

const KIND: DocumentKind = DocumentKind::Spreadsheet;
const WORKBOOK_PART: &str = "xl/workbook.xml";

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const REL_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
const REL_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";

/// Last row Excel can address (1-based)
const MAX_ROWS: usize = 1_048_576;
/// Last column Excel can address (`XFD`, 1-based)
const MAX_COLUMNS: usize = 16_384;
/// Largest dense grid a sheet may expand to
pub const MAX_GRID_CELLS: usize = 10_000_000;

/// Read every worksheet into a dense grid, in workbook order
pub fn extract(bytes: &[u8]) -> Result<TableModel> {
    let mut package = Package::open(bytes, KIND)?;

    let workbook = package.part(WORKBOOK_PART)?;
    let info = workbook_info(&workbook).map_err(corrupt)?;
    let rels = package.relationships(WORKBOOK_PART)?;

    let shared = match package.optional_part("xl/sharedStrings.xml")? {
        Some(xml) => shared_strings(&xml).map_err(corrupt)?,
        None => Vec::new(),
    };
    let styles = match package.optional_part("xl/styles.xml")? {
        Some(xml) => DateStyles::parse(&xml).map_err(corrupt)?,
        None => DateStyles::default(),
    };
    let values = CellValues {
        shared: &shared,
        styles: &styles,
        date1904: info.date1904,
    };

    let mut model = TableModel::default();
    for (title, rel_id) in info.sheets {
        let Some(target) = rels.get(&rel_id) else {
            warn!(sheet = %title, rel_id = %rel_id, "Sheet has no relationship target, skipping");
            continue;
        };
        let xml = package.part(target)?;
        let rows = worksheet_rows(&xml, &values)?;
        model.sheets.push(Sheet::new(title, rows));
    }
    Ok(model)
}

fn corrupt(e: quick_xml::Error) -> ExtractError {
    ExtractError::corrupt(KIND, e)
}

#[derive(Default)]
struct WorkbookInfo {
    /// (title, relationship id) for each `<sheet>` in workbook order
    sheets: Vec<(String, String)>,
    /// Serials count from 1904-01-01 instead of 1899-12-30
    date1904: bool,
}

fn workbook_info(xml: &str) -> std::result::Result<WorkbookInfo, quick_xml::Error> {
    let mut info = WorkbookInfo::default();
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"sheet" => {
                    if let (Some(name), Some(id)) = (attr(&e, b"name"), attr(&e, b"id")) {
                        info.sheets.push((name, id));
                    }
                }
                b"workbookPr" => {
                    info.date1904 = matches!(attr(&e, b"date1904").as_deref(), Some("1" | "true"));
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(info)
}

/// Shared string table; rich runs are concatenated, phonetic hints dropped
fn shared_strings(xml: &str) -> std::result::Result<Vec<String>, quick_xml::Error> {
    let mut strings = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;
    let mut phonetic_depth = 0usize;

    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"rPh" => phonetic_depth += 1,
                b"t" => in_text = phonetic_depth == 0,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::Text(t) if in_text => {
                if let Some(current) = current.as_mut() {
                    current.push_str(&t.unescape()?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => strings.push(current.take().unwrap_or_default()),
                b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                b"t" => in_text = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(strings)
}

/// Split a cell reference like `AB12` into zero-based (row, column).
///
/// `None` for malformed references and for cells outside the
/// `A1:XFD1048576` sheet.
fn parse_reference(reference: &str) -> Option<(usize, usize)> {
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() {
        return None;
    }

    let mut column = 0usize;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = c.to_ascii_uppercase() as usize - 'A' as usize + 1;
        column = column.checked_mul(26)?.checked_add(digit)?;
        if column > MAX_COLUMNS {
            return None;
        }
    }
    let row = parse_row_number(digits)?;
    Some((row, column - 1))
}

/// A 1-based row number as a zero-based index, `None` when out of range
fn parse_row_number(digits: &str) -> Option<usize> {
    let row: usize = digits.parse().ok()?;
    (1..=MAX_ROWS).contains(&row).then(|| row - 1)
}

/// Column letters for a zero-based column index
fn column_name(mut column: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (column % 26) as u8);
        if column < 26 {
            break;
        }
        column = column / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

/// Workbook-wide inputs for turning raw cell values into display text
struct CellValues<'a> {
    shared: &'a [String],
    styles: &'a DateStyles,
    date1904: bool,
}

#[derive(Default)]
struct PendingCell {
    column: usize,
    cell_type: Option<String>,
    style: Option<usize>,
    value: String,
}

impl PendingCell {
    /// Display text of the cell, `None` when it has no value
    fn resolve(self, values: &CellValues<'_>) -> Option<String> {
        if self.value.is_empty() {
            return None;
        }
        let text = match self.cell_type.as_deref() {
            Some("s") => values
                .shared
                .get(self.value.trim().parse::<usize>().ok()?)?
                .clone(),
            Some("b") => match self.value.trim() {
                "1" => "True".to_string(),
                _ => "False".to_string(),
            },
            Some("d") => numfmt::iso_to_text(&self.value).unwrap_or(self.value),
            None | Some("n") if values.styles.is_date(self.style) => self
                .value
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(|serial| numfmt::serial_to_text(serial, values.date1904))
                .unwrap_or(self.value),
            _ => self.value,
        };
        (!text.is_empty()).then_some(text)
    }
}

fn invalid(what: &str, value: &str) -> ExtractError {
    ExtractError::corrupt(KIND, format!("invalid {} '{}'", what, value))
}

fn worksheet_rows(xml: &str, values: &CellValues<'_>) -> Result<Vec<Row>> {
    let mut cells: BTreeMap<(usize, usize), String> = BTreeMap::new();
    let mut row_index = 0usize;
    let mut next_row = 0usize;
    let mut next_column = 0usize;
    let mut pending: Option<PendingCell> = None;
    let mut capture = false;
    let mut phonetic_depth = 0usize;

    // Row position from an explicit `r` attribute, else the next row
    let row_position = |r: Option<String>, next_row: usize| -> Result<usize> {
        match r {
            Some(r) => parse_row_number(&r).ok_or_else(|| invalid("row number", &r)),
            None if next_row < MAX_ROWS => Ok(next_row),
            None => Err(invalid("row number", &(next_row + 1).to_string())),
        }
    };
    let column_position = |r: Option<String>, next_column: usize| -> Result<usize> {
        match r {
            Some(r) => parse_reference(&r)
                .map(|(_, column)| column)
                .ok_or_else(|| invalid("cell reference", &r)),
            None if next_column < MAX_COLUMNS => Ok(next_column),
            None => Err(invalid("column", &column_name(next_column))),
        }
    };

    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event().map_err(corrupt)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"row" => {
                    row_index = row_position(attr(&e, b"r"), next_row)?;
                    next_row = row_index + 1;
                    next_column = 0;
                }
                b"c" => {
                    let column = column_position(attr(&e, b"r"), next_column)?;
                    next_column = column + 1;
                    pending = Some(PendingCell {
                        column,
                        cell_type: attr(&e, b"t"),
                        style: attr(&e, b"s").and_then(|s| s.parse().ok()),
                        value: String::new(),
                    });
                }
                b"rPh" => phonetic_depth += 1,
                // Cached values and inline string runs; formulas are skipped
                b"v" | b"t" => capture = pending.is_some() && phonetic_depth == 0,
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"row" => {
                    next_row = row_position(attr(&e, b"r"), next_row)? + 1;
                }
                b"c" => {
                    next_column = column_position(attr(&e, b"r"), next_column)? + 1;
                }
                _ => {}
            },
            Event::Text(t) if capture => {
                if let Some(cell) = pending.as_mut() {
                    cell.value.push_str(&t.unescape().map_err(corrupt)?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"c" => {
                    if let Some(cell) = pending.take() {
                        let column = cell.column;
                        if let Some(text) = cell.resolve(values) {
                            cells.insert((row_index, column), text);
                        }
                    }
                }
                b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                b"v" | b"t" => capture = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    // Dense grid from A1 to the last used cell
    let Some(last_row) = cells.keys().map(|(row, _)| *row).max() else {
        return Ok(Vec::new());
    };
    let width = cells.keys().map(|(_, column)| column + 1).max().unwrap_or(0);

    let grid = (last_row + 1).saturating_mul(width);
    if grid > MAX_GRID_CELLS {
        return Err(ExtractError::corrupt(
            KIND,
            format!(
                "sheet spans {} rows by {} columns, more than {} cells",
                last_row + 1,
                width,
                MAX_GRID_CELLS
            ),
        ));
    }

    let mut rows: Vec<Row> = vec![vec![None; width]; last_row + 1];
    for ((row, column), text) in cells {
        rows[row][column] = Some(text);
    }
    Ok(rows)
}

/// Write a new workbook with one sheet per sheet of `table`.
///
/// Titles come from `original` when it is given, so a redacted table keeps
/// the source workbook's sheet names.
pub fn reconstruct(table: &TableModel, original: Option<&TableModel>) -> Result<Vec<u8>> {
    let mut titles: Vec<String> = table
        .sheets
        .iter()
        .enumerate()
        .map(|(i, sheet)| {
            let title = original
                .and_then(|o| o.sheets.get(i))
                .map(|s| s.title.as_str())
                .unwrap_or(sheet.title.as_str());
            if title.trim().is_empty() {
                format!("Sheet{}", i + 1)
            } else {
                title.to_string()
            }
        })
        .collect();
    let mut sheets: Vec<&[Row]> = table.sheets.iter().map(|s| s.rows.as_slice()).collect();

    // A workbook needs at least one sheet
    if sheets.is_empty() {
        titles.push("Sheet1".to_string());
        sheets.push(&[]);
    }

    let mut writer = PackageWriter::new();
    writer.add("[Content_Types].xml", &content_types(sheets.len()))?;
    writer.add("_rels/.rels", &ooxml::root_relationships(WORKBOOK_PART))?;
    writer.add(WORKBOOK_PART, &workbook_xml(&titles))?;
    writer.add("xl/_rels/workbook.xml.rels", &workbook_rels(sheets.len()))?;
    writer.add("xl/styles.xml", &styles_xml())?;
    for (i, rows) in sheets.iter().enumerate() {
        writer.add(&format!("xl/worksheets/sheet{}.xml", i + 1), &worksheet_xml(rows))?;
    }
    writer.finish()
}

fn content_types(sheet_count: usize) -> String {
    let mut xml = format!(
        "{}<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
<Default Extension=\"xml\" ContentType=\"application/xml\"/>\
<Override PartName=\"/xl/workbook.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml\"/>\
<Override PartName=\"/xl/styles.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml\"/>",
        XML_DECLARATION
    );
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            "<Override PartName=\"/xl/worksheets/sheet{}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>",
            i
        ));
    }
    xml.push_str("</Types>");
    xml
}

fn workbook_xml(titles: &[String]) -> String {
    let mut xml = format!(
        "{}<workbook xmlns=\"{}\" xmlns:r=\"{}\"><sheets>",
        XML_DECLARATION, NS_MAIN, NS_REL
    );
    for (i, title) in titles.iter().enumerate() {
        xml.push_str(&format!(
            "<sheet name=\"{}\" sheetId=\"{}\" r:id=\"rId{}\"/>",
            ooxml::escape_text(title),
            i + 1,
            i + 1
        ));
    }
    xml.push_str("</sheets></workbook>");
    xml
}

fn workbook_rels(sheet_count: usize) -> String {
    let mut xml = format!(
        "{}<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
        XML_DECLARATION
    );
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            "<Relationship Id=\"rId{}\" Type=\"{}\" Target=\"worksheets/sheet{}.xml\"/>",
            i, REL_WORKSHEET, i
        ));
    }
    xml.push_str(&format!(
        "<Relationship Id=\"rId{}\" Type=\"{}\" Target=\"styles.xml\"/></Relationships>",
        sheet_count + 1,
        REL_STYLES
    ));
    xml
}

fn styles_xml() -> String {
    format!(
        "{}<styleSheet xmlns=\"{}\">\
<fonts count=\"1\"><font><sz val=\"11\"/><name val=\"Calibri\"/></font></fonts>\
<fills count=\"2\"><fill><patternFill patternType=\"none\"/></fill><fill><patternFill patternType=\"gray125\"/></fill></fills>\
<borders count=\"1\"><border><left/><right/><top/><bottom/><diagonal/></border></borders>\
<cellStyleXfs count=\"1\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\"/></cellStyleXfs>\
<cellXfs count=\"1\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\" xfId=\"0\"/></cellXfs>\
<cellStyles count=\"1\"><cellStyle name=\"Normal\" xfId=\"0\" builtinId=\"0\"/></cellStyles>\
</styleSheet>",
        XML_DECLARATION, NS_MAIN
    )
}

fn worksheet_xml(rows: &[Row]) -> String {
    let mut xml = format!("{}<worksheet xmlns=\"{}\"><sheetData>", XML_DECLARATION, NS_MAIN);
    for (r, row) in rows.iter().enumerate() {
        let mut cells = String::new();
        for (c, cell) in row.iter().enumerate() {
            let Some(text) = cell.as_deref().filter(|t| !t.is_empty()) else {
                continue;
            };
            cells.push_str(&format!(
                "<c r=\"{}{}\" t=\"inlineStr\"><is><t xml:space=\"preserve\">{}</t></is></c>",
                column_name(c),
                r + 1,
                ooxml::escape_text(text)
            ));
        }
        if !cells.is_empty() {
            xml.push_str(&format!("<row r=\"{}\">{}</row>", r + 1, cells));
        }
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}
