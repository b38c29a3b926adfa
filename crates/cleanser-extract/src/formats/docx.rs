//! Word-processing documents (WordprocessingML)

use super::ooxml::{self, Package, PackageWriter, XML_DECLARATION};
use crate::error::{ExtractError, Result};
use crate::kind::DocumentKind;

use quick_xml::events::Event;
use quick_xml::Reader;

const KIND: DocumentKind = DocumentKind::WordProcessing;
const MAIN_PART: &str = "word/document.xml";

/// Body paragraphs first (each followed by a newline), then table cells
/// table → row → cell (each cell followed by a space, each row by a newline).
///
/// The relative position of tables and paragraphs is not preserved.
pub fn extract(bytes: &[u8]) -> Result<String> {
    let mut package = Package::open(bytes, KIND)?;
    let xml = package.part(MAIN_PART)?;
    body_text(&xml).map_err(|e| ExtractError::corrupt(package.kind(), e))
}

#[derive(Default)]
struct BodyWalker {
    stack: Vec<Vec<u8>>,
    table_depth: usize,
    textbox_depth: usize,
    paragraph: Option<String>,
    cell: Option<Vec<String>>,
    row: Option<String>,
    paragraphs: String,
    tables: String,
}

impl BodyWalker {
    fn parent(&self) -> &[u8] {
        self.stack.last().map(Vec::as_slice).unwrap_or_default()
    }

    /// Paragraphs directly under the body, or directly in a top-level table cell
    fn starts_tracked_paragraph(&self) -> bool {
        let parent = self.parent();
        parent == b"body" || (parent == b"tc" && self.table_depth == 1)
    }

    fn push_text(&mut self, text: &str) {
        if self.textbox_depth > 0 {
            return;
        }
        if let Some(paragraph) = self.paragraph.as_mut() {
            paragraph.push_str(text);
        }
    }

    fn finish_paragraph(&mut self) {
        let text = self.paragraph.take().unwrap_or_default();
        if self.parent() == b"body" {
            self.paragraphs.push_str(&text);
            self.paragraphs.push('\n');
        } else if let Some(cell) = self.cell.as_mut() {
            cell.push(text);
        }
    }

    fn start(&mut self, name: &[u8]) {
        match name {
            b"p" if self.starts_tracked_paragraph() => self.paragraph = Some(String::new()),
            b"tbl" => self.table_depth += 1,
            b"tr" if self.table_depth == 1 => self.row = Some(String::new()),
            b"tc" if self.table_depth == 1 => self.cell = Some(Vec::new()),
            b"txbxContent" => self.textbox_depth += 1,
            _ => {}
        }
        self.stack.push(name.to_vec());
    }

    fn empty(&mut self, name: &[u8]) {
        match name {
            b"p" if self.starts_tracked_paragraph() => {
                self.paragraph = Some(String::new());
                self.finish_paragraph();
            }
            // Only run-level tabs and breaks; `w:tabs/w:tab` are tab stop definitions
            b"tab" if self.parent() == b"r" => self.push_text("\t"),
            b"br" | b"cr" if self.parent() == b"r" => self.push_text("\n"),
            _ => {}
        }
    }

    fn end(&mut self, name: &[u8]) {
        self.stack.pop();
        match name {
            b"p" if self.paragraph.is_some() && self.starts_tracked_paragraph() => {
                self.finish_paragraph()
            }
            b"tc" if self.table_depth == 1 => {
                if let (Some(cell), Some(row)) = (self.cell.take(), self.row.as_mut()) {
                    row.push_str(&cell.join("\n"));
                    row.push(' ');
                }
            }
            b"tr" if self.table_depth == 1 => {
                if let Some(row) = self.row.take() {
                    self.tables.push_str(&row);
                    self.tables.push('\n');
                }
            }
            b"tbl" => self.table_depth = self.table_depth.saturating_sub(1),
            b"txbxContent" => self.textbox_depth = self.textbox_depth.saturating_sub(1),
            _ => {}
        }
    }
}

fn body_text(xml: &str) -> std::result::Result<String, quick_xml::Error> {
    let mut walker = BodyWalker::default();
    let mut reader = Reader::from_str(xml);

    loop {
        match reader.read_event()? {
            Event::Start(e) => walker.start(e.local_name().as_ref()),
            Event::Empty(e) => walker.empty(e.local_name().as_ref()),
            Event::End(e) => walker.end(e.local_name().as_ref()),
            Event::Text(t) if walker.parent() == b"t" => {
                let text = t.unescape()?;
                walker.push_text(&text);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let mut text = walker.paragraphs;
    text.push_str(&walker.tables);
    Ok(text)
}

/// One paragraph per newline-delimited line of `text`
pub fn reconstruct(text: &str) -> Result<Vec<u8>> {
    let mut body = String::new();
    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            body.push_str("<w:p/>");
            continue;
        }

        body.push_str("<w:p><w:r>");
        for (i, segment) in line.split('\t').enumerate() {
            if i > 0 {
                body.push_str("<w:tab/>");
            }
            if !segment.is_empty() {
                body.push_str("<w:t xml:space=\"preserve\">");
                body.push_str(&ooxml::escape_text(segment));
                body.push_str("</w:t>");
            }
        }
        body.push_str("</w:r></w:p>");
    }

    let document = format!(
        "{}<w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
<w:body>{}<w:sectPr/></w:body></w:document>",
        XML_DECLARATION, body
    );

    let content_types = format!(
        "{}<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
<Default Extension=\"xml\" ContentType=\"application/xml\"/>\
<Override PartName=\"/{}\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml\"/>\
</Types>",
        XML_DECLARATION, MAIN_PART
    );

    let mut writer = PackageWriter::new();
    writer.add("[Content_Types].xml", &content_types)?;
    writer.add("_rels/.rels", &ooxml::root_relationships(MAIN_PART))?;
    writer.add(MAIN_PART, &document)?;
    writer.finish()
}
