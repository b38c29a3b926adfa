//! Shared Office Open XML plumbing: zip packages, relationships, escaping

use crate::error::{ExtractError, Result};
use crate::kind::DocumentKind;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub(crate) const XML_DECLARATION: &str =
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n";

pub(crate) const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

/// Read-only view over an OOXML zip package
pub(crate) struct Package<'a> {
    kind: DocumentKind,
    archive: ZipArchive<Cursor<&'a [u8]>>,
}

impl<'a> Package<'a> {
    pub(crate) fn open(bytes: &'a [u8], kind: DocumentKind) -> Result<Self> {
        let archive =
            ZipArchive::new(Cursor::new(bytes)).map_err(|e| ExtractError::corrupt(kind, e))?;
        Ok(Self { kind, archive })
    }

    pub(crate) fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// Read a part that must exist
    pub(crate) fn part(&mut self, name: &str) -> Result<String> {
        self.optional_part(name)?
            .ok_or_else(|| ExtractError::corrupt(self.kind, format!("missing part {}", name)))
    }

    /// Read a part that may be absent
    pub(crate) fn optional_part(&mut self, name: &str) -> Result<Option<String>> {
        let mut file = match self.archive.by_name(name) {
            Ok(file) => file,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(ExtractError::corrupt(self.kind, e)),
        };

        let mut xml = String::new();
        file.read_to_string(&mut xml)
            .map_err(|e| ExtractError::corrupt(self.kind, format!("{}: {}", name, e)))?;
        Ok(Some(xml))
    }

    /// Relationship id → resolved part name for the part `source`
    pub(crate) fn relationships(&mut self, source: &str) -> Result<HashMap<String, String>> {
        let (dir, file) = match source.rsplit_once('/') {
            Some((dir, file)) => (dir, file),
            None => ("", source),
        };
        let rels_name = if dir.is_empty() {
            format!("_rels/{}.rels", file)
        } else {
            format!("{}/_rels/{}.rels", dir, file)
        };

        let xml = match self.optional_part(&rels_name)? {
            Some(xml) => xml,
            None => return Ok(HashMap::new()),
        };

        let kind = self.kind;
        let mut rels = HashMap::new();
        let mut reader = Reader::from_str(&xml);
        loop {
            match reader.read_event().map_err(|e| ExtractError::corrupt(kind, e))? {
                Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                    if attr(&e, b"TargetMode").as_deref() == Some("External") {
                        continue;
                    }
                    if let (Some(id), Some(target)) = (attr(&e, b"Id"), attr(&e, b"Target")) {
                        rels.insert(id, resolve_target(dir, &target));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(rels)
    }
}

/// Value of the attribute whose local name is `local`
pub(crate) fn attr(element: &BytesStart<'_>, local: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == local)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Resolve a relationship target against the directory of its source part
pub(crate) fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Escape text for element content, dropping characters XML 1.0 cannot carry
pub(crate) fn escape_text(text: &str) -> String {
    let clean: String = text
        .chars()
        .filter(|&c| matches!(c, '\t' | '\n' | '\r') || !c.is_control())
        .collect();
    quick_xml::escape::escape(clean.as_str()).into_owned()
}

/// Builds a new OOXML zip package in memory
pub(crate) struct PackageWriter {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
}

impl PackageWriter {
    pub(crate) fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
        }
    }

    pub(crate) fn add(&mut self, name: &str, content: &str) -> Result<()> {
        self.writer
            .start_file(name, self.options)
            .map_err(ExtractError::reconstruction)?;
        self.writer.write_all(content.as_bytes())?;
        Ok(())
    }

    pub(crate) fn finish(self) -> Result<Vec<u8>> {
        let cursor = self.writer.finish().map_err(ExtractError::reconstruction)?;
        Ok(cursor.into_inner())
    }
}

/// `_rels/.rels` pointing at the main document part
pub(crate) fn root_relationships(main_part: &str) -> String {
    format!(
        "{}<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" Type=\"{}\" Target=\"{}\"/></Relationships>",
        XML_DECLARATION, REL_OFFICE_DOCUMENT, main_part
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("xl", "worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(resolve_target("ppt/slides", "../slideLayouts/slideLayout1.xml"), "ppt/slideLayouts/slideLayout1.xml");
        assert_eq!(resolve_target("xl", "/xl/worksheets/sheet2.xml"), "xl/worksheets/sheet2.xml");
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
        assert_eq!(escape_text("page\u{c}break\tok"), "pagebreak\tok");
    }

    #[test]
    fn test_written_package_reads_back() {
        let mut writer = PackageWriter::new();
        writer.add("_rels/.rels", &root_relationships("word/document.xml")).unwrap();
        writer.add("word/document.xml", "<doc/>").unwrap();
        let bytes = writer.finish().unwrap();

        let mut package = Package::open(&bytes, DocumentKind::WordProcessing).unwrap();
        assert_eq!(package.part("word/document.xml").unwrap(), "<doc/>");
        assert!(package.optional_part("word/missing.xml").unwrap().is_none());

        let rels = package.relationships("").unwrap();
        assert_eq!(rels.get("rId1").map(String::as_str), Some("word/document.xml"));
        assert!(package.relationships("word/document.xml").unwrap().is_empty());
    }

    #[test]
    fn test_garbage_is_corrupt() {
        let err = Package::open(b"not a zip", DocumentKind::Spreadsheet).err().unwrap();
        assert!(matches!(err, ExtractError::CorruptDocument { .. }));
    }
}
