//! Downloadable cleansed artifacts

use cleanser_extract::DocumentKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Media type of every plain-text artifact
pub const TEXT_MEDIA_TYPE: &str = "text/plain; charset=utf-8";

/// `cleaned_<name>` for kinds rebuilt in their own format, `cleaned_<name>.txt`
/// for kinds that degrade to text
pub fn artifact_name(filename: &str, kind: DocumentKind) -> String {
    if kind.degrades_to_text() {
        text_artifact_name(filename)
    } else {
        format!("cleaned_{}", filename)
    }
}

fn text_artifact_name(filename: &str) -> String {
    if filename.to_ascii_lowercase().ends_with(".txt") {
        format!("cleaned_{}", filename)
    } else {
        format!("cleaned_{}.txt", filename)
    }
}

/// A cleansed document ready to be saved
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub filename: String,
    pub media_type: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl Artifact {
    /// Artifact rebuilt for `kind` from the document called `source`
    pub fn for_kind(source: &str, kind: DocumentKind, bytes: Vec<u8>) -> Self {
        let media_type = if kind.degrades_to_text() || kind == DocumentKind::PlainText {
            TEXT_MEDIA_TYPE.to_string()
        } else {
            kind.media_type().to_string()
        };
        Self {
            filename: artifact_name(source, kind),
            media_type,
            bytes,
        }
    }

    /// Plain-text artifact used when the original format cannot be rebuilt
    pub fn text_fallback(source: &str, text: &str) -> Self {
        Self {
            filename: text_artifact_name(source),
            media_type: TEXT_MEDIA_TYPE.to_string(),
            bytes: text.as_bytes().to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Write the artifact into `dir`, returning the written path
    pub fn write_to(&self, dir: &Path) -> io::Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(&self.filename);
        fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_names() {
        assert_eq!(artifact_name("contact.txt", DocumentKind::PlainText), "cleaned_contact.txt");
        assert_eq!(artifact_name("deck.pptx", DocumentKind::Presentation), "cleaned_deck.pptx");
        assert_eq!(artifact_name("scan.png", DocumentKind::Image), "cleaned_scan.png.txt");
        assert_eq!(artifact_name("report.pdf", DocumentKind::Pdf), "cleaned_report.pdf.txt");
    }

    #[test]
    fn test_text_fallback() {
        let artifact = Artifact::text_fallback("people.xlsx", "<PERSON>");
        assert_eq!(artifact.filename, "cleaned_people.xlsx.txt");
        assert_eq!(artifact.media_type, TEXT_MEDIA_TYPE);
        assert_eq!(artifact.bytes, b"<PERSON>");
    }

    #[test]
    fn test_write_to() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = Artifact::for_kind("notes.txt", DocumentKind::PlainText, b"hi".to_vec());

        let path = artifact.write_to(&dir.path().join("out")).unwrap();
        assert_eq!(path.file_name().unwrap(), "cleaned_notes.txt");
        assert_eq!(fs::read(path).unwrap(), b"hi");
    }
}
