//! Document kinds and their resolution from filenames and media types

use crate::error::{ExtractError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Closed set of supported document kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    PlainText,
    Pdf,
    Image,
    WordProcessing,
    Spreadsheet,
    Presentation,
}

impl DocumentKind {
    /// Every kind, in dispatch-table order
    pub const ALL: [DocumentKind; 6] = [
        DocumentKind::PlainText,
        DocumentKind::Pdf,
        DocumentKind::Image,
        DocumentKind::WordProcessing,
        DocumentKind::Spreadsheet,
        DocumentKind::Presentation,
    ];

    /// Resolve a kind from a filename suffix (case-insensitive)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "txt" => Some(DocumentKind::PlainText),
            "pdf" => Some(DocumentKind::Pdf),
            "png" | "jpg" | "jpeg" => Some(DocumentKind::Image),
            "docx" => Some(DocumentKind::WordProcessing),
            "xlsx" => Some(DocumentKind::Spreadsheet),
            "pptx" => Some(DocumentKind::Presentation),
            _ => None,
        }
    }

    /// Resolve a kind from a declared media type
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "text/plain" => Some(DocumentKind::PlainText),
            "application/pdf" => Some(DocumentKind::Pdf),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(DocumentKind::WordProcessing)
            }
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => {
                Some(DocumentKind::Spreadsheet)
            }
            "application/vnd.openxmlformats-officedocument.presentationml.presentation" => {
                Some(DocumentKind::Presentation)
            }
            "image/png" | "image/jpeg" | "image/jpg" => Some(DocumentKind::Image),
            _ => None,
        }
    }

    /// Resolve a kind from the filename first, then the media type
    pub fn resolve(filename: &str, media_type: Option<&str>) -> Result<Self> {
        let by_extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension);

        by_extension
            .or_else(|| media_type.and_then(Self::from_media_type))
            .ok_or_else(|| match media_type {
                Some(mt) => ExtractError::UnsupportedFormat(format!("{} ({})", filename, mt)),
                None => ExtractError::UnsupportedFormat(filename.to_string()),
            })
    }

    /// Canonical media type of the source format
    pub fn media_type(&self) -> &'static str {
        match self {
            DocumentKind::PlainText => "text/plain",
            DocumentKind::Pdf => "application/pdf",
            DocumentKind::Image => "image/png",
            DocumentKind::WordProcessing => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            DocumentKind::Spreadsheet => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            DocumentKind::Presentation => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
        }
    }

    /// Whether the cleaned artifact for this kind is plain text instead of the source format
    pub fn degrades_to_text(&self) -> bool {
        matches!(self, DocumentKind::Pdf | DocumentKind::Image)
    }

    /// Whether extraction yields a table model
    pub fn is_tabular(&self) -> bool {
        matches!(self, DocumentKind::Spreadsheet)
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentKind::PlainText => "plain-text",
            DocumentKind::Pdf => "PDF",
            DocumentKind::Image => "image",
            DocumentKind::WordProcessing => "word-processing",
            DocumentKind::Spreadsheet => "spreadsheet",
            DocumentKind::Presentation => "presentation",
        };
        f.write_str(name)
    }
}
