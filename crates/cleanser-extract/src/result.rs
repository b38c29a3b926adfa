//! Extraction result types

use crate::kind::DocumentKind;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;

/// A single spreadsheet cell; `None` for cells with no value
pub type Cell = Option<String>;

/// One row of cells, column A first
pub type Row = Vec<Cell>;

/// One worksheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sheet {
    pub title: String,
    pub rows: Vec<Row>,
}

impl Sheet {
    pub fn new(title: impl Into<String>, rows: Vec<Row>) -> Self {
        Self {
            title: title.into(),
            rows,
        }
    }
}

/// Structured sheet/row/cell content of a workbook
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableModel {
    pub sheets: Vec<Sheet>,
}

impl TableModel {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    /// Sheet titles in workbook order
    pub fn titles(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.title.as_str()).collect()
    }

    /// Flattened view: each non-empty cell followed by a space, each row
    /// followed by a newline, sheets concatenated.
    pub fn flatten(&self) -> String {
        let mut text = String::new();
        for sheet in &self.sheets {
            for row in &sheet.rows {
                for cell in row.iter().flatten() {
                    if !cell.is_empty() {
                        text.push_str(cell);
                        text.push(' ');
                    }
                }
                text.push('\n');
            }
        }
        text
    }
}

/// Extracted (or redacted) content of one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "content", rename_all = "snake_case")]
pub enum ExtractedText {
    /// A single string
    Text(String),
    /// A workbook table model
    Table(TableModel),
}

impl ExtractedText {
    /// Text view of the content; tables are flattened
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            ExtractedText::Text(text) => Cow::Borrowed(text),
            ExtractedText::Table(table) => Cow::Owned(table.flatten()),
        }
    }

    /// Whether no text was found
    pub fn is_blank(&self) -> bool {
        self.as_text().trim().is_empty()
    }

    pub fn as_table(&self) -> Option<&TableModel> {
        match self {
            ExtractedText::Table(table) => Some(table),
            ExtractedText::Text(_) => None,
        }
    }
}

/// Result of extracting one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractResult {
    /// The extracted content
    pub content: ExtractedText,

    /// Source filename
    pub source: String,

    /// Resolved kind
    pub kind: DocumentKind,

    /// Original content length in bytes
    pub original_length: usize,

    /// Extracted text length in characters
    pub text_length: usize,

    /// Format-specific metadata (page, sheet or slide counts)
    pub metadata: HashMap<String, String>,
}

impl ExtractResult {
    /// Create a new extraction result
    pub fn new(content: ExtractedText, source: impl Into<String>, kind: DocumentKind) -> Self {
        let text_length = content.as_text().chars().count();
        Self {
            content,
            source: source.into(),
            kind,
            original_length: 0,
            text_length,
            metadata: HashMap::new(),
        }
    }

    /// Set the original length
    pub fn with_original_length(mut self, length: usize) -> Self {
        self.original_length = length;
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Whether no text was found
    pub fn is_blank(&self) -> bool {
        self.content.is_blank()
    }

    /// Get a truncated version of the text
    pub fn truncate(&self, max_chars: usize) -> String {
        let text = self.content.as_text();
        match text.char_indices().nth(max_chars) {
            Some((idx, _)) => format!("{}...", &text[..idx]),
            None => text.into_owned(),
        }
    }
}
