//! Redaction adapter: runs the guard over extracted text or table content

use crate::result::{ExtractedText, Row, Sheet, TableModel};

use cleanser_guard::{Guard, GuardContext, Result, SanitizeResult, Span};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// How table content is fed to the guard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableRedactionMode {
    /// Join each row's cells with single spaces, redact the line, and split the
    /// result on whitespace back into consecutive cells starting at column A.
    /// Cells containing spaces, and empty cells, shift the columns that follow.
    #[default]
    Row,
    /// Redact each non-empty cell on its own; the grid shape is preserved
    Cell,
}

impl FromStr for TableRedactionMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "row" => Ok(TableRedactionMode::Row),
            "cell" => Ok(TableRedactionMode::Cell),
            other => Err(format!("unknown table redaction mode '{}' (expected row or cell)", other)),
        }
    }
}

impl fmt::Display for TableRedactionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableRedactionMode::Row => write!(f, "row"),
            TableRedactionMode::Cell => write!(f, "cell"),
        }
    }
}

/// Redacted content and the spans that were replaced.
///
/// Span offsets are relative to the unit they were found in: the whole text,
/// one joined row, or one cell.
#[derive(Debug, Clone)]
pub struct Redaction {
    pub content: ExtractedText,
    pub spans: Vec<Span>,
}

impl Redaction {
    /// Whether anything was replaced
    pub fn is_modified(&self) -> bool {
        !self.spans.is_empty()
    }
}

/// Applies a [`Guard`] to extracted content
pub struct RedactionAdapter {
    guard: Guard,
    table_mode: TableRedactionMode,
}

impl RedactionAdapter {
    pub fn new(guard: Guard) -> Self {
        Self {
            guard,
            table_mode: TableRedactionMode::default(),
        }
    }

    /// Set the table redaction mode
    pub fn with_table_mode(mut self, mode: TableRedactionMode) -> Self {
        self.table_mode = mode;
        self
    }

    pub fn table_mode(&self) -> TableRedactionMode {
        self.table_mode
    }

    pub fn guard(&self) -> &Guard {
        &self.guard
    }

    /// Redact extracted content of either shape
    pub async fn redact(&self, content: &ExtractedText, source: &str) -> Result<Redaction> {
        match content {
            ExtractedText::Text(text) => {
                let result = self.redact_text(text, source).await?;
                let spans = result.spans().to_vec();
                Ok(Redaction {
                    content: ExtractedText::Text(result.into_text()),
                    spans,
                })
            }
            ExtractedText::Table(table) => self.redact_table(table, source).await,
        }
    }

    /// Redact a single string
    pub async fn redact_text(&self, text: &str, source: &str) -> Result<SanitizeResult> {
        let context = GuardContext::new().with_source(source);
        self.guard.sanitize_with_context(text, &context).await
    }

    /// Redact every sheet of a table, one row or cell at a time
    pub async fn redact_table(&self, table: &TableModel, source: &str) -> Result<Redaction> {
        let mut spans = Vec::new();
        let mut sheets = Vec::with_capacity(table.sheets.len());

        for sheet in &table.sheets {
            let mut rows = Vec::with_capacity(sheet.rows.len());
            for (r, row) in sheet.rows.iter().enumerate() {
                let context = GuardContext::new()
                    .with_source(source)
                    .with_unit(format!("{}!{}", sheet.title, r + 1));
                let redacted = match self.table_mode {
                    TableRedactionMode::Row => self.redact_row(row, &context, &mut spans).await?,
                    TableRedactionMode::Cell => self.redact_cells(row, &context, &mut spans).await?,
                };
                rows.push(redacted);
            }
            sheets.push(Sheet::new(sheet.title.clone(), rows));
        }

        debug!(
            source,
            mode = %self.table_mode,
            sheets = sheets.len(),
            spans = spans.len(),
            "Redacted table"
        );
        Ok(Redaction {
            content: ExtractedText::Table(TableModel::new(sheets)),
            spans,
        })
    }

    async fn redact_row(
        &self,
        row: &Row,
        context: &GuardContext,
        spans: &mut Vec<Span>,
    ) -> Result<Row> {
        let line = row
            .iter()
            .map(|cell| cell.as_deref().unwrap_or(""))
            .collect::<Vec<_>>()
            .join(" ");

        let result = self.guard.sanitize_with_context(&line, context).await?;
        spans.extend_from_slice(result.spans());
        Ok(result
            .text()
            .split_whitespace()
            .map(|token| Some(token.to_string()))
            .collect())
    }

    async fn redact_cells(
        &self,
        row: &Row,
        context: &GuardContext,
        spans: &mut Vec<Span>,
    ) -> Result<Row> {
        let mut redacted = Vec::with_capacity(row.len());
        for cell in row {
            match cell.as_deref() {
                Some(text) if !text.trim().is_empty() => {
                    let result = self.guard.sanitize_with_context(text, context).await?;
                    spans.extend_from_slice(result.spans());
                    redacted.push(Some(result.into_text()));
                }
                _ => redacted.push(cell.clone()),
            }
        }
        Ok(redacted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cleanser_guard::{Detector, EntityType, GuardBuilder, GuardConfig, GuardError};

    fn cell(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    fn adapter(mode: TableRedactionMode) -> RedactionAdapter {
        let guard = Guard::new(GuardConfig::minimal()).unwrap();
        RedactionAdapter::new(guard).with_table_mode(mode)
    }

    fn people() -> TableModel {
        TableModel::new(vec![Sheet::new(
            "Sheet1",
            vec![
                vec![cell("Name"), cell("Email")],
                vec![cell("Alice Smith"), None, cell("alice@x.com")],
            ],
        )])
    }

    #[tokio::test]
    async fn test_redact_text() {
        let redaction = adapter(TableRedactionMode::Row)
            .redact(&ExtractedText::Text("Mail bob@y.org today".to_string()), "a.txt")
            .await
            .unwrap();

        assert_eq!(redaction.content.as_text(), "Mail <EMAIL_ADDRESS> today");
        assert_eq!(redaction.spans.len(), 1);
        assert_eq!(redaction.spans[0].entity_type, EntityType::EmailAddress);
    }

    #[tokio::test]
    async fn test_row_mode_resplits_tokens() {
        let redaction = adapter(TableRedactionMode::Row)
            .redact_table(&people(), "people.xlsx")
            .await
            .unwrap();

        let table = redaction.content.as_table().unwrap();
        assert_eq!(table.sheets[0].title, "Sheet1");
        assert_eq!(table.sheets[0].rows[0], vec![cell("Name"), cell("Email")]);
        // "Alice Smith  alice@x.com" collapses into two consecutive cells
        assert_eq!(
            table.sheets[0].rows[1],
            vec![cell("<PERSON>"), cell("<EMAIL_ADDRESS>")]
        );
    }

    #[tokio::test]
    async fn test_cell_mode_preserves_shape() {
        let redaction = adapter(TableRedactionMode::Cell)
            .redact_table(&people(), "people.xlsx")
            .await
            .unwrap();

        let table = redaction.content.as_table().unwrap();
        assert_eq!(
            table.sheets[0].rows[1],
            vec![cell("<PERSON>"), None, cell("<EMAIL_ADDRESS>")]
        );
        assert_eq!(redaction.spans.len(), 2);
    }

    struct DownDetector;

    #[async_trait]
    impl Detector for DownDetector {
        async fn analyze(&self, _text: &str, _language: &str) -> cleanser_guard::Result<Vec<Span>> {
            Err(GuardError::DetectorFailure("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_detector_failure_propagates() {
        let guard = GuardBuilder::new()
            .with_config(GuardConfig::minimal())
            .with_detector(DownDetector)
            .build()
            .unwrap();

        let err = RedactionAdapter::new(guard)
            .redact(&ExtractedText::Text("anything".to_string()), "a.txt")
            .await
            .unwrap_err();
        assert!(err.is_detector_failure());
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("CELL".parse::<TableRedactionMode>().unwrap(), TableRedactionMode::Cell);
        assert!("column".parse::<TableRedactionMode>().is_err());
        assert_eq!(TableRedactionMode::default().to_string(), "row");
    }
}
