//! # Cleanser Extract
//!
//! Format-aware text extraction and reconstruction, with PII redaction via
//! `cleanser-guard`.
//!
//! ## Features
//!
//! - **Extraction**: plain text, PDF, images (OCR), Word, Excel and PowerPoint documents
//! - **Redaction**: text and table content through a [`cleanser_guard::Guard`]
//! - **Reconstruction**: rebuild a minimal document of the original kind from redacted content
//!
//! ## Example
//!
//! ```rust,ignore
//! use cleanser_extract::{Document, FormatRegistry, RedactionAdapter};
//! use cleanser_guard::{Guard, GuardConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = FormatRegistry::default();
//!     let adapter = RedactionAdapter::new(Guard::new(GuardConfig::default())?);
//!
//!     let document = Document::from_path("report.docx".as_ref())?;
//!     let extracted = registry.extract(&document)?;
//!     let redacted = adapter.redact(&extracted.content, document.filename()).await?;
//!     let bytes = registry.reconstruct(extracted.kind, &redacted.content, extracted.content.as_table())?;
//!     std::fs::write("cleaned_report.docx", bytes)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐     ┌────────────┐     ┌───────────────┐     ┌───────────────┐
//! │ Document │ ──► │ Extractor  │ ──► │ Cleanser Guard│ ──► │ Reconstructor │
//! │  (bytes) │     │ (per kind) │     │  (redaction)  │     │  (per kind)   │
//! └──────────┘     └────────────┘     └───────────────┘     └───────────────┘
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod formats;
pub mod kind;
pub mod ocr;
pub mod redact;
pub mod registry;
pub mod result;

pub use config::{ExtractorConfig, OcrConfig};
pub use document::Document;
pub use error::{ExtractError, Result};
pub use kind::DocumentKind;
pub use ocr::{OcrEngine, TesseractEngine};
pub use redact::{Redaction, RedactionAdapter, TableRedactionMode};
pub use registry::{handler, ExtractContext, FormatHandler, FormatRegistry};
pub use result::{Cell, ExtractResult, ExtractedText, Row, Sheet, TableModel};
