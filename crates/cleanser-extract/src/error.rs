//! Error types for extraction and reconstruction

use crate::kind::DocumentKind;
use thiserror::Error;

/// Result type for extraction operations
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Errors that can occur while extracting or rebuilding a document
#[derive(Error, Debug)]
pub enum ExtractError {
    /// No kind could be resolved from the filename or media type
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The underlying parser could not open the byte stream
    #[error("Corrupt {kind} document: {reason}")]
    CorruptDocument { kind: DocumentKind, reason: String },

    /// Plain text was not valid UTF-8
    #[error("Decode error: {0}")]
    Decode(#[from] std::str::Utf8Error),

    /// The OCR engine failed
    #[error("OCR error: {0}")]
    Ocr(String),

    /// Input too large
    #[error("Content too large: {size} bytes exceeds max {max} bytes")]
    ContentTooLarge { size: usize, max: usize },

    /// The redacted content has no strategy for this kind
    #[error("Unsupported reconstruction for {0}")]
    UnsupportedReconstruction(DocumentKind),

    /// Writing the new document failed
    #[error("Reconstruction failed: {0}")]
    Reconstruction(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    pub(crate) fn corrupt(kind: DocumentKind, reason: impl ToString) -> Self {
        ExtractError::CorruptDocument {
            kind,
            reason: reason.to_string(),
        }
    }

    pub(crate) fn reconstruction(reason: impl ToString) -> Self {
        ExtractError::Reconstruction(reason.to_string())
    }
}
