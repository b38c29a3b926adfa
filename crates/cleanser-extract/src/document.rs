//! Uploaded documents

use crate::error::Result;
use crate::kind::DocumentKind;
use std::path::Path;

/// A raw uploaded document. The bytes are never modified.
#[derive(Debug, Clone)]
pub struct Document {
    filename: String,
    media_type: Option<String>,
    bytes: Vec<u8>,
}

impl Document {
    /// Create a document from a filename and its raw bytes
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            media_type: None,
            bytes: bytes.into(),
        }
    }

    /// Read a document from disk, keeping only the file name
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        Ok(Self::new(filename, bytes))
    }

    /// Attach a declared media type
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Resolve the document kind, failing with `UnsupportedFormat`
    pub fn kind(&self) -> Result<DocumentKind> {
        DocumentKind::resolve(&self.filename, self.media_type.as_deref())
    }
}
