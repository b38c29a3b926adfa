//! Extractor configuration

use serde::{Deserialize, Serialize};

/// Configuration for content extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Maximum accepted input size in bytes
    pub max_input_bytes: usize,

    /// Decode invalid UTF-8 in plain text with replacement characters instead of failing
    pub lenient_utf8: bool,

    /// OCR settings for image documents
    pub ocr: OcrConfig,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_input_bytes: 50 * 1024 * 1024,
            lenient_utf8: false,
            ocr: OcrConfig::default(),
        }
    }
}

impl ExtractorConfig {
    /// Create a new config with a custom input limit
    pub fn with_max_input_bytes(mut self, max_input_bytes: usize) -> Self {
        self.max_input_bytes = max_input_bytes;
        self
    }

    /// Enable or disable lenient UTF-8 decoding
    pub fn with_lenient_utf8(mut self, lenient: bool) -> Self {
        self.lenient_utf8 = lenient;
        self
    }
}

/// Tesseract settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Path to the tesseract binary (defaults to `tesseract` on PATH)
    pub binary_path: Option<String>,
    /// Tesseract language code
    pub language: String,
    /// Page segmentation mode
    pub psm: u8,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            binary_path: None,
            language: "eng".to_string(),
            psm: 3,
        }
    }
}

impl OcrConfig {
    pub fn binary(&self) -> &str {
        self.binary_path.as_deref().unwrap_or("tesseract")
    }
}
