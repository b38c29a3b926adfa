//! Kind → strategy lookup table and the registry that drives it

use crate::config::ExtractorConfig;
use crate::document::Document;
use crate::error::{ExtractError, Result};
use crate::formats::{docx, image, pptx, text, xlsx};
use crate::kind::DocumentKind;
use crate::ocr::{OcrEngine, TesseractEngine};
use crate::result::{ExtractResult, ExtractedText, TableModel};

use std::time::Instant;
use tracing::{debug, info};

/// What an extraction strategy hands back to the registry
pub(crate) struct Extraction {
    content: ExtractedText,
    /// Format-specific unit count, e.g. ("pages", 3)
    units: Option<(&'static str, usize)>,
}

impl Extraction {
    fn text(text: String) -> Self {
        Self {
            content: ExtractedText::Text(text),
            units: None,
        }
    }

    fn with_units(mut self, unit: &'static str, count: usize) -> Self {
        self.units = Some((unit, count));
        self
    }
}

/// Inputs shared by every extraction strategy
pub struct ExtractContext<'a> {
    pub config: &'a ExtractorConfig,
    pub ocr: &'a dyn OcrEngine,
}

type ExtractFn = fn(&[u8], &ExtractContext<'_>) -> Result<Extraction>;
type ReconstructFn = fn(&ExtractedText, Option<&TableModel>) -> Result<Vec<u8>>;

/// Extraction and reconstruction strategy for one document kind
pub struct FormatHandler {
    pub kind: DocumentKind,
    extract: ExtractFn,
    reconstruct: ReconstructFn,
}

static PLAIN_TEXT: FormatHandler = FormatHandler {
    kind: DocumentKind::PlainText,
    extract: extract_plain_text,
    reconstruct: text_artifact,
};

static PDF: FormatHandler = FormatHandler {
    kind: DocumentKind::Pdf,
    extract: extract_pdf,
    reconstruct: text_artifact,
};

static IMAGE: FormatHandler = FormatHandler {
    kind: DocumentKind::Image,
    extract: extract_image,
    reconstruct: text_artifact,
};

static WORD_PROCESSING: FormatHandler = FormatHandler {
    kind: DocumentKind::WordProcessing,
    extract: extract_docx,
    reconstruct: reconstruct_docx,
};

static SPREADSHEET: FormatHandler = FormatHandler {
    kind: DocumentKind::Spreadsheet,
    extract: extract_xlsx,
    reconstruct: reconstruct_xlsx,
};

static PRESENTATION: FormatHandler = FormatHandler {
    kind: DocumentKind::Presentation,
    extract: extract_pptx,
    reconstruct: reconstruct_pptx,
};

/// The handler registered for `kind`
pub fn handler(kind: DocumentKind) -> &'static FormatHandler {
    match kind {
        DocumentKind::PlainText => &PLAIN_TEXT,
        DocumentKind::Pdf => &PDF,
        DocumentKind::Image => &IMAGE,
        DocumentKind::WordProcessing => &WORD_PROCESSING,
        DocumentKind::Spreadsheet => &SPREADSHEET,
        DocumentKind::Presentation => &PRESENTATION,
    }
}

fn extract_plain_text(bytes: &[u8], ctx: &ExtractContext<'_>) -> Result<Extraction> {
    Ok(Extraction::text(text::extract(bytes, ctx.config.lenient_utf8)?))
}

#[cfg(feature = "pdf")]
fn extract_pdf(bytes: &[u8], _ctx: &ExtractContext<'_>) -> Result<Extraction> {
    let (text, pages) = crate::formats::pdf::extract(bytes)?;
    Ok(Extraction::text(text).with_units("pages", pages))
}

#[cfg(not(feature = "pdf"))]
fn extract_pdf(_bytes: &[u8], _ctx: &ExtractContext<'_>) -> Result<Extraction> {
    Err(ExtractError::UnsupportedFormat(
        "PDF extraction requires the 'pdf' feature".to_string(),
    ))
}

fn extract_image(bytes: &[u8], ctx: &ExtractContext<'_>) -> Result<Extraction> {
    Ok(Extraction::text(image::extract(bytes, ctx.ocr)?))
}

fn extract_docx(bytes: &[u8], _ctx: &ExtractContext<'_>) -> Result<Extraction> {
    Ok(Extraction::text(docx::extract(bytes)?))
}

fn extract_xlsx(bytes: &[u8], _ctx: &ExtractContext<'_>) -> Result<Extraction> {
    let table = xlsx::extract(bytes)?;
    let sheets = table.sheets.len();
    Ok(Extraction {
        content: ExtractedText::Table(table),
        units: Some(("sheets", sheets)),
    })
}

fn extract_pptx(bytes: &[u8], _ctx: &ExtractContext<'_>) -> Result<Extraction> {
    let (text, slides) = pptx::extract(bytes)?;
    Ok(Extraction::text(text).with_units("slides", slides))
}

fn text_artifact(redacted: &ExtractedText, _original: Option<&TableModel>) -> Result<Vec<u8>> {
    Ok(text::reconstruct(&redacted.as_text()))
}

fn reconstruct_docx(redacted: &ExtractedText, _original: Option<&TableModel>) -> Result<Vec<u8>> {
    match redacted {
        ExtractedText::Text(text) => docx::reconstruct(text),
        ExtractedText::Table(_) => Err(ExtractError::UnsupportedReconstruction(
            DocumentKind::WordProcessing,
        )),
    }
}

fn reconstruct_xlsx(redacted: &ExtractedText, original: Option<&TableModel>) -> Result<Vec<u8>> {
    match redacted {
        ExtractedText::Table(table) => xlsx::reconstruct(table, original),
        ExtractedText::Text(_) => Err(ExtractError::UnsupportedReconstruction(
            DocumentKind::Spreadsheet,
        )),
    }
}

fn reconstruct_pptx(redacted: &ExtractedText, _original: Option<&TableModel>) -> Result<Vec<u8>> {
    match redacted {
        ExtractedText::Text(text) => pptx::reconstruct(text),
        ExtractedText::Table(_) => Err(ExtractError::UnsupportedReconstruction(
            DocumentKind::Presentation,
        )),
    }
}

/// Extracts and rebuilds documents of every supported kind
pub struct FormatRegistry {
    config: ExtractorConfig,
    ocr: Box<dyn OcrEngine>,
}

impl FormatRegistry {
    /// Create a registry using the Tesseract CLI for OCR
    pub fn new(config: ExtractorConfig) -> Self {
        let ocr = TesseractEngine::new(config.ocr.clone());
        Self {
            config,
            ocr: Box::new(ocr),
        }
    }

    /// Replace the OCR engine
    pub fn with_ocr(mut self, ocr: impl OcrEngine + 'static) -> Self {
        self.ocr = Box::new(ocr);
        self
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract the text content of `document`.
    ///
    /// A document with no text yields a blank result, not an error.
    pub fn extract(&self, document: &Document) -> Result<ExtractResult> {
        let kind = document.kind()?;
        let size = document.bytes().len();
        if size > self.config.max_input_bytes {
            return Err(ExtractError::ContentTooLarge {
                size,
                max: self.config.max_input_bytes,
            });
        }

        let start = Instant::now();
        let ctx = ExtractContext {
            config: &self.config,
            ocr: self.ocr.as_ref(),
        };
        debug!(source = document.filename(), kind = %kind, size, "Extracting");
        let extraction = (handler(kind).extract)(document.bytes(), &ctx)?;

        let mut result = ExtractResult::new(extraction.content, document.filename(), kind)
            .with_original_length(size)
            .with_metadata("media_type", kind.media_type());
        if let Some((unit, count)) = extraction.units {
            result = result.with_metadata(unit, count.to_string());
        }

        info!(
            source = document.filename(),
            kind = %kind,
            chars = result.text_length,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Extracted document"
        );
        Ok(result)
    }

    /// Build a new document of `kind` from redacted content.
    ///
    /// `original` is the table model extracted from the source workbook, used
    /// to carry sheet titles over.
    pub fn reconstruct(
        &self,
        kind: DocumentKind,
        redacted: &ExtractedText,
        original: Option<&TableModel>,
    ) -> Result<Vec<u8>> {
        let bytes = (handler(kind).reconstruct)(redacted, original)?;
        debug!(kind = %kind, size = bytes.len(), "Reconstructed document");
        Ok(bytes)
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new(ExtractorConfig::default())
    }
}
