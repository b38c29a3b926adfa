//! Raster images (png, jpeg) via OCR

use crate::error::{ExtractError, Result};
use crate::kind::DocumentKind;
use crate::ocr::OcrEngine;

use tracing::debug;

/// Decode the bitmap and hand it to the OCR engine; its output is returned verbatim
pub fn extract(bytes: &[u8], ocr: &dyn OcrEngine) -> Result<String> {
    let image = ::image::load_from_memory(bytes)
        .map_err(|e| ExtractError::corrupt(DocumentKind::Image, e))?;
    debug!(width = image.width(), height = image.height(), "Decoded image");
    ocr.image_to_text(&image)
}
