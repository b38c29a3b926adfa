//! OCR engine seam and the Tesseract CLI wrapper

use crate::config::OcrConfig;
use crate::error::{ExtractError, Result};

use image::{DynamicImage, ImageFormat};
use std::process::Command;
use std::time::Instant;
use tracing::{debug, info};

/// Turns a decoded bitmap into text
pub trait OcrEngine: Send + Sync {
    fn image_to_text(&self, image: &DynamicImage) -> Result<String>;
}

/// Tesseract OCR engine (CLI wrapper)
pub struct TesseractEngine {
    config: OcrConfig,
}

impl TesseractEngine {
    pub fn new(config: OcrConfig) -> Self {
        Self { config }
    }

    /// Report the installed tesseract version, if any
    pub fn version(&self) -> Result<String> {
        let output = Command::new(self.config.binary())
            .arg("--version")
            .output()
            .map_err(|e| ExtractError::Ocr(format!("tesseract not available: {}", e)))?;

        // Older releases print the version banner on stderr
        let banner = if output.stdout.is_empty() {
            String::from_utf8_lossy(&output.stderr).to_string()
        } else {
            String::from_utf8_lossy(&output.stdout).to_string()
        };
        Ok(banner.lines().next().unwrap_or_default().trim().to_string())
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new(OcrConfig::default())
    }
}

impl OcrEngine for TesseractEngine {
    fn image_to_text(&self, image: &DynamicImage) -> Result<String> {
        let start = Instant::now();

        let input = tempfile::Builder::new()
            .prefix("cleanser_ocr_")
            .suffix(".png")
            .tempfile()?;
        image
            .save_with_format(input.path(), ImageFormat::Png)
            .map_err(|e| ExtractError::Ocr(format!("failed to stage image: {}", e)))?;

        debug!(binary = self.config.binary(), path = %input.path().display(), "Running tesseract");
        let output = Command::new(self.config.binary())
            .arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.config.language)
            .arg("--psm")
            .arg(self.config.psm.to_string())
            .output()
            .map_err(|e| ExtractError::Ocr(format!("tesseract not available: {}", e)))?;

        if !output.status.success() {
            return Err(ExtractError::Ocr(format!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).to_string();
        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            chars = text.chars().count(),
            "OCR finished"
        );
        Ok(text)
    }
}
