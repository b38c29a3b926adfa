//! Per-format extraction and reconstruction strategies

pub mod docx;
pub mod image;
#[cfg(feature = "pdf")]
pub mod pdf;
pub mod pptx;
pub mod text;
pub mod xlsx;

pub(crate) mod numfmt;
pub(crate) mod ooxml;
