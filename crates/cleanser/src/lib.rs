//! # Cleanser
//!
//! Extract text from uploaded documents, redact PII, optionally summarize the
//! result with an LLM, and rebuild a cleansed artifact in the original format
//! where feasible.
//!
//! ## Example
//!
//! ```rust,ignore
//! use cleanser::{CleanserConfig, Pipeline, Session};
//! use cleanser_extract::Document;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let pipeline = Pipeline::from_config(&CleanserConfig::load(None)?)?;
//!     let mut session = Session::new();
//!
//!     let document = Document::new("contact.txt", "Contact John Smith at 555-123-4567.");
//!     let report = pipeline.process(&document, &mut session).await;
//!     println!("{}", report.redacted_text.unwrap_or_default());
//!     Ok(())
//! }
//! ```
//!
//! ## Lifecycle
//!
//! ```text
//! Uploaded → Extracted → Redacted → Summarized | SummarizationSkipped → Reconstructed → Downloadable
//!     │          │           │                                               │
//!     ▼          ▼           ▼                                               ▼
//! ExtractionFailed  Empty  RedactionFailed                          ReconstructionFailed
//! ```

pub mod artifact;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod session;
pub mod summarize;

pub use artifact::{artifact_name, Artifact};
pub use config::{CleanserConfig, PipelineConfig, SummaryConfig};
pub use error::{PipelineError, Result};
pub use pipeline::{DocumentReport, Pipeline, ProcessingState};
pub use session::{Session, UploadRecord};
pub use summarize::{summarize, summary_prompt, GroqSummarizer, Summarizer, Summary, SUMMARY_UNAVAILABLE};
