//! # Cleanser Guard
//!
//! PII detection and anonymization for extracted document text.
//!
//! The guard is split along the two seams a PII service exposes:
//!
//! - **Detector**: `analyze(text, language)` returns the PII spans found in the text
//! - **Anonymizer**: `anonymize(text, spans)` substitutes each span with a typed placeholder
//!
//! [`Guard`] sequences the two and emits an audit event for every call.
//! Out of the box it uses the regex-based [`PatternDetector`] and the local
//! [`PlaceholderAnonymizer`]; with the `presidio` feature it can talk to a
//! Presidio analyzer/anonymizer pair over HTTP instead.
//!
//! ## Quick Start
//!
//! ```rust
//! use cleanser_guard::{Guard, GuardConfig, SanitizeResult};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let guard = Guard::new(GuardConfig::default())?;
//!
//!     let result = guard.sanitize("Mail jane@example.com for access").await?;
//!     match result {
//!         SanitizeResult::Clean(text) => println!("Clean: {}", text),
//!         SanitizeResult::Redacted { text, spans } => {
//!             println!("Redacted: {} ({} spans)", text, spans.len())
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────────────────┐     ┌──────────────┐
//! │  Raw text   │ ──► │          Guard           │ ──► │ Redacted text│
//! └─────────────┘     │ ┌──────────┐ ┌─────────┐ │     └──────────────┘
//!                     │ │ Detector │►│Anonymize│ │
//!                     │ └──────────┘ └─────────┘ │
//!                     │ ┌──────────────────────┐ │
//!                     │ │     Audit logger     │ │
//!                     │ └──────────────────────┘ │
//!                     └──────────────────────────┘
//! ```

pub mod anonymize;
pub mod audit;
pub mod config;
pub mod error;
pub mod guard;
pub mod pii;
#[cfg(feature = "presidio")]
pub mod presidio;
pub mod types;

pub use anonymize::{resolve_overlaps, PlaceholderAnonymizer};
pub use config::GuardConfig;
pub use error::{GuardError, Result};
pub use guard::{Guard, GuardBuilder};
pub use pii::PatternDetector;
pub use types::*;

use async_trait::async_trait;

/// Finds PII spans in a piece of text.
#[async_trait]
pub trait Detector: Send + Sync {
    /// Return the PII spans found in `text`, ordered by start offset.
    async fn analyze(&self, text: &str, language: &str) -> Result<Vec<Span>>;
}

/// Replaces PII spans with placeholders.
#[async_trait]
pub trait Anonymizer: Send + Sync {
    /// Substitute every span in `spans` and return the anonymized text.
    async fn anonymize(&self, text: &str, spans: &[Span]) -> Result<AnonymizedText>;
}

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::GuardConfig;
    pub use crate::error::{GuardError, Result};
    pub use crate::guard::Guard;
    pub use crate::types::*;
    pub use crate::{Anonymizer, Detector};
}
