//! Pipeline orchestrator: extract → redact → summarize → reconstruct

use crate::artifact::Artifact;
use crate::config::{CleanserConfig, PipelineConfig};
use crate::error::{PipelineError, Result};
use crate::session::Session;
use crate::summarize::{summarize, GroqSummarizer, Summarizer, Summary};

use cleanser_extract::{Document, DocumentKind, ExtractError, FormatRegistry, RedactionAdapter};
use cleanser_guard::Guard;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Where a document is in its processing lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingState {
    Uploaded,
    Extracted,
    /// Extraction found no text; nothing further is done
    Empty,
    Redacted,
    Summarized,
    /// Summarization disabled or failed; processing continues
    SummarizationSkipped,
    Reconstructed,
    Downloadable,
    ExtractionFailed,
    RedactionFailed,
    ReconstructionFailed,
}

impl ProcessingState {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ProcessingState::ExtractionFailed
                | ProcessingState::RedactionFailed
                | ProcessingState::ReconstructionFailed
        )
    }
}

/// Everything observed while processing one document
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub filename: String,
    pub kind: Option<DocumentKind>,
    /// States visited, in order
    pub states: Vec<ProcessingState>,
    pub raw_text: Option<String>,
    pub redacted_text: Option<String>,
    /// Replaced spans per entity label
    pub entities: BTreeMap<String, usize>,
    pub summary: Option<Summary>,
    pub artifact: Option<Artifact>,
    /// Extraction metadata (media type, page/sheet/slide counts)
    pub metadata: HashMap<String, String>,
    pub warnings: Vec<String>,
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

impl DocumentReport {
    fn new(filename: &str) -> Self {
        Self {
            filename: filename.to_string(),
            kind: None,
            states: vec![ProcessingState::Uploaded],
            raw_text: None,
            redacted_text: None,
            entities: BTreeMap::new(),
            summary: None,
            artifact: None,
            metadata: HashMap::new(),
            warnings: Vec::new(),
            error: None,
            elapsed_ms: 0,
        }
    }

    /// The last state reached
    pub fn state(&self) -> ProcessingState {
        self.states
            .last()
            .copied()
            .unwrap_or(ProcessingState::Uploaded)
    }

    pub fn is_downloadable(&self) -> bool {
        self.state() == ProcessingState::Downloadable
    }

    /// Report for a file that could not be read at all
    pub fn unreadable(filename: &str, error: ExtractError) -> Self {
        let mut report = Self::new(filename);
        report.fail(
            ProcessingState::ExtractionFailed,
            PipelineError::Extraction(error),
        );
        report
    }

    /// Write the artifact into `dir`, returning the written path.
    ///
    /// A failed write is logged and added to the warnings; it never aborts
    /// the caller's batch.
    pub fn write_artifact(&mut self, dir: &Path) -> Option<PathBuf> {
        let artifact = self.artifact.as_ref()?;
        match artifact.write_to(dir) {
            Ok(path) => {
                info!(path = %path.display(), bytes = artifact.len(), "Wrote artifact");
                Some(path)
            }
            Err(e) => {
                error!(filename = %artifact.filename, error = %e, "Cannot write artifact");
                let warning = format!("could not write {}: {}", artifact.filename, e);
                self.warnings.push(warning);
                None
            }
        }
    }

    fn advance(&mut self, state: ProcessingState) {
        debug!(filename = %self.filename, state = ?state, "State change");
        self.states.push(state);
    }

    fn fail(&mut self, state: ProcessingState, error: PipelineError) {
        warn!(filename = %self.filename, state = ?state, error = %error, "Document failed");
        self.error = Some(error.to_string());
        self.advance(state);
    }
}

/// Runs documents through extraction, redaction, optional summarization and
/// reconstruction, one at a time.
pub struct Pipeline {
    registry: FormatRegistry,
    adapter: RedactionAdapter,
    summarizer: Option<Box<dyn Summarizer>>,
    config: PipelineConfig,
    max_tokens: u32,
}

impl Pipeline {
    /// Create a pipeline without a summarizer
    pub fn new(registry: FormatRegistry, adapter: RedactionAdapter) -> Self {
        Self {
            registry,
            adapter,
            summarizer: None,
            config: PipelineConfig::default(),
            max_tokens: crate::config::SummaryConfig::default().max_tokens,
        }
    }

    /// Build every stage from configuration
    pub fn from_config(config: &CleanserConfig) -> Result<Self> {
        let guard =
            Guard::new(config.guard.clone()).map_err(|e| PipelineError::Config(e.to_string()))?;
        let adapter = RedactionAdapter::new(guard).with_table_mode(config.pipeline.table_mode);
        let registry = FormatRegistry::new(config.extract.clone());

        let mut pipeline = Self::new(registry, adapter)
            .with_config(config.pipeline.clone())
            .with_max_tokens(config.summary.max_tokens);
        if config.pipeline.summarize {
            pipeline = pipeline.with_summarizer(GroqSummarizer::new(config.summary.clone())?);
        }
        Ok(pipeline)
    }

    pub fn with_summarizer(mut self, summarizer: impl Summarizer + 'static) -> Self {
        self.summarizer = Some(Box::new(summarizer));
        self
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Bound on summary length, in tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    /// Process every document in order. A failing document never stops the batch.
    pub async fn process_batch(
        &self,
        documents: &[Document],
        session: &mut Session,
    ) -> Vec<DocumentReport> {
        let mut reports = Vec::with_capacity(documents.len());
        for document in documents {
            reports.push(self.process(document, session).await);
        }

        let succeeded = reports.iter().filter(|r| r.is_downloadable()).count();
        info!(
            session = %session.id(),
            documents = reports.len(),
            succeeded,
            "Batch finished"
        );
        reports
    }

    /// Process one document. Success appends an upload record to `session`.
    pub async fn process(&self, document: &Document, session: &mut Session) -> DocumentReport {
        let start = Instant::now();
        let filename = document.filename();
        let mut report = DocumentReport::new(filename);

        self.run(document, &mut report).await;
        if report.is_downloadable() {
            session.record(filename);
        }

        report.elapsed_ms = start.elapsed().as_millis() as u64;
        info!(
            filename = %filename,
            state = ?report.state(),
            elapsed_ms = report.elapsed_ms,
            "Processed document"
        );
        report
    }

    async fn run(&self, document: &Document, report: &mut DocumentReport) {
        let filename = document.filename();

        let extracted = match self.registry.extract(document) {
            Ok(extracted) => extracted,
            Err(e) => {
                report.fail(ProcessingState::ExtractionFailed, PipelineError::Extraction(e));
                return;
            }
        };
        let kind = extracted.kind;
        report.kind = Some(kind);
        report.metadata = extracted.metadata.clone();
        report.raw_text = Some(extracted.content.as_text().into_owned());

        if extracted.is_blank() {
            report
                .warnings
                .push("No text could be extracted from this file.".to_string());
            report.advance(ProcessingState::Empty);
            return;
        }
        report.advance(ProcessingState::Extracted);

        let redaction = match self.adapter.redact(&extracted.content, filename).await {
            Ok(redaction) => redaction,
            Err(e) => {
                report.fail(ProcessingState::RedactionFailed, e.into());
                return;
            }
        };
        for span in &redaction.spans {
            *report
                .entities
                .entry(span.entity_type.label().to_string())
                .or_insert(0) += 1;
        }
        let redacted_text = redaction.content.as_text().into_owned();
        report.advance(ProcessingState::Redacted);

        match (&self.summarizer, self.config.summarize) {
            (Some(summarizer), true) => {
                let summary = summarize(summarizer.as_ref(), &redacted_text, self.max_tokens).await;
                report.advance(if summary.is_available() {
                    ProcessingState::Summarized
                } else {
                    ProcessingState::SummarizationSkipped
                });
                report.summary = Some(summary);
            }
            _ => report.advance(ProcessingState::SummarizationSkipped),
        }

        let artifact = match self
            .registry
            .reconstruct(kind, &redaction.content, extracted.content.as_table())
        {
            Ok(bytes) => Artifact::for_kind(filename, kind, bytes),
            Err(e) if self.config.text_fallback => {
                warn!(filename = %filename, error = %e, "Falling back to a plain-text artifact");
                report
                    .warnings
                    .push(format!("{}; saved as plain text instead", e));
                Artifact::text_fallback(filename, &redacted_text)
            }
            Err(e) => {
                report.redacted_text = Some(redacted_text);
                report.fail(
                    ProcessingState::ReconstructionFailed,
                    PipelineError::Reconstruction(e),
                );
                return;
            }
        };
        report.redacted_text = Some(redacted_text);
        report.advance(ProcessingState::Reconstructed);

        report.artifact = Some(artifact);
        report.advance(ProcessingState::Downloadable);
    }
}
