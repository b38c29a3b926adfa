//! `cleanser` command line: cleanse documents and write the artifacts to disk

use anyhow::{Context, Result};
use clap::Parser;
use cleanser::{CleanserConfig, DocumentReport, Pipeline, Session};
use cleanser_extract::{Document, DocumentKind, TableRedactionMode, TesseractEngine};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Extract, redact, summarize and rebuild documents
#[derive(Parser, Debug)]
#[command(name = "cleanser")]
#[command(about = "Redact PII from txt, pdf, image, docx, xlsx and pptx documents")]
#[command(version)]
struct Args {
    /// Config file (defaults to <config dir>/cleanser/cleanser.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory the cleaned artifacts are written to
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Skip the AI summary
    #[arg(long)]
    no_summary: bool,

    /// Language passed to the PII detector
    #[arg(short, long)]
    language: Option<String>,

    /// Spreadsheet redaction mode: row or cell
    #[arg(long)]
    table_mode: Option<TableRedactionMode>,

    /// Print the reports as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Documents to cleanse
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn print_report(report: &DocumentReport) {
    println!("=== {} ===", report.filename);
    if let Some(raw) = &report.raw_text {
        println!("--- Extracted text ---\n{}", raw);
    }
    if let Some(redacted) = &report.redacted_text {
        println!("--- Anonymized text ---\n{}", redacted);
    }
    if let Some(summary) = &report.summary {
        println!("--- AI summary ---\n{}", summary);
    }
    for warning in &report.warnings {
        println!("warning: {}", warning);
    }
    if let Some(err) = &report.error {
        println!("error: {}", err);
    }
    println!();
}

fn is_image(path: &Path) -> bool {
    matches!(
        DocumentKind::resolve(&path.to_string_lossy(), None),
        Ok(DocumentKind::Image)
    )
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = CleanserConfig::load(args.config.as_deref()).context("loading config")?;
    if args.no_summary {
        config.pipeline.summarize = false;
    }
    if let Some(language) = args.language {
        config.guard = config.guard.with_language(language);
    }
    if let Some(mode) = args.table_mode {
        config.pipeline.table_mode = mode;
    }

    if args.files.iter().any(|path| is_image(path)) {
        match TesseractEngine::new(config.extract.ocr.clone()).version() {
            Ok(version) => info!(version = %version, "OCR engine available"),
            Err(e) => warn!(error = %e, "OCR engine unavailable, images will fail to extract"),
        }
    }

    let pipeline = Pipeline::from_config(&config).context("building pipeline")?;
    let mut session = Session::new();
    let mut reports = Vec::with_capacity(args.files.len());

    for path in &args.files {
        let mut report = match Document::from_path(path) {
            Ok(document) => pipeline.process(&document, &mut session).await,
            Err(e) => {
                error!(path = %path.display(), error = %e, "Cannot read file");
                DocumentReport::unreadable(&path.display().to_string(), e)
            }
        };
        report.write_artifact(&args.out_dir);
        if !args.json {
            print_report(&report);
        }
        reports.push(report);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        println!("Upload history");
        for (i, record) in session.recent_first().enumerate() {
            println!("{}. {} (uploaded at {})", i + 1, record.filename, record.display_timestamp());
        }
    }

    Ok(())
}
