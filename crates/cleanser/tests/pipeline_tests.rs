use async_trait::async_trait;
use cleanser::{
    CleanserConfig, Pipeline, PipelineConfig, PipelineError, ProcessingState, Session, Summarizer,
    SUMMARY_UNAVAILABLE,
};
use cleanser_extract::{
    Document, DocumentKind, ExtractedText, FormatRegistry, OcrEngine, RedactionAdapter, Sheet,
    TableModel,
};
use cleanser_guard::{Detector, Guard, GuardBuilder, GuardConfig, GuardError, Span};
use image::{DynamicImage, ImageFormat};
use std::sync::{Arc, Mutex};

fn adapter() -> RedactionAdapter {
    RedactionAdapter::new(Guard::new(GuardConfig::minimal()).unwrap())
}

fn pipeline() -> Pipeline {
    Pipeline::new(FormatRegistry::default(), adapter())
}

fn cell(s: &str) -> Option<String> {
    Some(s.to_string())
}

/// Build an input document of `kind` from content
fn build(kind: DocumentKind, content: ExtractedText) -> Vec<u8> {
    FormatRegistry::default()
        .reconstruct(kind, &content, None)
        .unwrap()
}

struct RecordingSummarizer {
    prompts: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Summarizer for RecordingSummarizer {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> cleanser::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(format!("Summary within {} tokens", max_tokens))
    }
}

struct FailingSummarizer;

#[async_trait]
impl Summarizer for FailingSummarizer {
    async fn complete(&self, _prompt: &str, _max_tokens: u32) -> cleanser::Result<String> {
        Err(PipelineError::Summarization("rate limited".to_string()))
    }
}

struct UnreachableDetector;

#[async_trait]
impl Detector for UnreachableDetector {
    async fn analyze(&self, _text: &str, _language: &str) -> cleanser_guard::Result<Vec<Span>> {
        Err(GuardError::DetectorFailure("connection refused".to_string()))
    }
}

struct CannedOcr;

impl OcrEngine for CannedOcr {
    fn image_to_text(&self, _image: &DynamicImage) -> cleanser_extract::Result<String> {
        Ok("Patient SSN 123-45-6789\n".to_string())
    }
}

#[tokio::test]
async fn test_plain_text_end_to_end() {
    let mut session = Session::new();
    let document = Document::new("contact.txt", "Contact John Smith at 555-123-4567.");

    let report = pipeline().process(&document, &mut session).await;

    assert!(report.is_downloadable());
    assert_eq!(report.raw_text.as_deref(), Some("Contact John Smith at 555-123-4567."));
    assert_eq!(
        report.redacted_text.as_deref(),
        Some("Contact <PERSON> at <PHONE_NUMBER>.")
    );

    let artifact = report.artifact.unwrap();
    assert_eq!(artifact.filename, "cleaned_contact.txt");
    assert_eq!(artifact.bytes, b"Contact <PERSON> at <PHONE_NUMBER>.");

    assert_eq!(session.len(), 1);
    assert_eq!(session.records()[0].filename, "contact.txt");
}

#[tokio::test]
async fn test_spreadsheet_keeps_sheet_and_redacts_rows() {
    let input = build(
        DocumentKind::Spreadsheet,
        ExtractedText::Table(TableModel::new(vec![Sheet::new(
            "Sheet1",
            vec![
                vec![cell("Name"), cell("Email")],
                vec![cell("Alice"), cell("alice@x.com")],
                vec![cell("Bob"), cell("bob@y.org")],
            ],
        )])),
    );

    let mut session = Session::new();
    let report = pipeline()
        .process(&Document::new("people.xlsx", input), &mut session)
        .await;
    assert!(report.is_downloadable(), "{:?}", report.error);
    assert_eq!(report.entities.get("EMAIL_ADDRESS"), Some(&2));

    let artifact = report.artifact.unwrap();
    assert_eq!(artifact.filename, "cleaned_people.xlsx");

    let rebuilt = FormatRegistry::default()
        .extract(&Document::new(artifact.filename.clone(), artifact.bytes))
        .unwrap();
    let table = rebuilt.content.as_table().unwrap();
    assert_eq!(table.titles(), vec!["Sheet1"]);
    assert_eq!(
        table.sheets[0].rows,
        vec![
            vec![cell("Name"), cell("Email")],
            vec![cell("Alice"), cell("<EMAIL_ADDRESS>")],
            vec![cell("Bob"), cell("<EMAIL_ADDRESS>")],
        ]
    );
}

#[tokio::test]
async fn test_spreadsheet_without_header_redacts_every_email() {
    let input = build(
        DocumentKind::Spreadsheet,
        ExtractedText::Table(TableModel::new(vec![Sheet::new(
            "Sheet1",
            vec![
                vec![cell("Alice"), cell("alice@x.com")],
                vec![cell("Bob"), cell("bob@x.com")],
            ],
        )])),
    );

    let mut session = Session::new();
    let report = pipeline()
        .process(&Document::new("people.xlsx", input), &mut session)
        .await;
    assert!(report.is_downloadable(), "{:?}", report.error);

    let artifact = report.artifact.unwrap();
    let rebuilt = FormatRegistry::default()
        .extract(&Document::new(artifact.filename.clone(), artifact.bytes))
        .unwrap();
    let table = rebuilt.content.as_table().unwrap();
    assert_eq!(table.titles(), vec!["Sheet1"]);
    assert_eq!(table.sheets[0].rows.len(), 2);
    for value in table.sheets[0].rows.iter().flatten().flatten() {
        assert_ne!(value, "alice@x.com");
        assert_ne!(value, "bob@x.com");
    }
}

#[tokio::test]
async fn test_clean_word_document_is_unchanged() {
    let input = build(
        DocumentKind::WordProcessing,
        ExtractedText::Text("meeting notes\n\nthe budget looks fine".to_string()),
    );

    let mut session = Session::new();
    let report = pipeline()
        .process(&Document::new("notes.docx", input), &mut session)
        .await;

    assert!(report.is_downloadable(), "{:?}", report.error);
    assert!(report.entities.is_empty());
    assert_eq!(report.redacted_text, report.raw_text);
    assert!(report.raw_text.unwrap().starts_with("meeting notes\n\nthe budget looks fine"));
}

#[tokio::test]
async fn test_clean_spreadsheet_is_unchanged() {
    let rows = vec![
        vec![cell("item"), cell("colour")],
        vec![cell("widget"), cell("blue")],
        vec![cell("gadget"), None],
    ];
    let input = build(
        DocumentKind::Spreadsheet,
        ExtractedText::Table(TableModel::new(vec![Sheet::new("stock", rows.clone())])),
    );

    let mut session = Session::new();
    let report = pipeline()
        .process(&Document::new("stock.xlsx", input), &mut session)
        .await;

    assert!(report.is_downloadable(), "{:?}", report.error);
    assert!(report.entities.is_empty());
    assert_eq!(report.redacted_text, report.raw_text);

    let artifact = report.artifact.unwrap();
    let rebuilt = FormatRegistry::default()
        .extract(&Document::new(artifact.filename.clone(), artifact.bytes))
        .unwrap();
    let table = rebuilt.content.as_table().unwrap();
    assert_eq!(table.titles(), vec!["stock"]);
    assert_eq!(table.sheets[0].rows, rows);
}

#[tokio::test]
async fn test_clean_presentation_is_unchanged() {
    let input = build(
        DocumentKind::Presentation,
        ExtractedText::Text("roadmap\nnext steps".to_string()),
    );

    let mut session = Session::new();
    let report = pipeline()
        .process(&Document::new("plan.pptx", input), &mut session)
        .await;

    assert!(report.is_downloadable(), "{:?}", report.error);
    assert!(report.entities.is_empty());
    assert_eq!(report.redacted_text.as_deref(), Some("roadmap\nnext steps\n"));
    assert_eq!(report.redacted_text, report.raw_text);
}

#[tokio::test]
async fn test_presentation_has_one_slide_per_line() {
    let input = build(
        DocumentKind::Presentation,
        ExtractedText::Text("Team sync\nCall Jane Doe at 555-987-6543".to_string()),
    );

    let mut session = Session::new();
    let report = pipeline()
        .process(&Document::new("deck.pptx", input), &mut session)
        .await;
    let redacted = report.redacted_text.clone().unwrap();
    assert_eq!(redacted, "Team sync\nCall <PERSON> at <PHONE_NUMBER>\n");

    let artifact = report.artifact.unwrap();
    let rebuilt = FormatRegistry::default()
        .extract(&Document::new(artifact.filename.clone(), artifact.bytes))
        .unwrap();
    let slides = redacted.split('\n').count();
    assert_eq!(rebuilt.metadata.get("slides"), Some(&slides.to_string()));
}

#[tokio::test]
async fn test_word_document_round_trip() {
    let input = build(
        DocumentKind::WordProcessing,
        ExtractedText::Text("Dear team\n\nWrite to ana@x.com".to_string()),
    );

    let mut session = Session::new();
    let report = pipeline()
        .process(&Document::new("memo.docx", input), &mut session)
        .await;

    let artifact = report.artifact.unwrap();
    assert_eq!(artifact.filename, "cleaned_memo.docx");
    let rebuilt = FormatRegistry::default()
        .extract(&Document::new(artifact.filename.clone(), artifact.bytes))
        .unwrap();
    assert_eq!(rebuilt.content.as_text(), "Dear team\n\nWrite to <EMAIL_ADDRESS>\n\n");
}

#[tokio::test]
async fn test_image_degrades_to_text_artifact() {
    let mut png = Vec::new();
    DynamicImage::new_rgb8(4, 4)
        .write_to(&mut std::io::Cursor::new(&mut png), ImageFormat::Png)
        .unwrap();

    let pipeline = Pipeline::new(FormatRegistry::default().with_ocr(CannedOcr), adapter());
    let mut session = Session::new();
    let report = pipeline
        .process(&Document::new("scan.png", png), &mut session)
        .await;

    let artifact = report.artifact.unwrap();
    assert_eq!(artifact.filename, "cleaned_scan.png.txt");
    assert!(artifact.media_type.starts_with("text/plain"));
    assert_eq!(artifact.bytes, b"Patient SSN <US_SSN>\n");
}

#[tokio::test]
async fn test_summary_uses_redacted_text() {
    let prompts = Arc::new(Mutex::new(Vec::new()));
    let pipeline = pipeline()
        .with_summarizer(RecordingSummarizer {
            prompts: prompts.clone(),
        })
        .with_max_tokens(500);

    let mut session = Session::new();
    let report = pipeline
        .process(&Document::new("a.txt", "Mail bob@y.org"), &mut session)
        .await;

    assert!(report.states.contains(&ProcessingState::Summarized));
    assert_eq!(report.summary.unwrap().text(), "Summary within 500 tokens");

    let prompts = prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].ends_with("Mail <EMAIL_ADDRESS>"));
    assert!(!prompts[0].contains("bob@y.org"));
}

#[tokio::test]
async fn test_summary_failure_degrades_to_placeholder() {
    let pipeline = pipeline().with_summarizer(FailingSummarizer);
    let mut session = Session::new();

    let report = pipeline
        .process(&Document::new("a.txt", "Mail bob@y.org"), &mut session)
        .await;

    assert!(report.states.contains(&ProcessingState::SummarizationSkipped));
    assert_eq!(report.summary.unwrap().text(), SUMMARY_UNAVAILABLE);
    assert!(report.artifact.is_some());
    assert_eq!(session.len(), 1);
}

#[tokio::test]
async fn test_summary_disabled_by_config() {
    let pipeline = pipeline()
        .with_summarizer(FailingSummarizer)
        .with_config(PipelineConfig::default().with_summarize(false));
    let mut session = Session::new();

    let report = pipeline
        .process(&Document::new("a.txt", "hello"), &mut session)
        .await;
    assert!(report.summary.is_none());
    assert!(report.states.contains(&ProcessingState::SummarizationSkipped));
}

#[tokio::test]
async fn test_batch_isolates_failures() {
    let documents = vec![
        Document::new("first.txt", "Reach me at jane@example.com"),
        Document::new("archive.rar", "not supported"),
        Document::new("broken.txt", vec![0x66, 0xff, 0xfe]),
        Document::new("last.txt", "nothing to hide"),
    ];

    let mut session = Session::new();
    let reports = pipeline().process_batch(&documents, &mut session).await;

    let states: Vec<_> = reports.iter().map(|r| r.state()).collect();
    assert_eq!(
        states,
        vec![
            ProcessingState::Downloadable,
            ProcessingState::ExtractionFailed,
            ProcessingState::ExtractionFailed,
            ProcessingState::Downloadable,
        ]
    );
    assert!(reports[1].error.as_deref().unwrap().contains("Unsupported format"));
    assert!(reports[2].error.as_deref().unwrap().contains("Decode"));

    let recent: Vec<_> = session.recent_first().map(|r| r.filename.as_str()).collect();
    assert_eq!(recent, vec!["last.txt", "first.txt"]);
}

#[tokio::test]
async fn test_detector_failure_is_redaction_failed() {
    let guard = GuardBuilder::new()
        .with_config(GuardConfig::minimal())
        .with_detector(UnreachableDetector)
        .build()
        .unwrap();
    let pipeline = Pipeline::new(FormatRegistry::default(), RedactionAdapter::new(guard));
    let mut session = Session::new();

    let report = pipeline
        .process(&Document::new("a.txt", "John Smith"), &mut session)
        .await;

    assert_eq!(report.state(), ProcessingState::RedactionFailed);
    assert!(report.artifact.is_none());
    assert!(report.redacted_text.is_none());
    assert!(session.is_empty());
}

#[tokio::test]
async fn test_pipeline_from_default_config() {
    let config = CleanserConfig::default()
        .with_pipeline(PipelineConfig::default().with_summarize(false));
    let pipeline = Pipeline::from_config(&config).unwrap();

    let mut session = Session::new();
    let report = pipeline
        .process(&Document::new("id.txt", "SSN 123-45-6789"), &mut session)
        .await;
    assert_eq!(report.redacted_text.as_deref(), Some("SSN <US_SSN>"));
}
