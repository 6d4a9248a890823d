//! Integration tests for the full pipeline.
//!
//! Most tests swap pdfium, tesseract and the chat service for in-process
//! fakes, so they run anywhere. The last test drives the real stack and is
//! gated behind `E2E_ENABLED`:
//!
//!   E2E_ENABLED=1 OPENAI_API_KEY=sk-... cargo test --test pipeline -- --nocapture

use edgequake_llm::CompletionOptions;
use image::{DynamicImage, GrayImage, Luma};
use pdfsum::{
    run, run_with, BackendError, Completion, OcrEngine, OcrError, PageRenderer, PdfSumError,
    PipelineConfig, PipelineProgressCallback, RunStats, SummaryBackend, EXTRACTED_FILE_NAME,
    SUMMARY_FILE_NAME,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Fakes ────────────────────────────────────────────────────────────────────

/// Renders `pages` blank images; page N is `10 + N` pixels wide.
struct FakeRenderer {
    pages: u32,
    calls: AtomicUsize,
}

impl FakeRenderer {
    fn new(pages: u32) -> Arc<Self> {
        Arc::new(Self {
            pages,
            calls: AtomicUsize::new(0),
        })
    }
}

impl PageRenderer for FakeRenderer {
    fn render(&self, _pdf_path: &Path, _dpi: u32) -> Result<Vec<DynamicImage>, PdfSumError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((1..=self.pages)
            .map(|n| DynamicImage::ImageLuma8(GrayImage::from_pixel(10 + n, 12, Luma([230]))))
            .collect())
    }
}

struct FailingRenderer;

impl PageRenderer for FailingRenderer {
    fn render(&self, _pdf_path: &Path, _dpi: u32) -> Result<Vec<DynamicImage>, PdfSumError> {
        Err(PdfSumError::RasterisationFailed {
            page: 2,
            detail: "bitmap allocation failed".into(),
        })
    }
}

/// Returns `texts[N - 1]` for page N, identified by image width.
struct FakeOcr {
    texts: Vec<&'static str>,
}

impl OcrEngine for FakeOcr {
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        let page = (image.width() - 10) as usize;
        Ok(self.texts[page - 1].to_string())
    }
}

#[derive(Default)]
struct FakeChat {
    fail_all: bool,
    requests: Mutex<Vec<String>>,
}

impl SummaryBackend for FakeChat {
    async fn complete(
        &self,
        _system: &str,
        user: &str,
        _options: &CompletionOptions,
    ) -> Result<Completion, BackendError> {
        self.requests.lock().unwrap().push(user.to_string());
        if self.fail_all {
            return Err("connection refused".into());
        }
        Ok(Completion {
            content: "خلاصه".to_string(),
            prompt_tokens: 40,
            completion_tokens: 5,
        })
    }
}

#[derive(Default)]
struct CountingCallback {
    pages_done: AtomicUsize,
    chunks_done: AtomicUsize,
    finished: AtomicUsize,
}

impl PipelineProgressCallback for CountingCallback {
    fn on_page_complete(&self, _page_num: usize, _total: usize, _text_len: usize) {
        self.pages_done.fetch_add(1, Ordering::SeqCst);
    }

    fn on_chunk_complete(&self, _chunk_num: usize, _total: usize) {
        self.chunks_done.fetch_add(1, Ordering::SeqCst);
    }

    fn on_run_complete(&self, _stats: &RunStats) {
        self.finished.fetch_add(1, Ordering::SeqCst);
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// A config pointing at an existing (fake) input inside `dir`.
fn config_in(dir: &Path) -> PipelineConfig {
    let input = dir.join("input.pdf");
    std::fs::write(&input, b"%PDF-1.4 placeholder").unwrap();
    PipelineConfig::builder()
        .input(input)
        .output_dir(dir.join("out"))
        .api_key("sk-test")
        .build()
        .unwrap()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn two_page_document_produces_both_files() {
    let tmp = tempfile::tempdir().unwrap();
    let config = config_in(tmp.path());
    let chat = FakeChat::default();

    let output = run_with(
        &config,
        FakeRenderer::new(2),
        Arc::new(FakeOcr {
            texts: vec!["سلام", "دنیا"],
        }),
        &chat,
    )
    .await
    .unwrap();

    assert_eq!(output.extracted_text, "سلام\n\nدنیا\n\n");
    assert_eq!(*chat.requests.lock().unwrap(), vec!["سلام\n\nدنیا\n\n"]);

    let out_dir = tmp.path().join("out");
    assert_eq!(
        std::fs::read_to_string(out_dir.join(EXTRACTED_FILE_NAME)).unwrap(),
        "سلام\n\nدنیا\n\n"
    );
    assert_eq!(
        std::fs::read_to_string(out_dir.join(SUMMARY_FILE_NAME)).unwrap(),
        "خلاصه\n\n"
    );

    assert_eq!(output.stats.total_pages, 2);
    assert_eq!(output.stats.total_chunks, 1);
    assert_eq!(output.stats.total_input_tokens, 40);
    assert_eq!(output.stats.total_output_tokens, 5);
    assert!(!output.stats.summary_fell_back);
}

#[tokio::test]
async fn long_document_is_summarised_in_chunks() {
    let tmp = tempfile::tempdir().unwrap();
    let config = config_in(tmp.path());
    let chat = FakeChat::default();
    let page: &'static str = Box::leak("ا".repeat(1000).into_boxed_str());

    let output = run_with(
        &config,
        FakeRenderer::new(2),
        Arc::new(FakeOcr {
            texts: vec![page, page],
        }),
        &chat,
    )
    .await
    .unwrap();

    // 2 × (1000 + 2) chars → 1500 + 504
    let requests = chat.requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].chars().count(), 1500);
    assert_eq!(requests[1].chars().count(), 504);
    assert_eq!(requests.concat(), output.extracted_text);
    assert_eq!(output.summary_text, "خلاصه\n\nخلاصه\n\n");
}

#[tokio::test]
async fn missing_credential_fails_before_rendering() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = config_in(tmp.path());
    config.api_key = None;
    let renderer = FakeRenderer::new(1);

    let err = run_with(
        &config,
        renderer.clone(),
        Arc::new(FakeOcr { texts: vec!["x"] }),
        &FakeChat::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, PdfSumError::MissingCredential));
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
    assert!(!tmp.path().join("out").exists());
}

#[tokio::test]
async fn missing_input_is_reported() {
    let tmp = tempfile::tempdir().unwrap();
    let config = PipelineConfig::builder()
        .input(tmp.path().join("absent.pdf"))
        .output_dir(tmp.path())
        .api_key("sk-test")
        .build()
        .unwrap();

    let err = run_with(
        &config,
        FakeRenderer::new(1),
        Arc::new(FakeOcr { texts: vec!["x"] }),
        &FakeChat::default(),
    )
    .await
    .unwrap_err();

    match err {
        PdfSumError::FileNotFound { path } => assert_eq!(path, tmp.path().join("absent.pdf")),
        other => panic!("expected FileNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn rasterisation_failure_stops_the_run() {
    let tmp = tempfile::tempdir().unwrap();
    let config = config_in(tmp.path());
    let chat = FakeChat::default();

    let err = run_with(
        &config,
        Arc::new(FailingRenderer),
        Arc::new(FakeOcr { texts: vec![] }),
        &chat,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, PdfSumError::RasterisationFailed { page: 2, .. }));
    assert!(chat.requests.lock().unwrap().is_empty());
    assert!(!tmp.path().join("out").join(EXTRACTED_FILE_NAME).exists());
}

#[tokio::test]
async fn summary_falls_back_to_extracted_text() {
    let tmp = tempfile::tempdir().unwrap();
    let config = config_in(tmp.path());
    let chat = FakeChat {
        fail_all: true,
        ..Default::default()
    };

    let output = run_with(
        &config,
        FakeRenderer::new(1),
        Arc::new(FakeOcr {
            texts: vec!["متن صفحه"],
        }),
        &chat,
    )
    .await
    .unwrap();

    let summary =
        std::fs::read_to_string(tmp.path().join("out").join(SUMMARY_FILE_NAME)).unwrap();
    assert_eq!(summary, "متن صفحه\n\n");
    assert_eq!(summary, output.extracted_text);
    assert!(output.stats.summary_fell_back);
    assert_eq!(output.stats.failed_chunks, 1);
}

#[tokio::test]
async fn empty_document_writes_empty_files() {
    let tmp = tempfile::tempdir().unwrap();
    let config = config_in(tmp.path());
    let chat = FakeChat::default();

    let output = run_with(
        &config,
        FakeRenderer::new(0),
        Arc::new(FakeOcr { texts: vec![] }),
        &chat,
    )
    .await
    .unwrap();

    assert!(chat.requests.lock().unwrap().is_empty());
    assert_eq!(std::fs::read_to_string(&output.extracted_path).unwrap(), "");
    assert_eq!(std::fs::read_to_string(&output.summary_path).unwrap(), "");
}

#[tokio::test]
async fn unwritable_output_dir_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = config_in(tmp.path());
    let blocker = tmp.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();
    config.output_dir = blocker.join("out");

    let err = run_with(
        &config,
        FakeRenderer::new(1),
        Arc::new(FakeOcr { texts: vec!["x"] }),
        &FakeChat::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, PdfSumError::OutputWriteFailed { .. }));
}

#[tokio::test]
async fn progress_callback_sees_every_stage() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = config_in(tmp.path());
    let cb = Arc::new(CountingCallback::default());
    config.progress_callback = Some(cb.clone() as Arc<dyn PipelineProgressCallback>);

    run_with(
        &config,
        FakeRenderer::new(3),
        Arc::new(FakeOcr {
            texts: vec!["a", "b", "c"],
        }),
        &FakeChat::default(),
    )
    .await
    .unwrap();

    assert_eq!(cb.pages_done.load(Ordering::SeqCst), 3);
    assert_eq!(cb.chunks_done.load(Ordering::SeqCst), 1);
    assert_eq!(cb.finished.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn report_json_lists_pages_and_paths() {
    let tmp = tempfile::tempdir().unwrap();
    let config = config_in(tmp.path());

    let output = run_with(
        &config,
        FakeRenderer::new(2),
        Arc::new(FakeOcr {
            texts: vec!["یک", "دو"],
        }),
        &FakeChat::default(),
    )
    .await
    .unwrap();

    let json: serde_json::Value = serde_json::to_value(&output).unwrap();
    assert_eq!(json["pages"].as_array().unwrap().len(), 2);
    assert_eq!(json["stats"]["total_pages"], 2);
    assert!(json["summary_path"]
        .as_str()
        .unwrap()
        .ends_with(SUMMARY_FILE_NAME));
    assert!(json.get("extracted_text").is_none());
}

// ── Live stack ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn live_run_on_sample_pdf() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
        return;
    }
    let input = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases/sample_fa.pdf");
    if !input.exists() {
        println!("SKIP — test file not found: {}", input.display());
        return;
    }
    let tmp = tempfile::tempdir().unwrap();

    let mut builder = PipelineConfig::builder()
        .input(&input)
        .output_dir(tmp.path());
    if let Ok(key) = std::env::var("OPENAI_API_KEY") {
        builder = builder.api_key(key);
    }
    if let Ok(dir) = std::env::var("PDFIUM_LIB_DIR") {
        builder = builder.pdfium_dir(dir);
    }
    let config = builder.build().unwrap();

    let output = run(&config).await.unwrap();

    assert!(output.stats.total_pages > 0);
    assert!(output.extracted_path.exists());
    assert!(output.summary_path.exists());
    println!("{}", output.summary_text);
}
