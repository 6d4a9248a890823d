//! End-to-end entry points: one PDF in, two text files out.
//!
//! [`run`] wires the production collaborators (pdfium, the tesseract binary,
//! an OpenAI chat provider). [`run_with`] takes them as arguments and is
//! what tests drive.

use crate::config::{PipelineConfig, EXTRACTED_FILE_NAME, SUMMARY_FILE_NAME};
use crate::error::{PageError, PdfSumError};
use crate::output::{PipelineOutput, RunStats};
use crate::pipeline::ocr::{self, OcrEngine, TesseractEngine};
use crate::pipeline::persist;
use crate::pipeline::render::{self, PageRenderer, PdfiumRenderer};
use crate::pipeline::summarize::{self, SummaryBackend};
use edgequake_llm::{LLMProvider, OpenAIProvider};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Chat provider used for summaries.
const PROVIDER_NAME: &str = "openai";

/// OCR and summarise `config.input`, writing both artifacts to
/// `config.output_dir`.
///
/// The OpenAI provider is built from `config.api_key` and `config.model`;
/// nothing is read from the environment here.
///
/// # Errors
/// Fatal errors only: missing credential or input, pdfium or the PDF
/// failing, an artifact that cannot be written. Failed pages and chunks are
/// reported in the returned [`PipelineOutput`].
pub async fn run(config: &PipelineConfig) -> Result<PipelineOutput, PdfSumError> {
    config.validate()?;

    let renderer = Arc::new(PdfiumRenderer::new(config.pdfium_dir.clone()));

    let engine = TesseractEngine::new(
        &config.tesseract_path,
        &config.ocr_language,
        config.page_segmentation_mode,
    );
    if !engine.is_available() {
        warn!(
            "Tesseract not runnable at '{}'; every page will come out empty",
            config.tesseract_path.display()
        );
    }

    let provider = create_provider(config)?;

    run_with(config, renderer, Arc::new(engine), &provider).await
}

/// Run the pipeline with caller-supplied collaborators.
///
/// Validation happens first, so a missing credential or input file fails
/// before the renderer is touched.
pub async fn run_with<B: SummaryBackend>(
    config: &PipelineConfig,
    renderer: Arc<dyn PageRenderer>,
    engine: Arc<dyn OcrEngine>,
    backend: &B,
) -> Result<PipelineOutput, PdfSumError> {
    config.validate()?;
    let total_start = Instant::now();
    info!("Processing {}", config.input.display());

    // ── Step 1: Rasterise ────────────────────────────────────────────────
    let render_start = Instant::now();
    let images = render::render_document(renderer, &config.input, config.dpi).await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;
    info!("Rendered {} pages in {}ms", images.len(), render_duration_ms);

    if let Some(ref cb) = config.progress_callback {
        cb.on_pages_rendered(images.len());
    }

    // ── Step 2: OCR ──────────────────────────────────────────────────────
    let ocr_start = Instant::now();
    let pages = ocr::extract_pages(
        engine,
        images,
        config.workers,
        config.progress_callback.clone(),
    )
    .await;
    let ocr_duration_ms = ocr_start.elapsed().as_millis() as u64;
    let extracted_text = ocr::join_pages(&pages);

    let extracted_path =
        persist::save_text(&config.output_dir, EXTRACTED_FILE_NAME, &extracted_text).await?;

    // ── Step 3: Summarise ────────────────────────────────────────────────
    let summary_start = Instant::now();
    let summary = summarize::summarize(backend, &extracted_text, config).await;
    let summary_duration_ms = summary_start.elapsed().as_millis() as u64;

    let summary_path =
        persist::save_text(&config.output_dir, SUMMARY_FILE_NAME, &summary.text).await?;

    // ── Step 4: Stats ────────────────────────────────────────────────────
    let stats = RunStats {
        total_pages: pages.len(),
        ocr_failed_pages: pages.iter().filter(|p| !p.is_ok()).count(),
        preprocess_fallbacks: pages
            .iter()
            .filter(|p| {
                p.errors
                    .iter()
                    .any(|e| matches!(e, PageError::PreprocessFailed { .. }))
            })
            .count(),
        extracted_chars: extracted_text.chars().count(),
        total_chunks: summary.chunks.len(),
        failed_chunks: summary.chunks.iter().filter(|c| c.error.is_some()).count(),
        summary_fell_back: summary.fell_back,
        total_input_tokens: summary.chunks.iter().map(|c| c.input_tokens).sum(),
        total_output_tokens: summary.chunks.iter().map(|c| c.output_tokens).sum(),
        render_duration_ms,
        ocr_duration_ms,
        summary_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Done: {} pages ({} failed), {} chunks ({} failed) in {}ms",
        stats.total_pages,
        stats.ocr_failed_pages,
        stats.total_chunks,
        stats.failed_chunks,
        stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(&stats);
    }

    Ok(PipelineOutput {
        extracted_text,
        summary_text: summary.text,
        pages,
        chunks: summary.chunks,
        stats,
        extracted_path,
        summary_path,
    })
}

/// OpenAI chat provider authenticated with the configured key.
fn create_provider(config: &PipelineConfig) -> Result<Arc<dyn LLMProvider>, PdfSumError> {
    let key = config
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or(PdfSumError::MissingCredential)?;

    if config.model.trim().is_empty() {
        return Err(PdfSumError::ProviderNotConfigured {
            provider: PROVIDER_NAME.to_string(),
            hint: "model name is empty".to_string(),
        });
    }

    let provider = OpenAIProvider::new(key).with_model(&config.model);
    Ok(Arc::new(provider))
}
