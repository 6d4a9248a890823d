//! Page OCR: preprocess each page image and recognise its text.
//!
//! Pages are independent, so they fan out over a small fixed pool of
//! blocking workers (two by default). Each task carries its page index and
//! its result is written into a pre-sized slot, so the joined document keeps
//! page order no matter which worker finishes first.
//!
//! A page never fails the run: preprocessing errors fall back to the original
//! image, and OCR errors leave the page's text empty.

use crate::error::{OcrError, PageError};
use crate::output::PageResult;
use crate::pipeline::preprocess::preprocess_or_original;
use crate::progress::ProgressCallback;
use crate::prompts::BLOCK_SEPARATOR;
use futures::stream::{self, StreamExt};
use image::{DynamicImage, ImageFormat};
use std::ffi::OsString;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Tesseract ends each page with a form feed.
const PAGE_BREAK: char = '\u{c}';

/// Recognises the text in a single page image.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError>;
}

/// [`OcrEngine`] that shells out to the `tesseract` binary.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    binary: PathBuf,
    language: String,
    psm: u8,
}

impl TesseractEngine {
    pub fn new(binary: impl Into<PathBuf>, language: impl Into<String>, psm: u8) -> Self {
        Self {
            binary: binary.into(),
            language: language.into(),
            psm,
        }
    }

    /// Whether the configured binary can be started at all.
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Arguments for recognising `image_path`, writing text to stdout.
    fn command_args(&self, image_path: &Path) -> Vec<OsString> {
        vec![
            image_path.as_os_str().to_owned(),
            "stdout".into(),
            "-l".into(),
            self.language.clone().into(),
            "--psm".into(),
            self.psm.to_string().into(),
        ]
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| OcrError::TempImage(e.to_string()))?;

        let mut staged = tempfile::Builder::new()
            .prefix("pdfsum-page-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| OcrError::TempImage(e.to_string()))?;
        staged
            .write_all(&png)
            .and_then(|_| staged.flush())
            .map_err(|e| OcrError::TempImage(e.to_string()))?;

        let output = Command::new(&self.binary)
            .args(self.command_args(staged.path()))
            .output()
            .map_err(|source| OcrError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(OcrError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = String::from_utf8(output.stdout).map_err(|_| OcrError::InvalidUtf8)?;
        Ok(text.trim_end_matches(PAGE_BREAK).to_string())
    }
}

/// Preprocess and recognise one page.
///
/// Always returns a `PageResult`. On OCR failure the error is logged with the
/// page number and the page's text is empty; otherwise the text is the OCR
/// output followed by a blank line.
pub fn process_page(engine: &dyn OcrEngine, image: DynamicImage, page_num: usize) -> PageResult {
    let start = Instant::now();
    info!("Processing page {}", page_num);

    let (prepared, preprocess_error) = preprocess_or_original(image, page_num);
    let used_original_image = preprocess_error.is_some();
    let mut errors: Vec<PageError> = preprocess_error.into_iter().collect();

    let (text, chars) = match engine.recognize(&prepared) {
        Ok(recognised) => {
            let chars = recognised.chars().count();
            debug!("Page {}: {} chars recognised", page_num, chars);
            (recognised + BLOCK_SEPARATOR, chars)
        }
        Err(e) => {
            error!("Page {}: OCR failed: {}", page_num, e);
            errors.push(PageError::OcrFailed {
                page: page_num,
                detail: e.to_string(),
            });
            (String::new(), 0)
        }
    };

    PageResult {
        page_num,
        text,
        chars,
        used_original_image,
        duration_ms: start.elapsed().as_millis() as u64,
        errors,
    }
}

/// OCR every page on at most `workers` blocking threads.
///
/// The returned vector is in page order, one entry per input image.
pub async fn extract_pages(
    engine: Arc<dyn OcrEngine>,
    images: Vec<DynamicImage>,
    workers: usize,
    progress: Option<ProgressCallback>,
) -> Vec<PageResult> {
    let total_pages = images.len();
    let mut slots: Vec<Option<PageResult>> = vec![None; total_pages];

    let mut completed = stream::iter(images.into_iter().enumerate().map(|(idx, image)| {
        let engine = Arc::clone(&engine);
        let progress = progress.clone();
        async move {
            let page_num = idx + 1;
            if let Some(ref cb) = progress {
                cb.on_page_start(page_num, total_pages);
            }

            let result =
                tokio::task::spawn_blocking(move || process_page(engine.as_ref(), image, page_num))
                    .await
                    .unwrap_or_else(|e| worker_panicked(page_num, &e.to_string()));

            if let Some(ref cb) = progress {
                match result.errors.iter().find(|e| matches!(e, PageError::OcrFailed { .. })) {
                    None => cb.on_page_complete(page_num, total_pages, result.chars),
                    Some(e) => cb.on_page_error(page_num, total_pages, &e.to_string()),
                }
            }
            (idx, result)
        }
    }))
    .buffer_unordered(workers.max(1));

    while let Some((idx, result)) = completed.next().await {
        slots[idx] = Some(result);
    }

    slots.into_iter().flatten().collect()
}

/// Concatenate page blocks into the document text.
pub fn join_pages(pages: &[PageResult]) -> String {
    pages.iter().map(|p| p.text.as_str()).collect()
}

fn worker_panicked(page_num: usize, detail: &str) -> PageResult {
    error!("Page {}: OCR worker panicked: {}", page_num, detail);
    PageResult {
        page_num,
        text: String::new(),
        chars: 0,
        used_original_image: false,
        duration_ms: 0,
        errors: vec![PageError::OcrFailed {
            page: page_num,
            detail: format!("worker panicked: {detail}"),
        }],
    }
}
