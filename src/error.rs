//! Error types for the pdfsum library.
//!
//! Failures fall into two groups:
//!
//! * [`PdfSumError`] is **fatal**: the run cannot proceed (no credential, no
//!   input file, the PDF cannot be rendered, an artifact cannot be written).
//!   Returned as `Err(PdfSumError)` from [`crate::run::run`].
//!
//! * [`PageError`] / [`ChunkError`] are **recoverable**: one page failed to
//!   preprocess or OCR, or one chunk failed to summarise. They are logged,
//!   stored on [`crate::output::PageResult`] / [`crate::output::ChunkResult`],
//!   and the pipeline moves on.
//!
//! [`PreprocessError`] and [`OcrError`] are the low-level causes that the page
//! processor folds into a [`PageError`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdfsum library.
#[derive(Debug, Error)]
pub enum PdfSumError {
    // ── Startup errors ────────────────────────────────────────────────────
    /// No API credential for the summarisation service.
    #[error("OpenAI API key is not set.\nExport OPENAI_API_KEY=sk-... or add it to a .env file.")]
    MissingCredential,

    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The chat provider could not be constructed.
    #[error("LLM provider '{provider}' is not available: {hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Rasterisation errors ──────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_DIR to the directory containing libpdfium, or install pdfium system-wide."
    )]
    RendererUnavailable(String),

    /// The PDF could not be opened or parsed.
    #[error("PDF '{path}' could not be opened: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// pdfium returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create the output directory or write an artifact.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A recoverable error for a single page.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// Preprocessing failed; OCR ran on the original image instead.
    #[error("Page {page}: preprocessing failed, using original image: {detail}")]
    PreprocessFailed { page: usize, detail: String },

    /// OCR failed; the page contributes no text.
    #[error("Page {page}: OCR failed: {detail}")]
    OcrFailed { page: usize, detail: String },
}

/// A recoverable error for a single summary chunk.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum ChunkError {
    /// The completion request failed; the chunk is left out of the summary.
    #[error("Chunk {chunk}: summarisation failed: {detail}")]
    SummaryFailed { chunk: usize, detail: String },
}

/// Why image preprocessing could not produce an OCR-ready image.
#[derive(Debug, Error)]
pub enum PreprocessError {
    /// The image has no pixels to threshold.
    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    /// A filter panicked part-way through.
    #[error("preprocessing panicked: {0}")]
    Panicked(String),
}

/// Why the OCR engine could not recognise a page.
#[derive(Debug, Error)]
pub enum OcrError {
    /// The page image could not be staged for the engine.
    #[error("failed to write temporary page image: {0}")]
    TempImage(String),

    /// The engine binary could not be started.
    #[error("failed to run '{binary}': {source}")]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The engine exited unsuccessfully.
    #[error("tesseract exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    /// The engine wrote something that is not UTF-8.
    #[error("tesseract output is not valid UTF-8")]
    InvalidUtf8,
}
