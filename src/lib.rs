//! # pdfsum
//!
//! OCR a scanned Persian PDF and summarise it with a chat model.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Render      rasterise every page at 200 DPI via pdfium (spawn_blocking)
//!  ├─ 2. Preprocess  grayscale, sharpen, contrast ×1.5, Otsu threshold
//!  ├─ 3. OCR         tesseract -l fas --psm 6 on 2 workers, page order kept
//!  ├─ 4. Chunk       1500-char windows
//!  ├─ 5. Summarise   one chat request per chunk, Persian system prompt
//!  └─ 6. Output      extracted_text.txt + summarized_text.txt
//! ```
//!
//! A page that fails OCR contributes an empty block; a chunk that fails to
//! summarise is left out. If every chunk fails, the summary file holds the
//! extracted text.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdfsum::{run, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::builder()
//!         .input("scan.pdf")
//!         .api_key(std::env::var("OPENAI_API_KEY")?)
//!         .output_dir("out")
//!         .build()?;
//!     let output = run(&config).await?;
//!     println!("{}", output.summary_text);
//!     eprintln!("{} pages, {} chunks",
//!         output.stats.total_pages,
//!         output.stats.total_chunks);
//!     Ok(())
//! }
//! ```
//!
//! ## External Requirements
//!
//! * the pdfium shared library (system-wide, or `PDFIUM_LIB_DIR`)
//! * `tesseract` with the `fas` language data
//! * `OPENAI_API_KEY`
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfsum` binary (clap + anyhow + tracing-subscriber + indicatif + dotenvy) |
//!
//! ```toml
//! pdfsum = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod run;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PipelineConfig, PipelineConfigBuilder, EXTRACTED_FILE_NAME, SUMMARY_FILE_NAME};
pub use error::{ChunkError, OcrError, PageError, PdfSumError, PreprocessError};
pub use output::{ChunkResult, PageResult, PipelineOutput, RunStats, SummaryOutput};
pub use pipeline::ocr::{OcrEngine, TesseractEngine};
pub use pipeline::render::{PageRenderer, PdfiumRenderer};
pub use pipeline::summarize::{BackendError, Completion, SummaryBackend};
pub use progress::{NoopProgressCallback, PipelineProgressCallback, ProgressCallback};
pub use run::{run, run_with};
