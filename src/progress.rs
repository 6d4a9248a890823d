//! Progress-callback trait for page and chunk events.
//!
//! Inject an [`Arc<dyn PipelineProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to observe a
//! run as it moves through rendering, OCR and summarisation.
//!
//! # Example
//!
//! ```rust
//! use pdfsum::{PipelineConfig, PipelineProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     pages: AtomicUsize,
//! }
//!
//! impl PipelineProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize, text_len: usize) {
//!         self.pages.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("page {page_num}/{total_pages}: {text_len} chars");
//!     }
//! }
//!
//! let cb = Arc::new(CountingCallback { pages: AtomicUsize::new(0) });
//! let config = PipelineConfig::builder()
//!     .progress_callback(cb as Arc<dyn PipelineProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::output::RunStats;
use std::sync::Arc;

/// Called by the pipeline as it processes pages and chunks.
///
/// Page events arrive from OCR worker threads, possibly out of page order.
/// Chunk events arrive sequentially. All methods default to no-ops.
pub trait PipelineProgressCallback: Send + Sync {
    /// Called once rasterisation finished and the page count is known.
    fn on_pages_rendered(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called when a worker picks up a page (1-indexed).
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when OCR produced text for a page.
    ///
    /// `text_len` counts chars of the recognised text, separator excluded.
    fn on_page_complete(&self, page_num: usize, total_pages: usize, text_len: usize) {
        let _ = (page_num, total_pages, text_len);
    }

    /// Called when OCR failed for a page; the page contributes no text.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once before the first summary request.
    fn on_summary_start(&self, total_chunks: usize) {
        let _ = total_chunks;
    }

    /// Called when a chunk (1-indexed) was summarised.
    fn on_chunk_complete(&self, chunk_num: usize, total_chunks: usize) {
        let _ = (chunk_num, total_chunks);
    }

    /// Called when a chunk's summary request failed.
    fn on_chunk_error(&self, chunk_num: usize, total_chunks: usize, error: &str) {
        let _ = (chunk_num, total_chunks, error);
    }

    /// Called once both artifacts are on disk.
    fn on_run_complete(&self, stats: &RunStats) {
        let _ = stats;
    }
}

/// A no-op implementation.
#[derive(Debug, Default)]
pub struct NoopProgressCallback;

impl PipelineProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn PipelineProgressCallback>;
