//! Result types produced by a pipeline run.

use crate::error::{ChunkError, PageError};
use serde::Serialize;
use std::path::PathBuf;

/// Outcome of OCR for a single page.
#[derive(Debug, Clone, Serialize)]
pub struct PageResult {
    /// 1-indexed page number.
    pub page_num: usize,
    /// Page block as it appears in the document text: the recognised text
    /// followed by `"\n\n"`, or empty when OCR failed.
    #[serde(skip)]
    pub text: String,
    /// Chars of recognised text (separator excluded).
    pub chars: usize,
    /// True when preprocessing failed and OCR ran on the original raster.
    pub used_original_image: bool,
    pub duration_ms: u64,
    /// Non-fatal errors met on this page, in the order they happened.
    pub errors: Vec<PageError>,
}

impl PageResult {
    /// Whether OCR produced text for this page.
    pub fn is_ok(&self) -> bool {
        !self
            .errors
            .iter()
            .any(|e| matches!(e, PageError::OcrFailed { .. }))
    }
}

/// Outcome of the summary request for a single chunk.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkResult {
    /// 1-indexed chunk number.
    pub chunk_num: usize,
    /// Chars of document text in this chunk.
    pub input_chars: usize,
    #[serde(skip)]
    pub summary: Option<String>,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub duration_ms: u64,
    pub error: Option<ChunkError>,
}

/// The summariser's output for a whole document.
#[derive(Debug, Clone)]
pub struct SummaryOutput {
    /// Concatenated chunk summaries, or the unsummarised input when
    /// `fell_back` is set.
    pub text: String,
    pub chunks: Vec<ChunkResult>,
    /// True when no chunk could be summarised and `text` is the input.
    pub fell_back: bool,
}

/// Aggregate statistics for a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    pub total_pages: usize,
    pub ocr_failed_pages: usize,
    pub preprocess_fallbacks: usize,
    pub extracted_chars: usize,
    pub total_chunks: usize,
    pub failed_chunks: usize,
    pub summary_fell_back: bool,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub render_duration_ms: u64,
    pub ocr_duration_ms: u64,
    pub summary_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    #[serde(skip)]
    pub extracted_text: String,
    #[serde(skip)]
    pub summary_text: String,
    pub pages: Vec<PageResult>,
    pub chunks: Vec<ChunkResult>,
    pub stats: RunStats,
    pub extracted_path: PathBuf,
    pub summary_path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preprocess_fallback_alone_keeps_page_ok() {
        let page = PageResult {
            page_num: 1,
            text: "x\n\n".into(),
            chars: 1,
            used_original_image: true,
            duration_ms: 0,
            errors: vec![PageError::PreprocessFailed {
                page: 1,
                detail: "empty".into(),
            }],
        };
        assert!(page.is_ok());
    }

    #[test]
    fn ocr_failure_marks_page_failed() {
        let page = PageResult {
            page_num: 2,
            text: String::new(),
            chars: 0,
            used_original_image: false,
            duration_ms: 0,
            errors: vec![PageError::OcrFailed {
                page: 2,
                detail: "exit 1".into(),
            }],
        };
        assert!(!page.is_ok());
    }

    #[test]
    fn report_json_omits_texts() {
        let out = PipelineOutput {
            extracted_text: "secret page text".into(),
            summary_text: "secret summary".into(),
            pages: vec![],
            chunks: vec![],
            stats: RunStats::default(),
            extracted_path: PathBuf::from("/tmp/extracted_text.txt"),
            summary_path: PathBuf::from("/tmp/summarized_text.txt"),
        };
        let json = serde_json::to_string(&out).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("extracted_text.txt"));
        assert!(json.contains("\"total_pages\":0"));
    }
}
