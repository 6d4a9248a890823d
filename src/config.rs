//! Configuration for an OCR-and-summarise run.
//!
//! Everything a run needs (credential, paths, and the fixed knobs of each
//! stage) lives in one [`PipelineConfig`], built once at process entry and
//! passed by reference into every stage. Nothing is read from global state
//! after that point.

use crate::error::PdfSumError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;

/// Name of the extracted-text artifact inside the output directory.
pub const EXTRACTED_FILE_NAME: &str = "extracted_text.txt";

/// Name of the summary artifact inside the output directory.
pub const SUMMARY_FILE_NAME: &str = "summarized_text.txt";

/// Configuration for one pipeline run.
///
/// Built via [`PipelineConfig::builder()`] or [`PipelineConfig::default()`].
///
/// # Example
/// ```rust
/// use pdfsum::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .input("scan.pdf")
///     .api_key("sk-test")
///     .workers(4)
///     .build()
///     .unwrap();
/// assert_eq!(config.chunk_chars, 1500);
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// PDF to process. Default: `input.pdf`.
    pub input: PathBuf,

    /// Directory receiving `extracted_text.txt` and `summarized_text.txt`.
    /// Default: the OS temporary directory.
    pub output_dir: PathBuf,

    /// API key for the summarisation service. Required.
    pub api_key: Option<String>,

    /// Chat model used for summaries. Default: `gpt-3.5-turbo`.
    pub model: String,

    /// Directory containing the pdfium shared library. `None` searches the
    /// platform's default library locations.
    pub pdfium_dir: Option<PathBuf>,

    /// Tesseract executable. Default: `tesseract`, resolved on `PATH`.
    pub tesseract_path: PathBuf,

    /// Tesseract language pack. Default: `fas` (Persian).
    pub ocr_language: String,

    /// Tesseract page-segmentation mode. Default: 6 (single uniform block).
    pub page_segmentation_mode: u8,

    /// Rendering DPI. Default: 200.
    pub dpi: u32,

    /// Concurrent OCR workers. Default: 2.
    pub workers: usize,

    /// Characters per summary chunk. Default: 1500.
    pub chunk_chars: usize,

    /// Maximum tokens the model may generate per chunk. Default: 500.
    pub max_tokens: usize,

    /// Sampling temperature. Default: 0.7.
    pub temperature: f32,

    /// Optional progress observer.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("input.pdf"),
            output_dir: std::env::temp_dir(),
            api_key: None,
            model: "gpt-3.5-turbo".to_string(),
            pdfium_dir: None,
            tesseract_path: PathBuf::from(default_tesseract_binary()),
            ocr_language: "fas".to_string(),
            page_segmentation_mode: 6,
            dpi: 200,
            workers: 2,
            chunk_chars: 1500,
            max_tokens: 500,
            temperature: 0.7,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("input", &self.input)
            .field("output_dir", &self.output_dir)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("pdfium_dir", &self.pdfium_dir)
            .field("tesseract_path", &self.tesseract_path)
            .field("ocr_language", &self.ocr_language)
            .field("page_segmentation_mode", &self.page_segmentation_mode)
            .field("dpi", &self.dpi)
            .field("workers", &self.workers)
            .field("chunk_chars", &self.chunk_chars)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn PipelineProgressCallback>"),
            )
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }

    /// Startup checks, run before any processing.
    ///
    /// The credential is checked before the input path is touched, so a
    /// missing key never causes I/O on the input.
    pub fn validate(&self) -> Result<(), PdfSumError> {
        match self.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => {}
            _ => return Err(PdfSumError::MissingCredential),
        }
        if !self.input.exists() {
            return Err(PdfSumError::FileNotFound {
                path: self.input.clone(),
            });
        }
        Ok(())
    }
}

fn default_tesseract_binary() -> &'static str {
    if cfg!(windows) {
        "tesseract.exe"
    } else {
        "tesseract"
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn input(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.input = path.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn pdfium_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.pdfium_dir = Some(dir.into());
        self
    }

    pub fn tesseract_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.tesseract_path = path.into();
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn page_segmentation_mode(mut self, psm: u8) -> Self {
        self.config.page_segmentation_mode = psm;
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 600);
        self
    }

    pub fn workers(mut self, n: usize) -> Self {
        self.config.workers = n.max(1);
        self
    }

    pub fn chunk_chars(mut self, n: usize) -> Self {
        self.config.chunk_chars = n.max(1);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// Does not check the credential or the input file; that is
    /// [`PipelineConfig::validate`]'s job at run time.
    pub fn build(self) -> Result<PipelineConfig, PdfSumError> {
        let c = &self.config;
        if c.page_segmentation_mode > 13 {
            return Err(PdfSumError::InvalidConfig(format!(
                "page segmentation mode must be 0–13, got {}",
                c.page_segmentation_mode
            )));
        }
        if c.max_tokens == 0 {
            return Err(PdfSumError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.ocr_language.trim().is_empty() {
            return Err(PdfSumError::InvalidConfig(
                "OCR language must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}
