//! Pipeline stages for PDF OCR and summarisation.
//!
//! Each submodule implements one step, so every stage can be tested with a
//! fake collaborator in place of pdfium, tesseract or the chat service.
//!
//! ## Data Flow
//!
//! ```text
//! render ──▶ preprocess ──▶ ocr ──▶ chunk ──▶ summarize ──▶ persist
//! (pdfium)   (imageproc)   (tesseract)      (chat API)     (two .txt files)
//! ```
//!
//! 1. [`render`]: rasterise every page at the configured DPI; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 2. [`preprocess`]: grayscale, sharpen, contrast, Otsu binarisation
//! 3. [`ocr`]: recognise each page on a bounded worker pool, joined back in
//!    page order
//! 4. [`chunk`]: cut the document text into fixed-size char windows
//! 5. [`summarize`]: one chat request per chunk, in order; the only stage
//!    with network I/O
//! 6. [`persist`]: write the extracted text and the summary

pub mod chunk;
pub mod ocr;
pub mod persist;
pub mod preprocess;
pub mod render;
pub mod summarize;
