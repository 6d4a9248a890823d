//! System prompt for chunk summarisation.
//!
//! Kept in one place so tests can inspect it without a live model.

/// System instruction sent with every chunk.
///
/// Asks for a Persian summary that gives weight to headings and keeps the
/// important sections apart.
pub const SUMMARY_SYSTEM_PROMPT: &str =
    "متن زیر را به زبان فارسی خلاصه کن. از منطق وزن‌دهی به تیترها و جداسازی بخش‌های مهم استفاده کن.";

/// Separator appended after each page's OCR text and each chunk summary.
pub const BLOCK_SEPARATOR: &str = "\n\n";
