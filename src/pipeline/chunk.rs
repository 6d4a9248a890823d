//! Fixed-size text chunking for the summariser.
//!
//! Chunks are measured in chars (Unicode scalar values), never bytes, so a
//! multi-byte Persian letter is never split. Every chunk except possibly the
//! last holds exactly `max_chars` chars and the chunks concatenate back to the
//! input. Splits ignore word, sentence and page boundaries.

/// Split `text` into consecutive slices of at most `max_chars` chars.
///
/// An empty input yields no chunks. `max_chars` of 0 is treated as 1.
pub fn split_chunks(text: &str, max_chars: usize) -> Vec<&str> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::with_capacity(text.len() / max_chars + 1);

    let mut start = 0;
    let mut count = 0;
    for (byte_idx, _) in text.char_indices() {
        if count == max_chars {
            chunks.push(&text[start..byte_idx]);
            start = byte_idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        chunks.push(&text[start..]);
    }

    chunks
}
