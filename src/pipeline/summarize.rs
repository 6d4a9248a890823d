//! Chunked summarisation through a chat-completion backend.
//!
//! The document text is cut into fixed-size chunks and each chunk is sent,
//! in order and one at a time, with the Persian summary prompt. Summaries of
//! successful chunks are joined with blank lines. A failed chunk is logged
//! and left out. If no chunk succeeds, the summary is the input itself.

use crate::config::PipelineConfig;
use crate::error::ChunkError;
use crate::output::{ChunkResult, SummaryOutput};
use crate::pipeline::chunk::split_chunks;
use crate::prompts::{BLOCK_SEPARATOR, SUMMARY_SYSTEM_PROMPT};
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Error type surfaced by a [`SummaryBackend`].
pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

/// One model reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    pub content: String,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

/// Sends a system instruction and a user message, returns the reply.
pub trait SummaryBackend: Send + Sync {
    fn complete(
        &self,
        system: &str,
        user: &str,
        options: &CompletionOptions,
    ) -> impl Future<Output = Result<Completion, BackendError>> + Send;
}

impl SummaryBackend for Arc<dyn LLMProvider> {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        options: &CompletionOptions,
    ) -> Result<Completion, BackendError> {
        let messages = vec![ChatMessage::system(system), ChatMessage::user(user)];
        let response = self
            .chat(&messages, Some(options))
            .await
            .map_err(|e| BackendError::from(e.to_string()))?;

        Ok(Completion {
            content: response.content,
            prompt_tokens: response.prompt_tokens as u64,
            completion_tokens: response.completion_tokens as u64,
        })
    }
}

/// Sampling options for every summary request.
pub fn build_options(config: &PipelineConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

/// Summarise `text` chunk by chunk.
///
/// Never fails: per-chunk errors are recorded in the returned
/// [`ChunkResult`]s and reported to the progress callback.
pub async fn summarize<B: SummaryBackend>(
    backend: &B,
    text: &str,
    config: &PipelineConfig,
) -> SummaryOutput {
    let chunks = split_chunks(text, config.chunk_chars);
    let total_chunks = chunks.len();
    let options = build_options(config);
    let progress = config.progress_callback.as_ref();

    info!("Summarising {} chunk(s)", total_chunks);
    if let Some(cb) = progress {
        cb.on_summary_start(total_chunks);
    }

    let mut summary = String::new();
    let mut results = Vec::with_capacity(total_chunks);

    for (idx, chunk) in chunks.into_iter().enumerate() {
        let chunk_num = idx + 1;
        let input_chars = chunk.chars().count();
        let start = Instant::now();

        match backend.complete(SUMMARY_SYSTEM_PROMPT, chunk, &options).await {
            Ok(reply) => {
                debug!(
                    "Chunk {}: {} input tokens, {} output tokens, {:?}",
                    chunk_num,
                    reply.prompt_tokens,
                    reply.completion_tokens,
                    start.elapsed()
                );
                if reply.content.is_empty() {
                    warn!("Chunk {}: model returned an empty summary", chunk_num);
                }
                summary.push_str(&reply.content);
                summary.push_str(BLOCK_SEPARATOR);

                if let Some(cb) = progress {
                    cb.on_chunk_complete(chunk_num, total_chunks);
                }
                results.push(ChunkResult {
                    chunk_num,
                    input_chars,
                    summary: Some(reply.content),
                    input_tokens: reply.prompt_tokens,
                    output_tokens: reply.completion_tokens,
                    duration_ms: start.elapsed().as_millis() as u64,
                    error: None,
                });
            }
            Err(e) => {
                let detail = e.to_string();
                error!("Chunk {}: summary request failed: {}", chunk_num, detail);

                if let Some(cb) = progress {
                    cb.on_chunk_error(chunk_num, total_chunks, &detail);
                }
                results.push(ChunkResult {
                    chunk_num,
                    input_chars,
                    summary: None,
                    input_tokens: 0,
                    output_tokens: 0,
                    duration_ms: start.elapsed().as_millis() as u64,
                    error: Some(ChunkError::SummaryFailed {
                        chunk: chunk_num,
                        detail,
                    }),
                });
            }
        }
    }

    // Nothing summarised: hand back the input rather than an empty file.
    // With zero chunks the input is empty too.
    let fell_back = total_chunks > 0 && summary.is_empty();
    if fell_back {
        warn!("No chunk could be summarised; keeping the extracted text as the summary");
        summary = text.to_string();
    }

    SummaryOutput {
        text: summary,
        chunks: results,
        fell_back,
    }
}
