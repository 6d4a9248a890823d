//! CLI binary for pdfsum.
//!
//! A thin shim over the library crate that maps CLI flags and environment
//! variables to `PipelineConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdfsum::{run, PipelineConfig, PipelineProgressCallback, ProgressCallback, RunStats};
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const SPINNER_TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: one bar for OCR pages, then reused for summary chunks.
/// Pages may finish out of order.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(SPINNER_TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Rendering");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn activate_bar(&self, prefix: &'static str, unit: &str, total: usize) {
        let style = ProgressStyle::with_template(&format!(
            "{{spinner:.cyan}} {{prefix:.bold}}  \
             [{{bar:42.green/238}}] {{pos:>3}}/{{len}} {unit}  \
             ⏱ {{elapsed_precise}}  ETA {{eta_precise}}"
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(SPINNER_TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_position(0);
        self.bar.set_style(style);
        self.bar.set_prefix(prefix);
        self.bar.reset_eta();
    }

    fn page_elapsed_ms(&self, page_num: usize) -> u128 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&page_num))
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0)
    }
}

impl PipelineProgressCallback for CliProgressCallback {
    fn on_pages_rendered(&self, total_pages: usize) {
        self.activate_bar("OCR", "pages", total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Recognising {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(page_num, Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, text_len: usize) {
        let elapsed_ms = self.page_elapsed_ms(page_num);
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<8}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{text_len:>5} chars")),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        let elapsed_ms = self.page_elapsed_ms(page_num);
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            page_num,
            total,
            red(&truncate(error, 80)),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_summary_start(&self, total_chunks: usize) {
        self.activate_bar("Summarising", "chunks", total_chunks);
    }

    fn on_chunk_complete(&self, _chunk_num: usize, _total: usize) {
        self.bar.inc(1);
    }

    fn on_chunk_error(&self, chunk_num: usize, total: usize, error: &str) {
        self.bar.println(format!(
            "  {} Chunk {:>3}/{:<3}  {}",
            red("✗"),
            chunk_num,
            total,
            red(&truncate(error, 80)),
        ));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, _stats: &RunStats) {
        self.bar.finish_and_clear();
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let head: String = s.chars().take(max_chars - 1).collect();
        format!("{head}\u{2026}")
    } else {
        s.to_string()
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # OCR and summarise input.pdf into the temp directory
  pdfsum

  # Explicit input and output directory
  pdfsum scan.pdf --output-dir ./out

  # Different model, more OCR workers
  pdfsum scan.pdf --model gpt-4o-mini --workers 4

  # Machine-readable run report
  pdfsum scan.pdf --json > report.json

ENVIRONMENT VARIABLES (also read from ./.env):
  OPENAI_API_KEY      OpenAI API key (required)
  PDF_FILE_PATH       Input PDF (default: input.pdf)
  OUTPUT_DIR          Output directory (default: OS temp dir)
  TESSERACT_PATH      Tesseract executable (default: tesseract on PATH)
  PDFIUM_LIB_DIR      Directory containing libpdfium
  RUST_LOG            Overrides the log filter

OUTPUT:
  <output-dir>/extracted_text.txt    OCR text, one blank-line-terminated block per page
  <output-dir>/summarized_text.txt   Persian summary, one block per chunk
"#;

/// OCR a scanned Persian PDF and summarise it.
#[derive(Parser, Debug)]
#[command(
    name = "pdfsum",
    version,
    about = "OCR a scanned Persian PDF with Tesseract and summarise it with OpenAI",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF file to process.
    #[arg(env = "PDF_FILE_PATH", default_value = "input.pdf")]
    input: PathBuf,

    /// Directory for extracted_text.txt and summarized_text.txt.
    #[arg(long, env = "OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Tesseract executable.
    #[arg(long = "tesseract", env = "TESSERACT_PATH")]
    tesseract_path: Option<PathBuf>,

    /// Directory containing the pdfium shared library.
    #[arg(long, env = "PDFIUM_LIB_DIR")]
    pdfium_dir: Option<PathBuf>,

    /// Chat model used for summaries.
    #[arg(long, env = "PDFSUM_MODEL", default_value = "gpt-3.5-turbo")]
    model: String,

    /// Rendering DPI (72–600).
    #[arg(long, env = "PDFSUM_DPI", default_value_t = 200,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// Concurrent OCR workers.
    #[arg(long, env = "PDFSUM_WORKERS", default_value_t = 2)]
    workers: usize,

    /// Characters per summary chunk.
    #[arg(long, env = "PDFSUM_CHUNK_CHARS", default_value_t = 1500)]
    chunk_chars: usize,

    /// Max output tokens per chunk summary.
    #[arg(long, env = "PDFSUM_MAX_TOKENS", default_value_t = 500)]
    max_tokens: usize,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "PDFSUM_TEMPERATURE", default_value_t = 0.7)]
    temperature: f32,

    /// Tesseract language pack.
    #[arg(long = "lang", env = "PDFSUM_OCR_LANG", default_value = "fas")]
    ocr_language: String,

    /// Tesseract page-segmentation mode (0–13).
    #[arg(long, env = "PDFSUM_PSM", default_value_t = 6)]
    psm: u8,

    /// Print the run report as JSON on stdout.
    #[arg(long, env = "PDFSUM_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDFSUM_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFSUM_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFSUM_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; real environment variables still apply.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs while it is showing.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn PipelineProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Run ──────────────────────────────────────────────────────────────
    let output = run(&config).await.context("Processing failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet {
        let stats = &output.stats;
        eprintln!("{}", completion_line(stats));
        if stats.summary_fell_back {
            eprintln!(
                "   {}",
                red("no chunk could be summarised; summary holds the extracted text")
            );
        }
        eprintln!(
            "   {} tokens in  /  {} tokens out",
            dim(&stats.total_input_tokens.to_string()),
            dim(&stats.total_output_tokens.to_string()),
        );
        eprintln!("   → {}", bold(&output.extracted_path.display().to_string()));
        eprintln!("   → {}", bold(&output.summary_path.display().to_string()));
    }

    Ok(())
}

/// The one-line tally printed once a run finishes.
fn completion_line(stats: &RunStats) -> String {
    let failed_suffix = |n: usize| {
        if n > 0 {
            format!(" ({n} failed)")
        } else {
            String::new()
        }
    };
    format!(
        "{}  {} pages{}  {} chunks{}  {}ms",
        if stats.ocr_failed_pages == 0 && stats.failed_chunks == 0 {
            green("✔")
        } else {
            cyan("⚠")
        },
        stats.total_pages,
        failed_suffix(stats.ocr_failed_pages),
        stats.total_chunks,
        failed_suffix(stats.failed_chunks),
        stats.total_duration_ms,
    )
}

/// Map CLI args to `PipelineConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder()
        .input(&cli.input)
        .model(&cli.model)
        .dpi(cli.dpi)
        .workers(cli.workers)
        .chunk_chars(cli.chunk_chars)
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .ocr_language(&cli.ocr_language)
        .page_segmentation_mode(cli.psm);

    // The key is taken from the environment only, never from a flag.
    if let Ok(key) = std::env::var("OPENAI_API_KEY") {
        builder = builder.api_key(key);
    }
    if let Some(ref dir) = cli.output_dir {
        builder = builder.output_dir(dir);
    }
    if let Some(ref path) = cli.tesseract_path {
        builder = builder.tesseract_path(path);
    }
    if let Some(ref dir) = cli.pdfium_dir {
        builder = builder.pdfium_dir(dir);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
