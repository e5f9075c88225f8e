//! CLI binary for edgequake-pdf2para.
//!
//! Maps flags to `ExtractionConfig`, runs extraction (or stitching alone on
//! an existing output tree) and prints a summary.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdf2para::{
    extract, inspect, stitch_directory, ExtractionConfig, ExtractionProgressCallback, InputMode,
    PageSelection, ParagraphStore, ProgressCallback, StitchEvent, StitchOptions, StitchReport,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
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
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Progress bar over pages plus one log line per page and per stitch change.
struct CliProgressCallback {
    bar: ProgressBar,
    page_started: Mutex<Option<Instant>>,
    stitch_changes: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            page_started: Mutex::new(None),
            stitch_changes: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Extracting");
        self.bar.reset_eta();
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Extracting paragraphs from {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        if let Ok(mut started) = self.page_started.lock() {
            *started = Some(Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, kept_paragraphs: usize) {
        let elapsed_ms = self
            .page_started
            .lock()
            .ok()
            .and_then(|mut started| started.take())
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<16}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{kept_paragraphs:>3} paragraphs")),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
        if self.bar.position() == self.bar.length().unwrap_or(0) {
            self.bar.set_prefix("Stitching");
            self.bar.set_message("checking page boundaries");
        }
    }

    fn on_stitch_event(&self, event: &StitchEvent) {
        self.stitch_changes.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!("  {} {}", yellow("↺"), dim(&event.to_string())));
    }

    fn on_extraction_complete(&self, total_pages: usize, total_paragraphs: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} paragraphs from {} pages  {}",
            green("✔"),
            bold(&total_paragraphs.to_string()),
            total_pages,
            dim(&format!(
                "({} stitch changes)",
                self.stitch_changes.load(Ordering::SeqCst)
            )),
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract paragraphs into ./output_paragraphs/<page>/paragraph_<n>.txt
  pdf2para paper.pdf

  # Custom output directory, pages 3 to 12
  pdf2para --pages 3-12 -o out/ paper.pdf

  # Send the text layer instead of page images
  pdf2para --mode text paper.pdf

  # Keep short fragments, skip stitching
  pdf2para --min-length 0 --no-stitch paper.pdf

  # Re-run stitching on an existing output directory
  pdf2para --stitch-only output_paragraphs/

  # Inspect PDF metadata (no API key needed)
  pdf2para --inspect-only paper.pdf

OUTPUT LAYOUT:
  <output-dir>/<page>/paragraph_<n>.txt
  Pages are 1-indexed; paragraphs are numbered 1..N with no gaps.

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, gemini, anthropic, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to libpdfium (file or containing directory)
  RUST_LOG                Log filter, e.g. edgequake_pdf2para=debug
"#;

/// Extract explanatory paragraphs from PDFs with a vision LLM.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2para",
    version,
    about = "Extract explanatory paragraphs from PDFs with a vision LLM",
    long_about = "Extract the explanatory paragraphs of a PDF (local file or URL) one page at a \
time with a vision language model, store one text file per paragraph, then stitch paragraphs \
split across page breaks and reunite colon lead-ins with their lists.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF path or HTTP/HTTPS URL; with --stitch-only, an output directory.
    input: String,

    /// Root directory of the paragraph store.
    #[arg(short, long, env = "PDF2PARA_OUTPUT_DIR", default_value = "output_paragraphs")]
    output_dir: PathBuf,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "PDF2PARA_PAGES", default_value = "all")]
    pages: String,

    /// What the model sees of each page.
    #[arg(long, env = "PDF2PARA_MODE", value_enum, default_value = "image")]
    mode: ModeArg,

    /// Minimum paragraph length in characters; shorter ones are dropped.
    #[arg(long, env = "PDF2PARA_MIN_LENGTH", default_value_t = 30)]
    min_length: usize,

    /// LLM model ID (default: gpt-4.1-nano, or gemini-2.0-flash-lite for gemini).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, gemini, anthropic, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Rendering DPI (72–400).
    #[arg(long, env = "PDF2PARA_DPI", default_value_t = 144,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// Max LLM output tokens per page.
    #[arg(long, env = "PDF2PARA_MAX_TOKENS", default_value_t = 10_000)]
    max_tokens: usize,

    /// LLM temperature for extraction (0.0–2.0).
    #[arg(long, env = "PDF2PARA_TEMPERATURE", default_value_t = 0.5)]
    temperature: f32,

    /// Pause after every model call, in milliseconds.
    #[arg(long, env = "PDF2PARA_THROTTLE_MS", default_value_t = 2000)]
    throttle_ms: u64,

    /// Retries per model call; 0 aborts on the first failure.
    #[arg(long, env = "PDF2PARA_MAX_RETRIES", default_value_t = 0)]
    max_retries: u32,

    /// Per-call model timeout in seconds.
    #[arg(long, env = "PDF2PARA_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2PARA_PASSWORD")]
    password: Option<String>,

    /// Path to a text file replacing the extraction system prompt.
    #[arg(long, env = "PDF2PARA_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Skip both stitching passes.
    #[arg(long, conflicts_with = "stitch_only")]
    no_stitch: bool,

    /// Only stitch an existing output directory (INPUT); no extraction.
    #[arg(long, conflicts_with = "inspect_only")]
    stitch_only: bool,

    /// Print PDF metadata only.
    #[arg(long)]
    inspect_only: bool,

    /// Print the result as JSON on stdout.
    #[arg(long, env = "PDF2PARA_JSON")]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "PDF2PARA_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level logs.
    #[arg(short, long, env = "PDF2PARA_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2PARA_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDF2PARA_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Image,
    Text,
}

impl From<ModeArg> for InputMode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::Image => InputMode::Image,
            ModeArg::Text => InputMode::Text,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The bar replaces INFO logs; -v brings them back.
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

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let meta = inspect(&cli.input, cli.password.as_deref())
            .await
            .context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", cli.input);
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
        }
        return Ok(());
    }

    // ── Stitch-only mode ─────────────────────────────────────────────────
    if cli.stitch_only {
        let config = build_config(&cli, None).await?;
        let dir = PathBuf::from(&cli.input);
        let selection = parse_pages(&cli.pages)?;
        let pages = match selection {
            PageSelection::All => None,
            other => {
                let existing = ParagraphStore::new(&dir)
                    .pages()
                    .context("Failed to list page directories")?;
                let last = existing.last().copied().unwrap_or(0);
                Some(other.resolve(last).context("Invalid page selection")?)
            }
        };

        let report = stitch_directory(&dir, pages, &config)
            .await
            .context("Stitching failed")?;
        print_stitch_report(&cli, &report)?;
        return Ok(());
    }

    // ── Full extraction ──────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb).await?;

    let output = extract(&cli.input, &config)
        .await
        .context("Extraction failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        if !show_progress {
            eprintln!(
                "Extracted {} paragraphs from {} pages in {}ms",
                output.stats.stored_paragraphs,
                output.stats.processed_pages,
                output.stats.total_duration_ms
            );
        }
        eprintln!(
            "   {} filtered as too short  →  {}",
            dim(&output.stats.filtered_paragraphs.to_string()),
            bold(&output.output_dir.display().to_string()),
        );
    }

    Ok(())
}

fn print_stitch_report(cli: &Cli, report: &StitchReport) -> Result<()> {
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(report).context("Failed to serialise report")?
        );
    } else if !cli.quiet {
        eprintln!(
            "{} {} changes: {} cross-page merges, {} lead-ins merged, {} list items absorbed, \
             {} lead-ins dropped",
            green("✔"),
            bold(&report.total_changes().to_string()),
            report.cross_page_merges,
            report.lead_in_merges,
            report.list_items_absorbed,
            report.dangling_lead_ins_dropped + report.unsupported_lead_ins_dropped,
        );
    }
    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let system_prompt = if let Some(ref path) = cli.system_prompt {
        Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read system prompt from {:?}", path))?,
        )
    } else {
        None
    };

    let stitch = if cli.no_stitch {
        StitchOptions::disabled()
    } else {
        StitchOptions::default()
    };

    let mut builder = ExtractionConfig::builder()
        .dpi(cli.dpi)
        .input_mode(cli.mode.into())
        .pages(parse_pages(&cli.pages)?)
        .min_paragraph_len(cli.min_length)
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .throttle_ms(cli.throttle_ms)
        .max_retries(cli.max_retries)
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout)
        .output_dir(&cli.output_dir)
        .stitch(stitch);

    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref password) = cli.password {
        builder = builder.password(password);
    }
    if let Some(prompt) = system_prompt {
        builder = builder.system_prompt(prompt);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--pages` into a `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageSelection::All);
    }

    let page = |p: &str| -> Result<usize> {
        let n: usize = p
            .trim()
            .parse()
            .with_context(|| format!("Invalid page number: '{}'", p.trim()))?;
        if n < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", n);
        }
        Ok(n)
    };

    if let Some((start, end)) = s.split_once('-') {
        let (start, end) = (page(start)?, page(end)?);
        if start > end {
            anyhow::bail!("Invalid page range '{}-{}': start must be <= end", start, end);
        }
        return Ok(PageSelection::Range(start, end));
    }

    if s.contains(',') {
        let pages = s.split(',').map(page).collect::<Result<Vec<_>>>()?;
        return Ok(PageSelection::Set(pages));
    }

    Ok(PageSelection::Single(page(&s)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_page_selections() {
        assert!(matches!(parse_pages("all").unwrap(), PageSelection::All));
        assert!(matches!(parse_pages(" 5 ").unwrap(), PageSelection::Single(5)));
        assert!(matches!(parse_pages("3-15").unwrap(), PageSelection::Range(3, 15)));
        match parse_pages("1,3,5").unwrap() {
            PageSelection::Set(pages) => assert_eq!(pages, vec![1, 3, 5]),
            other => panic!("unexpected selection: {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_page_selections() {
        assert!(parse_pages("0").is_err());
        assert!(parse_pages("5-3").is_err());
        assert!(parse_pages("a,b").is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
