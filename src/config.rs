//! Configuration types for paragraph extraction and stitching.
//!
//! Every knob lives in [`ExtractionConfig`], built through
//! [`ExtractionConfigBuilder`]. The defaults reproduce a conservative,
//! rate-limit friendly run: one page at a time, a two-second pause after
//! every model call, no retries.

use crate::error::Pdf2ParaError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default directory that receives one sub-directory per page.
pub const DEFAULT_OUTPUT_DIR: &str = "output_paragraphs";

/// Configuration for an extraction run.
///
/// # Example
/// ```rust
/// use edgequake_pdf2para::{ExtractionConfig, InputMode};
///
/// let config = ExtractionConfig::builder()
///     .input_mode(InputMode::Text)
///     .min_paragraph_len(40)
///     .throttle_ms(500)
///     .output_dir("paragraphs")
///     .build()
///     .unwrap();
/// assert_eq!(config.min_paragraph_len, 40);
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Rendering DPI in image mode. Range: 72–400. Default: 144 (2× zoom).
    pub dpi: u32,

    /// Cap on either rendered image dimension, in pixels. Default: 2000.
    pub max_rendered_pixels: u32,

    /// Whether pages reach the model as images or as their text layer.
    pub input_mode: InputMode,

    /// LLM model identifier. If None, a per-provider default is used.
    pub model: Option<String>,

    /// LLM provider name (e.g. "gemini", "openai", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for the extraction call. Default: 0.5.
    pub temperature: f32,

    /// Output budget for the extraction call. Default: 10000.
    pub max_tokens: usize,

    /// Sampling temperature for continuity checks. Default: 0.1.
    pub oracle_temperature: f32,

    /// Output budget for continuity checks. Default: 10.
    ///
    /// The oracle only needs a yes/no answer.
    pub oracle_max_tokens: usize,

    /// Pause after every model call, in milliseconds. Default: 2000.
    pub throttle_ms: u64,

    /// Retries on a failed model call. Default: 0.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-call timeout in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Minimum trimmed length (in characters) a paragraph needs to be kept. Default: 30.
    pub min_paragraph_len: usize,

    /// Root of the paragraph store. Default: `output_paragraphs`.
    pub output_dir: PathBuf,

    /// Page selection. Default: all pages.
    pub pages: PageSelection,

    /// Which stitching passes run after extraction.
    pub stitch: StitchOptions,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Custom extraction prompt. If None, uses the built-in prompt.
    pub system_prompt: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Receives per-page and per-merge events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            dpi: 144,
            max_rendered_pixels: 2000,
            input_mode: InputMode::default(),
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.5,
            max_tokens: 10_000,
            oracle_temperature: 0.1,
            oracle_max_tokens: 10,
            throttle_ms: 2000,
            max_retries: 0,
            retry_backoff_ms: 500,
            api_timeout_secs: 120,
            min_paragraph_len: 30,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            pages: PageSelection::default(),
            stitch: StitchOptions::default(),
            password: None,
            system_prompt: None,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("input_mode", &self.input_mode)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("oracle_temperature", &self.oracle_temperature)
            .field("oracle_max_tokens", &self.oracle_max_tokens)
            .field("throttle_ms", &self.throttle_ms)
            .field("max_retries", &self.max_retries)
            .field("min_paragraph_len", &self.min_paragraph_len)
            .field("output_dir", &self.output_dir)
            .field("pages", &self.pages)
            .field("stitch", &self.stitch)
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn input_mode(mut self, mode: InputMode) -> Self {
        self.config.input_mode = mode;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn oracle_temperature(mut self, t: f32) -> Self {
        self.config.oracle_temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn oracle_max_tokens(mut self, n: usize) -> Self {
        self.config.oracle_max_tokens = n;
        self
    }

    pub fn throttle_ms(mut self, ms: u64) -> Self {
        self.config.throttle_ms = ms;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn min_paragraph_len(mut self, n: usize) -> Self {
        self.config.min_paragraph_len = n;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn stitch(mut self, options: StitchOptions) -> Self {
        self.config.stitch = options;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, Pdf2ParaError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 400 {
            return Err(Pdf2ParaError::InvalidConfig(format!(
                "DPI must be 72–400, got {}",
                c.dpi
            )));
        }
        if c.max_tokens == 0 || c.oracle_max_tokens == 0 {
            return Err(Pdf2ParaError::InvalidConfig(
                "Token budgets must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(Pdf2ParaError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if c.output_dir.as_os_str().is_empty() {
            return Err(Pdf2ParaError::InvalidConfig(
                "Output directory must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How a page is presented to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InputMode {
    /// Rasterise the page and send the PNG. Keeps layout cues. (default)
    #[default]
    Image,
    /// Send the page's extracted text layer. Cheaper, loses layout.
    Text,
}

/// Which stitching passes run after extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StitchOptions {
    /// Oracle-gated merge of last/first paragraphs across page breaks.
    pub cross_page: bool,
    /// Lexical colon-lead-in / list-item reconciliation.
    pub colon_lists: bool,
}

impl Default for StitchOptions {
    fn default() -> Self {
        Self {
            cross_page: true,
            colon_lists: true,
        }
    }
}

impl StitchOptions {
    /// Both passes disabled.
    pub fn disabled() -> Self {
        Self {
            cross_page: false,
            colon_lists: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.cross_page || self.colon_lists
    }
}

/// Specifies which pages of the PDF to process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum PageSelection {
    /// Every page (default).
    #[default]
    All,
    /// A single page (1-indexed).
    Single(usize),
    /// A contiguous range (1-indexed, inclusive).
    Range(usize, usize),
    /// Specific pages (1-indexed).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Resolve the selection against a document of `total_pages` pages.
    ///
    /// Returns sorted, deduplicated, 1-indexed page numbers. A page beyond
    /// the document is an error rather than being silently dropped: asking
    /// for it is almost always a typo, and dropping it would also change
    /// which pages count as adjacent during stitching.
    pub fn resolve(&self, total_pages: usize) -> Result<Vec<usize>, Pdf2ParaError> {
        let check = |p: usize| {
            if p >= 1 && p <= total_pages {
                Ok(p)
            } else {
                Err(Pdf2ParaError::PageOutOfRange {
                    page: p,
                    total: total_pages,
                })
            }
        };

        let mut pages: Vec<usize> = match self {
            PageSelection::All => (1..=total_pages).collect(),
            PageSelection::Single(p) => vec![check(*p)?],
            PageSelection::Range(start, end) => {
                check(*start)?;
                check(*end)?;
                (*start..=*end).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .map(|&p| check(p))
                .collect::<Result<_, _>>()?,
        };
        pages.sort_unstable();
        pages.dedup();
        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = ExtractionConfig::default();
        assert_eq!(c.dpi, 144);
        assert_eq!(c.temperature, 0.5);
        assert_eq!(c.max_tokens, 10_000);
        assert_eq!(c.oracle_max_tokens, 10);
        assert_eq!(c.throttle_ms, 2000);
        assert_eq!(c.max_retries, 0);
        assert_eq!(c.min_paragraph_len, 30);
        assert_eq!(c.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert!(c.stitch.cross_page && c.stitch.colon_lists);
    }

    #[test]
    fn builder_clamps_dpi_and_temperature() {
        let c = ExtractionConfig::builder()
            .dpi(1000)
            .temperature(5.0)
            .oracle_temperature(-1.0)
            .build()
            .unwrap();
        assert_eq!(c.dpi, 400);
        assert_eq!(c.temperature, 2.0);
        assert_eq!(c.oracle_temperature, 0.0);
    }

    #[test]
    fn builder_rejects_zero_budget() {
        let err = ExtractionConfig::builder().oracle_max_tokens(0).build();
        assert!(matches!(err, Err(Pdf2ParaError::InvalidConfig(_))));
    }

    #[test]
    fn builder_rejects_empty_output_dir() {
        let err = ExtractionConfig::builder().output_dir("").build();
        assert!(matches!(err, Err(Pdf2ParaError::InvalidConfig(_))));
    }

    #[test]
    fn selection_all() {
        assert_eq!(PageSelection::All.resolve(3).unwrap(), vec![1, 2, 3]);
        assert!(PageSelection::All.resolve(0).unwrap().is_empty());
    }

    #[test]
    fn selection_set_sorted_and_deduped() {
        let pages = PageSelection::Set(vec![4, 1, 4, 2]).resolve(5).unwrap();
        assert_eq!(pages, vec![1, 2, 4]);
    }

    #[test]
    fn selection_out_of_range_is_an_error() {
        let err = PageSelection::Single(9).resolve(4).unwrap_err();
        assert!(matches!(
            err,
            Pdf2ParaError::PageOutOfRange { page: 9, total: 4 }
        ));
        assert!(PageSelection::Range(3, 10).resolve(4).is_err());
        assert!(PageSelection::Single(0).resolve(4).is_err());
    }

    #[test]
    fn stitch_options_disabled() {
        assert!(!StitchOptions::disabled().is_enabled());
        assert!(StitchOptions::default().is_enabled());
    }
}
