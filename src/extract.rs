//! Extraction entry points.
//!
//! [`extract`] drives a whole run: resolve the PDF, walk the selected pages
//! one at a time through the model, persist each page's paragraphs, then
//! stitch. [`stitch_directory`] reruns only the stitching passes on an
//! existing output tree.

use crate::config::{ExtractionConfig, InputMode};
use crate::error::Pdf2ParaError;
use crate::oracle::{ContinuityOracle, LlmContinuityOracle};
use crate::output::{DocumentMetadata, ExtractionOutput, ExtractionStats, PageExtraction};
use crate::pipeline::llm::{self, PageContent};
use crate::pipeline::{encode, input, postprocess, render, segment};
use crate::stitch::{stitch_pages, StitchReport};
use crate::store::ParagraphStore;
use async_trait::async_trait;
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

const DEFAULT_MODEL: &str = "gpt-4.1-nano";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-lite";

/// Extract the explanatory paragraphs of a PDF file or URL into
/// `config.output_dir`, then stitch them.
///
/// Pages are processed strictly in order and the first failing page aborts
/// the run; pages already written stay on disk.
pub async fn extract(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, Pdf2ParaError> {
    let run_start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting extraction: {}", input_str);

    let source = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let pdf_path = source.path().to_path_buf();

    let provider = resolve_provider(config)?;

    let metadata = render::extract_metadata(&pdf_path, config.password.as_deref()).await?;
    let selected = config.pages.resolve(metadata.page_count)?;
    info!(
        "PDF has {} pages, {} selected",
        metadata.page_count,
        selected.len()
    );

    let store = ParagraphStore::new(&config.output_dir);
    let callback = config.progress_callback.clone();
    if let Some(ref cb) = callback {
        cb.on_extraction_start(selected.len());
    }

    let extraction_start = Instant::now();
    let mut pages = Vec::with_capacity(selected.len());
    for &page_num in &selected {
        if let Some(ref cb) = callback {
            cb.on_page_start(page_num, selected.len());
        }
        let page = extract_one(&provider, &store, &pdf_path, page_num, config).await?;
        if let Some(ref cb) = callback {
            cb.on_page_complete(page_num, selected.len(), page.kept_paragraphs);
        }
        pages.push(page);
    }
    let extraction_duration_ms = extraction_start.elapsed().as_millis() as u64;

    let stitch_start = Instant::now();
    let stitch = if config.stitch.is_enabled() {
        let oracle = LlmContinuityOracle::new(Arc::clone(&provider), config);
        Some(stitch_pages(&store, &selected, &oracle, config.stitch, callback.clone()).await?)
    } else {
        debug!("Stitching disabled");
        None
    };
    let stitch_duration_ms = stitch_start.elapsed().as_millis() as u64;

    let mut stored_paragraphs = 0;
    for &page_num in &selected {
        stored_paragraphs += store.count(page_num)?;
    }

    if let Some(ref cb) = callback {
        cb.on_extraction_complete(selected.len(), stored_paragraphs);
    }

    let stats = ExtractionStats {
        total_pages: metadata.page_count,
        processed_pages: pages.len(),
        stored_paragraphs,
        filtered_paragraphs: pages.iter().map(|p| p.filtered.len()).sum(),
        extraction_duration_ms,
        stitch_duration_ms,
        total_duration_ms: run_start.elapsed().as_millis() as u64,
    };
    info!(
        "Extraction complete: {} pages, {} paragraphs stored, {} filtered, {}ms",
        stats.processed_pages, stats.stored_paragraphs, stats.filtered_paragraphs, stats.total_duration_ms
    );

    Ok(ExtractionOutput {
        output_dir: config.output_dir.clone(),
        metadata,
        pages,
        stitch,
        stats,
    })
}

/// Blocking wrapper around [`extract`] for non-async callers.
pub fn extract_sync(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, Pdf2ParaError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2ParaError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract(input_str, config))
}

/// Read PDF metadata only. Needs no provider or API key.
pub async fn inspect(
    input_str: impl AsRef<str>,
    password: Option<&str>,
) -> Result<DocumentMetadata, Pdf2ParaError> {
    let source = input::resolve_input(input_str.as_ref(), 120).await?;
    render::extract_metadata(source.path(), password).await
}

/// Run the stitching passes over an existing paragraph tree.
///
/// `pages` defaults to every numeric page directory under `dir`, ascending.
/// The model is only needed for the cross-page pass.
pub async fn stitch_directory(
    dir: impl AsRef<Path>,
    pages: Option<Vec<usize>>,
    config: &ExtractionConfig,
) -> Result<StitchReport, Pdf2ParaError> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(Pdf2ParaError::InvalidInput {
            input: dir.display().to_string(),
        });
    }

    let store = ParagraphStore::new(dir);
    let pages = match pages {
        Some(pages) => pages,
        None => store.pages()?,
    };
    if pages.is_empty() {
        warn!("No page directories under {}", dir.display());
        return Ok(StitchReport::default());
    }

    let oracle: Box<dyn ContinuityOracle> = if config.stitch.cross_page {
        Box::new(LlmContinuityOracle::new(resolve_provider(config)?, config))
    } else {
        Box::new(Unconsulted)
    };
    stitch_pages(
        &store,
        &pages,
        oracle.as_ref(),
        config.stitch,
        config.progress_callback.clone(),
    )
    .await
}

/// Stand-in when the cross-page pass is off and no provider is configured.
struct Unconsulted;

#[async_trait]
impl ContinuityOracle for Unconsulted {
    async fn judge(&self, _first: &str, _second: &str) -> Result<bool, Pdf2ParaError> {
        Err(Pdf2ParaError::Internal(
            "continuity oracle consulted with cross-page stitching disabled".into(),
        ))
    }
}

/// Extract, filter and persist a single page.
async fn extract_one(
    provider: &Arc<dyn LLMProvider>,
    store: &ParagraphStore,
    pdf_path: &Path,
    page_num: usize,
    config: &ExtractionConfig,
) -> Result<PageExtraction, Pdf2ParaError> {
    let start = Instant::now();

    let content = match config.input_mode {
        InputMode::Image => {
            let image = render::render_page(pdf_path, page_num, config).await?;
            PageContent::Image(encode::encode_page(page_num, &image)?)
        }
        InputMode::Text => {
            PageContent::Text(render::page_text(pdf_path, page_num, config.password.as_deref()).await?)
        }
    };

    let reply = llm::extract_page(provider, page_num, content, config).await?;
    let cleaned = postprocess::clean_reply(&reply);
    let paragraphs = segment::split_paragraphs(&cleaned);
    let raw_paragraphs = paragraphs.len();
    if raw_paragraphs == 0 {
        info!("Page {}: no qualifying content", page_num);
    }

    let (kept, filtered) = segment::filter_short(paragraphs, config.min_paragraph_len);
    store.save_page(page_num, &kept)?;

    let duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "Page {}: {} paragraphs kept, {} filtered, {}ms",
        page_num,
        kept.len(),
        filtered.len(),
        duration_ms
    );

    Ok(PageExtraction {
        page_num,
        raw_paragraphs,
        kept_paragraphs: kept.len(),
        filtered,
        duration_ms,
    })
}

fn default_model(provider_name: &str) -> &'static str {
    if provider_name.eq_ignore_ascii_case("gemini") {
        DEFAULT_GEMINI_MODEL
    } else {
        DEFAULT_MODEL
    }
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, Pdf2ParaError> {
    debug!("Creating provider {} with model {}", provider_name, model);
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        Pdf2ParaError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Pick the provider, most specific source first:
///
/// 1. `config.provider`, used as-is;
/// 2. `config.provider_name` with `config.model` or the provider's default;
/// 3. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL` when both are set;
/// 4. OpenAI when `OPENAI_API_KEY` is set;
/// 5. whatever `ProviderFactory::from_env` detects.
fn resolve_provider(config: &ExtractionConfig) -> Result<Arc<dyn LLMProvider>, Pdf2ParaError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or_else(|| default_model(name));
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if std::env::var("OPENAI_API_KEY").is_ok_and(|key| !key.is_empty()) {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider("openai", model);
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| Pdf2ParaError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be detected from the environment.\n\
                Set OPENAI_API_KEY or GEMINI_API_KEY, or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StitchOptions;

    #[test]
    fn gemini_gets_its_own_default_model() {
        assert_eq!(default_model("gemini"), "gemini-2.0-flash-lite");
        assert_eq!(default_model("Gemini"), "gemini-2.0-flash-lite");
        assert_eq!(default_model("openai"), "gpt-4.1-nano");
    }

    #[tokio::test]
    async fn stitch_directory_rejects_missing_dir() {
        let err = stitch_directory("/no/such/output", None, &ExtractionConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Pdf2ParaError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn stitch_directory_with_no_pages_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let report = stitch_directory(dir.path(), None, &ExtractionConfig::default())
            .await
            .unwrap();
        assert_eq!(report, StitchReport::default());
    }

    #[tokio::test]
    async fn colon_pass_alone_needs_no_provider() {
        let dir = tempfile::tempdir().unwrap();
        let store = ParagraphStore::new(dir.path());
        store
            .save_page(1, &["The tool supports:".to_string(), "• fast".to_string()])
            .unwrap();

        let config = ExtractionConfig::builder()
            .stitch(StitchOptions {
                cross_page: false,
                colon_lists: true,
            })
            .build()
            .unwrap();
        let report = stitch_directory(dir.path(), None, &config).await.unwrap();
        assert_eq!(report.lead_in_merges, 1);
        assert_eq!(store.load_page(1).unwrap(), vec!["The tool supports:\n• fast"]);
    }

    #[tokio::test]
    async fn extract_reports_missing_input_before_touching_provider() {
        let config = ExtractionConfig::default();
        let err = extract("/no/such/file.pdf", &config).await.unwrap_err();
        assert!(matches!(err, Pdf2ParaError::FileNotFound { .. }));
    }
}
