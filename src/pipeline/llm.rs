//! Model calls: page extraction and the shared call policy.
//!
//! Every request in this crate, whether it extracts a page or asks a
//! continuity question, goes through [`chat`]. It enforces the three rules
//! the external APIs impose on us:
//!
//! - a per-call timeout, so a hung request surfaces as an error;
//! - a fixed throttle *after* every call, successful or not, to stay under
//!   free-tier rate limits;
//! - optional retries with exponential backoff (`retry_backoff_ms * 2^n`).
//!   Off by default: a failure aborts the run.

use crate::config::ExtractionConfig;
use crate::error::Pdf2ParaError;
use crate::prompts::EXTRACTION_SYSTEM_PROMPT;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

/// Timing rules applied to every model call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallPolicy {
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub api_timeout_secs: u64,
    pub throttle_ms: u64,
}

impl CallPolicy {
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            retry_backoff_ms: config.retry_backoff_ms,
            api_timeout_secs: config.api_timeout_secs,
            throttle_ms: config.throttle_ms,
        }
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(factor))
    }
}

/// What the model gets to see of a page.
#[derive(Debug, Clone)]
pub enum PageContent {
    /// Rasterised page as a base64 PNG.
    Image(ImageData),
    /// The page's extracted text layer.
    Text(String),
}

/// Send `messages` to the provider under `policy` and return the reply text.
///
/// `context` labels log lines and errors ("page 4", "continuity 3→4").
pub async fn chat(
    provider: &Arc<dyn LLMProvider>,
    messages: Vec<ChatMessage>,
    options: &CompletionOptions,
    policy: &CallPolicy,
    context: &str,
) -> Result<String, Pdf2ParaError> {
    let mut last_err: Option<Pdf2ParaError> = None;

    for attempt in 0..=policy.max_retries {
        if attempt > 0 {
            let backoff = policy.backoff(attempt);
            warn!(
                "{}: retry {}/{} after {}ms",
                context,
                attempt,
                policy.max_retries,
                backoff.as_millis()
            );
            sleep(backoff).await;
        }

        let start = Instant::now();
        let outcome = timeout(
            Duration::from_secs(policy.api_timeout_secs),
            provider.chat(&messages, Some(options)),
        )
        .await;
        throttle(policy).await;

        match outcome {
            Ok(Ok(response)) => {
                debug!(
                    "{}: {} input tokens, {} output tokens, {:?}",
                    context,
                    response.prompt_tokens,
                    response.completion_tokens,
                    start.elapsed()
                );
                return Ok(response.content);
            }
            Ok(Err(e)) => {
                warn!("{}: attempt {} failed: {}", context, attempt + 1, e);
                last_err = Some(Pdf2ParaError::LlmApiError {
                    context: context.to_string(),
                    message: e.to_string(),
                });
            }
            Err(_) => {
                warn!(
                    "{}: attempt {} timed out after {}s",
                    context,
                    attempt + 1,
                    policy.api_timeout_secs
                );
                last_err = Some(Pdf2ParaError::ApiTimeout {
                    context: context.to_string(),
                    secs: policy.api_timeout_secs,
                });
            }
        }
    }

    Err(last_err.unwrap_or_else(|| Pdf2ParaError::Internal(format!("{context}: no attempt made"))))
}

async fn throttle(policy: &CallPolicy) {
    if policy.throttle_ms > 0 {
        sleep(Duration::from_millis(policy.throttle_ms)).await;
    }
}

/// Ask the model for the explanatory paragraphs of one page.
///
/// Returns the raw reply, markers included; splitting happens in
/// [`crate::pipeline::segment`].
pub async fn extract_page(
    provider: &Arc<dyn LLMProvider>,
    page_num: usize,
    content: PageContent,
    config: &ExtractionConfig,
) -> Result<String, Pdf2ParaError> {
    let system_prompt = config
        .system_prompt
        .as_deref()
        .unwrap_or(EXTRACTION_SYSTEM_PROMPT);

    let user = match content {
        PageContent::Image(image) => ChatMessage::user_with_images("", vec![image]),
        PageContent::Text(text) => ChatMessage::user(text),
    };
    let messages = vec![ChatMessage::system(system_prompt), user];

    chat(
        provider,
        messages,
        &extraction_options(config),
        &CallPolicy::from_config(config),
        &format!("page {page_num}"),
    )
    .await
}

/// Generation parameters for page extraction.
fn extraction_options(config: &ExtractionConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

/// Generation parameters for continuity checks.
pub fn oracle_options(config: &ExtractionConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.oracle_temperature),
        max_tokens: Some(config.oracle_max_tokens),
        ..Default::default()
    }
}
