//! Continuity oracle: does paragraph B continue paragraph A?
//!
//! The stitching passes treat the oracle as a black-box predicate behind the
//! [`ContinuityOracle`] trait, so tests can script verdicts and callers can
//! plug in their own judge (a cache, a local classifier, a human prompt).
//! [`LlmContinuityOracle`] is the production implementation.

use crate::config::ExtractionConfig;
use crate::error::Pdf2ParaError;
use crate::pipeline::llm::{self, CallPolicy};
use crate::prompts::{continuity_prompt, AFFIRMATIVE_TOKEN};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use tracing::debug;

/// Judges whether two paragraph texts form one logical paragraph.
#[async_trait]
pub trait ContinuityOracle: Send + Sync {
    /// True only if `first` is cut off and `second` is its direct
    /// continuation. Either text may be empty.
    async fn judge(&self, first: &str, second: &str) -> Result<bool, Pdf2ParaError>;
}

/// Interpret a model reply: affirmative iff the trimmed, lower-cased reply
/// contains the affirmative token.
pub fn parse_verdict(reply: &str) -> bool {
    reply.trim().to_lowercase().contains(AFFIRMATIVE_TOKEN)
}

/// Oracle backed by an LLM provider.
///
/// Every call is followed by the configured throttle delay; errors from the
/// provider propagate unchanged.
pub struct LlmContinuityOracle {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
    policy: CallPolicy,
}

impl LlmContinuityOracle {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &ExtractionConfig) -> Self {
        Self {
            provider,
            options: llm::oracle_options(config),
            policy: CallPolicy::from_config(config),
        }
    }
}

#[async_trait]
impl ContinuityOracle for LlmContinuityOracle {
    async fn judge(&self, first: &str, second: &str) -> Result<bool, Pdf2ParaError> {
        let messages = vec![ChatMessage::user(continuity_prompt(first, second))];
        let reply = llm::chat(
            &self.provider,
            messages,
            &self.options,
            &self.policy,
            "continuity check",
        )
        .await?;

        let verdict = parse_verdict(&reply);
        debug!("Continuity verdict {:?} → {}", reply.trim(), verdict);
        Ok(verdict)
    }
}
