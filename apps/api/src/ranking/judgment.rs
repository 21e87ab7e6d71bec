//! Judged scoring: delegates one rubric rating per (candidate, criterion) to the
//! judgment service.
//!
//! Every call waits for a permit from a shared semaphore and is bounded by a timeout.
//! Replies must be a bare integer in 0..=5; anything else, and any service failure,
//! degrades to a 0 score plus a warning. A judgment failure never aborts a batch.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::warn;

use crate::llm_client::{JudgmentCapability, LlmError};
use crate::ranking::candidate::ScoringWarning;
use crate::ranking::criteria::CriterionDefinition;
use crate::ranking::prompts::rubric_prompt;

pub const MAX_RATING: u32 = 5;

#[derive(Debug, Error)]
pub enum JudgmentScoringError {
    #[error("judgment service unavailable: {0}")]
    Unavailable(#[from] LlmError),

    #[error("judgment service timed out after {0:?}")]
    Timeout(Duration),

    #[error("judgment reply is not a non-negative integer: {0:?}")]
    NonNumeric(String),

    #[error("judgment rating {0} is outside 0..=5")]
    OutOfRange(u64),

    #[error("judgment call pool is closed")]
    PoolClosed,
}

#[derive(Clone)]
pub struct JudgmentScorer {
    judge: Arc<dyn JudgmentCapability>,
    permits: Arc<Semaphore>,
    timeout: Duration,
}

impl JudgmentScorer {
    /// `max_concurrency` bounds in-flight judgment calls across every clone of this scorer.
    pub fn new(judge: Arc<dyn JudgmentCapability>, max_concurrency: usize, timeout: Duration) -> Self {
        Self {
            judge,
            permits: Arc::new(Semaphore::new(max_concurrency.max(1))),
            timeout,
        }
    }

    pub fn judge(&self) -> &dyn JudgmentCapability {
        self.judge.as_ref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Rates `text` against `criterion`, propagating every failure.
    pub async fn try_score(
        &self,
        text: &str,
        criterion: &CriterionDefinition,
    ) -> Result<u32, JudgmentScoringError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| JudgmentScoringError::PoolClosed)?;

        let prompt = rubric_prompt(&criterion.label, text);
        let reply = tokio::time::timeout(self.timeout, self.judge.complete(&prompt))
            .await
            .map_err(|_| JudgmentScoringError::Timeout(self.timeout))??;

        parse_rating(&reply)
    }

    /// Rates `text` against `criterion`; failures become a 0 score and a warning.
    pub async fn score(
        &self,
        text: &str,
        criterion: &CriterionDefinition,
    ) -> (u32, Option<ScoringWarning>) {
        match self.try_score(text, criterion).await {
            Ok(rating) => (rating, None),
            Err(e) => {
                warn!("Judged scoring failed for criterion '{}': {e}", criterion.id);
                (0, Some(ScoringWarning::new(&criterion.id, e.to_string())))
            }
        }
    }
}

/// Parses a judgment reply. Only a bare ASCII integer in 0..=5 (surrounding
/// whitespace allowed) is accepted.
pub fn parse_rating(reply: &str) -> Result<u32, JudgmentScoringError> {
    let trimmed = reply.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(JudgmentScoringError::NonNumeric(trimmed.to_string()));
    }

    // All digits, so the only parse failure left is overflow: out of range either way.
    let value: u64 = trimmed.parse().unwrap_or(u64::MAX);
    match u32::try_from(value) {
        Ok(rating) if rating <= MAX_RATING => Ok(rating),
        _ => Err(JudgmentScoringError::OutOfRange(value)),
    }
}
