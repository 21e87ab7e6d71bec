use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::JudgmentCapability;
use crate::ranking::batch::{BatchRanker, CancellationFlag};
use crate::ranking::candidate::CandidateScorer;
use crate::ranking::criteria::CriteriaSet;
use crate::ranking::judgment::JudgmentScorer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Owns the judgment semaphore, so the concurrency bound is process-wide.
    pub ranker: BatchRanker,
    /// Built-in keyword table used when a request supplies no criteria.
    pub default_criteria: Arc<CriteriaSet>,
    /// Flipped on shutdown; running batches stop between documents.
    pub shutdown: CancellationFlag,
}

impl AppState {
    pub fn new(config: Config, judge: Arc<dyn JudgmentCapability>, shutdown: CancellationFlag) -> Self {
        let judgment = JudgmentScorer::new(
            judge,
            config.judgment_max_concurrency,
            config.judgment_timeout,
        );
        let ranker = BatchRanker::new(CandidateScorer::new(judgment), config.document_max_in_flight);

        Self {
            config,
            ranker,
            default_criteria: Arc::new(CriteriaSet::from_fixed_table()),
            shutdown,
        }
    }
}
