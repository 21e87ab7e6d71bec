//! Batch ranking: scores many documents against one criteria set.
//!
//! Output row order always equals input order: documents run with bounded
//! concurrency but results are collected positionally, never by arrival.
//! A document that fails extraction or whose scoring panics still yields a row
//! (all zeros plus a failure marker). Cancellation is observed between documents;
//! in-flight documents are dropped and no partial report is returned.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::{future, FutureExt, StreamExt};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::extraction::ExtractionError;
use crate::ranking::candidate::{CandidateScorer, ScoreRecord};
use crate::ranking::criteria::CriteriaSet;

/// One batch input: the document's source name plus its extracted text, or the
/// reason extraction failed.
#[derive(Debug)]
pub struct RankInput {
    pub source_name: String,
    pub text: Result<String, ExtractionError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub report_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub criteria: CriteriaSet,
    pub records: Vec<ScoreRecord>,
}

impl BatchReport {
    /// Same report with records stably sorted by total score, highest first.
    /// Presentation only: ranking itself never reorders.
    pub fn into_ranked(mut self) -> Self {
        self.records.sort_by(|a, b| b.total_score.cmp(&a.total_score));
        self
    }

    pub fn failed_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_failed()).count()
    }
}

#[derive(Debug, Error)]
#[error("batch cancelled after {completed} of {total} documents")]
pub struct BatchCancelled {
    pub completed: usize,
    pub total: usize,
}

/// Shared cancel switch, checked between documents.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
pub struct BatchRanker {
    scorer: CandidateScorer,
    max_in_flight: usize,
}

impl BatchRanker {
    pub fn new(scorer: CandidateScorer, max_in_flight: usize) -> Self {
        Self {
            scorer,
            max_in_flight: max_in_flight.max(1),
        }
    }

    pub fn scorer(&self) -> &CandidateScorer {
        &self.scorer
    }

    pub async fn rank_batch(
        &self,
        documents: Vec<RankInput>,
        criteria: &CriteriaSet,
        cancel: &CancellationFlag,
    ) -> Result<BatchReport, BatchCancelled> {
        let total = documents.len();
        info!(
            "Ranking {} documents against {} criteria ({:?})",
            total,
            criteria.len(),
            criteria.source()
        );

        let mut scored = futures::stream::iter(documents)
            .take_while(|_| future::ready(!cancel.is_cancelled()))
            .map(|document| self.score_document(document, criteria))
            .buffered(self.max_in_flight);

        let mut records = Vec::with_capacity(total);
        while let Some(record) = scored.next().await {
            if cancel.is_cancelled() {
                break;
            }
            records.push(record);
        }

        if records.len() < total {
            warn!("Batch cancelled after {} of {} documents", records.len(), total);
            return Err(BatchCancelled {
                completed: records.len(),
                total,
            });
        }

        let report = BatchReport {
            report_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            criteria: criteria.clone(),
            records,
        };
        info!(
            "Batch {} complete: {} rows, {} failed",
            report.report_id,
            report.records.len(),
            report.failed_count()
        );
        Ok(report)
    }

    async fn score_document(&self, document: RankInput, criteria: &CriteriaSet) -> ScoreRecord {
        let RankInput { source_name, text } = document;

        let text = match text {
            Ok(text) => text,
            Err(e) => {
                warn!("Document '{source_name}' could not be extracted: {e}");
                return ScoreRecord::failed(source_name, criteria, e.to_string());
            }
        };

        match AssertUnwindSafe(self.scorer.score_candidate(&text, criteria))
            .catch_unwind()
            .await
        {
            Ok(record) => record,
            Err(panic) => {
                let reason = format!("scoring aborted: {}", panic_message(panic.as_ref()));
                warn!("Document '{source_name}': {reason}");
                ScoreRecord::failed(source_name, criteria, reason)
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::{JudgmentCapability, LlmError};
    use crate::ranking::criteria::{CriteriaSource, Strategy};
    use crate::ranking::judgment::JudgmentScorer;
    use async_trait::async_trait;
    use std::time::Duration;

    /// Answers later documents faster so completion order differs from input order.
    struct ReverseLatencyJudge;

    #[async_trait]
    impl JudgmentCapability for ReverseLatencyJudge {
        async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
            let rating: u64 = prompt
                .lines()
                .rev()
                .find_map(|line| line.strip_prefix("rating "))
                .and_then(|r| r.trim().parse().ok())
                .unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(100 - rating * 10)).await;
            Ok(rating.to_string())
        }
    }

    struct PanickingJudge;

    #[async_trait]
    impl JudgmentCapability for PanickingJudge {
        async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
            if prompt.contains("explode") {
                panic!("judge crashed");
            }
            Ok("1".to_string())
        }
    }

    /// Cancels the shared flag on its first call.
    struct CancellingJudge(CancellationFlag);

    #[async_trait]
    impl JudgmentCapability for CancellingJudge {
        async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
            self.0.cancel();
            Ok("1".to_string())
        }
    }

    fn ranker(judge: Arc<dyn JudgmentCapability>, max_in_flight: usize) -> BatchRanker {
        let judgment = JudgmentScorer::new(judge, 8, Duration::from_secs(5));
        BatchRanker::new(CandidateScorer::new(judgment), max_in_flight)
    }

    fn doc(source_name: impl Into<String>, text: impl Into<String>) -> RankInput {
        RankInput {
            source_name: source_name.into(),
            text: Ok(text.into()),
        }
    }

    fn judged(labels: &[&str]) -> CriteriaSet {
        CriteriaSet::from_labels(labels, Strategy::Judged, CriteriaSource::Supplied)
    }

    #[tokio::test]
    async fn test_failed_extraction_still_produces_row() {
        let criteria = CriteriaSet::from_fixed_table();
        let documents = vec![
            doc("a.pdf", "Alice Smith\nPython and Docker"),
            RankInput {
                source_name: "b.docx".to_string(),
                text: Err(ExtractionError::Empty),
            },
            doc("c.pdf", "Carol Jones\nDeep Learning, NLP"),
        ];

        let report = ranker(Arc::new(PanickingJudge), 2)
            .rank_batch(documents, &criteria, &CancellationFlag::default())
            .await
            .unwrap();

        assert_eq!(report.records.len(), 3);
        assert_eq!(report.records[0].candidate_name, "Alice Smith");
        assert_eq!(report.records[0].total_score, 20);

        let failed = &report.records[1];
        assert_eq!(failed.candidate_name, "b.docx");
        assert!(failed.is_failed());
        assert_eq!(failed.total_score, 0);
        assert_eq!(failed.per_criterion.len(), criteria.len());

        assert_eq!(report.records[2].candidate_name, "Carol Jones");
        assert_eq!(report.records[2].total_score, 32);
        assert_eq!(report.failed_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rows_follow_input_order_not_completion_order() {
        let criteria = judged(&["Anything"]);
        let documents: Vec<RankInput> = (0..6)
            .map(|i| doc(format!("{i}.pdf"), format!("Candidate {i}\nrating {i}")))
            .collect();

        let report = ranker(Arc::new(ReverseLatencyJudge), 6)
            .rank_batch(documents, &criteria, &CancellationFlag::default())
            .await
            .unwrap();

        let totals: Vec<u32> = report.records.iter().map(|r| r.total_score).collect();
        assert_eq!(totals, vec![0, 1, 2, 3, 4, 5]);
        let names: Vec<&str> = report.records.iter().map(|r| r.candidate_name.as_str()).collect();
        assert_eq!(names[0], "Candidate 0");
        assert_eq!(names[5], "Candidate 5");
    }

    #[tokio::test]
    async fn test_panicking_document_is_isolated() {
        let criteria = judged(&["Reliability"]);
        let documents = vec![
            doc("ok.pdf", "Ann Lee\ncalm"),
            doc("bad.pdf", "Bob Ray\nexplode"),
            doc("ok2.pdf", "Cy Dee\ncalm"),
        ];

        let report = ranker(Arc::new(PanickingJudge), 1)
            .rank_batch(documents, &criteria, &CancellationFlag::default())
            .await
            .unwrap();

        assert_eq!(report.records.len(), 3);
        assert_eq!(report.records[0].total_score, 1);
        assert_eq!(report.records[1].candidate_name, "bad.pdf");
        assert!(report.records[1]
            .failure
            .as_deref()
            .unwrap()
            .contains("judge crashed"));
        assert_eq!(report.records[2].total_score, 1);
    }

    #[tokio::test]
    async fn test_empty_batch_yields_empty_report() {
        let criteria = CriteriaSet::from_fixed_table();
        let report = ranker(Arc::new(PanickingJudge), 2)
            .rank_batch(vec![], &criteria, &CancellationFlag::default())
            .await
            .unwrap();
        assert!(report.records.is_empty());
        assert_eq!(report.criteria.len(), 10);
    }

    #[tokio::test]
    async fn test_cancel_before_start_returns_cancelled() {
        let cancel = CancellationFlag::default();
        cancel.cancel();
        let err = ranker(Arc::new(PanickingJudge), 2)
            .rank_batch(
                vec![doc("a.pdf", "Python")],
                &CriteriaSet::from_fixed_table(),
                &cancel,
            )
            .await
            .unwrap_err();
        assert_eq!(err.completed, 0);
        assert_eq!(err.total, 1);
    }

    #[tokio::test]
    async fn test_cancel_mid_batch_discards_partial_results() {
        let cancel = CancellationFlag::default();
        let documents = vec![
            doc("a.pdf", "Ann"),
            doc("b.pdf", "Ben"),
            doc("c.pdf", "Cat"),
        ];

        let err = ranker(Arc::new(CancellingJudge(cancel.clone())), 1)
            .rank_batch(documents, &judged(&["Focus"]), &cancel)
            .await
            .unwrap_err();

        assert_eq!(err.completed, 0);
        assert_eq!(err.total, 3);
    }

    #[test]
    fn test_into_ranked_sorts_stably_by_total() {
        let criteria = CriteriaSet::from_fixed_table();
        let mut a = ScoreRecord::failed("a".to_string(), &criteria, "x");
        a.total_score = 10;
        let mut b = ScoreRecord::failed("b".to_string(), &criteria, "x");
        b.total_score = 30;
        let mut c = ScoreRecord::failed("c".to_string(), &criteria, "x");
        c.total_score = 10;

        let report = BatchReport {
            report_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            criteria,
            records: vec![a, b, c],
        }
        .into_ranked();

        let names: Vec<&str> = report.records.iter().map(|r| r.candidate_name.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }
}
