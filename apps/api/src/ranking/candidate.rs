//! Candidate scoring: one document's text in, one `ScoreRecord` out.
//!
//! Flow: extract display name → score every criterion with its strategy → sum.
//! A failing criterion contributes 0 and a warning; the remaining criteria still run.

use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::ranking::criteria::{CriteriaSet, CriterionDefinition, Strategy};
use crate::ranking::judgment::JudgmentScorer;
use crate::ranking::lexical::LexicalScorer;

/// Sentinel display name when the first line does not look like a name.
pub const UNKNOWN_CANDIDATE: &str = "Unknown";

/// First lines with this many tokens or more are treated as headers, not names.
const MAX_NAME_TOKENS: usize = 5;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Candidate {
    pub display_name: String,
    pub raw_text: String,
}

impl Candidate {
    pub fn from_text(raw_text: String) -> Self {
        Self {
            display_name: extract_display_name(&raw_text),
            raw_text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringWarning {
    pub criterion_id: String,
    pub message: String,
}

impl ScoringWarning {
    pub fn new(criterion_id: &str, message: impl Into<String>) -> Self {
        Self {
            criterion_id: criterion_id.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionScore {
    pub criterion_id: String,
    pub score: u32,
}

/// One candidate's complete result. `per_criterion` follows criteria-set order and
/// covers every criterion exactly once; `total_score` is always their sum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub candidate_name: String,
    pub per_criterion: Vec<CriterionScore>,
    pub total_score: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ScoringWarning>,
    /// Set when the whole document failed; every score is then 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl ScoreRecord {
    fn from_scores(
        candidate_name: String,
        criteria: &CriteriaSet,
        scores: Vec<u32>,
        warnings: Vec<ScoringWarning>,
    ) -> Self {
        let per_criterion: Vec<CriterionScore> = criteria
            .ids()
            .zip(scores)
            .map(|(id, score)| CriterionScore {
                criterion_id: id.to_string(),
                score,
            })
            .collect();
        let total_score = per_criterion.iter().map(|c| c.score).sum();

        Self {
            candidate_name,
            per_criterion,
            total_score,
            warnings,
            failure: None,
        }
    }

    /// An all-zero row carrying a failure marker.
    pub fn failed(candidate_name: String, criteria: &CriteriaSet, reason: impl Into<String>) -> Self {
        let mut record = Self::from_scores(candidate_name, criteria, vec![0; criteria.len()], vec![]);
        record.failure = Some(reason.into());
        record
    }

    pub fn score_for(&self, criterion_id: &str) -> Option<u32> {
        self.per_criterion
            .iter()
            .find(|c| c.criterion_id == criterion_id)
            .map(|c| c.score)
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Name heuristic
// ────────────────────────────────────────────────────────────────────────────

/// First non-empty line if it has fewer than five whitespace-separated tokens,
/// otherwise `"Unknown"`. Long header lines are knowingly misattributed.
pub fn extract_display_name(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .filter(|line| line.split_whitespace().count() < MAX_NAME_TOKENS)
        .unwrap_or(UNKNOWN_CANDIDATE)
        .to_string()
}

// ────────────────────────────────────────────────────────────────────────────
// Scorer
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct CandidateScorer {
    lexical: LexicalScorer,
    judgment: JudgmentScorer,
}

impl CandidateScorer {
    pub fn new(judgment: JudgmentScorer) -> Self {
        Self {
            lexical: LexicalScorer,
            judgment,
        }
    }

    pub fn lexical(&self) -> &LexicalScorer {
        &self.lexical
    }

    pub fn judgment(&self) -> &JudgmentScorer {
        &self.judgment
    }

    /// Scores one candidate against every criterion in `criteria`.
    ///
    /// Judged criteria for the same candidate are issued together; the shared
    /// semaphore inside `JudgmentScorer` bounds how many actually run.
    pub async fn score_candidate(&self, raw_text: &str, criteria: &CriteriaSet) -> ScoreRecord {
        let candidate_name = extract_display_name(raw_text);

        let outcomes = join_all(
            criteria
                .iter()
                .map(|criterion| self.score_criterion(raw_text, criterion)),
        )
        .await;

        let mut scores = Vec::with_capacity(outcomes.len());
        let mut warnings = Vec::new();
        for (score, warning) in outcomes {
            scores.push(score);
            warnings.extend(warning);
        }

        ScoreRecord::from_scores(candidate_name, criteria, scores, warnings)
    }

    async fn score_criterion(
        &self,
        text: &str,
        criterion: &CriterionDefinition,
    ) -> (u32, Option<ScoringWarning>) {
        match criterion.strategy {
            Strategy::Lexical => (self.lexical.score(text, criterion), None),
            Strategy::Judged => self.judgment.score(text, criterion).await,
        }
    }
}
