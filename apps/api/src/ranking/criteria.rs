//! Criteria sets: the ordered, immutable list of criteria a ranking run scores against.
//!
//! Two provenances: the built-in keyword table (lexical) and criteria derived from a
//! job description by the judgment service (judged). A set is built once per run and
//! shared read-only across every candidate.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::llm_client::{strip_code_fences, JudgmentCapability, LlmError};
use crate::ranking::prompts::criteria_extraction_prompt;

/// Built-in job keywords and their weights. Sum = 145.
const FIXED_TABLE: &[(&str, u32)] = &[
    ("Python", 10),
    ("Machine Learning", 15),
    ("AI", 20),
    ("FastAPI", 10),
    ("TensorFlow", 15),
    ("PyTorch", 15),
    ("NLP", 12),
    ("Data Science", 18),
    ("Deep Learning", 20),
    ("Docker", 10),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Lexical,
    Judged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriteriaSource {
    FixedTable,
    JobDescription,
    Supplied,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionDefinition {
    pub id: String,
    pub label: String,
    /// Contribution on a lexical match. Ignored for judged criteria.
    pub weight: u32,
    pub strategy: Strategy,
}

#[derive(Debug, Error)]
pub enum CriteriaExtractionError {
    #[error("judgment service unavailable: {0}")]
    Unavailable(#[from] LlmError),

    #[error("judgment service timed out after {0:?}")]
    Timeout(Duration),

    #[error("no usable criteria in the judgment service response")]
    Empty,
}

#[derive(Debug, Clone, Serialize)]
pub struct CriteriaSet {
    source: CriteriaSource,
    criteria: Vec<CriterionDefinition>,
}

impl CriteriaSet {
    /// The built-in keyword table, scored lexically.
    pub fn from_fixed_table() -> Self {
        Self {
            source: CriteriaSource::FixedTable,
            criteria: FIXED_TABLE
                .iter()
                .map(|&(label, weight)| CriterionDefinition {
                    id: label.to_string(),
                    label: label.to_string(),
                    weight,
                    strategy: Strategy::Lexical,
                })
                .collect(),
        }
    }

    /// Builds a set from free-form labels (one criterion per label).
    /// Labels are normalised; blanks and case-insensitive duplicates are dropped.
    pub fn from_labels<I, S>(labels: I, strategy: Strategy, source: CriteriaSource) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let criteria = labels
            .into_iter()
            .filter_map(|raw| normalize_label(raw.as_ref()))
            .filter(|label| seen.insert(label.to_lowercase()))
            .map(|label| CriterionDefinition {
                id: label.clone(),
                label,
                weight: 0,
                strategy,
            })
            .collect();
        Self { source, criteria }
    }

    /// Asks the judgment service to derive criteria from a job description.
    /// Every derived criterion is judged.
    pub async fn from_job_description(
        text: &str,
        judge: &dyn JudgmentCapability,
        timeout: Duration,
    ) -> Result<Self, CriteriaExtractionError> {
        let prompt = criteria_extraction_prompt(text);
        let reply = tokio::time::timeout(timeout, judge.complete(&prompt))
            .await
            .map_err(|_| CriteriaExtractionError::Timeout(timeout))??;

        let set = Self::from_labels(
            strip_code_fences(&reply).lines(),
            Strategy::Judged,
            CriteriaSource::JobDescription,
        );
        if set.is_empty() {
            return Err(CriteriaExtractionError::Empty);
        }

        info!("Derived {} criteria from job description", set.len());
        Ok(set)
    }

    pub fn source(&self) -> CriteriaSource {
        self.source
    }

    pub fn iter(&self) -> impl Iterator<Item = &CriterionDefinition> {
        self.criteria.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.criteria.iter().map(|c| c.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }
}

/// Turns one line of judgment output into a criterion label.
///
/// Strips list markers ("-", "*", "•", "1.", "2)"), markdown emphasis and collapses
/// whitespace. Returns `None` when nothing is left.
pub fn normalize_label(line: &str) -> Option<String> {
    let mut rest = line.trim();

    if let Some(stripped) = rest.strip_prefix(['-', '*', '•']) {
        rest = stripped;
    } else {
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits > 0 {
            if let Some(stripped) = rest[digits..].strip_prefix(['.', ')']) {
                rest = stripped;
            }
        }
    }

    let rest = rest.trim().trim_matches(|c| c == '*' || c == '_').trim();
    let label = rest.split_whitespace().collect::<Vec<_>>().join(" ");

    (!label.is_empty()).then_some(label)
}
