//! Lexical scoring: deterministic, offline whole-word matching of criterion labels.
//!
//! A label matches only as a standalone token sequence: "AI" matches "AI-driven" but
//! not "maintain". Matching is case-insensitive and treats any run of whitespace as a
//! single space, so "Machine\nLearning" matches "Machine Learning". Binary per
//! criterion: a match contributes the full weight, no match contributes 0.

use crate::ranking::criteria::{CriteriaSet, CriterionDefinition};

#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalScorer;

impl LexicalScorer {
    pub fn score(&self, text: &str, criterion: &CriterionDefinition) -> u32 {
        if contains_phrase(&normalize(text), &criterion.label) {
            criterion.weight
        } else {
            0
        }
    }

    /// Labels of every criterion in `criteria` found in `text`, in set order.
    pub fn matched_labels<'a>(&self, text: &str, criteria: &'a CriteriaSet) -> Vec<&'a str> {
        let haystack = normalize(text);
        criteria
            .iter()
            .filter(|c| contains_phrase(&haystack, &c.label))
            .map(|c| c.label.as_str())
            .collect()
    }
}

/// Lowercases and collapses whitespace runs to single spaces.
fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// `haystack` must already be normalized.
///
/// Boundaries are only enforced on edges where the phrase itself starts or ends
/// with a word character, so labels such as "C++" or ".NET" still match.
fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    let needle = normalize(phrase);
    let Some(first) = needle.chars().next() else {
        return false;
    };
    let last = needle.chars().next_back().unwrap_or(first);
    let check_start = is_word_char(first);
    let check_end = is_word_char(last);

    haystack.match_indices(needle.as_str()).any(|(start, matched)| {
        let before_ok = !check_start
            || haystack[..start]
                .chars()
                .next_back()
                .map_or(true, |c| !is_word_char(c));
        let after_ok = !check_end
            || haystack[start + matched.len()..]
                .chars()
                .next()
                .map_or(true, |c| !is_word_char(c));
        before_ok && after_ok
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::criteria::Strategy;

    fn criterion(label: &str, weight: u32) -> CriterionDefinition {
        CriterionDefinition {
            id: label.to_string(),
            label: label.to_string(),
            weight,
            strategy: Strategy::Lexical,
        }
    }

    #[test]
    fn test_ai_does_not_match_inside_words() {
        let ai = criterion("AI", 20);
        assert_eq!(LexicalScorer.score("retain", &ai), 0);
        assert_eq!(LexicalScorer.score("I maintain legacy systems", &ai), 0);
    }

    #[test]
    fn test_ai_matches_hyphenated_compound() {
        assert_eq!(LexicalScorer.score("Built AI-driven tooling", &criterion("AI", 20)), 20);
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let ml = criterion("Machine Learning", 15);
        assert_eq!(LexicalScorer.score("MACHINE LEARNING lead", &ml), 15);
        assert_eq!(LexicalScorer.score("machine learning", &ml), 15);
    }

    #[test]
    fn test_phrase_spans_line_breaks() {
        let ml = criterion("Machine Learning", 15);
        assert_eq!(LexicalScorer.score("applied machine\n  learning", &ml), 15);
    }

    #[test]
    fn test_phrase_must_not_extend_into_longer_token() {
        let ds = criterion("Data Science", 18);
        assert_eq!(LexicalScorer.score("data sciences", &ds), 0);
        assert_eq!(LexicalScorer.score("bigdata science", &ds), 0);
    }

    #[test]
    fn test_punctuation_is_a_boundary() {
        let py = criterion("Python", 10);
        assert_eq!(LexicalScorer.score("(Python, Go)", &py), 10);
        assert_eq!(LexicalScorer.score("Python.", &py), 10);
        assert_eq!(LexicalScorer.score("python3", &py), 0);
    }

    #[test]
    fn test_later_occurrence_still_counts() {
        let ai = criterion("AI", 20);
        assert_eq!(LexicalScorer.score("maintained the AI platform", &ai), 20);
    }

    #[test]
    fn test_symbol_edged_labels() {
        assert_eq!(LexicalScorer.score("Fluent in C++ and Rust", &criterion("C++", 8)), 8);
        assert_eq!(LexicalScorer.score("Ten years of .NET", &criterion(".NET", 6)), 6);
    }

    #[test]
    fn test_repeated_mentions_score_once() {
        let docker = criterion("Docker", 10);
        assert_eq!(LexicalScorer.score("Docker docker DOCKER", &docker), 10);
    }

    #[test]
    fn test_empty_label_never_matches() {
        assert_eq!(LexicalScorer.score("anything", &criterion("  ", 5)), 0);
    }

    #[test]
    fn test_matched_labels_in_set_order() {
        let set = CriteriaSet::from_fixed_table();
        let matched = LexicalScorer.matched_labels("Docker, NLP and Python", &set);
        assert_eq!(matched, vec!["Python", "NLP", "Docker"]);
    }
}
