// Candidate Ranking Engine
// Implements: criteria sets, lexical + judged scoring, candidate scoring, batch ranking, CSV reports.
// All LLM calls go through llm_client::JudgmentCapability; no direct Anthropic calls here.

pub mod batch;
pub mod candidate;
pub mod criteria;
pub mod handlers;
pub mod judgment;
pub mod lexical;
pub mod prompts;
pub mod report;
