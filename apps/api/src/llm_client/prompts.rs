// Shared prompt constants.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting system prompts.

/// System prompt for every judgment call. Ranking prompts ask for bare text
/// (a number or a list of lines), never JSON.
pub const PLAIN_TEXT_SYSTEM: &str = "You are a precise, impartial technical recruiter. \
    Answer with exactly what the request asks for and nothing else. \
    Do NOT use markdown code fences. \
    Do NOT include explanations, caveats or apologies.";
