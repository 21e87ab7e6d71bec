// All LLM prompt templates for the ranking engine.

/// Criteria extraction prompt. Replace `{job_description}` before sending.
pub const CRITERIA_EXTRACTION_PROMPT: &str = r#"Extract the key ranking criteria (skills, experience, certifications) from the job description below.

Return ONE criterion per line as a short label (for example "Python", "5+ years backend experience", "AWS certification").
Do NOT number the lines. Do NOT add headings or commentary.

JOB DESCRIPTION:
{job_description}"#;

/// Rubric prompt for judged scoring.
/// Replace `{criterion}` and `{resume_text}` before sending.
pub const RUBRIC_PROMPT: &str = r#"Rate the resume below from 0 to 5 based on its relevance to the criterion: '{criterion}'.

0 = no evidence at all, 5 = strong, direct, repeated evidence.
Reply with a single integer between 0 and 5 and nothing else.

RESUME CONTENT:
{resume_text}"#;

pub fn criteria_extraction_prompt(job_description: &str) -> String {
    CRITERIA_EXTRACTION_PROMPT.replace("{job_description}", job_description)
}

pub fn rubric_prompt(criterion: &str, resume_text: &str) -> String {
    // Criterion first so a resume containing "{criterion}" is never re-substituted.
    RUBRIC_PROMPT
        .replace("{criterion}", criterion)
        .replace("{resume_text}", resume_text)
}
