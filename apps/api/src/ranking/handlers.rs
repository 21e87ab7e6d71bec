//! Axum route handlers for the Ranking API.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::AppError;
use crate::extraction::extract_upload;
use crate::ranking::batch::RankInput;
use crate::ranking::candidate::{Candidate, ScoreRecord};
use crate::ranking::criteria::{CriteriaSet, CriteriaSource, Strategy};
use crate::ranking::report::ReportSerializer;
use crate::state::AppState;

const TEXT_PREVIEW_CHARS: usize = 500;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ExtractCriteriaRequest {
    pub job_description: String,
}

#[derive(Debug, Deserialize)]
pub struct ScoreTextRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ScoreTextResponse {
    pub score: ScoreRecord,
    pub matched_criteria: Vec<String>,
    pub text_preview: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResumeResponse {
    pub file_name: String,
    pub text: String,
    pub display_name: String,
    pub score: ScoreRecord,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Csv,
    Json,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowOrder {
    #[default]
    Input,
    Total,
}

#[derive(Debug, Default, Deserialize)]
pub struct RankingQuery {
    #[serde(default)]
    pub format: ReportFormat,
    #[serde(default)]
    pub sort: RowOrder,
}

struct Upload {
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Bytes,
}

#[derive(Default)]
struct RankingForm {
    uploads: Vec<Upload>,
    job_description: Option<String>,
    criteria: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/criteria/default
pub async fn handle_default_criteria(State(state): State<AppState>) -> Json<CriteriaSet> {
    Json(state.default_criteria.as_ref().clone())
}

/// POST /api/v1/criteria/extract
///
/// Derives judged criteria from a job description. Lets callers preview what a
/// ranking run with the same description would score against.
pub async fn handle_extract_criteria(
    State(state): State<AppState>,
    Json(request): Json<ExtractCriteriaRequest>,
) -> Result<Json<CriteriaSet>, AppError> {
    if request.job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "job_description cannot be empty".to_string(),
        ));
    }

    let judgment = state.ranker.scorer().judgment();
    let criteria =
        CriteriaSet::from_job_description(&request.job_description, judgment.judge(), judgment.timeout())
            .await?;

    Ok(Json(criteria))
}

/// POST /api/v1/resumes/score
///
/// Scores already-extracted resume text against the built-in criteria.
pub async fn handle_score_text(
    State(state): State<AppState>,
    Json(request): Json<ScoreTextRequest>,
) -> Result<Json<ScoreTextResponse>, AppError> {
    if request.text.trim().is_empty() {
        return Err(AppError::Validation("text cannot be empty".to_string()));
    }

    let criteria = state.default_criteria.as_ref();
    let scorer = state.ranker.scorer();
    let score = scorer.score_candidate(&request.text, criteria).await;
    let matched_criteria = scorer
        .lexical()
        .matched_labels(&request.text, criteria)
        .into_iter()
        .map(str::to_string)
        .collect();

    Ok(Json(ScoreTextResponse {
        score,
        matched_criteria,
        text_preview: request.text.chars().take(TEXT_PREVIEW_CHARS).collect(),
    }))
}

/// POST /api/v1/resumes/upload
///
/// Extracts one PDF/DOCX upload and scores it against the built-in criteria.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResumeResponse>, AppError> {
    let form = read_form(&mut multipart).await?;
    let upload = form
        .uploads
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Validation("a 'file' field is required".to_string()))?;

    let file_name = upload.file_name.clone().unwrap_or_default();
    let text = tokio::task::spawn_blocking(move || {
        extract_upload(
            &upload.bytes,
            upload.file_name.as_deref(),
            upload.content_type.as_deref(),
        )
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Extraction task failed: {e}")))??;

    let candidate = Candidate::from_text(text);
    let score = state
        .ranker
        .scorer()
        .score_candidate(&candidate.raw_text, &state.default_criteria)
        .await;

    Ok(Json(UploadResumeResponse {
        file_name,
        text: candidate.raw_text,
        display_name: candidate.display_name,
        score,
    }))
}

/// POST /api/v1/rankings?format=csv|json&sort=input|total
///
/// Ranks every uploaded document. Criteria precedence: an explicit `criteria`
/// list, then criteria derived from `job_description`, then the built-in table.
/// Every uploaded file yields exactly one row, even when it cannot be read.
pub async fn handle_rank_batch(
    State(state): State<AppState>,
    Query(query): Query<RankingQuery>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let form = read_form(&mut multipart).await?;
    if form.uploads.is_empty() {
        return Err(AppError::Validation(
            "at least one 'files' upload is required".to_string(),
        ));
    }

    let criteria = resolve_criteria(&state, form.criteria, form.job_description).await?;
    let documents = extract_uploads(form.uploads).await?;

    let mut report = state
        .ranker
        .rank_batch(documents, &criteria, &state.shutdown)
        .await?;
    if matches!(query.sort, RowOrder::Total) {
        report = report.into_ranked();
    }

    if let Some(dir) = &state.config.report_dir {
        ReportSerializer::write_to_dir(&report, dir)?;
    }

    match query.format {
        ReportFormat::Json => Ok(Json(report).into_response()),
        ReportFormat::Csv => {
            let body = ReportSerializer::to_csv_bytes(&report)?;
            let disposition = format!("attachment; filename=\"ranking-{}.csv\"", report.report_id);
            Ok((
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                body,
            )
                .into_response())
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn read_form(multipart: &mut Multipart) -> Result<RankingForm, AppError> {
    let mut form = RankingForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" | "files" => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                form.uploads.push(Upload {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            "job_description" => form.job_description = Some(field.text().await?),
            "criteria" => form.criteria = Some(field.text().await?),
            other => debug!("Ignoring multipart field '{other}'"),
        }
    }

    Ok(form)
}

async fn resolve_criteria(
    state: &AppState,
    supplied: Option<String>,
    job_description: Option<String>,
) -> Result<Arc<CriteriaSet>, AppError> {
    if let Some(list) = supplied.filter(|s| !s.trim().is_empty()) {
        let criteria = CriteriaSet::from_labels(list.lines(), Strategy::Judged, CriteriaSource::Supplied);
        if criteria.is_empty() {
            return Err(AppError::Validation(
                "criteria did not contain any usable labels".to_string(),
            ));
        }
        return Ok(Arc::new(criteria));
    }

    if let Some(description) = job_description.filter(|s| !s.trim().is_empty()) {
        let judgment = state.ranker.scorer().judgment();
        let criteria =
            CriteriaSet::from_job_description(&description, judgment.judge(), judgment.timeout())
                .await?;
        return Ok(Arc::new(criteria));
    }

    Ok(state.default_criteria.clone())
}

/// Extraction is CPU-bound, so it runs on the blocking pool. Failures stay
/// attached to their document.
async fn extract_uploads(uploads: Vec<Upload>) -> Result<Vec<RankInput>, AppError> {
    let documents = tokio::task::spawn_blocking(move || {
        uploads
            .into_iter()
            .enumerate()
            .map(|(index, upload)| {
                let text = extract_upload(
                    &upload.bytes,
                    upload.file_name.as_deref(),
                    upload.content_type.as_deref(),
                );
                RankInput {
                    source_name: upload
                        .file_name
                        .unwrap_or_else(|| format!("document-{}", index + 1)),
                    text,
                }
            })
            .collect::<Vec<_>>()
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Extraction task failed: {e}")))?;

    info!("Extracted {} uploaded documents", documents.len());
    Ok(documents)
}
