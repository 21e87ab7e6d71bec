use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::extraction::ExtractionError;
use crate::ranking::batch::BatchCancelled;
use crate::ranking::criteria::CriteriaExtractionError;
use crate::ranking::report::ReportWriteError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Criteria extraction error: {0}")]
    CriteriaExtraction(#[from] CriteriaExtractionError),

    #[error("Report write error: {0}")]
    ReportWrite(#[from] ReportWriteError),

    #[error("Ranking cancelled: {0}")]
    Cancelled(#[from] BatchCancelled),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        AppError::Validation(format!("Invalid multipart body: {e}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Extraction(e @ ExtractionError::UnsupportedFormat(_)) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_FORMAT",
                format!("{e}. Upload a PDF or DOCX file."),
            ),
            AppError::Extraction(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "EXTRACTION_ERROR",
                e.to_string(),
            ),
            AppError::CriteriaExtraction(e) => {
                tracing::error!("Criteria extraction failed: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "CRITERIA_EXTRACTION_ERROR",
                    "Could not derive ranking criteria from the job description".to_string(),
                )
            }
            AppError::ReportWrite(e) => {
                tracing::error!("Report write failed: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "REPORT_WRITE_ERROR",
                    "The ranking report could not be written".to_string(),
                )
            }
            AppError::Cancelled(e) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "RANKING_CANCELLED",
                e.to_string(),
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
