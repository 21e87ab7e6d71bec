//! Document text extraction for the two supported containers: PDF and DOCX.
//!
//! Extraction failures are fatal to one document only; the batch ranker turns
//! them into failed rows.

mod docx;

use std::panic;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("could not read {format:?} document: {message}")]
    Corrupt {
        format: DocumentFormat,
        message: String,
    },

    #[error("document contains no extractable text")]
    Empty,
}

impl DocumentFormat {
    /// Detects the format from the file extension, falling back to the content type.
    pub fn detect(file_name: Option<&str>, content_type: Option<&str>) -> Result<Self, ExtractionError> {
        let extension = file_name
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase());

        match (extension.as_deref(), content_type) {
            (Some("pdf"), _) => Ok(Self::Pdf),
            (Some("docx"), _) => Ok(Self::Docx),
            (_, Some("application/pdf")) => Ok(Self::Pdf),
            (_, Some(DOCX_MIME)) => Ok(Self::Docx),
            _ => Err(ExtractionError::UnsupportedFormat(
                file_name
                    .or(content_type)
                    .unwrap_or("unnamed upload")
                    .to_string(),
            )),
        }
    }
}

/// Extracts plain text from `bytes`. The result is trimmed and never empty.
pub fn extract_text(bytes: &[u8], format: DocumentFormat) -> Result<String, ExtractionError> {
    let text = match format {
        DocumentFormat::Pdf => extract_pdf(bytes)?,
        DocumentFormat::Docx => docx::extract(bytes).map_err(|message| ExtractionError::Corrupt {
            format,
            message,
        })?,
    };

    let text = text.trim();
    if text.is_empty() {
        return Err(ExtractionError::Empty);
    }
    debug!("Extracted {} chars from {:?} document", text.len(), format);
    Ok(text.to_string())
}

/// Convenience for upload handlers: detect, then extract.
pub fn extract_upload(
    bytes: &[u8],
    file_name: Option<&str>,
    content_type: Option<&str>,
) -> Result<String, ExtractionError> {
    extract_text(bytes, DocumentFormat::detect(file_name, content_type)?)
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractionError> {
    // pdf-extract panics on some malformed inputs.
    match panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(ExtractionError::Corrupt {
            format: DocumentFormat::Pdf,
            message: format!("{e:?}"),
        }),
        Err(_) => Err(ExtractionError::Corrupt {
            format: DocumentFormat::Pdf,
            message: "PDF parser aborted".to_string(),
        }),
    }
}
