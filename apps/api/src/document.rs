//! Uploaded resume documents → plain text.

use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

use crate::errors::AppError;

const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("uploaded file is not a PDF")]
    NotPdf,

    #[error("could not read PDF: {0}")]
    Unreadable(String),

    #[error("PDF contains no extractable text")]
    NoText,

    #[error("PDF extraction worker failed")]
    Worker(#[source] tokio::task::JoinError),
}

impl From<DocumentError> for AppError {
    fn from(e: DocumentError) -> Self {
        match e {
            DocumentError::NotPdf => AppError::Validation(e.to_string()),
            DocumentError::Unreadable(_) | DocumentError::NoText => {
                AppError::UnprocessableEntity(e.to_string())
            }
            DocumentError::Worker(_) => AppError::Internal(anyhow::Error::new(e)),
        }
    }
}

/// Accepts a PDF by declared content type or by its magic bytes.
pub fn is_pdf(content_type: Option<&str>, data: &[u8]) -> bool {
    let declared = content_type.is_some_and(|ct| ct.eq_ignore_ascii_case("application/pdf"));
    declared || data.starts_with(PDF_MAGIC)
}

/// Extracts text from a PDF. Parsing is CPU-bound, so it runs on the blocking pool.
pub async fn extract_pdf_text(data: Bytes) -> Result<String, DocumentError> {
    if !data.starts_with(PDF_MAGIC) {
        return Err(DocumentError::NotPdf);
    }
    let size = data.len();
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&data))
        .await
        .map_err(|e| {
            // pdf-extract panics on some malformed documents
            if e.is_panic() {
                DocumentError::Unreadable("parser panicked".to_string())
            } else {
                DocumentError::Worker(e)
            }
        })?
        .map_err(|e| DocumentError::Unreadable(e.to_string()))?;

    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(DocumentError::NoText);
    }
    debug!("extracted {} chars from {size} byte PDF", text.len());
    Ok(text)
}
