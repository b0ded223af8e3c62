//! Ingestion error types

use pdfquery_common::errors::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("{0}")]
    InvalidUpload(String),

    #[error("Failed to load PDF: {0}")]
    PdfParse(String),

    #[error("PDF is encrypted")]
    Encrypted,

    #[error("Failed to extract text from page {page}: {message}")]
    PageExtraction { page: u32, message: String },

    #[error("No text content extracted from PDF")]
    NoText,

    #[error("Extraction task failed: {0}")]
    Task(String),

    #[error(transparent)]
    Storage(#[from] AppError),
}

impl From<IngestionError> for AppError {
    fn from(e: IngestionError) -> Self {
        match e {
            IngestionError::InvalidUpload(message) => AppError::validation(message),
            IngestionError::Storage(inner) => inner,
            IngestionError::Task(message) => AppError::Internal { message },
            other => AppError::PdfExtraction {
                message: other.to_string(),
            },
        }
    }
}
