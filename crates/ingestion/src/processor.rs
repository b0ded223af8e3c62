//! Ingestion processor
//!
//! Core ingestion workflow: validate the upload name, extract the PDF
//! text off the async runtime, then persist it as one document. The row
//! is only built after extraction succeeds and is written in a single
//! transaction, so a failure at any step leaves nothing behind.

use crate::errors::IngestionError;
use crate::pdf::{extract_text, is_pdf_filename};
use pdfquery_common::db::models::Document;
use pdfquery_common::db::Repository;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Validate an upload's filename before any parsing happens
pub fn validate_filename(filename: Option<&str>) -> Result<&str, IngestionError> {
    match filename {
        None | Some("") => Err(IngestionError::InvalidUpload("No selected file".to_string())),
        Some(name) if !is_pdf_filename(name) => {
            Err(IngestionError::InvalidUpload("File is not a PDF".to_string()))
        }
        Some(name) => Ok(name),
    }
}

/// Extracts and stores uploaded PDFs
#[derive(Clone)]
pub struct IngestionService {
    repo: Repository,
}

impl IngestionService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Extract `bytes` as a PDF and store its text as a new document
    #[instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    pub async fn ingest(&self, bytes: Vec<u8>) -> Result<Document, IngestionError> {
        let start = Instant::now();

        let result = self.extract_and_store(bytes).await;
        pdfquery_common::metrics::record_ingestion(start.elapsed().as_secs_f64(), result.is_ok());

        match &result {
            Ok(document) => info!(
                document_id = document.id,
                chars = document.text.len(),
                total_ms = start.elapsed().as_millis() as u64,
                "PDF content indexed"
            ),
            Err(e) => warn!(error = %e, "PDF ingestion failed"),
        }

        result
    }

    async fn extract_and_store(&self, bytes: Vec<u8>) -> Result<Document, IngestionError> {
        // Parsing is CPU-bound
        let text = tokio::task::spawn_blocking(move || extract_text(&bytes))
            .await
            .map_err(|e| IngestionError::Task(e.to_string()))??;

        Ok(self.repo.insert_document(text).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::pdf_with_pages;
    use pdfquery_common::config::DatabaseConfig;
    use sea_orm::ConnectionTrait;

    async fn service() -> (IngestionService, Repository) {
        let repo = Repository::connect(&DatabaseConfig::in_memory()).await.unwrap();
        (IngestionService::new(repo.clone()), repo)
    }

    #[test]
    fn test_validate_filename() {
        assert_eq!(validate_filename(Some("a.pdf")).unwrap(), "a.pdf");

        let empty = validate_filename(Some("")).unwrap_err();
        assert_eq!(empty.to_string(), "No selected file");

        let missing = validate_filename(None).unwrap_err();
        assert_eq!(missing.to_string(), "No selected file");

        let wrong = validate_filename(Some("notes.txt")).unwrap_err();
        assert_eq!(wrong.to_string(), "File is not a PDF");
    }

    #[tokio::test]
    async fn test_ingest_stores_extracted_text() {
        let (service, repo) = service().await;
        let bytes = pdf_with_pages(&["Page one", "Page two"]);
        let expected = extract_text(&bytes).unwrap();

        let document = service.ingest(bytes).await.unwrap();

        assert_eq!(document.text, expected);
        assert_eq!(repo.all_documents().await.unwrap(), vec![document]);
    }

    #[tokio::test]
    async fn test_same_pdf_twice_creates_two_records() {
        let (service, repo) = service().await;
        let bytes = pdf_with_pages(&["Repeated"]);

        let first = service.ingest(bytes.clone()).await.unwrap();
        let second = service.ingest(bytes).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(first.text, second.text);
        assert_eq!(repo.count_documents().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_corrupt_pdf_leaves_no_record() {
        let (service, repo) = service().await;

        let err = service.ingest(b"%PDF-1.5 truncated".to_vec()).await.unwrap_err();

        assert!(matches!(err, IngestionError::PdfParse(_)));
        assert_eq!(repo.count_documents().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_ingestion_keeps_both_records() {
        let (service, repo) = service().await;
        let a = pdf_with_pages(&["Document A"]);
        let b = pdf_with_pages(&["Document B"]);

        let (ra, rb) = tokio::join!(service.ingest(a), service.ingest(b));
        let (ra, rb) = (ra.unwrap(), rb.unwrap());

        assert_ne!(ra.id, rb.id);
        assert_eq!(repo.count_documents().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_storage_failure_leaves_no_record() {
        let (service, repo) = service().await;
        repo.conn()
            .execute_unprepared(
                "CREATE TRIGGER reject_inserts BEFORE INSERT ON pdf_content \
                 BEGIN SELECT RAISE(ABORT, 'storage unavailable'); END",
            )
            .await
            .unwrap();

        let err = service.ingest(pdf_with_pages(&["Lost"])).await.unwrap_err();

        assert!(matches!(err, IngestionError::Storage(_)));
        let err: pdfquery_common::AppError = err.into();
        assert_eq!(err.status_code().as_u16(), 500);
        assert_eq!(repo.count_documents().await.unwrap(), 0);
    }
}
