//! PDF upload handler

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use serde::Serialize;

use crate::AppState;
use pdfquery_common::errors::{AppError, Result};
use pdfquery_ingestion::processor::validate_filename;

/// Multipart field carrying the PDF
const FILE_FIELD: &str = "file";

#[derive(Serialize)]
pub struct UploadResponse {
    pub message: String,
}

/// A `file` part pulled out of the multipart body
struct UploadedFile {
    filename: Option<String>,
    bytes: Vec<u8>,
}

fn missing_file() -> AppError {
    AppError::validation("No file part in the request")
}

/// Find the `file` part, checking its name before reading the body
async fn read_file_field(mut form: Multipart) -> Result<UploadedFile> {
    while let Some(field) = form.next_field().await.map_err(|_| missing_file())? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().map(str::to_owned);
        validate_filename(filename.as_deref())?;

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::validation(e.body_text()))?;

        return Ok(UploadedFile {
            filename,
            bytes: bytes.to_vec(),
        });
    }

    Err(missing_file())
}

/// Extract the uploaded PDF's text and store it as a new document
pub async fn upload_pdf(
    State(state): State<AppState>,
    form: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>> {
    let form = form.map_err(|_| missing_file())?;
    let file = read_file_field(form).await?;

    let document = state.ingestion.ingest(file.bytes).await?;

    tracing::info!(
        document_id = document.id,
        filename = file.filename.as_deref().unwrap_or_default(),
        "PDF uploaded"
    );

    Ok(Json(UploadResponse {
        message: "PDF content indexed successfully".to_string(),
    }))
}
