//! Corpus query handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use pdfquery_common::errors::{AppError, Result};

const NO_QUERY: &str = "No query provided";

/// Question about the stored PDFs
#[derive(Debug, Deserialize, Validate)]
pub struct QueryRequest {
    #[validate(required, length(min = 1))]
    pub query: Option<String>,
}

#[derive(Serialize)]
pub struct QueryResponse {
    pub response: String,
}

/// Answer a question from every stored document
pub async fn query_pdf(
    State(state): State<AppState>,
    request: std::result::Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>> {
    // Bodies without a string `query` are reported the same way as a missing one
    let Json(request) = request.map_err(|_| AppError::validation(NO_QUERY))?;
    request.validate().map_err(|_| AppError::validation(NO_QUERY))?;

    let query = request.query.unwrap_or_default();
    let response = state.query.answer(&query).await?;

    Ok(Json(QueryResponse { response }))
}
