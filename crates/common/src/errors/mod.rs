//! Error types for PdfQuery services
//!
//! Provides the error taxonomy shared by every handler:
//! - Validation errors (client input missing or malformed) map to 400
//! - Not-found errors (nothing stored to answer from) map to 404
//! - Upstream errors (PDF parsing, storage, LLM provider) map to 500
//!
//! Every error renders as the JSON envelope `{"error": "<message>"}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification in logs
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,

    // Resource errors (4xxx)
    NoDocuments,

    // Database errors (7xxx)
    DatabaseError,
    ConnectionError,

    // External service errors (8xxx)
    PdfExtractionError,
    ProviderError,
    ProviderTimeout,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::ValidationError => 1001,

            ErrorCode::NoDocuments => 4002,

            ErrorCode::DatabaseError => 7001,
            ErrorCode::ConnectionError => 7002,

            ErrorCode::PdfExtractionError => 8002,
            ErrorCode::ProviderError => 8003,
            ErrorCode::ProviderTimeout => 8004,

            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("{message}")]
    Validation { message: String },

    // Resource errors
    #[error("No PDF content found in the database")]
    NoDocuments,

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Database connection error: {message}")]
    DatabaseConnection { message: String },

    // External service errors
    #[error("PDF extraction failed: {message}")]
    PdfExtraction { message: String },

    #[error("LLM provider error: {message}")]
    Provider { message: String },

    #[error("LLM provider timeout after {timeout_secs}s")]
    ProviderTimeout { timeout_secs: u64 },

    // Internal errors
    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl AppError {
    /// Shorthand for a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
        }
    }

    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::NoDocuments => ErrorCode::NoDocuments,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::DatabaseConnection { .. } => ErrorCode::ConnectionError,
            AppError::PdfExtraction { .. } => ErrorCode::PdfExtractionError,
            AppError::Provider { .. } => ErrorCode::ProviderError,
            AppError::ProviderTimeout { .. } => ErrorCode::ProviderTimeout,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,

            // 404 Not Found
            AppError::NoDocuments => StatusCode::NOT_FOUND,

            // 500 Internal Server Error: storage, PDF parsing and provider failures alike
            AppError::Database(_)
            | AppError::DatabaseConnection { .. }
            | AppError::PdfExtraction { .. }
            | AppError::Provider { .. }
            | AppError::ProviderTimeout { .. }
            | AppError::Internal { .. }
            | AppError::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

/// Error envelope returned by every endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        if self.is_server_error() {
            tracing::error!(
                error = %message,
                code = code.as_code(),
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %message,
                code = code.as_code(),
                status = status.as_u16(),
                "Client error"
            );
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let err = AppError::validation("File is not a PDF");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "File is not a PDF");
        assert!(!err.is_server_error());
        assert!(err.is_client_error());
    }

    #[test]
    fn test_error_codes_are_distinct_per_class() {
        assert_eq!(AppError::validation("x").code().as_code(), 1001);
        assert_eq!(AppError::NoDocuments.code().as_code(), 4002);
        assert_eq!(
            AppError::Configuration { message: "no key".into() }.code(),
            ErrorCode::ConfigurationError
        );
        assert_eq!(
            AppError::ProviderTimeout { timeout_secs: 60 }.code(),
            ErrorCode::ProviderTimeout
        );
    }

    #[test]
    fn test_no_documents_is_not_found() {
        let err = AppError::NoDocuments;
        assert_eq!(err.code(), ErrorCode::NoDocuments);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_upstream_errors_are_server_errors() {
        let errors = [
            AppError::PdfExtraction { message: "bad xref".into() },
            AppError::Provider { message: "quota exceeded".into() },
            AppError::ProviderTimeout { timeout_secs: 60 },
            AppError::DatabaseConnection { message: "locked".into() },
        ];
        for err in errors {
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
            assert!(err.is_server_error());
        }
    }

    #[tokio::test]
    async fn test_error_envelope() {
        let response = AppError::Provider { message: "boom".into() }.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "LLM provider error: boom" }));
    }
}
