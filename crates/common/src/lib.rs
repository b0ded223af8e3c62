//! PdfQuery Common Library
//!
//! Shared code for the PdfQuery binaries including:
//! - Database model and repository
//! - LLM provider abstraction
//! - Corpus query service
//! - Error types and handling
//! - Configuration management
//! - Metrics

pub mod config;
pub mod db;
pub mod errors;
pub mod llm;
pub mod metrics;
pub mod query;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::Repository;
pub use errors::{AppError, Result};
pub use llm::LanguageModel;
pub use query::QueryService;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
