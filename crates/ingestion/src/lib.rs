//! PdfQuery Ingestion
//!
//! Turns uploaded PDF bytes into a stored document:
//! 1. Parse the PDF and extract every page's text in order
//! 2. Persist the concatenated text as one row, atomically

pub mod errors;
pub mod pdf;
pub mod processor;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use errors::IngestionError;
pub use processor::IngestionService;
