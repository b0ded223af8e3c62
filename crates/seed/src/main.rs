//! PdfQuery Seed
//!
//! One-shot utility that creates the documents table if needed and
//! inserts two sample texts. Not idempotent: every run adds two rows.

use anyhow::Context;
use pdfquery_common::{
    config::AppConfig,
    db::{models::Document, Repository},
    VERSION,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Texts inserted on every run
const SAMPLE_TEXTS: [&str; 2] = [
    "This is a sample PDF text content for testing.",
    "Here is another example of PDF text content.",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level)),
        )
        .with_target(true)
        .init();

    info!("Starting PdfQuery Seed v{}", VERSION);

    let repo = Repository::connect(&config.database)
        .await
        .with_context(|| format!("failed to open database {}", config.database.url))?;

    let documents = seed(&repo).await?;

    info!(
        inserted = documents.len(),
        first_id = documents.first().map(|d| d.id),
        "Database seeded"
    );
    println!("Database seeded successfully!");

    Ok(())
}

/// Insert the sample texts in one transaction
async fn seed(repo: &Repository) -> anyhow::Result<Vec<Document>> {
    let texts = SAMPLE_TEXTS.iter().map(|text| text.to_string()).collect();

    repo.insert_documents(texts)
        .await
        .context("failed to insert sample documents")
}
