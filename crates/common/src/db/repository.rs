//! Repository pattern for database operations
//!
//! The only data access the service needs: create the table, append
//! documents, and read the whole corpus back in insertion order.

use crate::config::DatabaseConfig;
use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::Result;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryOrder, Schema, Set, TransactionTrait,
};

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Connect and make sure the documents table exists
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let repo = Self::new(DbPool::new(config).await?);
        repo.ensure_schema().await?;
        Ok(repo)
    }

    /// Underlying connection, for statements the repository does not wrap
    pub fn conn(&self) -> &DatabaseConnection {
        self.pool.conn()
    }

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    /// Create the documents table if it does not exist yet
    pub async fn ensure_schema(&self) -> Result<()> {
        let conn = self.conn();
        let backend = conn.get_database_backend();

        let mut stmt = Schema::new(backend).create_table_from_entity(DocumentEntity);
        stmt.if_not_exists();

        conn.execute(backend.build(&stmt)).await?;
        tracing::debug!("Documents table ensured");
        Ok(())
    }

    // ========================================================================
    // Document Operations
    // ========================================================================

    /// Insert one document; the row is visible only once the transaction commits
    pub async fn insert_document(&self, text: String) -> Result<Document> {
        let txn = self.conn().begin().await?;

        let document = DocumentActiveModel {
            text: Set(text),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(document)
    }

    /// Insert several documents in a single transaction
    pub async fn insert_documents(&self, texts: Vec<String>) -> Result<Vec<Document>> {
        let txn = self.conn().begin().await?;

        let mut documents = Vec::with_capacity(texts.len());
        for text in texts {
            let document = DocumentActiveModel {
                text: Set(text),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            documents.push(document);
        }

        txn.commit().await?;
        Ok(documents)
    }

    /// Load every stored document, oldest first
    pub async fn all_documents(&self) -> Result<Vec<Document>> {
        DocumentEntity::find()
            .order_by_asc(DocumentColumn::Id)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    /// Number of stored documents
    pub async fn count_documents(&self) -> Result<u64> {
        DocumentEntity::find()
            .count(self.conn())
            .await
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_repository() -> Repository {
        Repository::connect(&DatabaseConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_ensure_schema_is_repeatable() {
        let repo = memory_repository().await;
        repo.ensure_schema().await.unwrap();
        assert_eq!(repo.count_documents().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_documents_come_back_in_insertion_order() {
        let repo = memory_repository().await;

        let first = repo.insert_document("A".to_string()).await.unwrap();
        let second = repo.insert_document("B".to_string()).await.unwrap();
        assert!(second.id > first.id);

        let texts: Vec<String> = repo
            .all_documents()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.text)
            .collect();
        assert_eq!(texts, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_duplicate_text_creates_distinct_rows() {
        let repo = memory_repository().await;

        let a = repo.insert_document("same".to_string()).await.unwrap();
        let b = repo.insert_document("same".to_string()).await.unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(a.text, b.text);
        assert_eq!(repo.count_documents().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_batch_insert() {
        let repo = memory_repository().await;

        let docs = repo
            .insert_documents(vec!["one".to_string(), "two".to_string()])
            .await
            .unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(repo.count_documents().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_failed_batch_leaves_no_rows() {
        let repo = memory_repository().await;
        repo.conn()
            .execute_unprepared(
                "CREATE TRIGGER reject_second BEFORE INSERT ON pdf_content \
                 WHEN NEW.text = 'two' BEGIN SELECT RAISE(ABORT, 'rejected'); END",
            )
            .await
            .unwrap();

        let result = repo
            .insert_documents(vec!["one".to_string(), "two".to_string()])
            .await;

        assert!(matches!(result, Err(crate::AppError::Database(_))));
        assert_eq!(repo.count_documents().await.unwrap(), 0);
    }
}
