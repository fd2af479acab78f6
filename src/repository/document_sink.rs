// ==========================================
// KBO Loader - Document sink trait
// ==========================================
// Append-only bulk write of finished enterprise documents.
// The pipeline never reads back from the sink.
// ==========================================

use crate::domain::diagnostics::BatchReport;
use crate::domain::enterprise::Enterprise;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// DocumentSink Trait
// ==========================================
// Implementors: SqliteDocumentRepository, MemoryDocumentSink
#[async_trait]
pub trait DocumentSink: Send + Sync {
    /// Called once before the first batch
    ///
    /// # Returns
    /// - Err(CollectionNotEmpty): the target already holds documents
    ///   and resetting it was not requested
    async fn prepare(&self) -> RepositoryResult<()>;

    /// Inserts one batch of documents, all or nothing
    ///
    /// # Parameters
    /// - batch_index: 0-based index of the batch
    /// - documents: complete documents, in primary file order
    ///
    /// # Returns
    /// - Ok(usize): documents written
    /// - Err(UniqueConstraintViolation): an entity_number is already stored
    async fn insert_batch(&self, batch_index: usize, documents: Vec<Enterprise>) -> RepositoryResult<usize>;

    /// Persists the per-batch report (counts + warning histogram)
    async fn record_batch(&self, run_id: &str, report: &BatchReport) -> RepositoryResult<()>;
}
