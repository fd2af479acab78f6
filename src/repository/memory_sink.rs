// ==========================================
// KBO Loader - In-memory sink
// ==========================================
// Keeps flushed documents in memory (tests and dry runs).
// Same append-only contract as the SQLite repository.
// ==========================================

use crate::domain::diagnostics::BatchReport;
use crate::domain::enterprise::Enterprise;
use crate::repository::document_sink::DocumentSink;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct MemoryState {
    documents: Vec<Enterprise>,
    keys: HashSet<String>,
    batches: Vec<(String, BatchReport)>,
    prepared: bool,
}

#[derive(Default)]
pub struct MemoryDocumentSink {
    state: Mutex<MemoryState>,
    fail_at_batch: Option<usize>,
}

impl MemoryDocumentSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink whose insert fails for the given batch index
    pub fn failing_at(batch_index: usize) -> Self {
        Self {
            fail_at_batch: Some(batch_index),
            ..Self::default()
        }
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Flushed documents in insertion order
    pub fn documents(&self) -> RepositoryResult<Vec<Enterprise>> {
        Ok(self.lock()?.documents.clone())
    }

    pub fn document(&self, entity_number: &str) -> RepositoryResult<Option<Enterprise>> {
        Ok(self
            .lock()?
            .documents
            .iter()
            .find(|doc| doc.entity_number == entity_number)
            .cloned())
    }

    /// Reports recorded so far, as (run_id, report)
    pub fn batch_reports(&self) -> RepositoryResult<Vec<(String, BatchReport)>> {
        Ok(self.lock()?.batches.clone())
    }

    pub fn is_prepared(&self) -> bool {
        self.lock().map(|state| state.prepared).unwrap_or(false)
    }
}

#[async_trait]
impl DocumentSink for MemoryDocumentSink {
    async fn prepare(&self) -> RepositoryResult<()> {
        let mut state = self.lock()?;
        if !state.documents.is_empty() {
            return Err(RepositoryError::CollectionNotEmpty {
                collection: "memory".to_string(),
                count: state.documents.len() as i64,
            });
        }
        state.prepared = true;
        Ok(())
    }

    async fn insert_batch(&self, batch_index: usize, documents: Vec<Enterprise>) -> RepositoryResult<usize> {
        if self.fail_at_batch == Some(batch_index) {
            return Err(RepositoryError::InternalError(format!(
                "insert refused for batch {}",
                batch_index
            )));
        }

        let mut state = self.lock()?;
        // all or nothing, like the SQLite transaction
        let mut fresh = HashSet::with_capacity(documents.len());
        for doc in &documents {
            if state.keys.contains(&doc.entity_number) || !fresh.insert(doc.entity_number.clone()) {
                return Err(RepositoryError::UniqueConstraintViolation(doc.entity_number.clone()));
            }
        }

        let written = documents.len();
        state.keys.extend(fresh);
        state.documents.extend(documents);
        Ok(written)
    }

    async fn record_batch(&self, run_id: &str, report: &BatchReport) -> RepositoryResult<()> {
        self.lock()?.batches.push((run_id.to_string(), report.clone()));
        Ok(())
    }
}
