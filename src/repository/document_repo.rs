// ==========================================
// KBO Loader - SQLite document repository
// ==========================================
// One table per collection: entity_number → JSON document.
// Plain INSERT only: a second document with the same entity_number
// fails the whole batch transaction.
// ==========================================

use crate::db::{
    ensure_schema, is_valid_collection_name, open_sqlite_connection, read_schema_version, BATCH_LOG_TABLE,
    CURRENT_SCHEMA_VERSION,
};
use crate::domain::diagnostics::BatchReport;
use crate::domain::enterprise::Enterprise;
use crate::repository::document_sink::DocumentSink;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

pub struct SqliteDocumentRepository {
    conn: Arc<Mutex<Connection>>,
    collection: String,
    reset_collection: bool,
}

/// One row of the batch log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchLogEntry {
    pub run_id: String,
    pub batch_index: i64,
    pub primary_rows: i64,
    pub documents: i64,
    pub warnings: i64,
    pub warning_histogram: String, // JSON object kind → count
}

impl SqliteDocumentRepository {
    /// Opens (or creates) the database and the collection table
    ///
    /// # Parameters
    /// - db_path: SQLite file
    /// - collection: table name, `[A-Za-z_][A-Za-z0-9_]*`
    /// - reset_collection: empty the collection in `prepare` instead of refusing
    pub fn new(db_path: &str, collection: &str, reset_collection: bool) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Self::from_connection(Arc::new(Mutex::new(conn)), collection, reset_collection)
    }

    pub fn from_connection(
        conn: Arc<Mutex<Connection>>,
        collection: &str,
        reset_collection: bool,
    ) -> RepositoryResult<Self> {
        if !is_valid_collection_name(collection) {
            return Err(RepositoryError::InvalidCollectionName(collection.to_string()));
        }
        let repo = Self {
            conn,
            collection: collection.to_string(),
            reset_collection,
        };
        {
            let conn = repo.get_conn()?;
            if let Some(found) = read_schema_version(&conn)? {
                if found > CURRENT_SCHEMA_VERSION {
                    return Err(RepositoryError::UnsupportedSchemaVersion {
                        found,
                        supported: CURRENT_SCHEMA_VERSION,
                    });
                }
            }
            ensure_schema(&conn, &repo.collection)?;
        }
        Ok(repo)
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ===== Read helpers (verification only) =====

    pub fn count_documents(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", self.collection),
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn get_document(&self, entity_number: &str) -> RepositoryResult<Option<Enterprise>> {
        let conn = self.get_conn()?;
        let raw: Option<String> = conn
            .query_row(
                &format!("SELECT document FROM {} WHERE entity_number = ?1", self.collection),
                params![entity_number],
                |row| row.get(0),
            )
            .optional()?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub fn list_batch_log(&self, run_id: &str) -> RepositoryResult<Vec<BatchLogEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT run_id, batch_index, primary_rows, documents, warnings, warning_histogram
            FROM {}
            WHERE run_id = ?1 AND collection = ?2
            ORDER BY batch_index
            "#,
            BATCH_LOG_TABLE
        ))?;
        let entries = stmt
            .query_map(params![run_id, self.collection], |row| {
                Ok(BatchLogEntry {
                    run_id: row.get(0)?,
                    batch_index: row.get(1)?,
                    primary_rows: row.get(2)?,
                    documents: row.get(3)?,
                    warnings: row.get(4)?,
                    warning_histogram: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    // ===== Write path =====

    fn insert_serialized(
        conn: &Connection,
        collection: &str,
        batch_index: usize,
        rows: &[(String, String)],
    ) -> RepositoryResult<usize> {
        let tx = conn.unchecked_transaction()?;
        let inserted_at = chrono::Utc::now().to_rfc3339();
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} (entity_number, document, batch_index, inserted_at) VALUES (?1, ?2, ?3, ?4)",
                collection
            ))?;
            for (entity_number, document) in rows {
                stmt.execute(params![entity_number, document, batch_index as i64, inserted_at])?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }
}

#[async_trait]
impl DocumentSink for SqliteDocumentRepository {
    async fn prepare(&self) -> RepositoryResult<()> {
        let count = self.count_documents()?;
        if count == 0 {
            return Ok(());
        }
        if !self.reset_collection {
            return Err(RepositoryError::CollectionNotEmpty {
                collection: self.collection.clone(),
                count,
            });
        }

        warn!(collection = %self.collection, count, "emptying collection before run");
        let conn = self.get_conn()?;
        conn.execute(&format!("DELETE FROM {}", self.collection), [])?;
        Ok(())
    }

    async fn insert_batch(&self, batch_index: usize, documents: Vec<Enterprise>) -> RepositoryResult<usize> {
        let rows = documents
            .iter()
            .map(|doc| -> RepositoryResult<(String, String)> {
                Ok((doc.entity_number.clone(), serde_json::to_string(doc)?))
            })
            .collect::<RepositoryResult<Vec<_>>>()?;
        drop(documents);

        let conn = Arc::clone(&self.conn);
        let collection = self.collection.clone();
        let written = tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            Self::insert_serialized(&conn, &collection, batch_index, &rows)
        })
        .await
        .map_err(|e| RepositoryError::InternalError(e.to_string()))??;

        debug!(collection = %self.collection, batch_index, written, "batch inserted");
        Ok(written)
    }

    async fn record_batch(&self, run_id: &str, report: &BatchReport) -> RepositoryResult<()> {
        let histogram = serde_json::to_string(&report.warning_histogram())?;
        let conn = self.get_conn()?;
        conn.execute(
            &format!(
                r#"
                INSERT INTO {} (
                  run_id, collection, batch_index, primary_rows, documents,
                  warnings, warning_histogram, elapsed_ms, recorded_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
                BATCH_LOG_TABLE
            ),
            params![
                run_id,
                self.collection,
                report.batch_index as i64,
                report.primary_rows as i64,
                report.documents as i64,
                report.warnings.len() as i64,
                histogram,
                report.elapsed_ms as i64,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        info!(run_id = %run_id, batch_index = report.batch_index, "batch logged");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::diagnostics::{IngestWarning, WarningKind};
    use crate::domain::types::SourceFile;

    fn repo(reset: bool) -> SqliteDocumentRepository {
        let conn = Connection::open_in_memory().unwrap();
        SqliteDocumentRepository::from_connection(Arc::new(Mutex::new(conn)), "enterprises", reset)
            .unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_read_back() {
        let repo = repo(false);
        repo.prepare().await.unwrap();

        let mut doc = Enterprise::new("0200.065.765");
        doc.status = Some("Actif".to_string());
        let written = repo
            .insert_batch(0, vec![doc.clone(), Enterprise::new("0200.068.636")])
            .await
            .unwrap();

        assert_eq!(written, 2);
        assert_eq!(repo.count_documents().unwrap(), 2);
        assert_eq!(repo.get_document("0200.065.765").unwrap(), Some(doc));
        assert_eq!(repo.get_document("missing").unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_entity_number_rolls_back_batch() {
        let repo = repo(false);
        repo.insert_batch(0, vec![Enterprise::new("E1")]).await.unwrap();

        let err = repo
            .insert_batch(1, vec![Enterprise::new("E2"), Enterprise::new("E1")])
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
        // E2 was part of the failed transaction
        assert_eq!(repo.count_documents().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_prepare_refuses_non_empty_collection() {
        let repo = repo(false);
        repo.insert_batch(0, vec![Enterprise::new("E1")]).await.unwrap();
        let err = repo.prepare().await.unwrap_err();
        assert!(matches!(err, RepositoryError::CollectionNotEmpty { count: 1, .. }));
    }

    #[tokio::test]
    async fn test_prepare_with_reset_empties_collection() {
        let repo = repo(true);
        repo.insert_batch(0, vec![Enterprise::new("E1")]).await.unwrap();
        repo.prepare().await.unwrap();
        assert_eq!(repo.count_documents().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_record_batch() {
        let repo = repo(false);
        let report = BatchReport {
            batch_index: 0,
            primary_rows: 3,
            documents: 3,
            warnings: vec![IngestWarning {
                kind: WarningKind::OrphanChild,
                key: "999999".to_string(),
                source: SourceFile::Address,
                line: Some(4),
                detail: None,
            }],
            ..Default::default()
        };
        repo.record_batch("run-1", &report).await.unwrap();

        let log = repo.list_batch_log("run-1").unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].documents, 3);
        assert_eq!(log[0].warnings, 1);
        assert_eq!(log[0].warning_histogram, r#"{"ORPHAN_CHILD":1}"#);
    }

    #[test]
    fn test_newer_schema_version_is_refused() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE schema_version (version INTEGER PRIMARY KEY, applied_at TEXT);
             INSERT INTO schema_version (version) VALUES (99);",
        )
        .unwrap();
        let result =
            SqliteDocumentRepository::from_connection(Arc::new(Mutex::new(conn)), "enterprises", false);
        assert!(matches!(
            result,
            Err(RepositoryError::UnsupportedSchemaVersion { found: 99, supported: 1 })
        ));
    }

    #[test]
    fn test_invalid_collection_name() {
        let conn = Connection::open_in_memory().unwrap();
        let result =
            SqliteDocumentRepository::from_connection(Arc::new(Mutex::new(conn)), "bad name", false);
        assert!(matches!(result, Err(RepositoryError::InvalidCollectionName(_))));
    }
}
