// ==========================================
// KBO Loader - SQLite connection setup
// ==========================================
// Goals:
// - every Connection::open goes through the same PRAGMAs
// - one place that owns the document store schema
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// Default busy_timeout (ms)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Schema version written by `ensure_schema`
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// Batch bookkeeping table, shared by every collection
pub const BATCH_LOG_TABLE: &str = "ingest_batch_log";

/// Applies the common PRAGMAs to a connection
///
/// Notes:
/// - busy_timeout is per connection
/// - WAL keeps readers unblocked while a batch transaction is open
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    // in-memory databases answer "memory" here, which is fine
    let _mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
    Ok(())
}

/// Opens a connection and applies the common PRAGMAs
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// Collection names become table names: `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_valid_collection_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Creates the collection table, the batch log and the version table
///
/// The caller has validated `collection` with `is_valid_collection_name`.
pub fn ensure_schema(conn: &Connection, collection: &str) -> rusqlite::Result<()> {
    conn.execute_batch(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
          version INTEGER PRIMARY KEY,
          applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS {collection} (
          entity_number TEXT PRIMARY KEY,
          document TEXT NOT NULL,
          batch_index INTEGER NOT NULL,
          inserted_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_{collection}_batch
          ON {collection}(batch_index);

        CREATE TABLE IF NOT EXISTS {log} (
          run_id TEXT NOT NULL,
          collection TEXT NOT NULL,
          batch_index INTEGER NOT NULL,
          primary_rows INTEGER NOT NULL,
          documents INTEGER NOT NULL,
          warnings INTEGER NOT NULL,
          warning_histogram TEXT NOT NULL,
          elapsed_ms INTEGER NOT NULL,
          recorded_at TEXT NOT NULL,
          PRIMARY KEY (run_id, batch_index)
        );
        "#,
        collection = collection,
        log = BATCH_LOG_TABLE,
    ))?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// Reads schema_version (None when the table does not exist)
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
