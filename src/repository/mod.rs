// ==========================================
// KBO Loader - Repository layer
// ==========================================
// Sinks for finished documents. No pipeline logic here.
// Constraint: all values go through bound parameters; only the
// validated collection name is formatted into SQL.
// ==========================================

pub mod document_repo;
pub mod document_sink;
pub mod error;
pub mod memory_sink;

pub use document_repo::{BatchLogEntry, SqliteDocumentRepository};
pub use document_sink::DocumentSink;
pub use error::{RepositoryError, RepositoryResult};
pub use memory_sink::MemoryDocumentSink;
