// ==========================================
// KBO Loader - Core library
// ==========================================
// Registry export (CSV) → one hierarchical document per enterprise
// Stack: Rust + tokio + rayon + SQLite
// ==========================================

// ==========================================
// Modules
// ==========================================

// Domain layer - documents, rows, diagnostics
pub mod domain;

// Repository layer - document sinks
pub mod repository;

// Import layer - streaming joins and batch coordination
pub mod importer;

// Configuration layer
pub mod config;

// Database infrastructure (PRAGMAs, schema)
pub mod db;

// Logging
pub mod logging;

// ==========================================
// Re-exports
// ==========================================

pub use config::LoaderConfig;
pub use domain::{
    Activity, Address, BatchReport, BatchState, Contact, Denomination, Enterprise, IngestWarning,
    RunSummary, SourceFile, UnitDocument, WarningKind,
};
pub use importer::{run_pipeline, BatchCoordinator, CodeResolver, IngestError, IngestResult};
pub use repository::{DocumentSink, MemoryDocumentSink, RepositoryError, SqliteDocumentRepository};

// ==========================================
// Constants
// ==========================================

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const APP_NAME: &str = "KBO Loader";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
