// ==========================================
// KBO Loader - Ingest error type
// ==========================================
// Only run-aborting failures live here. Per-record problems are
// diagnostics (domain::diagnostics), never errors.
// ==========================================

use crate::domain::types::BatchState;
use crate::repository::RepositoryError;
use thiserror::Error;

/// Ingest pipeline error type
#[derive(Error, Debug)]
pub enum IngestError {
    // ===== File errors =====
    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("file read failed ({path}): {message}")]
    FileRead { path: String, message: String },

    #[error("malformed row ({path}, line {line}): {message}")]
    MalformedRow {
        path: String,
        line: u64,
        message: String,
    },

    #[error("missing column {column} in {path}")]
    MissingColumn { path: String, column: String },

    // ===== Configuration =====
    #[error("invalid configuration: {0}")]
    Config(String),

    // ===== Execution =====
    #[error("background task failed: {0}")]
    Task(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("batch {batch} failed in state {state}: {source}")]
    BatchFailed {
        batch: usize,
        state: BatchState,
        #[source]
        source: Box<IngestError>,
    },

    #[error("run aborted after batch {batch} failed in state {state}")]
    RunAborted { batch: usize, state: BatchState },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl IngestError {
    /// Wraps a failure with the batch index and coordinator state
    pub fn in_state(self, batch: usize, state: BatchState) -> Self {
        match self {
            already @ IngestError::BatchFailed { .. } => already,
            other => IngestError::BatchFailed {
                batch,
                state,
                source: Box::new(other),
            },
        }
    }

    /// State reported by a wrapped failure
    pub fn failed_state(&self) -> Option<BatchState> {
        match self {
            IngestError::BatchFailed { state, .. } | IngestError::RunAborted { state, .. } => Some(*state),
            _ => None,
        }
    }

    /// Maps a csv error to a fatal row/file error with context
    pub fn from_csv(path: &str, err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        match err.kind() {
            csv::ErrorKind::Io(_) => IngestError::FileRead {
                path: path.to_string(),
                message: err.to_string(),
            },
            _ => IngestError::MalformedRow {
                path: path.to_string(),
                line,
                message: err.to_string(),
            },
        }
    }
}

impl From<tokio::task::JoinError> for IngestError {
    fn from(err: tokio::task::JoinError) -> Self {
        IngestError::Task(err.to_string())
    }
}

/// Result alias
pub type IngestResult<T> = Result<T, IngestError>;
