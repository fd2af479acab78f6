// ==========================================
// KBO Loader - Structured diagnostics
// ==========================================
// Per-record problems are collected as records (kind, key, file)
// and returned with each batch, in addition to the warn! log line.
// ==========================================

use crate::domain::types::SourceFile;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

// ==========================================
// WarningKind
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningKind {
    OrphanChild,         // child row matched no enterprise/establishment/branch
    OrphanEstablishment, // establishment matched no enterprise of the batch
    OrphanBranch,        // branch matched no enterprise of the batch
    MissingKey,          // key column blank
    DuplicateKey,        // key already present in the batch arena
}

// ==========================================
// IngestWarning
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestWarning {
    pub kind: WarningKind,
    pub key: String,
    pub source: SourceFile,
    pub line: Option<u64>,
    pub detail: Option<String>,
}

/// Collector owned by one processing step; merged after the step joins
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<IngestWarning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a warning and logs it
    pub fn record(
        &mut self,
        kind: WarningKind,
        key: &str,
        source: SourceFile,
        line: Option<u64>,
        detail: Option<String>,
    ) {
        warn!(
            kind = ?kind,
            key = %key,
            source = %source,
            line = ?line,
            detail = detail.as_deref().unwrap_or(""),
            "record dropped"
        );
        self.warnings.push(IngestWarning {
            kind,
            key: key.to_string(),
            source,
            line,
            detail,
        });
    }

    pub fn merge(&mut self, other: Diagnostics) {
        self.warnings.extend(other.warnings);
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn into_warnings(self) -> Vec<IngestWarning> {
        self.warnings
    }
}

// ==========================================
// BatchReport - returned for every flushed batch
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub batch_index: usize,
    pub primary_rows: usize,
    pub establishment_rows: usize,
    pub branch_rows: usize,
    pub activity_rows: usize,
    pub address_rows: usize,
    pub contact_rows: usize,
    pub denomination_rows: usize,
    pub documents: usize,
    pub warnings: Vec<IngestWarning>,
    pub elapsed_ms: u64,
}

impl BatchReport {
    pub fn warning_count(&self, kind: WarningKind) -> usize {
        self.warnings.iter().filter(|w| w.kind == kind).count()
    }

    /// Warning counts per kind (persisted with the batch log)
    pub fn warning_histogram(&self) -> BTreeMap<WarningKind, usize> {
        let mut histogram = BTreeMap::new();
        for warning in &self.warnings {
            *histogram.entry(warning.kind).or_insert(0) += 1;
        }
        histogram
    }
}

// ==========================================
// RunSummary - final status of one run
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub batches: usize,
    pub primary_rows: usize,
    pub documents: usize,
    pub warnings: usize,
    pub elapsed_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_merge() {
        let mut left = Diagnostics::new();
        left.record(WarningKind::OrphanChild, "999999", SourceFile::Address, Some(3), None);

        let mut right = Diagnostics::new();
        right.record(WarningKind::OrphanBranch, "9.000.000.001", SourceFile::Branch, None, None);
        right.record(WarningKind::OrphanChild, "888888", SourceFile::Contact, Some(7), None);

        left.merge(right);
        assert_eq!(left.len(), 3);

        let report = BatchReport {
            warnings: left.into_warnings(),
            ..Default::default()
        };
        assert_eq!(report.warning_count(WarningKind::OrphanChild), 2);
        assert_eq!(report.warning_count(WarningKind::DuplicateKey), 0);

        let histogram = report.warning_histogram();
        assert_eq!(histogram.get(&WarningKind::OrphanBranch), Some(&1));
    }
}
