// ==========================================
// KBO Loader - Domain types
// ==========================================
// Source files, owner kinds and the batch state machine
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// SourceFile - one of the eight export files
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceFile {
    Enterprise,    // primary file
    Establishment, // secondary, keyed by EnterpriseNumber
    Branch,        // secondary, keyed by EnterpriseNumber
    Activity,      // child file
    Address,       // child file
    Contact,       // child file
    Denomination,  // child file
    Code,          // lookup table, loaded once per run
}

impl SourceFile {
    pub const ALL: [SourceFile; 8] = [
        SourceFile::Enterprise,
        SourceFile::Establishment,
        SourceFile::Branch,
        SourceFile::Activity,
        SourceFile::Address,
        SourceFile::Contact,
        SourceFile::Denomination,
        SourceFile::Code,
    ];

    /// File name used by the registry export
    pub fn default_file_name(&self) -> &'static str {
        match self {
            SourceFile::Enterprise => "enterprise.csv",
            SourceFile::Establishment => "establishment.csv",
            SourceFile::Branch => "branch.csv",
            SourceFile::Activity => "activity.csv",
            SourceFile::Address => "address.csv",
            SourceFile::Contact => "contact.csv",
            SourceFile::Denomination => "denomination.csv",
            SourceFile::Code => "code.csv",
        }
    }

    /// Column that the per-batch key filter is applied to (None = never filtered)
    pub fn filter_column(&self) -> Option<&'static str> {
        use crate::importer::field_mapper::columns;
        match self {
            SourceFile::Enterprise | SourceFile::Code => None,
            SourceFile::Establishment | SourceFile::Branch => Some(columns::ENTERPRISE_NUMBER),
            SourceFile::Activity
            | SourceFile::Address
            | SourceFile::Contact
            | SourceFile::Denomination => Some(columns::ENTITY_NUMBER),
        }
    }

    /// Column holding the row's own registry key (owner files only)
    pub fn key_column(&self) -> Option<&'static str> {
        use crate::importer::field_mapper::columns;
        match self {
            SourceFile::Enterprise => Some(columns::ENTERPRISE_NUMBER),
            SourceFile::Establishment => Some(columns::ESTABLISHMENT_NUMBER),
            SourceFile::Branch => Some(columns::BRANCH_ID),
            _ => None,
        }
    }
}

impl fmt::Display for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFile::Enterprise => write!(f, "ENTERPRISE"),
            SourceFile::Establishment => write!(f, "ESTABLISHMENT"),
            SourceFile::Branch => write!(f, "BRANCH"),
            SourceFile::Activity => write!(f, "ACTIVITY"),
            SourceFile::Address => write!(f, "ADDRESS"),
            SourceFile::Contact => write!(f, "CONTACT"),
            SourceFile::Denomination => write!(f, "DENOMINATION"),
            SourceFile::Code => write!(f, "CODE"),
        }
    }
}

// ==========================================
// OwnerKind - which arena an owner lives in
// ==========================================
// Key values of the three kinds may collide textually,
// so an owner is always addressed by kind + slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OwnerKind {
    Enterprise,
    Establishment,
    Branch,
}

impl fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnerKind::Enterprise => write!(f, "ENTERPRISE"),
            OwnerKind::Establishment => write!(f, "ESTABLISHMENT"),
            OwnerKind::Branch => write!(f, "BRANCH"),
        }
    }
}

// ==========================================
// BatchState - coordinator state machine
// ==========================================
// LOADING_KEYS → LOADING_SECONDARY → BUILDING → DISTRIBUTING
//   → ASSEMBLING → FLUSHING → (LOADING_KEYS | DONE)
// Any error latches FAILED. DONE and FAILED are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchState {
    LoadingKeys,
    LoadingSecondary,
    Building,
    Distributing,
    Assembling,
    Flushing,
    Done,
    Failed,
}

impl BatchState {
    /// Successor within one batch; FLUSHING loops back to LOADING_KEYS
    pub fn next(&self) -> BatchState {
        match self {
            BatchState::LoadingKeys => BatchState::LoadingSecondary,
            BatchState::LoadingSecondary => BatchState::Building,
            BatchState::Building => BatchState::Distributing,
            BatchState::Distributing => BatchState::Assembling,
            BatchState::Assembling => BatchState::Flushing,
            BatchState::Flushing => BatchState::LoadingKeys,
            BatchState::Done => BatchState::Done,
            BatchState::Failed => BatchState::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchState::Done | BatchState::Failed)
    }
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchState::LoadingKeys => write!(f, "LOADING_KEYS"),
            BatchState::LoadingSecondary => write!(f, "LOADING_SECONDARY"),
            BatchState::Building => write!(f, "BUILDING"),
            BatchState::Distributing => write!(f, "DISTRIBUTING"),
            BatchState::Assembling => write!(f, "ASSEMBLING"),
            BatchState::Flushing => write!(f, "FLUSHING"),
            BatchState::Done => write!(f, "DONE"),
            BatchState::Failed => write!(f, "FAILED"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_state_cycle() {
        let mut state = BatchState::LoadingKeys;
        let mut seen = vec![state];
        for _ in 0..5 {
            state = state.next();
            seen.push(state);
        }
        assert_eq!(seen.last(), Some(&BatchState::Flushing));
        assert_eq!(BatchState::Flushing.next(), BatchState::LoadingKeys);
        assert_eq!(BatchState::Done.next(), BatchState::Done);
        assert_eq!(BatchState::Failed.next(), BatchState::Failed);
        assert!(BatchState::Failed.is_terminal());
        assert!(!BatchState::Flushing.is_terminal());
        assert_eq!(BatchState::Failed.to_string(), "FAILED");
    }

    #[test]
    fn test_filter_columns() {
        assert_eq!(SourceFile::Enterprise.filter_column(), None);
        assert_eq!(SourceFile::Branch.filter_column(), Some("EnterpriseNumber"));
        assert_eq!(SourceFile::Address.filter_column(), Some("EntityNumber"));
        assert_eq!(SourceFile::Branch.key_column(), Some("Id"));
        assert_eq!(SourceFile::Contact.key_column(), None);
    }

    #[test]
    fn test_display_matches_serde() {
        let json = serde_json::to_string(&BatchState::LoadingSecondary).unwrap();
        assert_eq!(json, format!("\"{}\"", BatchState::LoadingSecondary));
    }
}
