// ==========================================
// KBO Loader - Domain layer
// ==========================================
// Documents, rows, code entries, diagnostics and enums.
// No I/O and no pipeline logic here.
// ==========================================

pub mod code;
pub mod diagnostics;
pub mod enterprise;
pub mod row;
pub mod types;

pub use code::CodeEntry;
pub use diagnostics::{BatchReport, Diagnostics, IngestWarning, RunSummary, WarningKind};
pub use enterprise::{
    Activity, Address, Branch, ChildContainers, ChildRecord, Contact, Denomination, Enterprise,
    Establishment, PendingUnit, UnitDocument,
};
pub use row::{Headers, RawRow};
pub use types::{BatchState, OwnerKind, SourceFile};
