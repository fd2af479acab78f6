// ==========================================
// KBO Loader - Hierarchy assembler
// ==========================================
// Folds establishments, then branches, into their enterprise.
// Runs after every child processor has been applied: a unit is
// moved into its enterprise and never touched again.
// ==========================================

use crate::domain::diagnostics::{Diagnostics, WarningKind};
use crate::domain::enterprise::{Enterprise, PendingUnit, UnitDocument};
use crate::domain::types::SourceFile;
use crate::importer::batch_arena::KeyedArena;
use std::collections::BTreeMap;

/// Folds establishments into `enterprises[..].establishments`
///
/// # Returns
/// Number of establishments folded
pub fn attach_establishments(
    enterprises: &mut KeyedArena<Enterprise>,
    establishments: KeyedArena<PendingUnit>,
    diagnostics: &mut Diagnostics,
) -> usize {
    fold(
        enterprises,
        establishments,
        |enterprise| &mut enterprise.establishments,
        WarningKind::OrphanEstablishment,
        SourceFile::Establishment,
        diagnostics,
    )
}

/// Folds branches into `enterprises[..].branches`
pub fn attach_branches(
    enterprises: &mut KeyedArena<Enterprise>,
    branches: KeyedArena<PendingUnit>,
    diagnostics: &mut Diagnostics,
) -> usize {
    fold(
        enterprises,
        branches,
        |enterprise| &mut enterprise.branches,
        WarningKind::OrphanBranch,
        SourceFile::Branch,
        diagnostics,
    )
}

fn fold<F>(
    enterprises: &mut KeyedArena<Enterprise>,
    units: KeyedArena<PendingUnit>,
    container: F,
    orphan: WarningKind,
    source: SourceFile,
    diagnostics: &mut Diagnostics,
) -> usize
where
    F: Fn(&mut Enterprise) -> &mut BTreeMap<String, UnitDocument>,
{
    let mut folded = 0;
    for (_, pending) in units.into_entries() {
        let line = pending.line;
        // back-reference is dropped here
        let (key, owner, unit) = pending.into_parts();
        match enterprises.by_key_mut(&owner) {
            Some(enterprise) => {
                container(enterprise).insert(key, unit);
                folded += 1;
            }
            None => diagnostics.record(
                orphan,
                &key,
                source,
                Some(line),
                Some(format!("enterprise {} not in batch", owner)),
            ),
        }
    }
    folded
}
