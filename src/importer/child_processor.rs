// ==========================================
// KBO Loader - Child processors
// ==========================================
// activity / address / contact / denomination rows → attachments.
// A processor never touches the owners: it resolves each row to an
// OwnerRef and returns (owner, child) pairs, which the arena applies
// after all four processors joined.
// ==========================================

use crate::domain::diagnostics::Diagnostics;
use crate::domain::enterprise::{Activity, Address, Contact, Denomination};
use crate::domain::row::RawRow;
use crate::domain::types::SourceFile;
use crate::importer::batch_arena::OwnerRef;
use crate::importer::entity_builder::EntityBuilder;
use crate::importer::field_mapper::FieldMapper;
use crate::importer::importer_trait::{ChildProcessor, CodeLookup};
use rayon::prelude::*;

// ===== Processors =====

pub struct ActivityProcessor;
pub struct AddressProcessor;
pub struct ContactProcessor;
pub struct DenominationProcessor;

impl ChildProcessor for ActivityProcessor {
    type Child = Activity;

    fn source(&self) -> SourceFile {
        SourceFile::Activity
    }

    fn build_child(&self, row: &RawRow, codes: &dyn CodeLookup) -> Activity {
        FieldMapper::map_activity(row, codes)
    }
}

impl ChildProcessor for AddressProcessor {
    type Child = Address;

    fn source(&self) -> SourceFile {
        SourceFile::Address
    }

    fn build_child(&self, row: &RawRow, codes: &dyn CodeLookup) -> Address {
        FieldMapper::map_address(row, codes)
    }
}

impl ChildProcessor for ContactProcessor {
    type Child = Contact;

    fn source(&self) -> SourceFile {
        SourceFile::Contact
    }

    fn build_child(&self, row: &RawRow, codes: &dyn CodeLookup) -> Contact {
        FieldMapper::map_contact(row, codes)
    }
}

impl ChildProcessor for DenominationProcessor {
    type Child = Denomination;

    fn source(&self) -> SourceFile {
        SourceFile::Denomination
    }

    fn build_child(&self, row: &RawRow, codes: &dyn CodeLookup) -> Denomination {
        FieldMapper::map_denomination(row, codes)
    }
}

// ==========================================
// Distribution
// ==========================================

/// Result of one processor pass
#[derive(Debug)]
pub struct ChildOutcome<C> {
    pub attachments: Vec<(OwnerRef, C)>, // file order
    pub diagnostics: Diagnostics,
}

impl<C> ChildOutcome<C> {
    pub fn attached(&self) -> usize {
        self.attachments.len()
    }
}

/// Resolves every row to its owner and builds the child value
///
/// # Parameters
/// - rows: rows already filtered to the batch key set
/// - resolve: key → owner (enterprise, then establishment, then branch)
///
/// Rows whose key resolves to no owner are dropped with a warning.
pub fn distribute<P, F>(
    processor: &P,
    rows: &[RawRow],
    codes: &dyn CodeLookup,
    resolve: &F,
) -> ChildOutcome<P::Child>
where
    P: ChildProcessor,
    F: Fn(&str) -> Option<OwnerRef> + Sync,
{
    let column = processor.owner_column();

    // Order-preserving parallel map; diagnostics are recorded afterwards
    let resolved: Vec<Result<(OwnerRef, P::Child), (String, u64)>> = rows
        .par_iter()
        .map(|row| {
            let key = EntityBuilder::key_of(row, column).unwrap_or_default();
            match resolve(&key) {
                Some(owner) => Ok((owner, processor.build_child(row, codes))),
                None => Err((key, row.line())),
            }
        })
        .collect();

    let mut diagnostics = Diagnostics::new();
    let mut attachments = Vec::with_capacity(resolved.len());
    for item in resolved {
        match item {
            Ok(attachment) => attachments.push(attachment),
            Err((key, line)) => diagnostics.record(
                processor.orphan_kind(),
                &key,
                processor.source(),
                Some(line),
                Some(format!("no owner for {} {}", column, key)),
            ),
        }
    }

    ChildOutcome {
        attachments,
        diagnostics,
    }
}

/// Filtered rows of the four child files of one batch
#[derive(Debug, Default)]
pub struct ChildRows {
    pub activities: Vec<RawRow>,
    pub addresses: Vec<RawRow>,
    pub contacts: Vec<RawRow>,
    pub denominations: Vec<RawRow>,
}

/// Outcomes of the four processors
pub struct DistributedChildren {
    pub activities: ChildOutcome<Activity>,
    pub addresses: ChildOutcome<Address>,
    pub contacts: ChildOutcome<Contact>,
    pub denominations: ChildOutcome<Denomination>,
}

/// Runs the four processors concurrently (they target disjoint containers)
pub fn distribute_all<F>(rows: &ChildRows, codes: &dyn CodeLookup, resolve: &F) -> DistributedChildren
where
    F: Fn(&str) -> Option<OwnerRef> + Sync,
{
    let ((activities, addresses), (contacts, denominations)) = rayon::join(
        || {
            rayon::join(
                || distribute(&ActivityProcessor, &rows.activities, codes, resolve),
                || distribute(&AddressProcessor, &rows.addresses, codes, resolve),
            )
        },
        || {
            rayon::join(
                || distribute(&ContactProcessor, &rows.contacts, codes, resolve),
                || distribute(&DenominationProcessor, &rows.denominations, codes, resolve),
            )
        },
    );

    DistributedChildren {
        activities,
        addresses,
        contacts,
        denominations,
    }
}
