// ==========================================
// KBO Loader - Per-batch arena
// ==========================================
// Owner maps of one batch. Built once in BUILDING, read-only by
// identity afterwards, dropped as a whole at FLUSHING.
// Owners are addressed by (kind, slot): the three key spaces can
// collide textually, so a key alone never identifies an owner.
// ==========================================

use crate::domain::diagnostics::{Diagnostics, WarningKind};
use crate::domain::enterprise::{ChildContainers, ChildRecord, Enterprise, PendingUnit};
use crate::domain::row::RawRow;
use crate::domain::types::{OwnerKind, SourceFile};
use crate::importer::entity_builder::EntityBuilder;
use std::collections::HashMap;

// ==========================================
// OwnerRef
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerRef {
    pub kind: OwnerKind,
    pub slot: usize,
}

// ==========================================
// KeyedArena - insertion-ordered, key-indexed storage
// ==========================================
#[derive(Debug)]
pub struct KeyedArena<T> {
    items: Vec<(String, T)>,
    index: HashMap<String, usize>,
}

impl<T> Default for KeyedArena<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T> KeyedArena<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Inserts under a fresh key; hands the item back if the key is taken
    pub fn insert(&mut self, key: String, item: T) -> Result<usize, T> {
        if self.index.contains_key(&key) {
            return Err(item);
        }
        let slot = self.items.len();
        self.index.insert(key.clone(), slot);
        self.items.push((key, item));
        Ok(slot)
    }

    pub fn slot_of(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn get(&self, slot: usize) -> Option<&T> {
        self.items.get(slot).map(|(_, item)| item)
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut T> {
        self.items.get_mut(slot).map(|(_, item)| item)
    }

    pub fn by_key_mut(&mut self, key: &str) -> Option<&mut T> {
        let slot = self.slot_of(key)?;
        self.get_mut(slot)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Entries in insertion order; the arena is consumed
    pub fn into_entries(self) -> impl Iterator<Item = (String, T)> {
        self.items.into_iter()
    }
}

// ==========================================
// BatchArena
// ==========================================
#[derive(Debug, Default)]
pub struct BatchArena {
    pub enterprises: KeyedArena<Enterprise>,
    pub establishments: KeyedArena<PendingUnit>,
    pub branches: KeyedArena<PendingUnit>,
}

impl BatchArena {
    /// BUILDING: shells for every primary / establishment / branch row
    ///
    /// Blank keys are MissingKey, repeated keys DuplicateKey; both rows
    /// are dropped and the first occurrence is kept.
    pub fn build(
        builder: &EntityBuilder<'_>,
        primary: &[RawRow],
        establishments: &[RawRow],
        branches: &[RawRow],
    ) -> (Self, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let mut arena = Self {
            enterprises: KeyedArena::with_capacity(primary.len()),
            establishments: KeyedArena::with_capacity(establishments.len()),
            branches: KeyedArena::with_capacity(branches.len()),
        };

        for row in primary {
            let enterprise = builder.build(row);
            let key = enterprise.entity_number.clone();
            stage(&mut arena.enterprises, key, enterprise, row, SourceFile::Enterprise, &mut diagnostics);
        }
        for row in establishments {
            let unit = builder.build_establishment(row);
            let key = unit.key.clone();
            stage(&mut arena.establishments, key, unit, row, SourceFile::Establishment, &mut diagnostics);
        }
        for row in branches {
            let unit = builder.build_branch(row);
            let key = unit.key.clone();
            stage(&mut arena.branches, key, unit, row, SourceFile::Branch, &mut diagnostics);
        }

        (arena, diagnostics)
    }

    /// Owner lookup order: enterprise → establishment → branch
    pub fn resolve_owner(&self, key: &str) -> Option<OwnerRef> {
        let found = |kind, slot: Option<usize>| slot.map(|slot| OwnerRef { kind, slot });
        found(OwnerKind::Enterprise, self.enterprises.slot_of(key))
            .or_else(|| found(OwnerKind::Establishment, self.establishments.slot_of(key)))
            .or_else(|| found(OwnerKind::Branch, self.branches.slot_of(key)))
    }

    pub fn children_mut(&mut self, owner: OwnerRef) -> Option<&mut ChildContainers> {
        match owner.kind {
            OwnerKind::Enterprise => self.enterprises.get_mut(owner.slot).map(|e| &mut e.children),
            OwnerKind::Establishment => {
                self.establishments.get_mut(owner.slot).map(|u| &mut u.unit.children)
            }
            OwnerKind::Branch => self.branches.get_mut(owner.slot).map(|u| &mut u.unit.children),
        }
    }

    /// Appends resolved children to their owners, in list order
    ///
    /// # Returns
    /// Number of children attached
    pub fn apply<C: ChildRecord>(&mut self, attachments: Vec<(OwnerRef, C)>) -> usize {
        let mut attached = 0;
        for (owner, child) in attachments {
            if let Some(children) = self.children_mut(owner) {
                C::container_mut(children).push(child);
                attached += 1;
            }
        }
        attached
    }
}

fn stage<T>(
    arena: &mut KeyedArena<T>,
    key: String,
    item: T,
    row: &RawRow,
    source: SourceFile,
    diagnostics: &mut Diagnostics,
) {
    if key.is_empty() {
        diagnostics.record(WarningKind::MissingKey, "", source, Some(row.line()), None);
        return;
    }
    if arena.insert(key.clone(), item).is_err() {
        diagnostics.record(
            WarningKind::DuplicateKey,
            &key,
            source,
            Some(row.line()),
            Some("first occurrence kept".to_string()),
        );
    }
}
