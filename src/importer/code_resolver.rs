// ==========================================
// KBO Loader - Code resolver
// ==========================================
// Loads code.csv once per run and answers
// (category, code, language) → description lookups in O(1).
// Shared read-only across all batches.
// ==========================================

use crate::domain::code::CodeEntry;
use crate::domain::row::RawRow;
use crate::importer::error::IngestResult;
use crate::importer::field_mapper::columns;
use crate::importer::file_parser::RowSource;
use crate::importer::importer_trait::CodeLookup;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

type ByLanguage = HashMap<String, String>;
type ByCode = HashMap<String, ByLanguage>;

pub struct CodeResolver {
    index: HashMap<String, ByCode>, // category → code → language → description
    language: String,
    entries: usize,
}

impl CodeResolver {
    /// Parses the whole code table
    ///
    /// # Parameters
    /// - path: code.csv
    /// - delimiter: field delimiter of the export
    /// - language: target locale for `describe` (e.g. "FR")
    pub fn load(path: &Path, delimiter: u8, language: &str) -> IngestResult<Self> {
        let source = RowSource::open(path, delimiter, None)?;
        source.require_columns(&[
            columns::CATEGORY,
            columns::CODE,
            columns::LANGUAGE,
            columns::DESCRIPTION,
        ])?;

        let mut resolver = Self::empty(language);
        for row in source {
            resolver.insert(Self::entry_from_row(&row?));
        }

        info!(
            entries = resolver.entries,
            categories = resolver.index.len(),
            language = %resolver.language,
            "code table loaded"
        );
        Ok(resolver)
    }

    pub fn from_entries<I>(entries: I, language: &str) -> Self
    where
        I: IntoIterator<Item = CodeEntry>,
    {
        let mut resolver = Self::empty(language);
        for entry in entries {
            resolver.insert(entry);
        }
        resolver
    }

    fn empty(language: &str) -> Self {
        Self {
            index: HashMap::new(),
            language: language.trim().to_string(),
            entries: 0,
        }
    }

    fn entry_from_row(row: &RawRow) -> CodeEntry {
        CodeEntry::new(
            row.get_or_empty(columns::CATEGORY),
            row.get_or_empty(columns::CODE),
            row.get_or_empty(columns::LANGUAGE),
            row.get_or_empty(columns::DESCRIPTION),
        )
    }

    /// First entry for a (category, code, language) wins
    fn insert(&mut self, entry: CodeEntry) {
        let slot = self
            .index
            .entry(entry.category)
            .or_default()
            .entry(entry.code)
            .or_default();

        if slot.contains_key(&entry.language) {
            debug!(language = %entry.language, "duplicate code entry ignored");
            return;
        }
        slot.insert(entry.language, entry.description);
        self.entries += 1;
    }

    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }
}

impl CodeLookup for CodeResolver {
    fn resolve(&self, category: &str, code: &str, language: &str) -> Option<&str> {
        let code = code.trim();
        if code.is_empty() {
            return None;
        }
        self.index
            .get(category)?
            .get(code)?
            .get(language)
            .map(String::as_str)
    }

    fn target_language(&self) -> &str {
        &self.language
    }
}
