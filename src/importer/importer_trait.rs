// ==========================================
// KBO Loader - Importer traits
// ==========================================
// Seams between the pipeline stages (no implementations here)
// ==========================================

use crate::domain::diagnostics::WarningKind;
use crate::domain::enterprise::ChildRecord;
use crate::domain::row::RawRow;
use crate::domain::types::SourceFile;

// ==========================================
// CodeLookup
// ==========================================
// Implementor: CodeResolver
pub trait CodeLookup: Send + Sync {
    /// Description for (category, code, language); None when absent
    fn resolve(&self, category: &str, code: &str, language: &str) -> Option<&str>;

    /// Language the pipeline resolves codes in
    fn target_language(&self) -> &str;

    /// Resolution in the target language
    fn describe(&self, category: &str, code: &str) -> Option<&str> {
        self.resolve(category, code, self.target_language())
    }
}

// ==========================================
// ChildProcessor
// ==========================================
// Implementors: ActivityProcessor, AddressProcessor,
// ContactProcessor, DenominationProcessor
pub trait ChildProcessor: Send + Sync {
    type Child: ChildRecord;

    /// File the rows come from
    fn source(&self) -> SourceFile;

    /// Foreign-key column naming the owner
    fn owner_column(&self) -> &'static str {
        crate::importer::field_mapper::columns::ENTITY_NUMBER
    }

    /// Builds the child value object from one row
    fn build_child(&self, row: &RawRow, codes: &dyn CodeLookup) -> Self::Child;

    /// Kind recorded when no owner matches
    fn orphan_kind(&self) -> WarningKind {
        WarningKind::OrphanChild
    }
}
