// ==========================================
// KBO Loader - Entity builder
// ==========================================
// Primary row → enterprise shell; branch/establishment row → pending
// unit. Pure: no I/O, child containers start empty.
// ==========================================

use crate::domain::enterprise::{Enterprise, PendingUnit, UnitDocument};
use crate::domain::row::RawRow;
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::field_mapper::{categories, columns, FieldMapper};
use crate::importer::importer_trait::CodeLookup;

pub struct EntityBuilder<'a> {
    codes: &'a dyn CodeLookup,
}

impl<'a> EntityBuilder<'a> {
    pub fn new(codes: &'a dyn CodeLookup) -> Self {
        Self { codes }
    }

    /// Trimmed key value; None when blank
    pub fn key_of(row: &RawRow, column: &str) -> Option<String> {
        FieldMapper::text(row, column)
    }

    /// Builds the enterprise shell for one enterprise.csv row
    ///
    /// # Rules
    /// - coded scalars resolved in the target language, unresolved → None
    /// - juridical_form_cac kept raw
    /// - start_date normalised to ISO when it is dd-mm-yyyy
    pub fn build(&self, row: &RawRow) -> Enterprise {
        let key = Self::key_of(row, columns::ENTERPRISE_NUMBER).unwrap_or_default();
        let codes = self.codes;

        let mut enterprise = Enterprise::new(key);
        enterprise.status = FieldMapper::coded(row, columns::STATUS, categories::STATUS, codes);
        enterprise.juridical_situation = FieldMapper::coded(
            row,
            columns::JURIDICAL_SITUATION,
            categories::JURIDICAL_SITUATION,
            codes,
        );
        enterprise.type_of_enterprise = FieldMapper::coded(
            row,
            columns::TYPE_OF_ENTERPRISE,
            categories::TYPE_OF_ENTERPRISE,
            codes,
        );
        enterprise.juridical_form =
            FieldMapper::coded(row, columns::JURIDICAL_FORM, categories::JURIDICAL_FORM, codes);
        enterprise.juridical_form_cac = FieldMapper::text(row, columns::JURIDICAL_FORM_CAC);
        enterprise.start_date = DataCleaner::normalize_date(row.get(columns::START_DATE));
        enterprise
    }

    /// establishment.csv row → pending establishment
    pub fn build_establishment(&self, row: &RawRow) -> PendingUnit {
        Self::build_unit(row, columns::ESTABLISHMENT_NUMBER)
    }

    /// branch.csv row → pending branch
    pub fn build_branch(&self, row: &RawRow) -> PendingUnit {
        Self::build_unit(row, columns::BRANCH_ID)
    }

    fn build_unit(row: &RawRow, key_column: &str) -> PendingUnit {
        PendingUnit {
            key: Self::key_of(row, key_column).unwrap_or_default(),
            enterprise_number: Self::key_of(row, columns::ENTERPRISE_NUMBER).unwrap_or_default(),
            line: row.line(),
            unit: UnitDocument {
                start_date: DataCleaner::normalize_date(row.get(columns::START_DATE)),
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::code::CodeEntry;
    use crate::domain::row::row_of;
    use crate::importer::code_resolver::CodeResolver;

    fn codes() -> CodeResolver {
        CodeResolver::from_entries(
            vec![
                CodeEntry::new("Status", "01", "FR", "Actif"),
                CodeEntry::new("Status", "AC", "FR", "Actif"),
                CodeEntry::new("JuridicalSituation", "000", "FR", "Situation normale"),
                CodeEntry::new("TypeOfEnterprise", "2", "FR", "Personne morale"),
                CodeEntry::new("JuridicalForm", "014", "FR", "Société anonyme"),
                CodeEntry::new("JuridicalForm", "610", "FR", "Société coopérative"),
            ],
            "FR",
        )
    }

    #[test]
    fn test_status_resolved_through_code_table() {
        let codes = codes();
        let builder = EntityBuilder::new(&codes);
        let row = row_of(&[("EnterpriseNumber", "0200.065.765"), ("Status", "01")]);
        let enterprise = builder.build(&row);
        assert_eq!(enterprise.entity_number, "0200.065.765");
        assert_eq!(enterprise.status.as_deref(), Some("Actif"));
    }

    #[test]
    fn test_build_full_row() {
        let codes = codes();
        let builder = EntityBuilder::new(&codes);
        let row = row_of(&[
            ("EnterpriseNumber", "0200.065.765"),
            ("Status", "AC"),
            ("JuridicalSituation", "000"),
            ("TypeOfEnterprise", "2"),
            ("JuridicalForm", "014"),
            ("JuridicalFormCAC", "610"),
            ("StartDate", "09-08-1960"),
        ]);
        let enterprise = builder.build(&row);
        assert_eq!(enterprise.juridical_situation.as_deref(), Some("Situation normale"));
        assert_eq!(enterprise.type_of_enterprise.as_deref(), Some("Personne morale"));
        assert_eq!(enterprise.juridical_form.as_deref(), Some("Société anonyme"));
        assert_eq!(enterprise.juridical_form_cac.as_deref(), Some("610"));
        assert_eq!(enterprise.start_date.as_deref(), Some("1960-08-09"));
        assert_eq!(enterprise.children.total(), 0);
        assert!(enterprise.establishments.is_empty());
        assert!(enterprise.branches.is_empty());
    }

    #[test]
    fn test_blank_and_unknown_fields_are_null() {
        let codes = codes();
        let builder = EntityBuilder::new(&codes);
        let row = row_of(&[
            ("EnterpriseNumber", "0200.065.765"),
            ("Status", "   "),
            ("JuridicalSituation", "999"),
            ("TypeOfEnterprise", ""),
            ("JuridicalForm", "xyz"),
            ("StartDate", " "),
        ]);
        let enterprise = builder.build(&row);
        assert_eq!(enterprise.status, None);
        assert_eq!(enterprise.juridical_situation, None);
        assert_eq!(enterprise.type_of_enterprise, None);
        assert_eq!(enterprise.juridical_form, None);
        assert_eq!(enterprise.juridical_form_cac, None);
        assert_eq!(enterprise.start_date, None);
    }

    #[test]
    fn test_juridical_form_cac_keeps_raw_code() {
        let codes = CodeResolver::from_entries(Vec::new(), "FR");
        let builder = EntityBuilder::new(&codes);
        let row = row_of(&[("EnterpriseNumber", "E1"), ("JuridicalFormCAC", " 610 ")]);
        let enterprise = builder.build(&row);
        assert_eq!(enterprise.juridical_form_cac.as_deref(), Some("610"));
        assert_eq!(enterprise.juridical_form, None);
    }

    #[test]
    fn test_build_units() {
        let codes = codes();
        let builder = EntityBuilder::new(&codes);

        let establishment = builder.build_establishment(&row_of(&[
            ("EstablishmentNumber", "2.000.000.339"),
            ("StartDate", "01-11-1974"),
            ("EnterpriseNumber", "0403.449.823"),
        ]));
        assert_eq!(establishment.key, "2.000.000.339");
        assert_eq!(establishment.enterprise_number, "0403.449.823");
        assert_eq!(establishment.unit.start_date.as_deref(), Some("1974-11-01"));
        assert_eq!(establishment.line, 2);

        let branch = builder.build_branch(&row_of(&[
            ("Id", "9.000.000.001"),
            ("StartDate", ""),
            ("EnterpriseNumber", "0200.065.765"),
        ]));
        assert_eq!(branch.key, "9.000.000.001");
        assert_eq!(branch.unit.start_date, None);
    }
}
