// ==========================================
// KBO Loader - Field mapper
// ==========================================
// Source column contracts + row → child value object mapping.
// Coded fields are resolved through the code table; blank values
// and unresolved codes normalise to None.
// ==========================================

use crate::domain::enterprise::{Activity, Address, Contact, Denomination};
use crate::domain::row::RawRow;
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::importer_trait::CodeLookup;

// ==========================================
// Column names of the registry export
// ==========================================
pub mod columns {
    // ===== Keys =====
    pub const ENTERPRISE_NUMBER: &str = "EnterpriseNumber";
    pub const ESTABLISHMENT_NUMBER: &str = "EstablishmentNumber";
    pub const BRANCH_ID: &str = "Id";
    pub const ENTITY_NUMBER: &str = "EntityNumber";

    // ===== enterprise.csv =====
    pub const STATUS: &str = "Status";
    pub const JURIDICAL_SITUATION: &str = "JuridicalSituation";
    pub const TYPE_OF_ENTERPRISE: &str = "TypeOfEnterprise";
    pub const JURIDICAL_FORM: &str = "JuridicalForm";
    pub const JURIDICAL_FORM_CAC: &str = "JuridicalFormCAC";
    pub const START_DATE: &str = "StartDate";

    // ===== activity.csv =====
    pub const ACTIVITY_GROUP: &str = "ActivityGroup";
    pub const NACE_VERSION: &str = "NaceVersion";
    pub const NACE_CODE: &str = "NaceCode";
    pub const CLASSIFICATION: &str = "Classification";

    // ===== address.csv =====
    pub const TYPE_OF_ADDRESS: &str = "TypeOfAddress";
    pub const ZIPCODE: &str = "Zipcode";
    pub const MUNICIPALITY_PREFIX: &str = "Municipality";
    pub const STREET_PREFIX: &str = "Street";
    pub const COUNTRY_PREFIX: &str = "Country";
    pub const HOUSE_NUMBER: &str = "HouseNumber";
    pub const BOX: &str = "Box";
    pub const EXTRA_ADDRESS_INFO: &str = "ExtraAddressInfo";
    pub const DATE_STRIKING_OFF: &str = "DateStrikingOff";

    // ===== contact.csv =====
    pub const ENTITY_CONTACT: &str = "EntityContact";
    pub const CONTACT_TYPE: &str = "ContactType";
    pub const VALUE: &str = "Value";

    // ===== denomination.csv =====
    pub const TYPE_OF_DENOMINATION: &str = "TypeOfDenomination";
    pub const DENOMINATION: &str = "Denomination";

    // ===== code.csv (Language is shared with denomination.csv) =====
    pub const CATEGORY: &str = "Category";
    pub const CODE: &str = "Code";
    pub const LANGUAGE: &str = "Language";
    pub const DESCRIPTION: &str = "Description";
}

// ==========================================
// Code table categories
// ==========================================
pub mod categories {
    pub const STATUS: &str = "Status";
    pub const JURIDICAL_SITUATION: &str = "JuridicalSituation";
    pub const TYPE_OF_ENTERPRISE: &str = "TypeOfEnterprise";
    pub const JURIDICAL_FORM: &str = "JuridicalForm";
    pub const ACTIVITY_GROUP: &str = "ActivityGroup";
    pub const CLASSIFICATION: &str = "Classification";
    pub const TYPE_OF_ADDRESS: &str = "TypeOfAddress";
    pub const CONTACT_TYPE: &str = "ContactType";
    pub const ENTITY_CONTACT: &str = "EntityContact";
    pub const TYPE_OF_DENOMINATION: &str = "TypeOfDenomination";
    pub const LANGUAGE: &str = "Language";
    /// NACE descriptions live under "Nace" + version (e.g. "Nace2008")
    pub const NACE_PREFIX: &str = "Nace";
}

/// Official languages tried after the target language for localised columns
const FALLBACK_LANGUAGES: [&str; 2] = ["FR", "NL"];

pub struct FieldMapper;

impl FieldMapper {
    // ===== Helpers =====

    /// Sanitised raw value of a column
    pub fn text(row: &RawRow, column: &str) -> Option<String> {
        DataCleaner::sanitize(row.get(column))
    }

    /// Resolved description of a coded column; None when unresolved
    pub fn coded(row: &RawRow, column: &str, category: &str, codes: &dyn CodeLookup) -> Option<String> {
        let code = row.get(column)?;
        DataCleaner::sanitize(codes.describe(category, code))
    }

    /// Resolved description, falling back to the raw code
    pub fn coded_or_raw(
        row: &RawRow,
        column: &str,
        category: &str,
        codes: &dyn CodeLookup,
    ) -> Option<String> {
        Self::coded(row, column, category, codes).or_else(|| Self::text(row, column))
    }

    /// Localised column such as MunicipalityFR / MunicipalityNL
    pub fn localized(row: &RawRow, prefix: &str, language: &str) -> Option<String> {
        std::iter::once(language)
            .chain(FALLBACK_LANGUAGES.iter().copied())
            .find_map(|lang| Self::text(row, &format!("{}{}", prefix, lang)))
    }

    // ===== Child mappers =====

    pub fn map_activity(row: &RawRow, codes: &dyn CodeLookup) -> Activity {
        let nace = Self::text(row, columns::NACE_VERSION)
            .map(|version| format!("{}{}", categories::NACE_PREFIX, version));
        let nace_description = match (&nace, row.get(columns::NACE_CODE)) {
            (Some(category), Some(code)) => DataCleaner::sanitize(codes.describe(category, code)),
            _ => None,
        };

        Activity {
            nace,
            nace_code: Self::text(row, columns::NACE_CODE),
            nace_description,
            activity_group: Self::coded(row, columns::ACTIVITY_GROUP, categories::ACTIVITY_GROUP, codes),
            classification: Self::coded(row, columns::CLASSIFICATION, categories::CLASSIFICATION, codes),
        }
    }

    pub fn map_address(row: &RawRow, codes: &dyn CodeLookup) -> Address {
        let language = codes.target_language();
        Address {
            type_of_address: Self::coded_or_raw(
                row,
                columns::TYPE_OF_ADDRESS,
                categories::TYPE_OF_ADDRESS,
                codes,
            ),
            zipcode: Self::text(row, columns::ZIPCODE),
            municipality: Self::localized(row, columns::MUNICIPALITY_PREFIX, language),
            street: Self::localized(row, columns::STREET_PREFIX, language),
            country: Self::localized(row, columns::COUNTRY_PREFIX, language),
            house_number: Self::text(row, columns::HOUSE_NUMBER),
            r#box: Self::text(row, columns::BOX),
            extra_address_info: Self::text(row, columns::EXTRA_ADDRESS_INFO),
            date_striking_off: DataCleaner::normalize_date(row.get(columns::DATE_STRIKING_OFF)),
        }
    }

    pub fn map_contact(row: &RawRow, codes: &dyn CodeLookup) -> Contact {
        Contact {
            entity_contact: Self::coded_or_raw(
                row,
                columns::ENTITY_CONTACT,
                categories::ENTITY_CONTACT,
                codes,
            ),
            contact_type: Self::coded_or_raw(row, columns::CONTACT_TYPE, categories::CONTACT_TYPE, codes),
            value: Self::text(row, columns::VALUE),
        }
    }

    pub fn map_denomination(row: &RawRow, codes: &dyn CodeLookup) -> Denomination {
        Denomination {
            language: Self::coded_or_raw(row, columns::LANGUAGE, categories::LANGUAGE, codes),
            type_of_denomination: Self::coded_or_raw(
                row,
                columns::TYPE_OF_DENOMINATION,
                categories::TYPE_OF_DENOMINATION,
                codes,
            ),
            denomination: Self::text(row, columns::DENOMINATION),
        }
    }
}
