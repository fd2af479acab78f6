// ==========================================
// Test helpers
// ==========================================
// Writes a small registry export (the eight CSV files) into a
// temporary directory and runs the pipeline against it.
// ==========================================

#![allow(dead_code)]

use kbo_loader::{run_pipeline, IngestResult, LoaderConfig, MemoryDocumentSink, RunSummary};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

// ===== Keys of the standard export =====
pub const E1: &str = "0200.065.765";
pub const E2: &str = "0200.068.636";
pub const E3: &str = "0201.310.929";
pub const S1: &str = "2.000.000.339"; // establishment of E1
pub const S2: &str = "2.000.000.471"; // establishment of E3
pub const B1: &str = "9.000.000.001"; // branch of E2

pub const ENTERPRISE_CSV: &str = r#""EnterpriseNumber","Status","JuridicalSituation","TypeOfEnterprise","JuridicalForm","JuridicalFormCAC","StartDate"
"0200.065.765","01","000","2","014","","09-08-1960"
"0200.068.636","AC","000","2","","","  "
"0201.310.929","AC","012","1","   ","","01-01-2000"
"#;

pub const ESTABLISHMENT_CSV: &str = r#""EstablishmentNumber","StartDate","EnterpriseNumber"
"2.000.000.339","01-11-1974","0200.065.765"
"2.999.999.999","01-01-2001","0999.999.999"
"2.000.000.471","01-09-1980","0201.310.929"
"#;

pub const BRANCH_CSV: &str = r#""Id","StartDate","EnterpriseNumber"
"9.000.000.001","01-01-2015","0200.068.636"
"#;

pub const ACTIVITY_CSV: &str = r#""EntityNumber","ActivityGroup","NaceVersion","NaceCode","Classification"
"0200.065.765","001","2008","62010","MAIN"
"2.000.000.339","001","2008","62020","SECO"
"2.000.000.471","001","2008","62010","MAIN"
"0999.999.999","001","2008","62010","MAIN"
"#;

pub const ADDRESS_CSV: &str = r#""EntityNumber","TypeOfAddress","CountryNL","CountryFR","Zipcode","MunicipalityNL","MunicipalityFR","StreetNL","StreetFR","HouseNumber","Box","ExtraAddressInfo","DateStrikingOff"
"0200.065.765","REGO","","","9000","Gent","Gand","Kouter","Kouter","1","","",""
"999999","REGO","","","1000","Brussel","Bruxelles","Wetstraat","Rue de la Loi","16","","",""
"2.000.000.339","BAET","","","9000","Gent","Gand","Veldstraat","Rue des Champs","5","B2","",""
"#;

pub const CONTACT_CSV: &str = r#""EntityNumber","EntityContact","ContactType","Value"
"0200.068.636","ENT","EMAIL","info@example.be"
"9.000.000.001","BRA","TEL","02/123.45.67"
"#;

pub const DENOMINATION_CSV: &str = r#""EntityNumber","Language","TypeOfDenomination","Denomination"
"0200.065.765","2","001","Intercommunale Maritime"
"2.000.000.339","2","001","IM Gent"
"0200.068.636","1","001","   "
"0201.310.929","2","002","ACME"
"#;

pub const CODE_CSV: &str = r#""Category","Code","Language","Description"
"Status","01","FR","Actif"
"Status","01","NL","Actief"
"Status","AC","FR","Actif"
"Status","AC","NL","Actief"
"JuridicalSituation","000","FR","Situation normale"
"TypeOfEnterprise","1","FR","Personne physique"
"TypeOfEnterprise","2","FR","Personne morale"
"JuridicalForm","014","FR","Société anonyme"
"ActivityGroup","001","FR","Activités TVA"
"Nace2008","62010","FR","Programmation informatique"
"Nace2008","62020","FR","Conseil informatique"
"Classification","MAIN","FR","Principale"
"Classification","SECO","FR","Secondaire"
"TypeOfAddress","REGO","FR","Siège"
"EntityContact","ENT","FR","Entité"
"ContactType","EMAIL","FR","E-mail"
"TypeOfDenomination","001","FR","Dénomination"
"TypeOfDenomination","002","FR","Abréviation"
"Language","1","FR","Français"
"Language","2","FR","Néerlandais"
"#;

/// Temporary export directory; removed on drop
pub struct RegistryFixture {
    pub dir: TempDir,
}

impl RegistryFixture {
    /// The standard export above
    pub fn standard() -> Self {
        Self::with_overrides(&[])
    }

    /// Standard export with some files replaced, as (file name, content)
    pub fn with_overrides(overrides: &[(&str, &str)]) -> Self {
        let fixture = Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        };
        let files = [
            ("enterprise.csv", ENTERPRISE_CSV),
            ("establishment.csv", ESTABLISHMENT_CSV),
            ("branch.csv", BRANCH_CSV),
            ("activity.csv", ACTIVITY_CSV),
            ("address.csv", ADDRESS_CSV),
            ("contact.csv", CONTACT_CSV),
            ("denomination.csv", DENOMINATION_CSV),
            ("code.csv", CODE_CSV),
        ];
        for (name, content) in files {
            let content = overrides
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, c)| *c)
                .unwrap_or(content);
            fixture.write(name, content);
        }
        fixture
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, name: &str, content: &str) {
        fs::write(self.dir.path().join(name), content).expect("Failed to write fixture");
    }

    pub fn config(&self, batch_size: usize) -> LoaderConfig {
        LoaderConfig {
            data_dir: self.path().to_path_buf(),
            db_path: self.path().join("kbo.db").to_string_lossy().into_owned(),
            batch_size,
            ..Default::default()
        }
    }
}

/// Runs the pipeline into a fresh in-memory sink
pub async fn run_in_memory(config: LoaderConfig) -> (IngestResult<RunSummary>, Arc<MemoryDocumentSink>) {
    let sink = Arc::new(MemoryDocumentSink::new());
    let result = run_pipeline(config, sink.clone()).await;
    (result, sink)
}
