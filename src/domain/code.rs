// ==========================================
// KBO Loader - Code table entry
// ==========================================

use serde::{Deserialize, Serialize};

/// One row of code.csv: (category, code, language) → description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeEntry {
    pub category: String,    // e.g. "Status", "JuridicalForm", "Nace2008"
    pub code: String,        // e.g. "AC", "014"
    pub language: String,    // "FR" / "NL" / "DE" / "EN"
    pub description: String, // human readable label
}

impl CodeEntry {
    pub fn new(category: &str, code: &str, language: &str, description: &str) -> Self {
        Self {
            category: category.to_string(),
            code: code.to_string(),
            language: language.to_string(),
            description: description.to_string(),
        }
    }
}
