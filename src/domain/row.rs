// ==========================================
// KBO Loader - Raw row
// ==========================================
// One physical row of a source file: column name → trimmed string.
// No type coercion happens at this level.
// ==========================================

use std::sync::Arc;

/// Column headers shared by every row of one file
pub type Headers = Arc<[String]>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    headers: Headers,
    values: Vec<String>,
    line: u64, // physical line in the source file (1-based, header = 1)
}

impl RawRow {
    pub fn new(headers: Headers, values: Vec<String>, line: u64) -> Self {
        Self {
            headers,
            values,
            line,
        }
    }

    /// Value of a column, None when the file has no such column
    pub fn get(&self, column: &str) -> Option<&str> {
        self.headers
            .iter()
            .position(|h| h == column)
            .and_then(|idx| self.values.get(idx))
            .map(String::as_str)
    }

    /// Value of a column, empty string when absent
    pub fn get_or_empty(&self, column: &str) -> &str {
        self.get(column).unwrap_or("")
    }

    pub fn line(&self) -> u64 {
        self.line
    }
}

/// Builds a row from literal pairs; used by tests across the crate
#[cfg(test)]
pub(crate) fn row_of(pairs: &[(&str, &str)]) -> RawRow {
    let headers: Headers = pairs.iter().map(|(h, _)| h.to_string()).collect();
    let values = pairs.iter().map(|(_, v)| v.to_string()).collect();
    RawRow::new(headers, values, 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_by_column_name() {
        let row = row_of(&[("EntityNumber", "0200.065.765"), ("Value", "info@example.be")]);
        assert_eq!(row.get("Value"), Some("info@example.be"));
        assert_eq!(row.get("Missing"), None);
        assert_eq!(row.get_or_empty("Missing"), "");
    }
}
