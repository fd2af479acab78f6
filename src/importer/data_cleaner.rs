// ==========================================
// KBO Loader - Data cleaner
// ==========================================
// NULL normalisation (empty / whitespace-only → None) and
// start-date normalisation (dd-mm-yyyy → ISO yyyy-mm-dd).
// ==========================================

use chrono::NaiveDate;

pub struct DataCleaner;

impl DataCleaner {
    /// Blank or whitespace-only → None, otherwise the trimmed value
    pub fn sanitize(value: Option<&str>) -> Option<String> {
        value.and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
    }

    /// Registry dates are dd-mm-yyyy; anything else non-blank is kept verbatim
    pub fn normalize_date(value: Option<&str>) -> Option<String> {
        Self::sanitize(value).map(|v| {
            NaiveDate::parse_from_str(&v, "%d-%m-%Y")
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or(v)
        })
    }
}
