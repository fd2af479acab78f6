// ==========================================
// KBO Loader - Streaming row source
// ==========================================
// Reads one delimited file as a lazy, non-restartable sequence of
// RawRow. An optional key filter is tested per record as it arrives,
// so only relevant rows are ever materialised.
// ==========================================

use crate::domain::row::{Headers, RawRow};
use crate::importer::error::{IngestError, IngestResult};
use csv::{Reader, ReaderBuilder, StringRecord, Trim};
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Registry keys relevant to the current batch
pub type KeySet = HashSet<String>;

// ==========================================
// RowFilter - key-membership predicate
// ==========================================
#[derive(Debug, Clone)]
pub struct RowFilter {
    column: String,
    keys: Arc<KeySet>,
}

impl RowFilter {
    pub fn new(column: impl Into<String>, keys: Arc<KeySet>) -> Self {
        Self {
            column: column.into(),
            keys,
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    /// An empty key set lets every row through
    pub fn matches(&self, value: &str) -> bool {
        self.keys.is_empty() || self.keys.contains(value)
    }
}

// ==========================================
// RowSource
// ==========================================
pub struct RowSource {
    path: String,
    reader: Reader<File>,
    headers: Headers,
    filter: Option<(usize, RowFilter)>,
    record: StringRecord,
    finished: bool,
    rows_read: u64,
    rows_kept: u64,
}

impl RowSource {
    /// Opens a file and reads its header line
    ///
    /// # Errors
    /// - FileNotFound: the path does not exist
    /// - MissingColumn: the filter column is not in the header
    /// - FileRead / MalformedRow: the header cannot be read
    pub fn open(path: &Path, delimiter: u8, filter: Option<RowFilter>) -> IngestResult<Self> {
        let display = path.display().to_string();

        if !path.exists() {
            return Err(IngestError::FileNotFound(display));
        }

        let file = File::open(path).map_err(|e| IngestError::FileRead {
            path: display.clone(),
            message: e.to_string(),
        })?;

        // Fixed column shape: a row with a different field count is fatal
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .delimiter(delimiter)
            .flexible(false)
            .trim(Trim::All)
            .from_reader(file);

        let headers: Headers = reader
            .headers()
            .map_err(|e| IngestError::from_csv(&display, e))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let filter = match filter {
            Some(filter) => {
                let idx = headers
                    .iter()
                    .position(|h| h == filter.column())
                    .ok_or_else(|| IngestError::MissingColumn {
                        path: display.clone(),
                        column: filter.column().to_string(),
                    })?;
                Some((idx, filter))
            }
            None => None,
        };

        Ok(Self {
            path: display,
            reader,
            headers,
            filter,
            record: StringRecord::new(),
            finished: false,
            rows_read: 0,
            rows_kept: 0,
        })
    }

    /// Fails with MissingColumn unless every column is in the header
    pub fn require_columns(&self, columns: &[&str]) -> IngestResult<()> {
        for column in columns {
            if !self.headers.iter().any(|h| h == column) {
                return Err(IngestError::MissingColumn {
                    path: self.path.clone(),
                    column: column.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Reads up to `limit` more rows; an empty vec means the file is exhausted
    pub fn next_slice(&mut self, limit: usize) -> IngestResult<Vec<RawRow>> {
        let mut rows = Vec::with_capacity(limit.min(64 * 1024));
        while rows.len() < limit {
            match self.next() {
                Some(row) => rows.push(row?),
                None => break,
            }
        }
        Ok(rows)
    }

    /// Drains the remaining (filtered) rows
    pub fn collect_rows(mut self) -> IngestResult<Vec<RawRow>> {
        let rows = self.by_ref().collect::<IngestResult<Vec<_>>>()?;
        let (read, kept) = self.counters();
        debug!(path = %self.path, read, kept, "rows collected");
        Ok(rows)
    }

    /// (rows read, rows kept) so far
    pub fn counters(&self) -> (u64, u64) {
        (self.rows_read, self.rows_kept)
    }

    fn read_next(&mut self) -> IngestResult<Option<RawRow>> {
        loop {
            let more = self
                .reader
                .read_record(&mut self.record)
                .map_err(|e| IngestError::from_csv(&self.path, e))?;
            if !more {
                return Ok(None);
            }
            self.rows_read += 1;

            // Skip fully blank rows
            if self.record.iter().all(|v| v.is_empty()) {
                continue;
            }

            if let Some((idx, filter)) = &self.filter {
                let key = self.record.get(*idx).unwrap_or("");
                if !filter.matches(key) {
                    continue;
                }
            }

            let line = self.record.position().map(|p| p.line()).unwrap_or(0);
            let values = self.record.iter().map(str::to_string).collect();
            self.rows_kept += 1;
            return Ok(Some(RawRow::new(self.headers.clone(), values, line)));
        }
    }
}

impl Iterator for RowSource {
    type Item = IngestResult<RawRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.read_next() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                // Non-restartable: nothing is yielded after a failure
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
