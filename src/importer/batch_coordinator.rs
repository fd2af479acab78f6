// ==========================================
// KBO Loader - Batch coordinator
// ==========================================
// State machine per batch:
//   LOADING_KEYS → LOADING_SECONDARY → BUILDING → DISTRIBUTING
//   → ASSEMBLING → FLUSHING → (LOADING_KEYS | DONE)
// Batches are strictly sequential. Within a batch, file loads run
// on the blocking pool (try_join!, first error wins) and the child
// processors on rayon. Every batch-scoped structure is dropped
// before the next LOADING_KEYS.
// ==========================================

use crate::config::LoaderConfig;
use crate::domain::diagnostics::{BatchReport, Diagnostics, RunSummary};
use crate::domain::enterprise::Enterprise;
use crate::domain::row::RawRow;
use crate::domain::types::{BatchState, SourceFile};
use crate::importer::batch_arena::BatchArena;
use crate::importer::child_processor::{distribute_all, ChildRows};
use crate::importer::code_resolver::CodeResolver;
use crate::importer::entity_builder::EntityBuilder;
use crate::importer::error::{IngestError, IngestResult};
use crate::importer::field_mapper::columns;
use crate::importer::file_parser::{KeySet, RowFilter, RowSource};
use crate::importer::hierarchy::{attach_branches, attach_establishments};
use crate::repository::DocumentSink;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Runs a closure on tokio's blocking pool
async fn blocking<T, F>(f: F) -> IngestResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(f).await?)
}

/// Rows of the secondary and child files of one batch
#[derive(Debug, Default)]
struct SecondaryRows {
    establishments: Vec<RawRow>,
    branches: Vec<RawRow>,
    children: ChildRows,
}

// ==========================================
// BatchCoordinator
// ==========================================
pub struct BatchCoordinator {
    config: Arc<LoaderConfig>,
    delimiter: u8,
    codes: Arc<CodeResolver>,
    sink: Arc<dyn DocumentSink>,
    primary: Option<RowSource>, // progress cursor over the primary file
    state: BatchState,
    failed_at: Option<(usize, BatchState)>, // batch and state of the fatal error
    batch_index: usize,
    run_id: String,
    started: Instant,
    primary_total: usize,
    documents_total: usize,
    warnings_total: usize,
}

impl BatchCoordinator {
    /// Validates the run, loads the code table and prepares the sink
    ///
    /// # Errors
    /// - Config: invalid configuration
    /// - FileNotFound / MissingColumn: an input file is absent or lacks its key column
    /// - Repository: the sink refused the run (e.g. non-empty collection)
    pub async fn open(config: LoaderConfig, sink: Arc<dyn DocumentSink>) -> IngestResult<Self> {
        config.validate()?;
        let delimiter = config.delimiter_byte()?;

        for file in SourceFile::ALL {
            let path = config.path_of(file);
            if !path.exists() {
                return Err(IngestError::FileNotFound(path.display().to_string()));
            }
        }

        let code_path = config.path_of(SourceFile::Code);
        let language = config.language.clone();
        let codes = blocking(move || CodeResolver::load(&code_path, delimiter, &language)).await??;

        let primary_path = config.path_of(SourceFile::Enterprise);
        let primary = blocking(move || -> IngestResult<RowSource> {
            let source = RowSource::open(&primary_path, delimiter, None)?;
            source.require_columns(&[columns::ENTERPRISE_NUMBER])?;
            Ok(source)
        })
        .await??;

        sink.prepare().await?;

        let run_id = Uuid::new_v4().to_string();
        info!(
            run_id = %run_id,
            data_dir = %config.data_dir.display(),
            batch_size = config.batch_size,
            language = %config.language,
            "ingest run opened"
        );

        Ok(Self {
            config: Arc::new(config),
            delimiter,
            codes: Arc::new(codes),
            sink,
            primary: Some(primary),
            state: BatchState::LoadingKeys,
            failed_at: None,
            batch_index: 0,
            run_id,
            started: Instant::now(),
            primary_total: 0,
            documents_total: 0,
            warnings_total: 0,
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    pub fn codes(&self) -> &CodeResolver {
        &self.codes
    }

    /// Drives batches until the primary file is exhausted or a batch fails
    pub async fn run(mut self) -> IngestResult<RunSummary> {
        while self.next_batch().await?.is_some() {}
        let summary = self.summary();
        info!(
            run_id = %summary.run_id,
            batches = summary.batches,
            primary_rows = summary.primary_rows,
            documents = summary.documents,
            warnings = summary.warnings,
            elapsed_ms = summary.elapsed_ms,
            "ingest run done"
        );
        Ok(summary)
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            run_id: self.run_id.clone(),
            batches: self.batch_index,
            primary_rows: self.primary_total,
            documents: self.documents_total,
            warnings: self.warnings_total,
            elapsed_ms: self.started.elapsed().as_millis() as u64,
        }
    }

    /// Processes one batch end to end
    ///
    /// # Returns
    /// - Ok(Some(report)): the batch was flushed
    /// - Ok(None): DONE, the primary file yielded no more rows
    /// - Err(BatchFailed): fatal, carrying the failing state; FAILED is latched
    /// - Err(RunAborted): any call after a failure
    pub async fn next_batch(&mut self) -> IngestResult<Option<BatchReport>> {
        match self.state {
            BatchState::Done => return Ok(None),
            BatchState::Failed => {
                let (batch, state) = self.failed_at.unwrap_or((self.batch_index, BatchState::Failed));
                return Err(IngestError::RunAborted { batch, state });
            }
            _ => {}
        }

        let batch = self.batch_index;
        match self.process_batch(batch).await {
            Ok(report) => Ok(report),
            Err(err) => {
                let err = err.in_state(batch, self.state);
                self.failed_at = Some((batch, err.failed_state().unwrap_or(self.state)));
                error!(batch, state = %self.state, error = %err, "batch failed, run aborted");
                self.primary = None;
                self.enter(BatchState::Failed);
                Err(err)
            }
        }
    }

    async fn process_batch(&mut self, batch: usize) -> IngestResult<Option<BatchReport>> {
        let started = Instant::now();

        // ===== LOADING_KEYS =====
        let primary_rows = self.load_primary().await?;
        if primary_rows.is_empty() {
            self.enter(BatchState::Done);
            return Ok(None);
        }
        info!(batch, primary_rows = primary_rows.len(), "batch started");

        let mut report = BatchReport {
            batch_index: batch,
            primary_rows: primary_rows.len(),
            ..Default::default()
        };

        // ===== LOADING_SECONDARY =====
        self.advance();
        let secondary = self.load_secondary(&primary_rows).await?;
        report.establishment_rows = secondary.establishments.len();
        report.branch_rows = secondary.branches.len();
        report.activity_rows = secondary.children.activities.len();
        report.address_rows = secondary.children.addresses.len();
        report.contact_rows = secondary.children.contacts.len();
        report.denomination_rows = secondary.children.denominations.len();

        // ===== BUILDING =====
        self.advance();
        let codes = Arc::clone(&self.codes);
        let SecondaryRows {
            establishments,
            branches,
            children,
        } = secondary;
        let (arena, mut diagnostics) = blocking(move || {
            let builder = EntityBuilder::new(&*codes);
            BatchArena::build(&builder, &primary_rows, &establishments, &branches)
        })
        .await?;

        // ===== DISTRIBUTING =====
        self.advance();
        let codes = Arc::clone(&self.codes);
        let (arena, distributed) = blocking(move || {
            let mut arena = arena;
            let outcome = {
                let owners = &arena;
                let resolve = |key: &str| owners.resolve_owner(key);
                distribute_all(&children, &*codes, &resolve)
            };

            let mut warnings = Diagnostics::new();
            warnings.merge(outcome.activities.diagnostics);
            warnings.merge(outcome.addresses.diagnostics);
            warnings.merge(outcome.contacts.diagnostics);
            warnings.merge(outcome.denominations.diagnostics);

            let attached = arena.apply(outcome.activities.attachments)
                + arena.apply(outcome.addresses.attachments)
                + arena.apply(outcome.contacts.attachments)
                + arena.apply(outcome.denominations.attachments);
            debug!(attached, orphans = warnings.len(), "children distributed");
            (arena, warnings)
        })
        .await?;
        diagnostics.merge(distributed);

        // ===== ASSEMBLING =====
        self.advance();
        let (documents, assembled) = blocking(move || Self::assemble(arena)).await?;
        diagnostics.merge(assembled);

        // ===== FLUSHING =====
        self.advance();
        report.documents = self.sink.insert_batch(batch, documents).await?;
        report.warnings = diagnostics.into_warnings();
        report.elapsed_ms = started.elapsed().as_millis() as u64;
        self.sink.record_batch(&self.run_id, &report).await?;

        self.primary_total += report.primary_rows;
        self.documents_total += report.documents;
        self.warnings_total += report.warnings.len();
        self.batch_index += 1;

        info!(
            batch,
            documents = report.documents,
            establishments = report.establishment_rows,
            branches = report.branch_rows,
            warnings = report.warnings.len(),
            elapsed_ms = report.elapsed_ms,
            "batch flushed"
        );
        self.advance();
        Ok(Some(report))
    }

    /// Moves to the successor state of the batch cycle
    fn advance(&mut self) {
        self.enter(self.state.next());
    }

    fn enter(&mut self, state: BatchState) {
        debug!(batch = self.batch_index, from = %self.state, to = %state, "state transition");
        self.state = state;
    }

    // ===== LOADING_KEYS =====

    /// Next slice of the primary file; the cursor survives across batches
    async fn load_primary(&mut self) -> IngestResult<Vec<RawRow>> {
        let mut source = self
            .primary
            .take()
            .ok_or_else(|| IngestError::Task("primary cursor unavailable".to_string()))?;
        let limit = self.config.batch_size;

        let (source, rows) = blocking(move || {
            let rows = source.next_slice(limit);
            (source, rows)
        })
        .await?;
        self.primary = Some(source);
        rows
    }

    // ===== LOADING_SECONDARY =====

    async fn load_secondary(&self, primary_rows: &[RawRow]) -> IngestResult<SecondaryRows> {
        let enterprise_keys: KeySet = primary_rows
            .iter()
            .filter_map(|row| EntityBuilder::key_of(row, columns::ENTERPRISE_NUMBER))
            .collect();

        // An empty key set would let every row through the filters
        if enterprise_keys.is_empty() {
            return Ok(SecondaryRows::default());
        }

        let keys = Arc::new(enterprise_keys);
        let (establishments, branches) = tokio::try_join!(
            self.load_filtered(SourceFile::Establishment, Arc::clone(&keys)),
            self.load_filtered(SourceFile::Branch, Arc::clone(&keys)),
        )?;

        // Children of establishments and branches are keyed by the unit's own key
        let mut extended = Arc::try_unwrap(keys).unwrap_or_else(|shared| (*shared).clone());
        for (rows, file) in [
            (&establishments, SourceFile::Establishment),
            (&branches, SourceFile::Branch),
        ] {
            if let Some(column) = file.key_column() {
                extended.extend(rows.iter().filter_map(|row| EntityBuilder::key_of(row, column)));
            }
        }
        debug!(keys = extended.len(), "key set extended");

        let keys = Arc::new(extended);
        let (activities, addresses, contacts, denominations) = tokio::try_join!(
            self.load_filtered(SourceFile::Activity, Arc::clone(&keys)),
            self.load_filtered(SourceFile::Address, Arc::clone(&keys)),
            self.load_filtered(SourceFile::Contact, Arc::clone(&keys)),
            self.load_filtered(SourceFile::Denomination, Arc::clone(&keys)),
        )?;

        Ok(SecondaryRows {
            establishments,
            branches,
            children: ChildRows {
                activities,
                addresses,
                contacts,
                denominations,
            },
        })
    }

    /// Streams one file, keeping only rows whose filter column is in `keys`
    async fn load_filtered(&self, file: SourceFile, keys: Arc<KeySet>) -> IngestResult<Vec<RawRow>> {
        let column = file
            .filter_column()
            .ok_or_else(|| IngestError::Config(format!("{} has no filter column", file)))?;
        let path: PathBuf = self.config.path_of(file);
        let delimiter = self.delimiter;

        let rows = blocking(move || -> IngestResult<Vec<RawRow>> {
            let source = RowSource::open(&path, delimiter, Some(RowFilter::new(column, keys)))?;
            if let Some(key_column) = file.key_column() {
                source.require_columns(&[key_column])?;
            }
            source.collect_rows()
        })
        .await??;

        debug!(file = %file, rows = rows.len(), "secondary file filtered");
        Ok(rows)
    }

    // ===== ASSEMBLING =====

    /// Establishments then branches folded in; the arena is consumed
    fn assemble(arena: BatchArena) -> (Vec<Enterprise>, Diagnostics) {
        let BatchArena {
            mut enterprises,
            establishments,
            branches,
        } = arena;

        let mut diagnostics = Diagnostics::new();
        let folded_establishments = attach_establishments(&mut enterprises, establishments, &mut diagnostics);
        let folded_branches = attach_branches(&mut enterprises, branches, &mut diagnostics);
        debug!(
            establishments = folded_establishments,
            branches = folded_branches,
            "units folded"
        );

        let documents = enterprises.into_entries().map(|(_, doc)| doc).collect();
        (documents, diagnostics)
    }
}
