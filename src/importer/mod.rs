// ==========================================
// KBO Loader - Import pipeline
// ==========================================
// Streaming joins over the registry export, code resolution,
// document assembly and batch coordination.
// ==========================================

pub mod batch_arena;
pub mod batch_coordinator;
pub mod child_processor;
pub mod code_resolver;
pub mod data_cleaner;
pub mod entity_builder;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod hierarchy;
pub mod importer_trait;

pub use batch_arena::{BatchArena, KeyedArena, OwnerRef};
pub use batch_coordinator::BatchCoordinator;
pub use child_processor::{
    ActivityProcessor, AddressProcessor, ChildOutcome, ChildRows, ContactProcessor,
    DenominationProcessor,
};
pub use code_resolver::CodeResolver;
pub use data_cleaner::DataCleaner;
pub use entity_builder::EntityBuilder;
pub use error::{IngestError, IngestResult};
pub use field_mapper::FieldMapper;
pub use file_parser::{KeySet, RowFilter, RowSource};
pub use hierarchy::{attach_branches, attach_establishments};
pub use importer_trait::{ChildProcessor, CodeLookup};

use crate::config::LoaderConfig;
use crate::domain::diagnostics::RunSummary;
use crate::repository::DocumentSink;
use std::sync::Arc;

/// Opens a coordinator and runs every batch
pub async fn run_pipeline(config: LoaderConfig, sink: Arc<dyn DocumentSink>) -> IngestResult<RunSummary> {
    BatchCoordinator::open(config, sink).await?.run().await
}
