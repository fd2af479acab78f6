// ==========================================
// KBO Loader - Entry point
// ==========================================
// One-shot batch job: load every batch, report, exit.
// Usage: kbo-loader [DATA_DIR]
// ==========================================

use anyhow::Context;
use kbo_loader::{logging, run_pipeline, LoaderConfig, SqliteDocumentRepository};
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} {}", kbo_loader::APP_NAME, kbo_loader::VERSION);
    tracing::info!("==================================================");

    let config = LoaderConfig::load(std::env::args().nth(1)).context("loading configuration")?;

    if let Some(parent) = Path::new(&config.db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating database directory {}", parent.display()))?;
        }
    }
    tracing::info!(db_path = %config.db_path, collection = %config.collection, "using database");

    let sink = SqliteDocumentRepository::new(&config.db_path, &config.collection, config.reset_collection)
        .context("opening document store")?;

    let summary = run_pipeline(config, Arc::new(sink)).await.map_err(|e| {
        tracing::error!(error = %e, "ingest run failed");
        e
    })?;

    tracing::info!(
        run_id = %summary.run_id,
        batches = summary.batches,
        documents = summary.documents,
        warnings = summary.warnings,
        elapsed_ms = summary.elapsed_ms,
        "finished"
    );
    Ok(())
}
