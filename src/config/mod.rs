// ==========================================
// KBO Loader - Configuration layer
// ==========================================
// Run configuration with layered overrides
// (defaults → JSON file → environment → CLI)
// ==========================================

pub mod loader_config;

pub use loader_config::{default_db_path, env_keys, LoaderConfig, SourceFiles};
