// ==========================================
// KBO Loader - Loader configuration
// ==========================================
// Load order (later wins):
//   defaults → JSON file named by KBO_LOADER_CONFIG
//   → KBO_LOADER_* environment → first CLI argument (data_dir)
// ==========================================

use crate::db::is_valid_collection_name;
use crate::domain::types::SourceFile;
use crate::importer::error::{IngestError, IngestResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

// ===== Environment keys =====
pub mod env_keys {
    pub const CONFIG_FILE: &str = "KBO_LOADER_CONFIG";
    pub const DATA_DIR: &str = "KBO_LOADER_DATA_DIR";
    pub const DB_PATH: &str = "KBO_LOADER_DB_PATH";
    pub const COLLECTION: &str = "KBO_LOADER_COLLECTION";
    pub const BATCH_SIZE: &str = "KBO_LOADER_BATCH_SIZE";
    pub const LANGUAGE: &str = "KBO_LOADER_LANGUAGE";
    pub const RESET: &str = "KBO_LOADER_RESET";
}

pub const DEFAULT_BATCH_SIZE: usize = 500_000;
pub const DEFAULT_COLLECTION: &str = "enterprises";
pub const DEFAULT_LANGUAGE: &str = "FR";

// ==========================================
// SourceFiles - file name per export file
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceFiles {
    pub enterprise: String,
    pub establishment: String,
    pub branch: String,
    pub activity: String,
    pub address: String,
    pub contact: String,
    pub denomination: String,
    pub code: String,
}

impl Default for SourceFiles {
    fn default() -> Self {
        Self {
            enterprise: SourceFile::Enterprise.default_file_name().to_string(),
            establishment: SourceFile::Establishment.default_file_name().to_string(),
            branch: SourceFile::Branch.default_file_name().to_string(),
            activity: SourceFile::Activity.default_file_name().to_string(),
            address: SourceFile::Address.default_file_name().to_string(),
            contact: SourceFile::Contact.default_file_name().to_string(),
            denomination: SourceFile::Denomination.default_file_name().to_string(),
            code: SourceFile::Code.default_file_name().to_string(),
        }
    }
}

impl SourceFiles {
    pub fn name(&self, file: SourceFile) -> &str {
        match file {
            SourceFile::Enterprise => &self.enterprise,
            SourceFile::Establishment => &self.establishment,
            SourceFile::Branch => &self.branch,
            SourceFile::Activity => &self.activity,
            SourceFile::Address => &self.address,
            SourceFile::Contact => &self.contact,
            SourceFile::Denomination => &self.denomination,
            SourceFile::Code => &self.code,
        }
    }
}

// ==========================================
// LoaderConfig
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub data_dir: PathBuf,
    pub files: SourceFiles,
    pub db_path: String,
    pub collection: String,
    pub batch_size: usize,        // primary rows per batch
    pub language: String,         // code table language, also picks …FR / …NL columns
    pub delimiter: char,          // single ASCII byte
    pub reset_collection: bool,   // empty a non-empty collection instead of refusing
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            files: SourceFiles::default(),
            db_path: default_db_path(),
            collection: DEFAULT_COLLECTION.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            language: DEFAULT_LANGUAGE.to_string(),
            delimiter: ',',
            reset_collection: false,
        }
    }
}

/// Default database file under the user data directory
///
/// Falls back to the working directory when no data dir is known.
pub fn default_db_path() -> String {
    match dirs::data_dir() {
        Some(dir) => dir.join("kbo-loader").join("kbo.db").to_string_lossy().into_owned(),
        None => "./kbo.db".to_string(),
    }
}

impl LoaderConfig {
    /// Full load: file (if any), environment, CLI data_dir
    pub fn load(cli_data_dir: Option<String>) -> IngestResult<Self> {
        let mut config = match std::env::var(env_keys::CONFIG_FILE) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(Path::new(path.trim()))?,
            _ => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;

        if let Some(dir) = cli_data_dir.filter(|d| !d.trim().is_empty()) {
            config.data_dir = PathBuf::from(dir.trim());
        }

        config.validate()?;
        debug!(config = ?config, "configuration loaded");
        Ok(config)
    }

    /// Reads a JSON file; absent fields keep their defaults
    pub fn from_file(path: &Path) -> IngestResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| IngestError::FileRead {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&raw)
            .map_err(|e| IngestError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Applies KBO_LOADER_* overrides through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> IngestResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(dir) = get(env_keys::DATA_DIR) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(path) = get(env_keys::DB_PATH) {
            self.db_path = path;
        }
        if let Some(collection) = get(env_keys::COLLECTION) {
            self.collection = collection;
        }
        if let Some(size) = get(env_keys::BATCH_SIZE) {
            self.batch_size = size.parse().map_err(|_| {
                IngestError::Config(format!("{} is not a number: {}", env_keys::BATCH_SIZE, size))
            })?;
        }
        if let Some(language) = get(env_keys::LANGUAGE) {
            self.language = language;
        }
        if let Some(reset) = get(env_keys::RESET) {
            self.reset_collection = matches!(reset.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        Ok(())
    }

    pub fn validate(&self) -> IngestResult<()> {
        if self.batch_size == 0 {
            return Err(IngestError::Config("batch_size must be greater than 0".to_string()));
        }
        if self.language.trim().is_empty() {
            return Err(IngestError::Config("language must not be empty".to_string()));
        }
        self.delimiter_byte()?;
        if !is_valid_collection_name(&self.collection) {
            return Err(IngestError::Config(format!(
                "collection must match [A-Za-z_][A-Za-z0-9_]*: {}",
                self.collection
            )));
        }
        Ok(())
    }

    /// Delimiter as the byte handed to the csv reader
    pub fn delimiter_byte(&self) -> IngestResult<u8> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| {
                IngestError::Config(format!("delimiter must be one ASCII character: {:?}", self.delimiter))
            })
    }

    pub fn path_of(&self, file: SourceFile) -> PathBuf {
        self.data_dir.join(self.files.name(file))
    }
}
