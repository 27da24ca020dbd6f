use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::key::KeyStrategyKind;

/// Which engine backs a database.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    /// Volatile; nothing survives the process.
    Memory,
    /// Append-only log under [`DatabaseConfig::data_dir`].
    #[default]
    Log,
}

/// Flush/sync strategy for the log engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// `fsync` after every batch (safest, highest latency).
    EveryWrite,
    /// Rely on OS page-cache buffering; `fsync` only on flush and close.
    #[default]
    OsDefault,
}

/// Configuration for opening a [`Database`](crate::database::Database).
///
/// Every field has a default, so a TOML file only needs the keys it changes:
///
/// ```toml
/// name = "shop"
/// path = "/var/lib/terara"
/// engine = "log"
/// sync_mode = "every_write"
/// key_strategy = "hashed"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database name; also the subdirectory of `path` holding its files.
    pub name: String,
    /// Root directory for database files.
    pub path: PathBuf,
    pub engine: EngineKind,
    pub sync_mode: SyncMode,
    /// How collections derive storage keys from document ids.
    pub key_strategy: KeyStrategyKind,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            name: "terara".to_string(),
            path: PathBuf::from(".terara"),
            engine: EngineKind::default(),
            sync_mode: SyncMode::default(),
            key_strategy: KeyStrategyKind::default(),
        }
    }
}

impl DatabaseConfig {
    /// A volatile database, for tests and scratch work.
    pub fn in_memory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            engine: EngineKind::Memory,
            ..Default::default()
        }
    }

    pub fn from_toml_str(s: &str) -> StoreResult<Self> {
        toml::from_str(s).map_err(|e| StoreError::Config(e.to_string()))
    }

    pub fn from_toml_file(path: &Path) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> StoreResult<String> {
        toml::to_string(self).map_err(|e| StoreError::Config(e.to_string()))
    }

    /// Directory holding this database's files.
    pub fn data_dir(&self) -> PathBuf {
        self.path.join(&self.name)
    }
}
