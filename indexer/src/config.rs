//! Indexer configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::IndexerError;

/// Configuration for the gavel daemon.
///
/// Can be loaded from a TOML file via [`IndexerConfig::from_toml_file`]
/// or built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Data directory for the LMDB store.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Storage backend: "lmdb" (durable) or "memory" (dev/test only —
    /// state is lost on exit).
    #[serde(default = "default_store_backend")]
    pub store_backend: String,

    /// LMDB map size in bytes.
    #[serde(default = "default_map_size")]
    pub lmdb_map_size: usize,

    /// Checkpoint source name for this ingestion worker.
    #[serde(default = "default_source")]
    pub source: String,

    /// Ledger sequence to start indexing from when no checkpoint exists.
    #[serde(default)]
    pub start_seq: u32,

    /// Newline-delimited JSON ledger dump to ingest from. Without it the
    /// daemon can still serve the read API over existing state.
    #[serde(default)]
    pub ledger_file: Option<PathBuf>,

    /// Whether to serve the read API.
    #[serde(default = "default_true")]
    pub enable_api: bool,

    /// Read API port (if enabled).
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Seconds since the checkpointed ledger's close time before the
    /// health endpoint reports unhealthy.
    #[serde(default = "default_health_staleness")]
    pub health_staleness_secs: u64,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./gavel_data")
}

fn default_store_backend() -> String {
    "lmdb".to_string()
}

fn default_map_size() -> usize {
    1 << 30
}

fn default_source() -> String {
    crate::service::DEFAULT_SOURCE.to_string()
}

fn default_true() -> bool {
    true
}

fn default_api_port() -> u16 {
    8000
}

fn default_health_staleness() -> u64 {
    120
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl IndexerConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, IndexerError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| IndexerError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, IndexerError> {
        toml::from_str(s).map_err(|e| IndexerError::Config(e.to_string()))
    }
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            store_backend: default_store_backend(),
            lmdb_map_size: default_map_size(),
            source: default_source(),
            start_seq: 0,
            ledger_file: None,
            enable_api: default_true(),
            api_port: default_api_port(),
            health_staleness_secs: default_health_staleness(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}
