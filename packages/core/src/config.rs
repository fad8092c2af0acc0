//! Indexer and backend configuration
//!
//! Configuration is resolved in three layers: built-in defaults, an optional
//! JSON file, then `GRAPHINDEX_*` environment variables. The result is
//! validated once before any backend call is made.
//!
//! | Variable | Field |
//! |----------|-------|
//! | `GRAPHINDEX_INDEX_NAME` | [`IndexerConfig::index_name`] |
//! | `GRAPHINDEX_BATCH_SIZE` | [`IndexerConfig::batch_size`] |
//! | `GRAPHINDEX_MAX_BULK_PAYLOAD_BYTES` | [`IndexerConfig::max_bulk_payload_bytes`] |
//! | `GRAPHINDEX_USE_WORKERS` | [`IndexerConfig::use_workers`] |
//! | `GRAPHINDEX_WORKSPACE_INDEXING_MODE` | [`IndexerConfig::workspace_indexing_mode`] |
//! | `GRAPHINDEX_ENDPOINT` | [`BackendConfig::endpoint`] |
//! | `GRAPHINDEX_USERNAME` / `GRAPHINDEX_PASSWORD` | basic auth |
//! | `GRAPHINDEX_TIMEOUT_SECS` | [`BackendConfig::timeout_secs`] |

use crate::indexer::IndexingError;
use crate::models::{WorkspaceIndexingMode, LIVE_WORKSPACE};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

/// Maximum size of one bulk request body (10 MiB)
pub const DEFAULT_MAX_BULK_PAYLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Nodes processed between two bulk flushes
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Settings of the indexing pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IndexerConfig {
    /// Base index name; also the name of the top-level alias
    pub index_name: String,

    /// Number of processed nodes after which the bulk buffer is flushed
    pub batch_size: usize,

    /// Byte ceiling of a single bulk request body
    pub max_bulk_payload_bytes: usize,

    /// Populate dimension combinations in parallel tokio tasks
    pub use_workers: bool,

    pub workspace_indexing_mode: WorkspaceIndexingMode,

    /// Workspace indexed when the build does not name one
    pub default_workspace: String,

    /// Settings body sent when creating an index generation
    pub index_settings: Value,

    /// Property type → mapping used when a property declares none
    pub default_property_mappings: BTreeMap<String, Value>,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            index_name: "neoscr".to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            max_bulk_payload_bytes: DEFAULT_MAX_BULK_PAYLOAD_BYTES,
            use_workers: true,
            workspace_indexing_mode: WorkspaceIndexingMode::default(),
            default_workspace: LIVE_WORKSPACE.to_string(),
            index_settings: json!({}),
            default_property_mappings: default_property_mappings(),
        }
    }
}

fn default_property_mappings() -> BTreeMap<String, Value> {
    [
        ("string", json!({"type": "keyword"})),
        ("boolean", json!({"type": "boolean"})),
        ("integer", json!({"type": "integer"})),
        ("float", json!({"type": "float"})),
        ("DateTime", json!({"type": "date", "format": "date_time_no_millis"})),
        ("reference", json!({"type": "keyword"})),
        ("references", json!({"type": "keyword"})),
        ("array", json!({"type": "keyword"})),
    ]
    .into_iter()
    .map(|(name, mapping)| (name.to_string(), mapping))
    .collect()
}

impl IndexerConfig {
    /// Defaults overridden by `GRAPHINDEX_*` environment variables
    pub fn from_env() -> Result<Self, IndexingError> {
        let mut config = Self::default();
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Override fields from a variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), IndexingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("GRAPHINDEX_INDEX_NAME") {
            self.index_name = value;
        }
        if let Some(value) = lookup("GRAPHINDEX_BATCH_SIZE") {
            self.batch_size = parse_var("GRAPHINDEX_BATCH_SIZE", &value)?;
        }
        if let Some(value) = lookup("GRAPHINDEX_MAX_BULK_PAYLOAD_BYTES") {
            self.max_bulk_payload_bytes = parse_var("GRAPHINDEX_MAX_BULK_PAYLOAD_BYTES", &value)?;
        }
        if let Some(value) = lookup("GRAPHINDEX_USE_WORKERS") {
            self.use_workers = parse_var("GRAPHINDEX_USE_WORKERS", &value)?;
        }
        if let Some(value) = lookup("GRAPHINDEX_WORKSPACE_INDEXING_MODE") {
            self.workspace_indexing_mode = value
                .parse()
                .map_err(|e: crate::models::InvalidIndexingMode| {
                    IndexingError::configuration(e.to_string())
                })?;
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), IndexingError> {
        if self.index_name.is_empty() {
            return Err(IndexingError::configuration("index_name cannot be empty"));
        }

        if self.index_name != self.index_name.to_lowercase() {
            return Err(IndexingError::configuration(format!(
                "index_name '{}' must be lowercase",
                self.index_name
            )));
        }

        if self.batch_size == 0 {
            return Err(IndexingError::configuration(
                "batch_size must be greater than 0",
            ));
        }

        if self.max_bulk_payload_bytes == 0 {
            return Err(IndexingError::configuration(
                "max_bulk_payload_bytes must be greater than 0",
            ));
        }

        if self.default_workspace.is_empty() {
            return Err(IndexingError::configuration(
                "default_workspace cannot be empty",
            ));
        }

        Ok(())
    }
}

/// Connection settings of the HTTP backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BackendConfig {
    pub endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9200".to_string(),
            username: None,
            password: None,
            timeout_secs: 30,
        }
    }
}

impl BackendConfig {
    pub fn from_env() -> Result<Self, IndexingError> {
        let mut config = Self::default();
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), IndexingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("GRAPHINDEX_ENDPOINT") {
            self.endpoint = value;
        }
        if let Some(value) = lookup("GRAPHINDEX_USERNAME") {
            self.username = Some(value);
        }
        if let Some(value) = lookup("GRAPHINDEX_PASSWORD") {
            self.password = Some(value);
        }
        if let Some(value) = lookup("GRAPHINDEX_TIMEOUT_SECS") {
            self.timeout_secs = parse_var("GRAPHINDEX_TIMEOUT_SECS", &value)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), IndexingError> {
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(IndexingError::configuration(format!(
                "endpoint '{}' must start with http:// or https://",
                self.endpoint
            )));
        }

        if self.timeout_secs == 0 {
            return Err(IndexingError::configuration(
                "timeout_secs must be greater than 0",
            ));
        }

        if self.password.is_some() && self.username.is_none() {
            return Err(IndexingError::configuration(
                "password given without username",
            ));
        }

        Ok(())
    }
}

/// Complete configuration file
///
/// ```json
/// {
///   "indexer": { "indexName": "site", "batchSize": 200 },
///   "backend": { "endpoint": "https://search.internal:9200" }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphIndexConfig {
    pub indexer: IndexerConfig,
    pub backend: BackendConfig,
}

impl GraphIndexConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, IndexingError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            IndexingError::configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// File (or defaults), then environment, then validation
    pub fn load(path: Option<&Path>) -> Result<Self, IndexingError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.indexer.apply_overrides(|name| std::env::var(name).ok())?;
        config.backend.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), IndexingError> {
        self.indexer.validate()?;
        self.backend.validate()
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T, IndexingError> {
    value.parse().map_err(|_| {
        IndexingError::configuration(format!("invalid value '{}' for {}", value, name))
    })
}
