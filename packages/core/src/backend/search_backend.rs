//! Search Backend Abstraction
//!
//! The [`SearchBackend`] trait is the seam between the indexer and the remote
//! document store. It mirrors the small subset of an Elasticsearch-compatible
//! API the rebuild needs: index administration, mappings, bulk writes and
//! alias management.

use super::BackendError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One step of an atomic alias update
///
/// Serializes to the wire form `{"add": {"index": "...", "alias": "..."}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AliasAction {
    Add { index: String, alias: String },
    Remove { index: String, alias: String },
}

impl AliasAction {
    pub fn add(index: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::Add {
            index: index.into(),
            alias: alias.into(),
        }
    }

    pub fn remove(index: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::Remove {
            index: index.into(),
            alias: alias.into(),
        }
    }
}

/// Result of a single bulk item
#[derive(Debug, Clone, PartialEq)]
pub struct BulkItemResult {
    /// Action name (`index`, `update`, `delete`)
    pub action: String,
    pub index: Option<String>,
    pub id: Option<String>,
    pub status: u16,
    pub error: Option<Value>,
}

impl BulkItemResult {
    /// Failed items carry an error object; a 404 on delete is not a failure
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Parsed response of a bulk request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkResponse {
    /// Backend-reported flag: at least one item failed
    pub errors: bool,
    pub items: Vec<BulkItemResult>,
}

impl BulkResponse {
    /// Parse the Elasticsearch bulk response shape
    ///
    /// ```json
    /// {"errors": true, "items": [{"index": {"_index": "i", "_id": "1", "status": 400, "error": {}}}]}
    /// ```
    pub fn from_value(value: &Value) -> Result<Self, BackendError> {
        let errors = value
            .get("errors")
            .and_then(Value::as_bool)
            .ok_or_else(|| BackendError::invalid_response("bulk response without 'errors' flag"))?;

        let mut items = Vec::new();
        for item in value.get("items").and_then(Value::as_array).into_iter().flatten() {
            let Some((action, body)) = item.as_object().and_then(|object| object.iter().next()) else {
                return Err(BackendError::invalid_response("empty bulk item"));
            };
            items.push(BulkItemResult {
                action: action.clone(),
                index: body.get("_index").and_then(Value::as_str).map(str::to_string),
                id: body.get("_id").and_then(Value::as_str).map(str::to_string),
                status: body
                    .get("status")
                    .and_then(Value::as_u64)
                    .and_then(|status| u16::try_from(status).ok())
                    .unwrap_or(0),
                error: body.get("error").cloned(),
            });
        }

        Ok(Self { errors, items })
    }

    pub fn failed_items(&self) -> impl Iterator<Item = &BulkItemResult> {
        self.items.iter().filter(|item| item.is_failure())
    }
}

/// Remote document store operations used by the indexer
///
/// Implementations must be shareable between workers; every method takes
/// `&self`.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn index_exists(&self, index: &str) -> Result<bool, BackendError>;

    /// Create an index with the given settings body
    async fn create_index(&self, index: &str, settings: &Value) -> Result<(), BackendError>;

    async fn delete_index(&self, index: &str) -> Result<(), BackendError>;

    /// Merge the mapping of one document type into an index
    async fn put_mapping(
        &self,
        index: &str,
        mapping_type: &str,
        mapping: &Value,
    ) -> Result<(), BackendError>;

    /// Send an NDJSON bulk body
    async fn bulk(&self, body: String) -> Result<BulkResponse, BackendError>;

    /// Make all written documents visible to search
    async fn refresh(&self, index: &str) -> Result<(), BackendError>;

    /// Names of the indices an alias points to
    ///
    /// A missing alias yields `Err` with [`BackendError::is_not_found`].
    async fn index_names_by_alias(&self, alias: &str) -> Result<Vec<String>, BackendError>;

    /// Names of all indices starting with `prefix`
    async fn index_names_by_prefix(&self, prefix: &str) -> Result<Vec<String>, BackendError>;

    /// Apply all actions in one atomic request
    async fn update_aliases(&self, actions: &[AliasAction]) -> Result<(), BackendError>;
}
