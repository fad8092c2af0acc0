//! In-Memory Search Backend
//!
//! A faithful enough stand-in for an Elasticsearch node: indices with
//! mappings and documents, atomic alias updates, NDJSON bulk processing and
//! 404 semantics for missing aliases. Used by dry runs and tests.
//!
//! Failure injection lets tests exercise the tolerated error paths:
//!
//! - [`fail_documents`](InMemorySearchBackend::fail_documents): bulk items for
//!   these ids are rejected with an item-level error
//! - [`fail_bulk_requests`](InMemorySearchBackend::fail_bulk_requests): whole
//!   bulk calls fail with status 500
//! - [`fail_deletes`](InMemorySearchBackend::fail_deletes): deleting these
//!   indices fails with status 500
//! - [`fail_alias_lookups`](InMemorySearchBackend::fail_alias_lookups): alias
//!   reads fail with the given status
//!
//! Bulk bodies are only kept when the backend is built
//! [`with_request_log`](InMemorySearchBackend::with_request_log).

use super::{AliasAction, BackendError, BulkItemResult, BulkResponse, SearchBackend};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tokio::sync::RwLock;

/// Contents of one stored index
#[derive(Debug, Clone, Default)]
pub struct StoredIndex {
    pub settings: Value,
    /// Mapping type → mapping body
    pub mappings: BTreeMap<String, Value>,
    /// Document id → source
    pub documents: BTreeMap<String, Value>,
    pub refresh_count: usize,
}

#[derive(Debug, Default)]
struct BackendState {
    indices: BTreeMap<String, StoredIndex>,
    /// Alias → indices
    aliases: BTreeMap<String, BTreeSet<String>>,
    /// `Some` when request logging is enabled
    bulk_requests: Option<Vec<String>>,
    failing_documents: HashSet<String>,
    failing_deletes: HashSet<String>,
    fail_bulk: bool,
    alias_lookup_failure: Option<u16>,
}

/// [`SearchBackend`] keeping everything in process memory
#[derive(Debug, Default)]
pub struct InMemorySearchBackend {
    state: RwLock<BackendState>,
}

impl InMemorySearchBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep every NDJSON bulk body for [`bulk_requests`](Self::bulk_requests)
    pub fn with_request_log(mut self) -> Self {
        self.state.get_mut().bulk_requests = Some(Vec::new());
        self
    }

    /// Create an empty index directly, bypassing the trait
    pub async fn seed_index(&self, name: &str) {
        self.state
            .write()
            .await
            .indices
            .entry(name.to_string())
            .or_default();
    }

    /// Point `alias` at `index` directly, bypassing the trait
    pub async fn seed_alias(&self, alias: &str, index: &str) {
        self.state
            .write()
            .await
            .aliases
            .entry(alias.to_string())
            .or_default()
            .insert(index.to_string());
    }

    pub async fn fail_documents<I, S>(&self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = self.state.write().await;
        state.failing_documents.extend(ids.into_iter().map(Into::into));
    }

    pub async fn fail_bulk_requests(&self, fail: bool) {
        self.state.write().await.fail_bulk = fail;
    }

    pub async fn fail_deletes<I, S>(&self, indices: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = self.state.write().await;
        state.failing_deletes.extend(indices.into_iter().map(Into::into));
    }

    pub async fn fail_alias_lookups(&self, status: Option<u16>) {
        self.state.write().await.alias_lookup_failure = status;
    }

    pub async fn index_names(&self) -> Vec<String> {
        self.state.read().await.indices.keys().cloned().collect()
    }

    pub async fn index(&self, name: &str) -> Option<StoredIndex> {
        self.state.read().await.indices.get(name).cloned()
    }

    pub async fn document(&self, index: &str, id: &str) -> Option<Value> {
        self.state
            .read()
            .await
            .indices
            .get(index)
            .and_then(|stored| stored.documents.get(id).cloned())
    }

    /// Indices an alias points to; empty when the alias does not exist
    pub async fn alias_targets(&self, alias: &str) -> Vec<String> {
        self.state
            .read()
            .await
            .aliases
            .get(alias)
            .map(|targets| targets.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Every NDJSON bulk body received so far; empty without a request log
    pub async fn bulk_requests(&self) -> Vec<String> {
        self.state
            .read()
            .await
            .bulk_requests
            .clone()
            .unwrap_or_default()
    }
}

impl BackendState {
    fn apply_bulk(&mut self, body: &str) -> Result<BulkResponse, BackendError> {
        let mut lines = body.lines().filter(|line| !line.trim().is_empty());
        let mut response = BulkResponse::default();

        while let Some(action_line) = lines.next() {
            let action: Value = serde_json::from_str(action_line)?;
            let Some((name, meta)) = action.as_object().and_then(|object| object.iter().next()) else {
                return Err(BackendError::http(400, "malformed bulk action line"));
            };
            let index = meta.get("_index").and_then(Value::as_str).unwrap_or_default();
            let id = meta.get("_id").and_then(Value::as_str).unwrap_or_default();

            let source: Option<Value> = match name.as_str() {
                "delete" => None,
                "index" | "create" | "update" => {
                    let line = lines
                        .next()
                        .ok_or_else(|| BackendError::http(400, "bulk action without payload line"))?;
                    Some(serde_json::from_str(line)?)
                }
                other => return Err(BackendError::http(400, format!("unknown bulk action '{}'", other))),
            };

            let outcome = if self.failing_documents.contains(id) {
                Err((400, json!({"type": "mapper_parsing_exception", "reason": "injected failure"})))
            } else {
                self.apply_item(name, index, id, source)
            };

            let (status, error) = match outcome {
                Ok(status) => (status, None),
                Err((status, error)) => {
                    response.errors = true;
                    (status, Some(error))
                }
            };
            response.items.push(BulkItemResult {
                action: name.clone(),
                index: Some(index.to_string()),
                id: Some(id.to_string()),
                status,
                error,
            });
        }

        Ok(response)
    }

    fn apply_item(
        &mut self,
        action: &str,
        index: &str,
        id: &str,
        source: Option<Value>,
    ) -> Result<u16, (u16, Value)> {
        let Some(stored) = self.indices.get_mut(index) else {
            return Err((404, json!({"type": "index_not_found_exception", "index": index})));
        };

        match (action, source) {
            ("delete", _) => Ok(if stored.documents.remove(id).is_some() { 200 } else { 404 }),
            ("update", Some(update)) => {
                let doc = update.get("doc").cloned().unwrap_or_else(|| json!({}));
                let upsert = update
                    .get("doc_as_upsert")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                match stored.documents.get_mut(id) {
                    Some(existing) => {
                        merge_objects(existing, doc);
                        Ok(200)
                    }
                    None if upsert => {
                        stored.documents.insert(id.to_string(), doc);
                        Ok(201)
                    }
                    None => Err((404, json!({"type": "document_missing_exception", "id": id}))),
                }
            }
            (_, Some(source)) => {
                let created = stored.documents.insert(id.to_string(), source).is_none();
                Ok(if created { 201 } else { 200 })
            }
            (_, None) => Err((400, json!({"type": "action_request_validation_exception"}))),
        }
    }
}

fn merge_objects(target: &mut Value, patch: Value) {
    match (target.as_object_mut(), patch) {
        (Some(target), Value::Object(patch)) => {
            for (key, value) in patch {
                target.insert(key, value);
            }
        }
        (_, patch) => *target = patch,
    }
}

#[async_trait]
impl SearchBackend for InMemorySearchBackend {
    async fn index_exists(&self, index: &str) -> Result<bool, BackendError> {
        Ok(self.state.read().await.indices.contains_key(index))
    }

    async fn create_index(&self, index: &str, settings: &Value) -> Result<(), BackendError> {
        let mut state = self.state.write().await;
        if state.indices.contains_key(index) {
            return Err(BackendError::http(
                400,
                format!("resource_already_exists_exception: index [{}] already exists", index),
            ));
        }
        state.indices.insert(
            index.to_string(),
            StoredIndex {
                settings: settings.clone(),
                ..Default::default()
            },
        );
        Ok(())
    }

    async fn delete_index(&self, index: &str) -> Result<(), BackendError> {
        let mut state = self.state.write().await;
        if state.failing_deletes.contains(index) {
            return Err(BackendError::http(500, format!("injected delete failure for [{}]", index)));
        }
        if state.indices.remove(index).is_none() {
            return Err(BackendError::not_found(index));
        }
        for targets in state.aliases.values_mut() {
            targets.remove(index);
        }
        state.aliases.retain(|_, targets| !targets.is_empty());
        Ok(())
    }

    async fn put_mapping(
        &self,
        index: &str,
        mapping_type: &str,
        mapping: &Value,
    ) -> Result<(), BackendError> {
        let mut state = self.state.write().await;
        let stored = state
            .indices
            .get_mut(index)
            .ok_or_else(|| BackendError::not_found(index))?;
        stored
            .mappings
            .insert(mapping_type.to_string(), mapping.clone());
        Ok(())
    }

    async fn bulk(&self, body: String) -> Result<BulkResponse, BackendError> {
        let mut state = self.state.write().await;
        if let Some(requests) = state.bulk_requests.as_mut() {
            requests.push(body.clone());
        }
        if state.fail_bulk {
            return Err(BackendError::http(500, "injected bulk failure"));
        }
        state.apply_bulk(&body)
    }

    async fn refresh(&self, index: &str) -> Result<(), BackendError> {
        let mut state = self.state.write().await;
        let stored = state
            .indices
            .get_mut(index)
            .ok_or_else(|| BackendError::not_found(index))?;
        stored.refresh_count += 1;
        Ok(())
    }

    async fn index_names_by_alias(&self, alias: &str) -> Result<Vec<String>, BackendError> {
        let state = self.state.read().await;
        if let Some(status) = state.alias_lookup_failure {
            return Err(BackendError::http(status, "injected alias lookup failure"));
        }
        state
            .aliases
            .get(alias)
            .map(|targets| targets.iter().cloned().collect())
            .ok_or_else(|| BackendError::not_found(alias))
    }

    async fn index_names_by_prefix(&self, prefix: &str) -> Result<Vec<String>, BackendError> {
        Ok(self
            .state
            .read()
            .await
            .indices
            .keys()
            .filter(|name| name.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn update_aliases(&self, actions: &[AliasAction]) -> Result<(), BackendError> {
        let mut state = self.state.write().await;

        // validate everything first so the update is all-or-nothing
        for action in actions {
            let (AliasAction::Add { index, alias } | AliasAction::Remove { index, alias }) = action;
            if !state.indices.contains_key(index) {
                return Err(BackendError::not_found(index));
            }
            if state.indices.contains_key(alias) {
                return Err(BackendError::http(
                    400,
                    format!("invalid_alias_name_exception: an index exists with the same name as the alias [{}]", alias),
                ));
            }
        }

        for action in actions {
            match action {
                AliasAction::Add { index, alias } => {
                    state
                        .aliases
                        .entry(alias.clone())
                        .or_default()
                        .insert(index.clone());
                }
                AliasAction::Remove { index, alias } => {
                    if let Some(targets) = state.aliases.get_mut(alias) {
                        targets.remove(index);
                    }
                }
            }
        }
        state.aliases.retain(|_, targets| !targets.is_empty());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bulk_index_update_and_delete() -> anyhow::Result<()> {
        let backend = InMemorySearchBackend::new();
        backend.create_index("docs-1", &json!({})).await?;

        let body = [
            r#"{"index":{"_index":"docs-1","_id":"a"}}"#,
            r#"{"title":"A"}"#,
            r#"{"update":{"_index":"docs-1","_id":"a"}}"#,
            r#"{"doc":{"__fulltext":{"text":"hello"}},"doc_as_upsert":true}"#,
            r#"{"delete":{"_index":"docs-1","_id":"missing"}}"#,
        ]
        .join("\n")
            + "\n";

        let response = backend.bulk(body).await?;
        assert!(!response.errors);
        assert_eq!(response.items.len(), 3);
        assert_eq!(response.items[2].status, 404);

        let document = backend.document("docs-1", "a").await.expect("indexed");
        assert_eq!(document["title"], "A");
        assert_eq!(document["__fulltext"]["text"], "hello");
        Ok(())
    }

    #[tokio::test]
    async fn test_bulk_bodies_are_kept_only_with_request_log() -> anyhow::Result<()> {
        let body = "{\"delete\":{\"_index\":\"docs-1\",\"_id\":\"a\"}}\n";

        let backend = InMemorySearchBackend::new();
        backend.create_index("docs-1", &json!({})).await?;
        backend.bulk(body.to_string()).await?;
        assert!(backend.bulk_requests().await.is_empty());

        let backend = InMemorySearchBackend::new().with_request_log();
        backend.create_index("docs-1", &json!({})).await?;
        backend.bulk(body.to_string()).await?;
        backend.bulk(body.to_string()).await?;
        assert_eq!(backend.bulk_requests().await, vec![body.to_string(), body.to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn test_bulk_into_missing_index_is_item_error() -> anyhow::Result<()> {
        let backend = InMemorySearchBackend::new();
        let response = backend
            .bulk("{\"index\":{\"_index\":\"nope\",\"_id\":\"a\"}}\n{}\n".to_string())
            .await?;
        assert!(response.errors);
        assert_eq!(response.failed_items().count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_alias_update_is_atomic() -> anyhow::Result<()> {
        let backend = InMemorySearchBackend::new();
        backend.create_index("docs-1", &json!({})).await?;
        backend.seed_alias("docs", "docs-1").await;

        let result = backend
            .update_aliases(&[
                AliasAction::remove("docs-1", "docs"),
                AliasAction::add("docs-2", "docs"),
            ])
            .await;
        assert!(result.is_err());
        assert_eq!(backend.alias_targets("docs").await, vec!["docs-1".to_string()]);
        Ok(())
    }

    #[test]
    fn test_alias_over_existing_index_name_is_rejected() {
        let backend = InMemorySearchBackend::new();
        let result = tokio_test::block_on(async {
            backend.create_index("docs", &json!({})).await?;
            backend.create_index("docs-1", &json!({})).await?;
            backend.update_aliases(&[AliasAction::add("docs-1", "docs")]).await
        });
        assert!(matches!(result, Err(BackendError::Http { status: 400, .. })));
    }

    #[tokio::test]
    async fn test_missing_alias_is_not_found() {
        let backend = InMemorySearchBackend::new();
        let error = backend
            .index_names_by_alias("docs")
            .await
            .expect_err("alias does not exist");
        assert!(error.is_not_found());
    }
}
