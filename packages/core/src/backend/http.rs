//! Elasticsearch-compatible HTTP backend
//!
//! Talks to the REST API with `reqwest`. Every non-success status becomes
//! [`BackendError::Http`] carrying the response body, so callers can tell a
//! missing alias (404) from a real failure.

use super::{AliasAction, BackendError, BulkResponse, SearchBackend};
use crate::config::BackendConfig;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;

/// [`SearchBackend`] over HTTP
pub struct HttpSearchBackend {
    config: BackendConfig,
    http: Client,
}

impl HttpSearchBackend {
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.endpoint.trim_end_matches('/'), path)
    }

    fn with_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.username {
            Some(username) => request.basic_auth(username, self.config.password.as_ref()),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = self.with_auth(request).send().await?;
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(BackendError::http(status, body))
    }
}

#[async_trait]
impl SearchBackend for HttpSearchBackend {
    async fn index_exists(&self, index: &str) -> Result<bool, BackendError> {
        let response = self
            .with_auth(self.http.head(self.url(index)))
            .send()
            .await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(BackendError::http(status.as_u16(), String::new())),
        }
    }

    async fn create_index(&self, index: &str, settings: &Value) -> Result<(), BackendError> {
        self.send(self.http.put(self.url(index)).json(settings)).await?;
        Ok(())
    }

    async fn delete_index(&self, index: &str) -> Result<(), BackendError> {
        self.send(self.http.delete(self.url(index))).await?;
        Ok(())
    }

    async fn put_mapping(
        &self,
        index: &str,
        mapping_type: &str,
        mapping: &Value,
    ) -> Result<(), BackendError> {
        tracing::debug!("Putting mapping for type {} into {}", mapping_type, index);
        self.send(
            self.http
                .put(self.url(&format!("{}/_mapping", index)))
                .json(mapping),
        )
        .await?;
        Ok(())
    }

    async fn bulk(&self, body: String) -> Result<BulkResponse, BackendError> {
        let response = self
            .send(
                self.http
                    .post(self.url("_bulk"))
                    .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
                    .body(body),
            )
            .await?;
        let value: Value = response.json().await?;
        BulkResponse::from_value(&value)
    }

    async fn refresh(&self, index: &str) -> Result<(), BackendError> {
        self.send(self.http.post(self.url(&format!("{}/_refresh", index))))
            .await?;
        Ok(())
    }

    async fn index_names_by_alias(&self, alias: &str) -> Result<Vec<String>, BackendError> {
        let response = self
            .send(self.http.get(self.url(&format!("_alias/{}", alias))))
            .await?;
        // {"<index>": {"aliases": {"<alias>": {}}}, ...}
        let indices: BTreeMap<String, Value> = response.json().await?;
        Ok(indices.into_keys().collect())
    }

    async fn index_names_by_prefix(&self, prefix: &str) -> Result<Vec<String>, BackendError> {
        #[derive(Deserialize)]
        struct CatIndex {
            index: String,
        }

        let response = self
            .send(
                self.http
                    .get(self.url(&format!("_cat/indices/{}*", prefix)))
                    .query(&[("format", "json"), ("h", "index")]),
            )
            .await?;
        let rows: Vec<CatIndex> = response.json().await?;
        let mut names: Vec<String> = rows
            .into_iter()
            .map(|row| row.index)
            .filter(|name| name.starts_with(prefix))
            .collect();
        names.sort();
        Ok(names)
    }

    async fn update_aliases(&self, actions: &[AliasAction]) -> Result<(), BackendError> {
        if actions.is_empty() {
            return Ok(());
        }
        self.send(
            self.http
                .post(self.url("_aliases"))
                .json(&json!({ "actions": actions })),
        )
        .await?;
        Ok(())
    }
}
