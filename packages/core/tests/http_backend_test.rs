//! Integration tests for HttpSearchBackend
//!
//! Runs the client against a small axum server that mimics the
//! Elasticsearch endpoints the indexer uses and records every request.

use anyhow::Result;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use graphindex_core::backend::{AliasAction, HttpSearchBackend, SearchBackend};
use graphindex_core::BackendConfig;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    path: String,
    content_type: Option<String>,
    authorization: Option<String>,
    body: String,
}

#[derive(Clone, Default)]
struct FakeServer {
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl FakeServer {
    fn record(&self, method: &str, path: String, headers: &HeaderMap, body: &Bytes) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(Recorded {
                method: method.to_string(),
                path,
                content_type: header("content-type"),
                authorization: header("authorization"),
                body: String::from_utf8_lossy(body).into_owned(),
            });
        }
    }

    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().map(|requests| requests.clone()).unwrap_or_default()
    }
}

async fn index_exists(State(server): State<FakeServer>, Path(index): Path<String>, headers: HeaderMap) -> StatusCode {
    server.record("HEAD", format!("/{}", index), &headers, &Bytes::new());
    if index == "existing" {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn create_index(
    State(server): State<FakeServer>,
    Path(index): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    server.record("PUT", format!("/{}", index), &headers, &body);
    if index == "existing" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": {"type": "resource_already_exists_exception"}})),
        );
    }
    (StatusCode::OK, Json(json!({"acknowledged": true})))
}

async fn delete_index(State(server): State<FakeServer>, Path(index): Path<String>, headers: HeaderMap) -> StatusCode {
    server.record("DELETE", format!("/{}", index), &headers, &Bytes::new());
    StatusCode::OK
}

async fn put_mapping(
    State(server): State<FakeServer>,
    Path(index): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Value> {
    server.record("PUT", format!("/{}/_mapping", index), &headers, &body);
    Json(json!({"acknowledged": true}))
}

async fn refresh(State(server): State<FakeServer>, Path(index): Path<String>, headers: HeaderMap) -> Json<Value> {
    server.record("POST", format!("/{}/_refresh", index), &headers, &Bytes::new());
    Json(json!({"_shards": {"failed": 0}}))
}

async fn bulk(State(server): State<FakeServer>, headers: HeaderMap, body: Bytes) -> Json<Value> {
    server.record("POST", "/_bulk".to_string(), &headers, &body);
    Json(json!({
        "took": 1,
        "errors": true,
        "items": [
            {"index": {"_index": "gen-1", "_id": "a", "status": 201}},
            {"update": {"_index": "gen-1", "_id": "b", "status": 400,
                        "error": {"type": "mapper_parsing_exception"}}}
        ]
    }))
}

async fn alias(State(server): State<FakeServer>, Path(alias): Path<String>, headers: HeaderMap) -> impl IntoResponse {
    server.record("GET", format!("/_alias/{}", alias), &headers, &Bytes::new());
    if alias == "missing" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "alias [missing] missing", "status": 404})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "neoscr-abc-2": {"aliases": {alias.clone(): {}}},
            "neoscr-abc-1": {"aliases": {alias: {}}}
        })),
    )
}

async fn cat_indices(State(server): State<FakeServer>, Path(pattern): Path<String>, headers: HeaderMap) -> Json<Value> {
    server.record("GET", format!("/_cat/indices/{}", pattern), &headers, &Bytes::new());
    Json(json!([
        {"index": "neoscr-abc-2"},
        {"index": "neoscr-abc-1"},
        {"index": "other"}
    ]))
}

async fn update_aliases(State(server): State<FakeServer>, headers: HeaderMap, body: Bytes) -> Json<Value> {
    server.record("POST", "/_aliases".to_string(), &headers, &body);
    Json(json!({"acknowledged": true}))
}

async fn create_test_env(username: Option<&str>) -> Result<(FakeServer, HttpSearchBackend)> {
    let server = FakeServer::default();
    let app = Router::new()
        .route("/_bulk", post(bulk))
        .route("/_aliases", post(update_aliases))
        .route("/_alias/:alias", get(alias))
        .route("/_cat/indices/:pattern", get(cat_indices))
        .route("/:index/_mapping", put(put_mapping))
        .route("/:index/_refresh", post(refresh))
        .route(
            "/:index",
            put(create_index).delete(delete_index).head(index_exists),
        )
        .with_state(server.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let address = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let backend = HttpSearchBackend::new(BackendConfig {
        endpoint: format!("http://{}", address),
        username: username.map(str::to_string),
        password: username.map(|_| "secret".to_string()),
        ..Default::default()
    })?;
    Ok((server, backend))
}

#[tokio::test]
async fn test_index_management_requests() -> Result<()> {
    let (server, backend) = create_test_env(None).await?;

    assert!(backend.index_exists("existing").await?);
    assert!(!backend.index_exists("absent").await?);

    backend.create_index("gen-1", &json!({"number_of_shards": 1})).await?;
    backend
        .put_mapping("gen-1", "Acme-Page", &json!({"properties": {}}))
        .await?;
    backend.refresh("gen-1").await?;
    backend.delete_index("gen-1").await?;

    let requests = server.requests();
    let calls: Vec<(String, String)> = requests
        .iter()
        .map(|request| (request.method.clone(), request.path.clone()))
        .collect();
    assert_eq!(
        calls,
        vec![
            ("HEAD".to_string(), "/existing".to_string()),
            ("HEAD".to_string(), "/absent".to_string()),
            ("PUT".to_string(), "/gen-1".to_string()),
            ("PUT".to_string(), "/gen-1/_mapping".to_string()),
            ("POST".to_string(), "/gen-1/_refresh".to_string()),
            ("DELETE".to_string(), "/gen-1".to_string()),
        ]
    );
    let settings: Value = serde_json::from_str(&requests[2].body)?;
    assert_eq!(settings, json!({"number_of_shards": 1}));
    Ok(())
}

#[tokio::test]
async fn test_error_status_carries_body() -> Result<()> {
    let (_server, backend) = create_test_env(None).await?;

    let error = backend
        .create_index("existing", &json!({}))
        .await
        .expect_err("index already exists");
    assert!(!error.is_not_found());
    assert!(error.to_string().contains("resource_already_exists_exception"));
    Ok(())
}

#[tokio::test]
async fn test_bulk_sends_ndjson_and_parses_items() -> Result<()> {
    let (server, backend) = create_test_env(None).await?;
    let body = "{\"index\":{\"_index\":\"gen-1\",\"_id\":\"a\"}}\n{}\n".to_string();

    let response = backend.bulk(body.clone()).await?;

    assert!(response.errors);
    let failed: Vec<_> = response.failed_items().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].id.as_deref(), Some("b"));

    let request = &server.requests()[0];
    assert_eq!(request.content_type.as_deref(), Some("application/x-ndjson"));
    assert_eq!(request.body, body);
    Ok(())
}

#[tokio::test]
async fn test_alias_lookup_and_missing_alias() -> Result<()> {
    let (_server, backend) = create_test_env(None).await?;

    let targets = backend.index_names_by_alias("neoscr-abc").await?;
    assert_eq!(targets, vec!["neoscr-abc-1".to_string(), "neoscr-abc-2".to_string()]);

    let error = backend
        .index_names_by_alias("missing")
        .await
        .expect_err("alias does not exist");
    assert!(error.is_not_found());
    Ok(())
}

#[tokio::test]
async fn test_prefix_listing_filters_and_sorts() -> Result<()> {
    let (server, backend) = create_test_env(None).await?;

    let names = backend.index_names_by_prefix("neoscr-abc-").await?;
    assert_eq!(names, vec!["neoscr-abc-1".to_string(), "neoscr-abc-2".to_string()]);
    assert_eq!(server.requests()[0].path, "/_cat/indices/neoscr-abc-*");
    Ok(())
}

#[tokio::test]
async fn test_alias_actions_are_sent_in_one_request() -> Result<()> {
    let (server, backend) = create_test_env(Some("indexer")).await?;

    backend.update_aliases(&[]).await?;
    backend
        .update_aliases(&[
            AliasAction::remove("neoscr-abc-1", "neoscr-abc"),
            AliasAction::add("neoscr-abc-2", "neoscr-abc"),
        ])
        .await?;

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let body: Value = serde_json::from_str(&requests[0].body)?;
    assert_eq!(
        body,
        json!({"actions": [
            {"remove": {"index": "neoscr-abc-1", "alias": "neoscr-abc"}},
            {"add": {"index": "neoscr-abc-2", "alias": "neoscr-abc"}}
        ]})
    );
    assert!(requests[0]
        .authorization
        .as_deref()
        .is_some_and(|value| value.starts_with("Basic ")));
    Ok(())
}
