//! Integration tests for snapshot loading and configuration files
//!
//! Loads a content graph and a configuration from JSON files on disk and runs
//! a full build against the in-memory backend.

use anyhow::Result;
use graphindex_core::graph::{ContentGraph, GraphError, InMemoryContentGraph};
use graphindex_core::{
    BuildOptions, GraphIndexConfig, InMemorySearchBackend, IndexingOrchestrator,
    WorkspaceIndexingMode,
};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

fn snapshot() -> serde_json::Value {
    let en = json!({"_workspace": "live", "language": "en"});
    let key = |id: &str| json!({"aggregateId": id, "originDimensionSpacePoint": en.clone()});
    let subgraph = json!({"contentStream": "live", "dimensionSpacePoint": en.clone()});

    json!({
        "nodeTypes": [
            {"name": "Acme:Sites"},
            {
                "name": "Acme.Site:Page",
                "search": {"fulltext": {"enable": true}},
                "properties": {
                    "title": {
                        "type": "string",
                        "search": {"fulltextExtractor": {"kind": "extractInto", "bucket": "h1"}}
                    },
                    "uriPathSegment": {"type": "string"}
                }
            },
            {
                "name": "Acme.Site:Text",
                "properties": {
                    "text": {
                        "type": "string",
                        "search": {"fulltextExtractor": {"kind": "extractHtmlTags"}}
                    }
                }
            }
        ],
        "dimensionSpacePoints": [en.clone()],
        "nodes": [
            {"aggregateId": "sites", "originDimensionSpacePoint": en.clone(), "nodeType": "Acme:Sites"},
            {
                "aggregateId": "home",
                "originDimensionSpacePoint": en.clone(),
                "nodeType": "Acme.Site:Page",
                "properties": {"title": "Home", "uriPathSegment": "home"}
            },
            {
                "aggregateId": "intro",
                "originDimensionSpacePoint": en.clone(),
                "nodeType": "Acme.Site:Text",
                "properties": {"text": "<h2>Welcome</h2><p>to the site</p>"}
            }
        ],
        "hierarchyRelations": [
            {"parent": key("sites"), "child": key("home"), "subgraph": subgraph.clone(), "sortIndex": 100},
            {
                "parent": key("home"),
                "child": key("intro"),
                "subgraph": subgraph,
                "sortIndex": 100,
                "accessRoles": ["Everybody"]
            }
        ],
        "referenceRelations": [
            {"source": key("intro"), "target": key("home"), "name": "related"}
        ]
    })
}

fn write_json(dir: &TempDir, name: &str, value: &serde_json::Value) -> Result<std::path::PathBuf> {
    let path = dir.path().join(name);
    std::fs::write(&path, serde_json::to_string_pretty(value)?)?;
    Ok(path)
}

#[tokio::test]
async fn test_build_from_snapshot_file() -> Result<()> {
    let dir = TempDir::new()?;
    let graph_path = write_json(&dir, "graph.json", &snapshot())?;
    let config_path = write_json(
        &dir,
        "graphindex.json",
        &json!({
            "indexer": {"indexName": "site", "batchSize": 1, "workspaceIndexingMode": "full"},
            "backend": {"endpoint": "http://search.internal:9200"}
        }),
    )?;

    let config = GraphIndexConfig::from_file(&config_path)?;
    assert_eq!(config.indexer.index_name, "site");
    assert_eq!(config.indexer.workspace_indexing_mode, WorkspaceIndexingMode::Full);
    assert!(config.validate().is_ok());

    let graph = InMemoryContentGraph::load(&graph_path)?;
    assert_eq!(graph.node_count(), 3);

    let backend = Arc::new(InMemorySearchBackend::new());
    let orchestrator = IndexingOrchestrator::new(Arc::new(graph), backend.clone(), config.indexer);
    let report = orchestrator
        .build(BuildOptions {
            postfix: Some("42".to_string()),
            ..Default::default()
        })
        .await?;

    // one request per node with a batch size of one
    assert_eq!(report.nodes(), 2);
    assert_eq!(report.combinations[0].flush.requests, 2);

    let generation = &report.combinations[0].generation.name;
    assert!(generation.starts_with("site-"));
    assert!(generation.ends_with("-42"));

    let stored = backend.index(generation).await.expect("generation exists");
    assert!(stored.mappings.contains_key("Acme-Site-Page"));
    assert!(stored.mappings.contains_key("Acme-Site-Text"));
    assert_eq!(stored.mappings.len(), 3);
    assert_eq!(stored.refresh_count, 1);

    let home = stored
        .documents
        .values()
        .find(|document| document["__identifier"] == "home")
        .expect("home indexed");
    assert_eq!(home["__fulltext"]["h1"], "Home");
    assert_eq!(home["__fulltext"]["h2"], "Welcome");
    assert_eq!(home["__fulltext"]["text"], "to the site");
    assert_eq!(home["uriPathSegment"], "home");
    assert_eq!(home["__incomingReferenceRelations"][0]["source"], "intro");

    let intro = stored
        .documents
        .values()
        .find(|document| document["__identifier"] == "intro")
        .expect("intro indexed");
    assert_eq!(intro["__hierarchyRelations"][0]["accessRoles"], json!(["Everybody"]));
    assert_eq!(intro["__hierarchyRelations"][0]["sortIndex"], 100);

    assert_eq!(backend.alias_targets("site").await, vec![generation.clone()]);
    Ok(())
}

#[tokio::test]
async fn test_snapshot_with_unknown_node_type_is_rejected() -> Result<()> {
    let dir = TempDir::new()?;
    let mut broken = snapshot();
    broken["nodes"][1]["nodeType"] = json!("Acme.Site:Missing");
    let path = write_json(&dir, "graph.json", &broken)?;

    let result = InMemoryContentGraph::load(&path);
    assert!(matches!(result, Err(GraphError::UnknownNodeType { .. })));
    Ok(())
}

#[tokio::test]
async fn test_missing_snapshot_file_is_io_error() -> Result<()> {
    let dir = TempDir::new()?;
    let result = InMemoryContentGraph::load(dir.path().join("absent.json"));
    assert!(matches!(result, Err(GraphError::Io { .. })));
    Ok(())
}
