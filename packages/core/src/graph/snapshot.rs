//! JSON Graph Snapshots
//!
//! A snapshot is a self-contained JSON export of a content graph:
//!
//! ```json
//! {
//!   "nodeTypes": [ { "name": "Acme:Page", "search": { "fulltext": { "enable": true } } } ],
//!   "dimensionSpacePoints": [ { "_workspace": "live", "language": "en" } ],
//!   "nodes": [
//!     {
//!       "aggregateId": "home",
//!       "originDimensionSpacePoint": { "_workspace": "live", "language": "en" },
//!       "nodeType": "Acme:Page",
//!       "properties": { "title": "Home" }
//!     }
//!   ],
//!   "hierarchyRelations": [],
//!   "referenceRelations": []
//! }
//! ```
//!
//! Subgraphs are derived from `dimensionSpacePoints`; the content stream of
//! each is its `_workspace` coordinate.

use super::{ContentGraph, ContentGraphBuilder, GraphError, InMemoryContentGraph};
use crate::models::{
    DimensionSpacePoint, HierarchyRelation, NodeAggregateId, NodeKey, NodeType, PropertyBag,
    ReferenceRelation,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One node record of a snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotNode {
    pub aggregate_id: NodeAggregateId,
    pub origin_dimension_space_point: DimensionSpacePoint,
    pub node_type: String,
    #[serde(default)]
    pub properties: PropertyBag,
}

/// Serialized form of a whole content graph
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSnapshot {
    #[serde(default)]
    pub node_types: Vec<NodeType>,
    #[serde(default)]
    pub dimension_space_points: Vec<DimensionSpacePoint>,
    #[serde(default)]
    pub nodes: Vec<SnapshotNode>,
    #[serde(default)]
    pub hierarchy_relations: Vec<HierarchyRelation>,
    #[serde(default)]
    pub reference_relations: Vec<ReferenceRelation>,
}

impl GraphSnapshot {
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, GraphError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| GraphError::io(path, e))?;
        Self::from_json(&contents)
    }

    /// Assemble and validate the graph
    pub fn into_graph(self) -> Result<InMemoryContentGraph, GraphError> {
        let mut builder = ContentGraphBuilder::default();
        for node_type in self.node_types {
            builder = builder.node_type(node_type);
        }
        for point in self.dimension_space_points {
            builder = builder.dimension_space_point(point);
        }
        for node in self.nodes {
            builder = builder.node(
                NodeKey::new(node.aggregate_id, node.origin_dimension_space_point),
                node.node_type,
                node.properties,
            );
        }
        for relation in self.hierarchy_relations {
            builder = builder.hierarchy(relation);
        }
        for relation in self.reference_relations {
            builder = builder.reference(relation);
        }
        builder.build()
    }
}

impl InMemoryContentGraph {
    /// Load a graph from a snapshot file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GraphError> {
        let graph = GraphSnapshot::from_file(path.as_ref())?.into_graph()?;
        tracing::info!(
            "Loaded content graph from {} ({} nodes)",
            path.as_ref().display(),
            graph.node_count()
        );
        Ok(graph)
    }
}
