//! Content Graph Error Types
//!
//! Errors raised while loading or assembling a content graph. Reading an
//! assembled graph never fails.

use crate::models::{DimensionSpacePoint, NodeKey};
use std::path::PathBuf;
use thiserror::Error;

/// Content graph assembly errors
#[derive(Error, Debug)]
pub enum GraphError {
    /// A node references a node type that was never registered
    #[error("Node {node} has unknown node type '{node_type}'")]
    UnknownNodeType { node: NodeKey, node_type: String },

    /// Two nodes share aggregate id and origin point
    #[error("Duplicate node {0}")]
    DuplicateNode(NodeKey),

    /// A relation points at a node that does not exist
    #[error("{relation} relation references missing node {node}")]
    DanglingRelation { relation: &'static str, node: NodeKey },

    /// A hierarchy relation belongs to a subgraph that was never registered
    #[error("Hierarchy relation uses unregistered subgraph {0}")]
    UnknownSubgraph(DimensionSpacePoint),

    /// A subgraph point without `_workspace` coordinate
    #[error("Dimension space point {0} has no _workspace coordinate")]
    MissingWorkspace(DimensionSpacePoint),

    /// Failed to read a snapshot file
    #[error("Failed to read graph snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Snapshot is not valid JSON or has the wrong shape
    #[error("Failed to parse graph snapshot: {0}")]
    Parse(#[from] serde_json::Error),
}

impl GraphError {
    pub fn unknown_node_type(node: NodeKey, node_type: impl Into<String>) -> Self {
        Self::UnknownNodeType {
            node,
            node_type: node_type.into(),
        }
    }

    pub fn dangling_relation(relation: &'static str, node: NodeKey) -> Self {
        Self::DanglingRelation { relation, node }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
