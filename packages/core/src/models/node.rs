//! Node and Edge Data Structures
//!
//! Nodes are identified by a stable [`NodeAggregateId`] plus the origin
//! dimension space point they were created in ([`NodeKey`]). Tree membership is
//! not stored on the node itself: it is expressed through explicit
//! [`HierarchyRelation`] edges, one per subgraph the child is attached under.
//!
//! # Architecture
//!
//! - **Aggregate identity**: all variants of a node share one aggregate id
//! - **Subgraph-owned edges**: every hierarchy relation belongs to one [`Subgraph`]
//! - **Visibility on the edge**: hidden flags, time windows and access roles
//!   are properties of the relation, not of the node
//! - **References**: named, non-hierarchical edges with an outgoing sort index

use crate::models::{DimensionSpacePoint, Subgraph};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Property bag of a node: property name → JSON value
pub type PropertyBag = Map<String, Value>;

/// Stable identifier shared by all variants of a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeAggregateId(String);

impl NodeAggregateId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeAggregateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeAggregateId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for NodeAggregateId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Identity of one node in the graph: aggregate id plus origin point
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeKey {
    pub aggregate_id: NodeAggregateId,
    #[serde(rename = "originDimensionSpacePoint")]
    pub origin: DimensionSpacePoint,
}

impl NodeKey {
    pub fn new(aggregate_id: impl Into<NodeAggregateId>, origin: DimensionSpacePoint) -> Self {
        Self {
            aggregate_id: aggregate_id.into(),
            origin,
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.aggregate_id, self.origin)
    }
}

/// Parent → child edge within one subgraph
///
/// A node has one incoming hierarchy relation per subgraph it is attached
/// under. Visibility settings live on the edge because the same node can be
/// hidden in one variant and visible in another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyRelation {
    pub parent: NodeKey,
    pub child: NodeKey,

    /// Subgraph owning this edge
    pub subgraph: Subgraph,

    /// Position among siblings
    #[serde(default)]
    pub sort_index: i64,

    #[serde(default)]
    pub hidden: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden_before_date_time: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden_after_date_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub hidden_in_index: bool,

    /// Roles allowed to see the child through this edge
    #[serde(default)]
    pub access_roles: Vec<String>,
}

impl HierarchyRelation {
    /// Visible relation with default settings
    pub fn new(parent: NodeKey, child: NodeKey, subgraph: Subgraph, sort_index: i64) -> Self {
        Self {
            parent,
            child,
            subgraph,
            sort_index,
            hidden: false,
            hidden_before_date_time: None,
            hidden_after_date_time: None,
            hidden_in_index: false,
            access_roles: Vec::new(),
        }
    }

    pub fn subgraph_hash(&self) -> String {
        self.subgraph.hash()
    }

    /// Whether this edge's subgraph covers `point`, ignoring the workspace
    ///
    /// Both sides are compared with the `_workspace` coordinate stripped.
    pub fn is_in_dimension(&self, point: &DimensionSpacePoint) -> bool {
        self.subgraph.dimension_space_point.without_workspace() == point.without_workspace()
    }
}

/// Named, non-hierarchical edge between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceRelation {
    pub source: NodeKey,
    pub target: NodeKey,
    pub name: String,

    /// Position among the source's outgoing references of the same name
    #[serde(default)]
    pub sort_index: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live(language: &str) -> DimensionSpacePoint {
        DimensionSpacePoint::from_pairs([("_workspace", "live"), ("language", language)])
    }

    #[test]
    fn test_relation_dimension_match_strips_workspace() {
        let parent = NodeKey::new("parent", live("en"));
        let child = NodeKey::new("child", live("en"));
        let subgraph = Subgraph::for_point(live("en")).expect("workspace present");
        let relation = HierarchyRelation::new(parent, child, subgraph, 100);

        assert!(relation.is_in_dimension(&DimensionSpacePoint::from_pairs([("language", "en")])));
        assert!(relation.is_in_dimension(&DimensionSpacePoint::from_pairs([
            ("_workspace", "user-me"),
            ("language", "en")
        ])));
        assert!(!relation.is_in_dimension(&DimensionSpacePoint::from_pairs([("language", "de")])));
    }

    #[test]
    fn test_hierarchy_relation_defaults_on_deserialize() {
        let json = serde_json::json!({
            "parent": {"aggregateId": "p", "originDimensionSpacePoint": {"_workspace": "live"}},
            "child": {"aggregateId": "c", "originDimensionSpacePoint": {"_workspace": "live"}},
            "subgraph": {
                "contentStream": "live",
                "dimensionSpacePoint": {"_workspace": "live"}
            }
        });
        let relation: HierarchyRelation = serde_json::from_value(json).expect("valid relation");
        assert_eq!(relation.sort_index, 0);
        assert!(!relation.hidden);
        assert!(relation.access_roles.is_empty());
        assert!(relation.hidden_before_date_time.is_none());
    }

    #[test]
    fn test_node_key_display() {
        let key = NodeKey::new("abc", DimensionSpacePoint::from_pairs([("language", "en")]));
        assert_eq!(key.to_string(), r#"abc@{"language":"en"}"#);
    }
}
