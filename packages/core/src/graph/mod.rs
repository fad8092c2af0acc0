//! Content Graph Read API
//!
//! The indexer never mutates the graph. It reads nodes, their hierarchy and
//! reference edges, and the subgraphs those edges belong to through the
//! [`ContentGraph`] and [`ContentNode`] traits.
//!
//! # Architecture
//!
//! - **[`ContentGraph`]**: node iteration and lookup, subgraph lookup, the
//!   allowed dimension subspace and the node type registry
//! - **[`ContentNode`]**: one stored node; [`GraphNode`] is the stored form and
//!   [`SubgraphNode`] views a stored node through one subgraph
//! - **[`InMemoryContentGraph`]**: the shipped implementation, assembled with
//!   [`ContentGraphBuilder`] or loaded from a JSON [`GraphSnapshot`]
//!
//! Implementations must be `Send + Sync`: the orchestrator shares one graph
//! read-only between all indexing workers.

mod error;
mod memory;
mod snapshot;
mod subgraph_node;

pub use error::GraphError;
pub use memory::{ContentGraphBuilder, GraphNode, InMemoryContentGraph};
pub use snapshot::{GraphSnapshot, SnapshotNode};
pub use subgraph_node::SubgraphNode;

use crate::models::{
    ContentStreamIdentity, DimensionSpacePoint, DimensionSpacePointSet, HierarchyRelation,
    NodeAggregateId, NodeKey, NodeType, NodeTypeRegistry, PropertyBag, ReferenceRelation,
    Subgraph,
};

/// A node as seen by the indexer
pub trait ContentNode: Send + Sync {
    fn key(&self) -> &NodeKey;

    fn aggregate_id(&self) -> &NodeAggregateId {
        &self.key().aggregate_id
    }

    /// Dimension space point the node was created in
    fn origin(&self) -> &DimensionSpacePoint {
        &self.key().origin
    }

    fn node_type(&self) -> &NodeType;

    fn properties(&self) -> &PropertyBag;

    /// Edges from parents, one per subgraph the node is attached under
    fn incoming_hierarchy_relations(&self) -> &[HierarchyRelation];

    /// Edges to children, across all subgraphs
    fn outgoing_hierarchy_relations(&self) -> &[HierarchyRelation];

    fn incoming_reference_relations(&self) -> &[ReferenceRelation];

    fn outgoing_reference_relations(&self) -> &[ReferenceRelation];

    /// Whether the node owns an aggregated fulltext payload
    fn is_fulltext_root(&self) -> bool {
        self.node_type().is_fulltext_root()
    }
}

/// Read access to a whole content graph
pub trait ContentGraph: Send + Sync {
    /// All nodes in a stable order
    fn nodes(&self) -> Box<dyn Iterator<Item = &dyn ContentNode> + '_>;

    fn node_count(&self) -> usize;

    fn node(&self, key: &NodeKey) -> Option<&dyn ContentNode>;

    /// Subgraph for a content stream and full dimension space point
    fn subgraph(
        &self,
        content_stream: &ContentStreamIdentity,
        dimension_space_point: &DimensionSpacePoint,
    ) -> Option<&Subgraph>;

    /// Every dimension space point (including `_workspace`) content may exist in
    fn allowed_dimension_subspace(&self) -> DimensionSpacePointSet;

    /// Names of all workspaces present in the allowed subspace, sorted
    fn workspaces(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .allowed_dimension_subspace()
            .iter()
            .filter_map(|point| point.workspace().map(str::to_string))
            .collect();
        names.sort();
        names.dedup();
        names
    }

    fn node_types(&self) -> &NodeTypeRegistry;
}
