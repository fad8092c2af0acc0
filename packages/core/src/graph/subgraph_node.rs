//! Node viewed through one subgraph

use super::ContentNode;
use crate::models::{
    ContentStreamIdentity, DimensionSpacePoint, DocumentId, HierarchyRelation, NodeKey, NodeType,
    PropertyBag, ReferenceRelation, Subgraph,
};

/// A stored node addressed in a specific (content stream, point) subgraph
///
/// The same stored node yields one `SubgraphNode` per occupied point; each
/// becomes its own document.
#[derive(Clone, Copy)]
pub struct SubgraphNode<'a> {
    node: &'a dyn ContentNode,
    subgraph: &'a Subgraph,
}

impl<'a> SubgraphNode<'a> {
    pub fn new(node: &'a dyn ContentNode, subgraph: &'a Subgraph) -> Self {
        Self { node, subgraph }
    }

    pub fn content_stream(&self) -> &ContentStreamIdentity {
        &self.subgraph.content_stream
    }

    pub fn dimension_space_point(&self) -> &DimensionSpacePoint {
        &self.subgraph.dimension_space_point
    }

    pub fn subgraph(&self) -> &Subgraph {
        self.subgraph
    }

    pub fn inner(&self) -> &'a dyn ContentNode {
        self.node
    }

    /// Deterministic id of the document for this variant
    pub fn document_id(&self) -> DocumentId {
        DocumentId::compute(
            self.content_stream(),
            self.aggregate_id(),
            self.dimension_space_point(),
        )
    }
}

impl ContentNode for SubgraphNode<'_> {
    fn key(&self) -> &NodeKey {
        self.node.key()
    }

    fn node_type(&self) -> &NodeType {
        self.node.node_type()
    }

    fn properties(&self) -> &PropertyBag {
        self.node.properties()
    }

    fn incoming_hierarchy_relations(&self) -> &[HierarchyRelation] {
        self.node.incoming_hierarchy_relations()
    }

    fn outgoing_hierarchy_relations(&self) -> &[HierarchyRelation] {
        self.node.outgoing_hierarchy_relations()
    }

    fn incoming_reference_relations(&self) -> &[ReferenceRelation] {
        self.node.incoming_reference_relations()
    }

    fn outgoing_reference_relations(&self) -> &[ReferenceRelation] {
        self.node.outgoing_reference_relations()
    }
}
