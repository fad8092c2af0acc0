//! In-Memory Content Graph
//!
//! Holds the full graph in memory with relations pre-distributed onto their
//! endpoint nodes, so every [`ContentNode`] accessor is a slice borrow.

use super::{ContentGraph, ContentNode, GraphError};
use crate::models::{
    ContentStreamIdentity, DimensionSpacePoint, DimensionSpacePointSet, HierarchyRelation,
    NodeKey, NodeType, NodeTypeRegistry, PropertyBag, ReferenceRelation, Subgraph,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Stored node with its relations
#[derive(Debug, Clone)]
pub struct GraphNode {
    key: NodeKey,
    node_type: Arc<NodeType>,
    properties: PropertyBag,
    incoming_hierarchy: Vec<HierarchyRelation>,
    outgoing_hierarchy: Vec<HierarchyRelation>,
    incoming_references: Vec<ReferenceRelation>,
    outgoing_references: Vec<ReferenceRelation>,
}

impl GraphNode {
    pub fn new(key: NodeKey, node_type: Arc<NodeType>, properties: PropertyBag) -> Self {
        Self {
            key,
            node_type,
            properties,
            incoming_hierarchy: Vec::new(),
            outgoing_hierarchy: Vec::new(),
            incoming_references: Vec::new(),
            outgoing_references: Vec::new(),
        }
    }
}

impl ContentNode for GraphNode {
    fn key(&self) -> &NodeKey {
        &self.key
    }

    fn node_type(&self) -> &NodeType {
        &self.node_type
    }

    fn properties(&self) -> &PropertyBag {
        &self.properties
    }

    fn incoming_hierarchy_relations(&self) -> &[HierarchyRelation] {
        &self.incoming_hierarchy
    }

    fn outgoing_hierarchy_relations(&self) -> &[HierarchyRelation] {
        &self.outgoing_hierarchy
    }

    fn incoming_reference_relations(&self) -> &[ReferenceRelation] {
        &self.incoming_references
    }

    fn outgoing_reference_relations(&self) -> &[ReferenceRelation] {
        &self.outgoing_references
    }
}

/// Immutable, fully indexed content graph
#[derive(Debug, Default)]
pub struct InMemoryContentGraph {
    nodes: Vec<GraphNode>,
    positions: HashMap<NodeKey, usize>,
    subgraphs: HashMap<(ContentStreamIdentity, DimensionSpacePoint), Subgraph>,
    allowed_subspace: DimensionSpacePointSet,
    node_types: NodeTypeRegistry,
}

impl InMemoryContentGraph {
    pub fn builder() -> ContentGraphBuilder {
        ContentGraphBuilder::default()
    }
}

impl ContentGraph for InMemoryContentGraph {
    fn nodes(&self) -> Box<dyn Iterator<Item = &dyn ContentNode> + '_> {
        Box::new(self.nodes.iter().map(|node| node as &dyn ContentNode))
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn node(&self, key: &NodeKey) -> Option<&dyn ContentNode> {
        self.positions
            .get(key)
            .map(|&position| &self.nodes[position] as &dyn ContentNode)
    }

    fn subgraph(
        &self,
        content_stream: &ContentStreamIdentity,
        dimension_space_point: &DimensionSpacePoint,
    ) -> Option<&Subgraph> {
        self.subgraphs
            .get(&(content_stream.clone(), dimension_space_point.clone()))
    }

    fn allowed_dimension_subspace(&self) -> DimensionSpacePointSet {
        self.allowed_subspace.clone()
    }

    fn node_types(&self) -> &NodeTypeRegistry {
        &self.node_types
    }
}

struct PendingNode {
    key: NodeKey,
    node_type: String,
    properties: PropertyBag,
}

/// Assembles an [`InMemoryContentGraph`] and validates it on [`build`](Self::build)
///
/// # Examples
///
/// ```rust
/// use graphindex_core::graph::{ContentGraph, InMemoryContentGraph};
/// use graphindex_core::models::{DimensionSpacePoint, HierarchyRelation, NodeKey, NodeType, Subgraph};
///
/// let en = DimensionSpacePoint::from_pairs([("_workspace", "live"), ("language", "en")]);
/// let root = NodeKey::new("root", en.clone());
/// let page = NodeKey::new("page", en.clone());
///
/// let graph = InMemoryContentGraph::builder()
///     .node_type(NodeType::new("Acme:Root"))
///     .node_type(NodeType::new("Acme:Page").fulltext_root())
///     .dimension_space_point(en.clone())
///     .node(root.clone(), "Acme:Root", Default::default())
///     .node(page.clone(), "Acme:Page", Default::default())
///     .hierarchy(HierarchyRelation::new(root, page.clone(), Subgraph::for_point(en).unwrap(), 1))
///     .build()
///     .unwrap();
///
/// assert_eq!(graph.node_count(), 2);
/// assert!(graph.node(&page).unwrap().is_fulltext_root());
/// ```
#[derive(Default)]
pub struct ContentGraphBuilder {
    node_types: NodeTypeRegistry,
    points: Vec<DimensionSpacePoint>,
    nodes: Vec<PendingNode>,
    hierarchy: Vec<HierarchyRelation>,
    references: Vec<ReferenceRelation>,
}

impl ContentGraphBuilder {
    pub fn node_type(mut self, node_type: NodeType) -> Self {
        self.node_types.register(node_type);
        self
    }

    /// Register an allowed point; a subgraph is created for it
    pub fn dimension_space_point(mut self, point: DimensionSpacePoint) -> Self {
        self.points.push(point);
        self
    }

    pub fn node(mut self, key: NodeKey, node_type: impl Into<String>, properties: PropertyBag) -> Self {
        self.nodes.push(PendingNode {
            key,
            node_type: node_type.into(),
            properties,
        });
        self
    }

    pub fn hierarchy(mut self, relation: HierarchyRelation) -> Self {
        self.hierarchy.push(relation);
        self
    }

    pub fn reference(mut self, relation: ReferenceRelation) -> Self {
        self.references.push(relation);
        self
    }

    /// Validate and index the graph
    ///
    /// Fails on unknown node types, duplicate nodes, relations with missing
    /// endpoints and hierarchy relations in unregistered subgraphs.
    pub fn build(self) -> Result<InMemoryContentGraph, GraphError> {
        let mut graph = InMemoryContentGraph {
            node_types: self.node_types,
            ..Default::default()
        };

        for point in self.points {
            let subgraph = Subgraph::for_point(point.clone())
                .ok_or_else(|| GraphError::MissingWorkspace(point.clone()))?;
            graph.allowed_subspace.insert(point.clone());
            graph
                .subgraphs
                .insert((subgraph.content_stream.clone(), point), subgraph);
        }

        for pending in self.nodes {
            let node_type = graph
                .node_types
                .get(&pending.node_type)
                .ok_or_else(|| GraphError::unknown_node_type(pending.key.clone(), &pending.node_type))?;
            if graph.positions.contains_key(&pending.key) {
                return Err(GraphError::DuplicateNode(pending.key));
            }
            graph.positions.insert(pending.key.clone(), graph.nodes.len());
            graph
                .nodes
                .push(GraphNode::new(pending.key, node_type, pending.properties));
        }

        for relation in self.hierarchy {
            let subgraph = &relation.subgraph;
            if !graph
                .subgraphs
                .contains_key(&(subgraph.content_stream.clone(), subgraph.dimension_space_point.clone()))
            {
                return Err(GraphError::UnknownSubgraph(
                    subgraph.dimension_space_point.clone(),
                ));
            }
            let parent = graph.position("hierarchy", &relation.parent)?;
            let child = graph.position("hierarchy", &relation.child)?;
            graph.nodes[parent].outgoing_hierarchy.push(relation.clone());
            graph.nodes[child].incoming_hierarchy.push(relation);
        }

        for relation in self.references {
            let source = graph.position("reference", &relation.source)?;
            let target = graph.position("reference", &relation.target)?;
            graph.nodes[source].outgoing_references.push(relation.clone());
            graph.nodes[target].incoming_references.push(relation);
        }

        for node in &mut graph.nodes {
            node.outgoing_hierarchy.sort_by_key(|relation| relation.sort_index);
            node.outgoing_references
                .sort_by(|a, b| a.name.cmp(&b.name).then(a.sort_index.cmp(&b.sort_index)));
        }

        Ok(graph)
    }
}

impl InMemoryContentGraph {
    fn position(&self, relation: &'static str, key: &NodeKey) -> Result<usize, GraphError> {
        self.positions
            .get(key)
            .copied()
            .ok_or_else(|| GraphError::dangling_relation(relation, key.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn live(language: &str) -> DimensionSpacePoint {
        DimensionSpacePoint::from_pairs([("_workspace", "live"), ("language", language)])
    }

    fn properties(title: &str) -> PropertyBag {
        json!({ "title": title })
            .as_object()
            .cloned()
            .unwrap_or_default()
    }

    #[test]
    fn test_relations_are_distributed_to_endpoints() {
        let en = live("en");
        let root = NodeKey::new("root", en.clone());
        let first = NodeKey::new("first", en.clone());
        let second = NodeKey::new("second", en.clone());
        let subgraph = Subgraph::for_point(en.clone()).expect("workspace");

        let graph = InMemoryContentGraph::builder()
            .node_type(NodeType::new("Acme:Page"))
            .dimension_space_point(en)
            .node(root.clone(), "Acme:Page", properties("Root"))
            .node(first.clone(), "Acme:Page", properties("First"))
            .node(second.clone(), "Acme:Page", properties("Second"))
            .hierarchy(HierarchyRelation::new(root.clone(), second.clone(), subgraph.clone(), 200))
            .hierarchy(HierarchyRelation::new(root.clone(), first.clone(), subgraph, 100))
            .reference(ReferenceRelation {
                source: first.clone(),
                target: second.clone(),
                name: "related".into(),
                sort_index: 0,
            })
            .build()
            .expect("valid graph");

        let root_node = graph.node(&root).expect("root");
        let children: Vec<_> = root_node
            .outgoing_hierarchy_relations()
            .iter()
            .map(|relation| relation.child.aggregate_id.as_str())
            .collect();
        assert_eq!(children, vec!["first", "second"]);

        let second_node = graph.node(&second).expect("second");
        assert_eq!(second_node.incoming_hierarchy_relations().len(), 1);
        assert_eq!(second_node.incoming_reference_relations().len(), 1);
        assert_eq!(graph.workspaces(), vec!["live".to_string()]);
    }

    #[test]
    fn test_unknown_node_type_is_rejected() {
        let result = InMemoryContentGraph::builder()
            .node(NodeKey::new("a", live("en")), "Acme:Missing", PropertyBag::new())
            .build();
        assert!(matches!(result, Err(GraphError::UnknownNodeType { .. })));
    }

    #[test]
    fn test_dangling_hierarchy_relation_is_rejected() {
        let en = live("en");
        let result = InMemoryContentGraph::builder()
            .node_type(NodeType::new("Acme:Page"))
            .dimension_space_point(en.clone())
            .node(NodeKey::new("a", en.clone()), "Acme:Page", PropertyBag::new())
            .hierarchy(HierarchyRelation::new(
                NodeKey::new("a", en.clone()),
                NodeKey::new("ghost", en.clone()),
                Subgraph::for_point(en).expect("workspace"),
                0,
            ))
            .build();
        assert!(matches!(result, Err(GraphError::DanglingRelation { .. })));
    }

    #[test]
    fn test_point_without_workspace_is_rejected() {
        let result = InMemoryContentGraph::builder()
            .dimension_space_point(DimensionSpacePoint::from_pairs([("language", "en")]))
            .build();
        assert!(matches!(result, Err(GraphError::MissingWorkspace(_))));
    }
}
