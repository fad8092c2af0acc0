//! Per-combination node indexing
//!
//! Ties the resolver, the workspace indexing mode, subgraph lookup and the
//! document builder together for one dimension combination.

use super::{
    BulkWriteBuffer, DimensionVariantResolver, DocumentBuilder, IndexingObserver,
    PropertyExtractor,
};
use crate::graph::{ContentGraph, ContentNode};
use crate::models::{ContentStreamIdentity, DimensionSpacePoint, DocumentId, WorkspaceIndexingMode};

/// Indexes nodes into the generation of one dimension combination
pub struct NodeIndexer<'a> {
    graph: &'a dyn ContentGraph,
    observer: &'a dyn IndexingObserver,
    resolver: DimensionVariantResolver,
    builder: DocumentBuilder<'a>,
    mode: WorkspaceIndexingMode,
    combination: DimensionSpacePoint,
    dimension_hash: String,
}

impl<'a> NodeIndexer<'a> {
    /// `combination` is a workspace-free point of the allowed subspace
    pub fn new(
        graph: &'a dyn ContentGraph,
        extractor: &'a dyn PropertyExtractor,
        observer: &'a dyn IndexingObserver,
        mode: WorkspaceIndexingMode,
        combination: DimensionSpacePoint,
    ) -> Self {
        let dimension_hash = combination.hash();
        Self {
            graph,
            observer,
            resolver: DimensionVariantResolver,
            builder: DocumentBuilder::new(graph, extractor, observer),
            mode,
            combination,
            dimension_hash,
        }
    }

    pub fn dimension_hash(&self) -> &str {
        &self.dimension_hash
    }

    /// Whether the node is attached under a subgraph of this combination
    pub fn includes(&self, node: &dyn ContentNode) -> bool {
        node.incoming_hierarchy_relations()
            .iter()
            .any(|relation| relation.is_in_dimension(&self.combination))
    }

    /// Emit one document per admitted occupied point with a subgraph
    ///
    /// Points without a subgraph are reported to the observer and skipped.
    pub fn index_node(&self, node: &dyn ContentNode, buffer: &mut BulkWriteBuffer) -> Vec<DocumentId> {
        let mut ids = Vec::new();

        for point in self.resolver.occupied_points(self.graph, node) {
            if !self.mode.admits(&point, node.origin()) {
                continue;
            }
            let subgraph = ContentStreamIdentity::from_point(&point)
                .and_then(|stream| self.graph.subgraph(&stream, &point));
            let Some(subgraph) = subgraph else {
                self.observer.point_skipped(node.key(), &point);
                continue;
            };
            ids.push(
                self.builder
                    .index(node, subgraph, &self.dimension_hash, buffer),
            );
        }

        ids
    }
}
