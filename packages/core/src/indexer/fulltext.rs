//! Fulltext aggregation
//!
//! A fulltext root owns one payload built from its own fulltext fields and the
//! fields of every descendant down to (not including) the next fulltext root.
//! Only edges of the requested dimension are followed, so each variant of the
//! root gets the text that is visible in that variant.

use super::{IndexingObserver, PropertyExtractor};
use crate::graph::{ContentGraph, ContentNode};
use crate::models::{DimensionSpacePoint, FulltextPayload, HierarchyRelation, NodeKey};
use std::collections::HashSet;

/// Collects descendant text into a fulltext root's payload
#[derive(Debug, Clone, Copy, Default)]
pub struct FulltextAggregator;

impl FulltextAggregator {
    /// Aggregate the payload of `root` for `target_point`
    ///
    /// Children are visited depth-first in sort-index order; each node key is
    /// visited at most once. Properties without configuration are reported to
    /// `observer` and skipped.
    pub fn aggregate(
        &self,
        graph: &dyn ContentGraph,
        root: &dyn ContentNode,
        target_point: &DimensionSpacePoint,
        extractor: &dyn PropertyExtractor,
        observer: &dyn IndexingObserver,
    ) -> FulltextPayload {
        let mut payload = FulltextPayload::new();
        self.append_own(root, extractor, observer, &mut payload);
        self.append_descendants(graph, root, target_point, extractor, observer, &mut payload);
        payload
    }

    /// Append descendant text to a payload already holding the root's own text
    pub fn append_descendants(
        &self,
        graph: &dyn ContentGraph,
        root: &dyn ContentNode,
        target_point: &DimensionSpacePoint,
        extractor: &dyn PropertyExtractor,
        observer: &dyn IndexingObserver,
        payload: &mut FulltextPayload,
    ) {
        let mut visited: HashSet<NodeKey> = HashSet::new();
        visited.insert(root.key().clone());

        let mut stack = children_in_dimension(root, target_point);
        while let Some(key) = stack.pop() {
            if !visited.insert(key.clone()) {
                continue;
            }
            let Some(child) = graph.node(&key) else {
                tracing::debug!("Hierarchy child {} not found in graph", key);
                continue;
            };
            if child.is_fulltext_root() {
                continue;
            }
            self.append_own(child, extractor, observer, payload);
            stack.extend(children_in_dimension(child, target_point));
        }
    }

    fn append_own(
        &self,
        node: &dyn ContentNode,
        extractor: &dyn PropertyExtractor,
        observer: &dyn IndexingObserver,
        payload: &mut FulltextPayload,
    ) {
        let extracted = extractor.extract(node, &mut |property: &str| {
            observer.property_skipped(node.key(), property)
        });
        payload.merge(&extracted.fulltext);
    }
}

/// Child keys in reverse sort order, ready to be popped from a stack
fn children_in_dimension(node: &dyn ContentNode, point: &DimensionSpacePoint) -> Vec<NodeKey> {
    let mut relations: Vec<&HierarchyRelation> = node
        .outgoing_hierarchy_relations()
        .iter()
        .filter(|relation| relation.is_in_dimension(point))
        .collect();
    relations.sort_by_key(|relation| std::cmp::Reverse(relation.sort_index));
    relations
        .into_iter()
        .map(|relation| relation.child.clone())
        .collect()
}
