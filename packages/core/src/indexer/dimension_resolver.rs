//! Dimension variant resolution
//!
//! A node is emitted once per dimension space point it occupies. Plain nodes
//! occupy only their origin point. A fulltext root also occupies every point
//! reachable through its non-root descendants, because its aggregated
//! fulltext has to exist wherever that descendant content is visible.

use crate::graph::{ContentGraph, ContentNode};
use crate::models::{DimensionSpacePointSet, NodeKey};
use std::collections::HashSet;

/// Computes the set of points a node must be emitted for
#[derive(Debug, Clone, Copy, Default)]
pub struct DimensionVariantResolver;

impl DimensionVariantResolver {
    /// Origin point first, then descendant origins in traversal order
    ///
    /// The walk follows outgoing hierarchy relations, never enters a
    /// descendant fulltext root and visits every node key at most once, so
    /// cycles and diamonds terminate.
    pub fn occupied_points(
        &self,
        graph: &dyn ContentGraph,
        node: &dyn ContentNode,
    ) -> DimensionSpacePointSet {
        let mut points = DimensionSpacePointSet::new();
        points.insert(node.origin().clone());

        if !node.is_fulltext_root() {
            return points;
        }

        let mut visited: HashSet<NodeKey> = HashSet::new();
        visited.insert(node.key().clone());

        let mut stack: Vec<NodeKey> = node
            .outgoing_hierarchy_relations()
            .iter()
            .rev()
            .map(|relation| relation.child.clone())
            .collect();

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
            points.insert(child.origin().clone());
            stack.extend(
                child
                    .outgoing_hierarchy_relations()
                    .iter()
                    .rev()
                    .map(|relation| relation.child.clone()),
            );
        }

        points
    }
}
