//! Per-build indexing context
//!
//! One [`IndexingContext`] is created per build and handed explicitly from the
//! orchestrator down to the document builder and bulk buffer. It replaces any
//! global settings: configuration, the generation postfix, the shared error
//! counter and the observer all travel with it.

use crate::config::IndexerConfig;
use crate::models::{DimensionSpacePoint, NodeKey};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared counter of tolerated errors
///
/// Cloning yields a handle to the same counter, so every worker reports into
/// one total.
#[derive(Debug, Clone, Default)]
pub struct ErrorTracker {
    count: Arc<AtomicUsize>,
}

impl ErrorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self) {
        self.record_many(1);
    }

    pub fn record_many(&self, count: usize) {
        self.count.fetch_add(count, Ordering::Relaxed);
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    pub fn has_errors(&self) -> bool {
        self.count() > 0
    }
}

/// Receives non-fatal indexing events
pub trait IndexingObserver: Send + Sync {
    /// A property had no indexing configuration and was left out
    fn property_skipped(&self, node: &NodeKey, property: &str);

    /// An occupied point had no matching subgraph
    fn point_skipped(&self, node: &NodeKey, point: &DimensionSpacePoint);
}

/// Observer that writes every event to the debug log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl IndexingObserver for TracingObserver {
    fn property_skipped(&self, node: &NodeKey, property: &str) {
        tracing::debug!(
            "Property '{}' of node {} not indexed because no configuration found",
            property,
            node.aggregate_id
        );
    }

    fn point_skipped(&self, node: &NodeKey, point: &DimensionSpacePoint) {
        tracing::debug!(
            "No subgraph for point {} of node {}, skipping",
            point,
            node.aggregate_id
        );
    }
}

/// Everything a build threads through its stages
#[derive(Clone)]
pub struct IndexingContext {
    pub config: Arc<IndexerConfig>,

    /// Suffix shared by every generation of this build
    pub postfix: String,

    pub errors: ErrorTracker,

    pub observer: Arc<dyn IndexingObserver>,
}

impl IndexingContext {
    pub fn new(config: Arc<IndexerConfig>, postfix: impl Into<String>) -> Self {
        Self {
            config,
            postfix: postfix.into(),
            errors: ErrorTracker::new(),
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn IndexingObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Per-dimension alias: `<index_name>-<dimension hash>`
    pub fn dimension_alias(&self, combination: &DimensionSpacePoint) -> String {
        format!("{}-{}", self.config.index_name, combination.hash())
    }

    /// Generation name for one combination: `<dimension alias>-<postfix>`
    pub fn generation_name(&self, combination: &DimensionSpacePoint) -> String {
        format!("{}-{}", self.dimension_alias(combination), self.postfix)
    }
}
