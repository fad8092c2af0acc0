//! Population workers
//!
//! One [`PopulationJob`] fills the generation of one dimension combination:
//! walk all nodes, keep those attached in the combination, buffer their
//! documents, flush every `batch_size` nodes, then refresh. Jobs run inline or
//! as tokio tasks that report back over an mpsc channel.

use super::{
    BulkWriteBuffer, FlushSummary, IndexGeneration, IndexLifecycleManager, IndexingContext,
    IndexingError, NodeIndexer, PropertyExtractor,
};
use crate::backend::SearchBackend;
use crate::graph::{ContentGraph, ContentNode};
use crate::models::DimensionSpacePoint;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Result of populating one dimension combination
#[derive(Debug, Clone)]
pub struct CombinationReport {
    pub combination: DimensionSpacePoint,
    pub dimension_hash: String,
    pub generation: IndexGeneration,

    /// Nodes attached in the combination that were processed
    pub nodes: usize,

    /// Documents buffered, one per admitted node variant
    pub documents: usize,

    pub flush: FlushSummary,
    pub duration: Duration,
}

/// Message sent by a spawned worker when its job ends
pub(crate) struct WorkerMessage {
    pub position: usize,
    pub result: Result<CombinationReport, IndexingError>,
}

/// Everything needed to populate one generation
pub(crate) struct PopulationJob {
    pub graph: Arc<dyn ContentGraph>,
    pub backend: Arc<dyn SearchBackend>,
    pub extractor: Arc<dyn PropertyExtractor>,
    pub context: IndexingContext,
    pub manager: IndexLifecycleManager,
    pub combination: DimensionSpacePoint,
    pub generation: IndexGeneration,
    pub limit: Option<usize>,
}

impl PopulationJob {
    pub async fn run(self) -> Result<CombinationReport, IndexingError> {
        let Self {
            graph,
            backend,
            extractor,
            context,
            manager,
            combination,
            mut generation,
            limit,
        } = self;
        let started = Instant::now();
        let config = &context.config;

        let indexer = NodeIndexer::new(
            graph.as_ref(),
            extractor.as_ref(),
            context.observer.as_ref(),
            config.workspace_indexing_mode,
            combination.clone(),
        );
        let mut buffer = BulkWriteBuffer::new(
            backend,
            config.batch_size,
            config.max_bulk_payload_bytes,
            context.errors.clone(),
        );
        buffer.register_target(indexer.dimension_hash(), &generation.name);

        tracing::info!("Indexing combination {} into {}", combination, generation.name);

        let nodes: Vec<&dyn ContentNode> = graph.nodes().filter(|node| indexer.includes(*node)).collect();

        let mut processed = 0;
        let mut documents = 0;
        let mut flush = FlushSummary::default();

        for node in nodes {
            if limit.is_some_and(|limit| processed >= limit) {
                tracing::info!("Limit of {} nodes reached for {}", processed, generation.name);
                break;
            }
            documents += indexer.index_node(node, &mut buffer).len();
            processed += 1;
            if let Some(summary) = buffer.record_node().await {
                flush.merge(summary);
            }
        }
        flush.merge(buffer.flush().await);

        manager.refresh(&mut generation).await?;

        let duration = started.elapsed();
        tracing::info!(
            "Indexed {} nodes ({} documents) into {} in {:?}",
            processed,
            documents,
            generation.name,
            duration
        );

        Ok(CombinationReport {
            dimension_hash: indexer.dimension_hash().to_string(),
            combination,
            generation,
            nodes: processed,
            documents,
            flush,
            duration,
        })
    }

    /// Run the job in its own task, reporting through `reports`
    pub fn spawn(self, position: usize, reports: mpsc::Sender<WorkerMessage>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let result = self.run().await;
            if reports.send(WorkerMessage { position, result }).await.is_err() {
                tracing::warn!("Report receiver dropped, result of worker {} lost", position);
            }
        })
    }
}
