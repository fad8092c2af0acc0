//! Indexing Orchestrator
//!
//! Drives a complete rebuild of the search index from a content graph.
//!
//! # Build Phases
//!
//! 1. Resolve the postfix and check the workspace exists
//! 2. Derive the dimension combinations of that workspace
//! 3. Create and map one generation per combination (update mode reuses the
//!    generations currently behind the aliases instead)
//! 4. Alias first generations right away so the aliases exist
//! 5. Populate every combination, inline or in one tokio task each
//! 6. Once every worker has joined, swap the per-dimension aliases and the
//!    main alias over to the new generations
//!
//! Tolerated failures are counted in the shared
//! [`ErrorTracker`](super::ErrorTracker) and reported at the end; fatal ones
//! abort the build before any alias is swapped.

use super::worker::{PopulationJob, WorkerMessage};
use super::{
    update_main_alias, CombinationReport, ConfiguredPropertyExtractor, GenerationState,
    IndexGeneration, IndexLifecycleManager, IndexingContext, IndexingError, IndexingObserver, MappingBuilder,
    MappingCollection, PropertyExtractor, TracingObserver,
};
use crate::backend::SearchBackend;
use crate::config::IndexerConfig;
use crate::graph::ContentGraph;
use crate::models::DimensionSpacePoint;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Options of one build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Generation suffix; defaults to the current unix time
    pub postfix: Option<String>,

    /// Write into the live generations instead of building new ones
    pub update: bool,

    /// Stop each combination after this many nodes
    pub limit: Option<usize>,

    /// Workspace to index; defaults to the configured default workspace
    pub workspace: Option<String>,
}

/// Outcome of a build
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub postfix: String,
    pub workspace: String,
    pub combinations: Vec<CombinationReport>,

    /// Generations behind the main alias after the build
    pub main_alias_targets: Vec<String>,

    /// Tolerated errors counted while indexing
    pub error_count: usize,

    pub duration: Duration,
}

impl BuildReport {
    pub fn nodes(&self) -> usize {
        self.combinations.iter().map(|report| report.nodes).sum()
    }

    pub fn documents(&self) -> usize {
        self.combinations.iter().map(|report| report.documents).sum()
    }

    pub fn generations(&self) -> Vec<&str> {
        self.combinations
            .iter()
            .map(|report| report.generation.name.as_str())
            .collect()
    }
}

/// Coordinates mapping, population and alias swaps of a build
pub struct IndexingOrchestrator {
    graph: Arc<dyn ContentGraph>,
    backend: Arc<dyn SearchBackend>,
    config: Arc<IndexerConfig>,
    extractor: Arc<dyn PropertyExtractor>,
    observer: Arc<dyn IndexingObserver>,
}

impl IndexingOrchestrator {
    pub fn new(graph: Arc<dyn ContentGraph>, backend: Arc<dyn SearchBackend>, config: IndexerConfig) -> Self {
        Self {
            graph,
            backend,
            config: Arc::new(config),
            extractor: Arc::new(ConfiguredPropertyExtractor),
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn PropertyExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn IndexingObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    /// Rebuild (or update) the index for one workspace
    pub async fn build(&self, options: BuildOptions) -> Result<BuildReport, IndexingError> {
        let started = Instant::now();
        self.config.validate()?;

        let postfix = options
            .postfix
            .clone()
            .unwrap_or_else(|| chrono::Utc::now().timestamp().to_string());
        if postfix.is_empty() {
            return Err(IndexingError::configuration("Postfix must not be empty"));
        }
        let workspace = self.resolve_workspace(options.workspace.as_deref())?;
        let combinations = self.dimension_combinations(&workspace);

        let context = IndexingContext::new(self.config.clone(), &postfix).with_observer(self.observer.clone());

        tracing::info!(
            "Indexing workspace {} into {} combinations with postfix {}{}",
            workspace,
            combinations.len(),
            postfix,
            if options.update { " (update)" } else { "" }
        );

        let mappings = MappingBuilder::new(self.config.default_property_mappings.clone())
            .build(self.graph.node_types());

        let mut jobs = Vec::with_capacity(combinations.len());
        for combination in combinations {
            let manager = IndexLifecycleManager::new(self.backend.clone(), context.dimension_alias(&combination));
            let generation = if options.update {
                manager.live_generation().await?
            } else {
                self.prepare_generation(&manager, &postfix, &mappings).await?
            };
            jobs.push(PopulationJob {
                graph: self.graph.clone(),
                backend: self.backend.clone(),
                extractor: self.extractor.clone(),
                context: context.clone(),
                manager,
                combination,
                generation,
                limit: options.limit,
            });
        }

        let mut reports = if self.config.use_workers {
            run_workers(jobs).await?
        } else {
            let mut reports = Vec::with_capacity(jobs.len());
            for job in jobs {
                reports.push(job.run().await?);
            }
            reports
        };

        if !options.update {
            for report in &mut reports {
                if report.generation.state != GenerationState::Aliased {
                    let manager = IndexLifecycleManager::new(self.backend.clone(), &report.generation.alias);
                    for stale in manager.update_alias(&mut report.generation).await? {
                        tracing::info!(
                            "Generation {} is {} and left for cleanup",
                            stale.name,
                            stale.state
                        );
                    }
                }
            }
        }

        let main_alias_targets = self.publish_main_alias(&reports, &postfix, options.update).await?;

        let error_count = context.errors.count();
        if error_count > 0 {
            tracing::warn!("{} errors were returned while indexing", error_count);
        }

        let report = BuildReport {
            postfix,
            workspace,
            combinations: reports,
            main_alias_targets,
            error_count,
            duration: started.elapsed(),
        };
        tracing::info!(
            "Indexed {} nodes as {} documents in {:?}",
            report.nodes(),
            report.documents(),
            report.duration
        );
        Ok(report)
    }

    /// Remove every generation no per-dimension alias points to
    ///
    /// Failures are logged per combination and do not stop the others.
    pub async fn cleanup(&self, workspace: Option<&str>) -> Result<Vec<String>, IndexingError> {
        self.config.validate()?;
        let workspace = self.resolve_workspace(workspace)?;
        let context = IndexingContext::new(self.config.clone(), "");

        let mut removed = Vec::new();
        for combination in self.dimension_combinations(&workspace) {
            let manager = IndexLifecycleManager::new(self.backend.clone(), context.dimension_alias(&combination));
            match manager.cleanup().await {
                Ok(names) => removed.extend(names),
                Err(e) => tracing::error!(
                    "Cleanup of {} for combination {} failed: {}",
                    manager.alias(),
                    combination,
                    e
                ),
            }
        }

        tracing::info!("Removed {} stale indices", removed.len());
        Ok(removed)
    }

    /// Workspace-free points of the allowed subspace within `workspace`
    pub fn dimension_combinations(&self, workspace: &str) -> Vec<DimensionSpacePoint> {
        let combinations: BTreeSet<DimensionSpacePoint> = self
            .graph
            .allowed_dimension_subspace()
            .iter()
            .filter(|point| point.workspace() == Some(workspace))
            .map(DimensionSpacePoint::without_workspace)
            .collect();
        combinations.into_iter().collect()
    }

    fn resolve_workspace(&self, requested: Option<&str>) -> Result<String, IndexingError> {
        let workspace = requested.unwrap_or(&self.config.default_workspace).to_string();
        if !self.graph.workspaces().contains(&workspace) {
            return Err(IndexingError::configuration(format!(
                "Workspace \"{}\" does not exist",
                workspace
            )));
        }
        Ok(workspace)
    }

    async fn prepare_generation(
        &self,
        manager: &IndexLifecycleManager,
        postfix: &str,
        mappings: &MappingCollection,
    ) -> Result<IndexGeneration, IndexingError> {
        let mut generation = manager.generation(postfix);
        manager.create(&mut generation, &self.config.index_settings).await?;
        manager.apply_mapping(&mut generation, mappings).await?;

        if !manager.alias_exists().await? {
            tracing::info!("Alias {} does not exist yet, creating it", manager.alias());
            manager.update_alias(&mut generation).await?;
        }
        Ok(generation)
    }

    async fn publish_main_alias(
        &self,
        reports: &[CombinationReport],
        postfix: &str,
        update: bool,
    ) -> Result<Vec<String>, IndexingError> {
        if !update {
            return update_main_alias(self.backend.as_ref(), &self.config.index_name, postfix).await;
        }

        let postfixes: BTreeSet<&str> = reports
            .iter()
            .map(|report| report.generation.postfix.as_str())
            .collect();
        match postfixes.into_iter().collect::<Vec<_>>().as_slice() {
            [live] => update_main_alias(self.backend.as_ref(), &self.config.index_name, live).await,
            _ => {
                tracing::warn!(
                    "Live generations do not share one postfix, main alias {} left unchanged",
                    self.config.index_name
                );
                Ok(Vec::new())
            }
        }
    }
}

/// Spawn one task per job and wait for all of them
///
/// Reports arrive over an mpsc channel in completion order and are returned in
/// job order. The first fatal error is returned once every task has joined.
async fn run_workers(jobs: Vec<PopulationJob>) -> Result<Vec<CombinationReport>, IndexingError> {
    let total = jobs.len();
    let (reports_tx, mut reports_rx) = mpsc::channel::<WorkerMessage>(total.max(1));

    let handles: Vec<_> = jobs
        .into_iter()
        .enumerate()
        .map(|(position, job)| job.spawn(position, reports_tx.clone()))
        .collect();
    drop(reports_tx);

    let mut slots: Vec<Option<CombinationReport>> = (0..total).map(|_| None).collect();
    let mut first_error = None;
    while let Some(message) = reports_rx.recv().await {
        match message.result {
            Ok(report) => slots[message.position] = Some(report),
            Err(e) => {
                tracing::error!("Indexing worker {} failed: {}", message.position, e);
                first_error.get_or_insert(e);
            }
        }
    }

    for handle in handles {
        if let Err(e) = handle.await {
            first_error.get_or_insert(IndexingError::worker(e.to_string()));
        }
    }

    if let Some(e) = first_error {
        return Err(e);
    }
    slots
        .into_iter()
        .enumerate()
        .map(|(position, slot)| {
            slot.ok_or_else(|| IndexingError::worker(format!("Worker {} sent no report", position)))
        })
        .collect()
}
