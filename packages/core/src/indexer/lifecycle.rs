//! Index generation lifecycle
//!
//! Every build writes into fresh generations named `<alias>-<postfix>`. A
//! generation only becomes searchable once the per-dimension alias is swapped
//! over to it, so readers never observe a half-populated index.
//!
//! # States
//!
//! ```text
//! Absent → Created → Mapped → Populated → Aliased → Stale → Deleted
//! ```
//!
//! The first generation of an alias may be aliased right after mapping, so
//! the alias exists while it is populated. Any generation that was created
//! but never aliased may also be deleted.
//! Moving out of order is an [`IndexingError::InvalidTransition`].

use super::{IndexingError, MappingCollection};
use crate::backend::{AliasAction, BackendError, SearchBackend};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Lifecycle state of one index generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerationState {
    Absent,
    Created,
    Mapped,
    Populated,
    Aliased,
    Stale,
    Deleted,
}

impl GenerationState {
    pub fn can_transition_to(self, next: GenerationState) -> bool {
        use GenerationState::*;
        matches!(
            (self, next),
            (Absent, Created)
                | (Created, Mapped)
                | (Mapped, Populated)
                | (Mapped | Populated, Aliased)
                | (Aliased, Stale)
                | (Created | Mapped | Populated | Stale, Deleted)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Created => "created",
            Self::Mapped => "mapped",
            Self::Populated => "populated",
            Self::Aliased => "aliased",
            Self::Stale => "stale",
            Self::Deleted => "deleted",
        }
    }
}

impl fmt::Display for GenerationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One physical index behind a per-dimension alias
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexGeneration {
    pub alias: String,
    pub postfix: String,
    pub name: String,
    pub state: GenerationState,
}

impl IndexGeneration {
    /// A generation this build is about to create
    pub fn new(alias: impl Into<String>, postfix: impl Into<String>) -> Self {
        let alias = alias.into();
        let postfix = postfix.into();
        Self {
            name: format!("{}-{}", alias, postfix),
            alias,
            postfix,
            state: GenerationState::Absent,
        }
    }

    /// An index that already exists in `state`
    pub fn existing(alias: impl Into<String>, name: impl Into<String>, state: GenerationState) -> Self {
        let alias = alias.into();
        let name = name.into();
        let postfix = name
            .strip_prefix(&format!("{}-", alias))
            .unwrap_or_default()
            .to_string();
        Self {
            alias,
            postfix,
            name,
            state,
        }
    }

    fn transition(&mut self, next: GenerationState) -> Result<(), IndexingError> {
        if !self.state.can_transition_to(next) {
            return Err(IndexingError::invalid_transition(&self.name, self.state, next));
        }
        tracing::debug!("Generation {}: {} -> {}", self.name, self.state, next);
        self.state = next;
        Ok(())
    }
}

/// Creates, maps, publishes and removes the generations of one alias
#[derive(Clone)]
pub struct IndexLifecycleManager {
    backend: Arc<dyn SearchBackend>,
    alias: String,
}

impl IndexLifecycleManager {
    pub fn new(backend: Arc<dyn SearchBackend>, alias: impl Into<String>) -> Self {
        Self {
            backend,
            alias: alias.into(),
        }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Generation of this alias for `postfix`, not yet created
    pub fn generation(&self, postfix: &str) -> IndexGeneration {
        IndexGeneration::new(&self.alias, postfix)
    }

    /// Create the generation, replacing a same-named leftover
    pub async fn create(&self, generation: &mut IndexGeneration, settings: &Value) -> Result<(), IndexingError> {
        if !generation.state.can_transition_to(GenerationState::Created) {
            return Err(IndexingError::invalid_transition(
                &generation.name,
                generation.state,
                GenerationState::Created,
            ));
        }

        if self.backend.index_exists(&generation.name).await? {
            tracing::warn!("Index {} already exists, deleting it before creation", generation.name);
            self.backend.delete_index(&generation.name).await?;
        }
        self.backend.create_index(&generation.name, settings).await?;
        tracing::info!("Created index {}", generation.name);

        generation.transition(GenerationState::Created)
    }

    /// Push one mapping per node type into the generation
    pub async fn apply_mapping(
        &self,
        generation: &mut IndexGeneration,
        mappings: &MappingCollection,
    ) -> Result<(), IndexingError> {
        if !generation.state.can_transition_to(GenerationState::Mapped) {
            return Err(IndexingError::invalid_transition(
                &generation.name,
                generation.state,
                GenerationState::Mapped,
            ));
        }

        for warning in &mappings.warnings {
            tracing::warn!("{}", warning);
        }
        for mapping in &mappings.mappings {
            self.backend
                .put_mapping(&generation.name, &mapping.type_name, &mapping.body)
                .await?;
        }
        tracing::info!(
            "Applied {} node type mappings to {}",
            mappings.len(),
            generation.name
        );

        generation.transition(GenerationState::Mapped)
    }

    /// Make written documents visible
    ///
    /// Moves a mapped generation to populated; refreshing a populated or
    /// aliased generation again is allowed and keeps its state.
    pub async fn refresh(&self, generation: &mut IndexGeneration) -> Result<(), IndexingError> {
        match generation.state {
            GenerationState::Mapped => {
                self.backend.refresh(&generation.name).await?;
                generation.transition(GenerationState::Populated)
            }
            GenerationState::Populated | GenerationState::Aliased => {
                self.backend.refresh(&generation.name).await?;
                Ok(())
            }
            state => Err(IndexingError::invalid_transition(
                &generation.name,
                state,
                GenerationState::Populated,
            )),
        }
    }

    /// Point the alias at exactly this generation
    ///
    /// Returns the generations the alias pointed to before, now stale.
    pub async fn update_alias(
        &self,
        generation: &mut IndexGeneration,
    ) -> Result<Vec<IndexGeneration>, IndexingError> {
        if generation.name == self.alias {
            return Err(IndexingError::configuration(format!(
                "Index name {} equals its alias name",
                generation.name
            )));
        }
        if !generation.state.can_transition_to(GenerationState::Aliased) {
            return Err(IndexingError::invalid_transition(
                &generation.name,
                generation.state,
                GenerationState::Aliased,
            ));
        }

        let previous = swap_alias(self.backend.as_ref(), &self.alias, &[generation.name.clone()]).await?;
        generation.transition(GenerationState::Aliased)?;
        tracing::info!("Alias {} now points to {}", self.alias, generation.name);

        let mut stale = Vec::new();
        for name in previous.into_iter().filter(|name| *name != generation.name) {
            let mut replaced = IndexGeneration::existing(&self.alias, name, GenerationState::Aliased);
            replaced.transition(GenerationState::Stale)?;
            stale.push(replaced);
        }
        Ok(stale)
    }

    /// Indices the alias points to; a missing alias has none
    pub async fn current_targets(&self) -> Result<Vec<String>, IndexingError> {
        Ok(alias_targets(self.backend.as_ref(), &self.alias).await?)
    }

    pub async fn alias_exists(&self) -> Result<bool, IndexingError> {
        Ok(!self.current_targets().await?.is_empty())
    }

    /// The generation currently behind the alias
    ///
    /// Used when updating in place instead of building a new generation.
    pub async fn live_generation(&self) -> Result<IndexGeneration, IndexingError> {
        let targets = self.current_targets().await?;
        match targets.as_slice() {
            [name] => Ok(IndexGeneration::existing(
                &self.alias,
                name,
                GenerationState::Aliased,
            )),
            [] => Err(IndexingError::configuration(format!(
                "Alias {} does not exist, run a full build first",
                self.alias
            ))),
            _ => Err(IndexingError::configuration(format!(
                "Alias {} points to {} indices, expected one",
                self.alias,
                targets.len()
            ))),
        }
    }

    /// Delete a generation that is no longer needed
    pub async fn delete(&self, generation: &mut IndexGeneration) -> Result<(), IndexingError> {
        if !generation.state.can_transition_to(GenerationState::Deleted) {
            return Err(IndexingError::invalid_transition(
                &generation.name,
                generation.state,
                GenerationState::Deleted,
            ));
        }
        self.backend.delete_index(&generation.name).await?;
        generation.transition(GenerationState::Deleted)
    }

    /// Delete every generation of this alias the alias does not point to
    ///
    /// Deletion failures are logged and skipped. Returns the removed names.
    pub async fn cleanup(&self) -> Result<Vec<String>, IndexingError> {
        let targets = self.current_targets().await?;
        let prefix = format!("{}-", self.alias);
        let candidates = self.backend.index_names_by_prefix(&prefix).await?;

        let mut removed = Vec::new();
        for name in candidates {
            if targets.contains(&name) {
                continue;
            }
            let mut generation = IndexGeneration::existing(&self.alias, &name, GenerationState::Stale);
            match self.delete(&mut generation).await {
                Ok(()) => {
                    tracing::info!("Removed stale index {}", name);
                    removed.push(name);
                }
                Err(e) => tracing::warn!("Failed to remove index {}: {}", name, e),
            }
        }

        Ok(removed)
    }
}

/// Point the main alias `<index_name>` at every generation of `postfix`
///
/// Generations are the indices named `<index_name>-<hash>-<postfix>` where
/// `<hash>` is a single dimension hash. Returns the new targets.
pub async fn update_main_alias(
    backend: &dyn SearchBackend,
    index_name: &str,
    postfix: &str,
) -> Result<Vec<String>, IndexingError> {
    let prefix = format!("{}-", index_name);
    let suffix = format!("-{}", postfix);
    let generations: Vec<String> = backend
        .index_names_by_prefix(&prefix)
        .await?
        .into_iter()
        .filter(|name| {
            name.strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(&suffix))
                .is_some_and(is_dimension_hash)
        })
        .collect();

    if generations.is_empty() {
        tracing::warn!(
            "No generations found for postfix {}, main alias {} left unchanged",
            postfix,
            index_name
        );
        return Ok(generations);
    }

    swap_alias(backend, index_name, &generations).await?;
    tracing::info!(
        "Main alias {} now spans {} generations",
        index_name,
        generations.len()
    );
    Ok(generations)
}

/// Hex sha256 digest as produced by `DimensionSpacePoint::hash`
fn is_dimension_hash(segment: &str) -> bool {
    segment.len() == 64 && segment.bytes().all(|b| b.is_ascii_hexdigit())
}

async fn alias_targets(backend: &dyn SearchBackend, alias: &str) -> Result<Vec<String>, BackendError> {
    match backend.index_names_by_alias(alias).await {
        Ok(names) => Ok(names),
        Err(e) if e.is_not_found() => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

/// Atomically move `alias` from its current targets to `targets`
async fn swap_alias(
    backend: &dyn SearchBackend,
    alias: &str,
    targets: &[String],
) -> Result<Vec<String>, IndexingError> {
    let previous = alias_targets(backend, alias).await?;

    if previous.is_empty() && backend.index_exists(alias).await? {
        tracing::warn!("Deleting index {} so the name can be used as an alias", alias);
        backend.delete_index(alias).await?;
    }

    let mut actions: Vec<AliasAction> = previous
        .iter()
        .filter(|name| !targets.contains(name))
        .map(|name| AliasAction::remove(name.clone(), alias))
        .collect();
    actions.extend(targets.iter().map(|name| AliasAction::add(name.clone(), alias)));

    backend.update_aliases(&actions).await?;
    Ok(previous)
}
