//! GraphIndex Core
//!
//! Projects a versioned, multi-dimensional content graph into a search
//! backend: one document per node variant, aggregated fulltext per fulltext
//! root, and one index generation per dimension combination published behind
//! aliases.
//!
//! # Architecture
//!
//! - **Read-only graph**: the indexer consumes the [`graph::ContentGraph`]
//!   trait and never writes to it
//! - **Generations behind aliases**: every build writes fresh indices and
//!   swaps aliases atomically once all workers have finished
//! - **At-most-once bulk writes**: failed bulk items are logged and counted,
//!   never retried
//! - **Explicit context**: configuration, postfix and error tracking are passed
//!   down, there is no global state
//!
//! # Modules
//!
//! - [`models`] - Dimension points, nodes, node types and search documents
//! - [`graph`] - Content graph traits, in-memory graph and JSON snapshots
//! - [`backend`] - Search backend trait with HTTP and in-memory implementations
//! - [`indexer`] - Mapping, document building, bulk writing and index lifecycle
//! - [`config`] - Indexer and backend settings
//! - [`utils`] - Hashing and HTML helpers

pub mod backend;
pub mod config;
pub mod graph;
pub mod indexer;
pub mod models;
pub mod utils;

// Re-export commonly used types
pub use backend::{BackendError, HttpSearchBackend, InMemorySearchBackend, SearchBackend};
pub use config::{BackendConfig, GraphIndexConfig, IndexerConfig};
pub use graph::{ContentGraph, ContentNode, InMemoryContentGraph};
pub use indexer::{BuildOptions, BuildReport, IndexingError, IndexingOrchestrator};
pub use models::*;
