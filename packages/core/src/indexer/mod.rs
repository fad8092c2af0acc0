//! Indexing Pipeline
//!
//! Turns a content graph into one search index generation per dimension
//! combination.
//!
//! # Architecture
//!
//! - **[`IndexingOrchestrator`]**: runs a build or cleanup end to end
//! - **[`IndexLifecycleManager`]**: creates, maps, refreshes, aliases and
//!   removes [`IndexGeneration`]s
//! - **[`MappingBuilder`]**: node type declarations to backend mappings
//! - **[`NodeIndexer`]**: one combination's node selection and variant fan-out
//! - **[`DimensionVariantResolver`]**: points a node's document must exist in
//! - **[`DocumentBuilder`]** and **[`FulltextAggregator`]**: document bodies
//! - **[`BulkWriteBuffer`]**: batched NDJSON writes
//!
//! All state of a build travels in an explicit [`IndexingContext`].

mod bulk;
mod context;
mod dimension_resolver;
mod document_builder;
mod error;
mod fulltext;
mod lifecycle;
mod mapping;
mod node_indexer;
mod orchestrator;
mod property_extractor;
mod worker;

pub use bulk::{BulkOperation, BulkWriteBuffer, FlushSummary};
pub use context::{ErrorTracker, IndexingContext, IndexingObserver, TracingObserver};
pub use dimension_resolver::DimensionVariantResolver;
pub use document_builder::DocumentBuilder;
pub use error::IndexingError;
pub use fulltext::FulltextAggregator;
pub use lifecycle::{update_main_alias, GenerationState, IndexGeneration, IndexLifecycleManager};
pub use mapping::{MappingBuilder, MappingCollection, NodeTypeMapping};
pub use node_indexer::NodeIndexer;
pub use orchestrator::{BuildOptions, BuildReport, IndexingOrchestrator};
pub use property_extractor::{ConfiguredPropertyExtractor, ExtractedProperties, PropertyExtractor};
pub use worker::CombinationReport;
