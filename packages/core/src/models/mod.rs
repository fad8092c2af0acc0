//! Data Models
//!
//! This module contains the data structures shared by every indexing stage:
//!
//! - Dimension space points, content streams and subgraphs
//! - Node identity, hierarchy and reference edges
//! - Node types with their search configuration
//! - Search documents and their fulltext payload

mod dimension;
mod document;
mod indexing_mode;
mod node;
mod node_type;

pub use dimension::{
    ContentStreamIdentity, DimensionSpacePoint, DimensionSpacePointSet, Subgraph, LIVE_WORKSPACE,
    WORKSPACE_DIMENSION,
};
pub use document::{
    Document, DocumentId, FulltextPayload, HierarchyRelationEntry, IncomingReferenceEntry,
    OutgoingReferenceEntry,
};
pub use indexing_mode::{InvalidIndexingMode, WorkspaceIndexingMode};
pub use node::{HierarchyRelation, NodeAggregateId, NodeKey, PropertyBag, ReferenceRelation};
pub use node_type::{
    mapping_name_for, FulltextConfiguration, FulltextExtractor, NodeType, NodeTypeRegistry,
    PropertyConfiguration, PropertySearchConfiguration, SearchConfiguration,
    UNSTRUCTURED_NODE_TYPE,
};
