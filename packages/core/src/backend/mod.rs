//! Search Backend Layer
//!
//! # Architecture
//!
//! - **[`SearchBackend`]**: async trait over the remote document store
//! - **[`HttpSearchBackend`]**: Elasticsearch-compatible REST client
//! - **[`InMemorySearchBackend`]**: process-local store for dry runs and tests
//!
//! The orchestrator holds the backend as `Arc<dyn SearchBackend>` and shares
//! it between all workers.

mod error;
mod http;
mod memory;
mod search_backend;

pub use error::BackendError;
pub use http::HttpSearchBackend;
pub use memory::{InMemorySearchBackend, StoredIndex};
pub use search_backend::{AliasAction, BulkItemResult, BulkResponse, SearchBackend};
