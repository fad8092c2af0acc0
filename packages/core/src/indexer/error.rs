//! Indexing Error Types
//!
//! Only fatal conditions surface as [`IndexingError`]. Tolerated failures
//! (rejected bulk items, failed flushes, missing subgraphs, cleanup deletion
//! failures) are logged and counted by the
//! [`ErrorTracker`](super::ErrorTracker) instead.

use crate::backend::BackendError;
use crate::graph::GraphError;
use thiserror::Error;

/// Fatal indexing errors
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Invalid settings or an unsafe alias layout
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Backend call failed on a path where failure is not tolerated
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Index generation moved through its lifecycle out of order
    #[error("Invalid index generation transition for {index}: {from} -> {to}")]
    InvalidTransition {
        index: String,
        from: String,
        to: String,
    },

    /// An indexing worker panicked or was cancelled
    #[error("Indexing worker failed: {0}")]
    Worker(String),

    #[error("Content graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IndexingError {
    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an invalid transition error
    pub fn invalid_transition(
        index: impl Into<String>,
        from: impl ToString,
        to: impl ToString,
    ) -> Self {
        Self::InvalidTransition {
            index: index.into(),
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Create a worker error
    pub fn worker(msg: impl Into<String>) -> Self {
        Self::Worker(msg.into())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}
