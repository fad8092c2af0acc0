//! Search Backend Error Types
//!
//! Errors returned by [`SearchBackend`](super::SearchBackend) implementations.
//! Callers decide which of them are tolerable: a 404 on alias lookup means
//! "no alias yet", everything else on the alias path is fatal.

use thiserror::Error;

/// Search backend operation errors
#[derive(Error, Debug)]
pub enum BackendError {
    /// Backend answered with a non-success status
    #[error("Backend responded with status {status}: {body}")]
    Http { status: u16, body: String },

    /// Request never produced a response
    #[error("Backend transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Request or response body could not be (de)serialized
    #[error("Backend serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Response parsed but did not have the expected shape
    #[error("Invalid backend response: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    /// Create an HTTP status error
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    /// Create a 404 error for a missing index or alias
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::http(404, format!("no such index or alias [{}]", name.into()))
    }

    /// Create an invalid response error
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Whether the backend reported the target as missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Http { status: 404, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_detection() {
        assert!(BackendError::not_found("neoscr").is_not_found());
        assert!(!BackendError::http(500, "boom").is_not_found());
        assert!(!BackendError::invalid_response("nope").is_not_found());
    }
}
