//! Workspace Indexing Mode
//!
//! Decides which workspaces a node's occupied points may come from.

use crate::models::{DimensionSpacePoint, LIVE_WORKSPACE};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which workspace variants of a node are indexed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkspaceIndexingMode {
    /// Only points in the `live` workspace
    #[default]
    OnlyLive,

    /// Only points in the workspace the node originates from
    OnlyOrigin,

    /// Every workspace the node is visible in
    Full,
}

impl WorkspaceIndexingMode {
    /// Whether `point` should be indexed for a node created in `origin`
    pub fn admits(&self, point: &DimensionSpacePoint, origin: &DimensionSpacePoint) -> bool {
        match self {
            Self::OnlyLive => point.workspace() == Some(LIVE_WORKSPACE),
            Self::OnlyOrigin => point.workspace() == origin.workspace(),
            Self::Full => true,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnlyLive => "onlyLive",
            Self::OnlyOrigin => "onlyOrigin",
            Self::Full => "full",
        }
    }
}

impl fmt::Display for WorkspaceIndexingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown workspace indexing mode
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid workspace indexing mode '{0}', expected one of: onlyLive, onlyOrigin, full")]
pub struct InvalidIndexingMode(pub String);

impl FromStr for WorkspaceIndexingMode {
    type Err = InvalidIndexingMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "onlyLive" => Ok(Self::OnlyLive),
            "onlyOrigin" => Ok(Self::OnlyOrigin),
            "full" => Ok(Self::Full),
            other => Err(InvalidIndexingMode(other.to_string())),
        }
    }
}
