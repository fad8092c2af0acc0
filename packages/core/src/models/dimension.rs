//! Dimension Space Types
//!
//! Content in the graph exists in several simultaneous variants. Each variant is
//! addressed by a [`DimensionSpacePoint`]: an ordered mapping from dimension name
//! to coordinate value, e.g. `{"_workspace": "live", "language": "en"}`.
//!
//! # Architecture
//!
//! - **Canonical ordering**: coordinates live in a `BTreeMap`, so equality,
//!   hashing and JSON encoding never depend on insertion order
//! - **Workspace dimension**: the reserved `_workspace` coordinate selects the
//!   [`ContentStreamIdentity`] a subgraph belongs to
//! - **Subgraphs**: a [`Subgraph`] is one (content stream, point) slice of the
//!   graph; hierarchy relations are owned by exactly one subgraph

use crate::utils::sha256_hex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Name of the reserved dimension carrying the workspace
pub const WORKSPACE_DIMENSION: &str = "_workspace";

/// Name of the published workspace
pub const LIVE_WORKSPACE: &str = "live";

/// One coordinate tuple in dimension space
///
/// Two points are equal iff all coordinates match.
///
/// # Examples
///
/// ```rust
/// use graphindex_core::models::DimensionSpacePoint;
///
/// let point = DimensionSpacePoint::from_pairs([("_workspace", "live"), ("language", "en")]);
/// assert_eq!(point.workspace(), Some("live"));
/// assert_eq!(
///     point.without_workspace(),
///     DimensionSpacePoint::from_pairs([("language", "en")])
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DimensionSpacePoint {
    coordinates: BTreeMap<String, String>,
}

impl DimensionSpacePoint {
    /// Create a point from a coordinate map
    pub fn new(coordinates: BTreeMap<String, String>) -> Self {
        Self { coordinates }
    }

    /// Create a point from `(dimension, value)` pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            coordinates: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn coordinates(&self) -> &BTreeMap<String, String> {
        &self.coordinates
    }

    /// Coordinate value for `dimension`, if the point has one
    pub fn coordinate(&self, dimension: &str) -> Option<&str> {
        self.coordinates.get(dimension).map(String::as_str)
    }

    /// Value of the `_workspace` coordinate
    pub fn workspace(&self) -> Option<&str> {
        self.coordinate(WORKSPACE_DIMENSION)
    }

    /// Copy of this point with the `_workspace` coordinate removed
    pub fn without_workspace(&self) -> Self {
        let mut coordinates = self.coordinates.clone();
        coordinates.remove(WORKSPACE_DIMENSION);
        Self { coordinates }
    }

    /// Copy of this point with `dimension` set to `value`
    pub fn with_coordinate(&self, dimension: impl Into<String>, value: impl Into<String>) -> Self {
        let mut coordinates = self.coordinates.clone();
        coordinates.insert(dimension.into(), value.into());
        Self { coordinates }
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    /// Canonical JSON encoding (keys sorted)
    pub fn to_json(&self) -> String {
        json!(self.coordinates).to_string()
    }

    /// Stable hex digest of the canonical JSON encoding
    ///
    /// Used to name per-dimension index generations and to tag bulk operations
    /// with the generation they target.
    pub fn hash(&self) -> String {
        sha256_hex(self.to_json())
    }
}

impl fmt::Display for DimensionSpacePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}

/// Insertion-ordered set of dimension space points
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DimensionSpacePointSet {
    points: Vec<DimensionSpacePoint>,
    index: HashSet<DimensionSpacePoint>,
}

impl DimensionSpacePointSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a point; returns `false` if it was already present
    pub fn insert(&mut self, point: DimensionSpacePoint) -> bool {
        if self.index.contains(&point) {
            return false;
        }
        self.index.insert(point.clone());
        self.points.push(point);
        true
    }

    pub fn contains(&self, point: &DimensionSpacePoint) -> bool {
        self.index.contains(point)
    }

    /// Union of both sets, keeping this set's order first
    pub fn union(&self, other: &DimensionSpacePointSet) -> DimensionSpacePointSet {
        let mut result = self.clone();
        for point in other.iter() {
            result.insert(point.clone());
        }
        result
    }

    pub fn iter(&self) -> impl Iterator<Item = &DimensionSpacePoint> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl FromIterator<DimensionSpacePoint> for DimensionSpacePointSet {
    fn from_iter<T: IntoIterator<Item = DimensionSpacePoint>>(iter: T) -> Self {
        let mut set = Self::new();
        for point in iter {
            set.insert(point);
        }
        set
    }
}

impl IntoIterator for DimensionSpacePointSet {
    type Item = DimensionSpacePoint;
    type IntoIter = std::vec::IntoIter<DimensionSpacePoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.into_iter()
    }
}

/// Identifies the versioned branch a subgraph belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentStreamIdentity(String);

impl ContentStreamIdentity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Resolve the content stream from the `_workspace` coordinate of a point
    ///
    /// Returns `None` for points without a workspace coordinate.
    pub fn from_point(point: &DimensionSpacePoint) -> Option<Self> {
        point.workspace().map(Self::new)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentStreamIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One (content stream, dimension space point) slice of the content graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subgraph {
    pub content_stream: ContentStreamIdentity,
    pub dimension_space_point: DimensionSpacePoint,
}

impl Subgraph {
    pub fn new(content_stream: ContentStreamIdentity, dimension_space_point: DimensionSpacePoint) -> Self {
        Self {
            content_stream,
            dimension_space_point,
        }
    }

    /// Subgraph addressed by a point that carries its own `_workspace` coordinate
    pub fn for_point(dimension_space_point: DimensionSpacePoint) -> Option<Self> {
        let content_stream = ContentStreamIdentity::from_point(&dimension_space_point)?;
        Some(Self::new(content_stream, dimension_space_point))
    }

    /// Stable hash identifying the subgraph that owns a hierarchy relation
    pub fn hash(&self) -> String {
        sha256_hex(
            json!({
                "contentStreamIdentifier": self.content_stream,
                "dimensionSpacePoint": self.dimension_space_point,
            })
            .to_string(),
        )
    }
}
