//! Search Documents
//!
//! A [`Document`] is the flat, backend-bound projection of one node in one
//! dimension space point. It is created transiently during an indexing pass,
//! turned into bulk operations and discarded.
//!
//! ## Document Layout
//!
//! ```json
//! {
//!   "__identifier": "7f0b2a6c-...",
//!   "__nodeType": "Acme.Site:Page",
//!   "__dimensionCombinations": { "language": "en" },
//!   "__dimensionCombinationHash": "44136fa3...",
//!   "__hierarchyRelations": [
//!     { "subgraph": "9c1f...", "sortIndex": 100, "accessRoles": [], "hidden": false,
//!       "hiddenBeforeDateTime": null, "hiddenAfterDateTime": null, "hiddenInIndex": false }
//!   ],
//!   "__incomingReferenceRelations": [ { "source": "a1", "name": "related" } ],
//!   "__outgoingReferenceRelations": [ { "target": "b2", "name": "author", "sortIndex": 0 } ],
//!   "title": "Welcome"
//! }
//! ```
//!
//! The fulltext payload is not part of the document body; it is written by a
//! separate update operation so it can be replaced independently.

use crate::models::{ContentStreamIdentity, DimensionSpacePoint, NodeAggregateId, PropertyBag};
use crate::utils::sha256_hex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;

/// Deterministic backend document id
///
/// A pure hash of (content stream, node aggregate id, dimension space point):
/// rebuilding an unchanged graph always yields the same ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Compute the id of one node variant
    ///
    /// # Examples
    ///
    /// ```rust
    /// use graphindex_core::models::{ContentStreamIdentity, DimensionSpacePoint, DocumentId, NodeAggregateId};
    ///
    /// let stream = ContentStreamIdentity::new("live");
    /// let node = NodeAggregateId::new("home");
    /// let point = DimensionSpacePoint::from_pairs([("_workspace", "live"), ("language", "en")]);
    ///
    /// let first = DocumentId::compute(&stream, &node, &point);
    /// let second = DocumentId::compute(&stream, &node, &point);
    /// assert_eq!(first, second);
    /// ```
    pub fn compute(
        content_stream: &ContentStreamIdentity,
        node_aggregate_id: &NodeAggregateId,
        dimension_space_point: &DimensionSpacePoint,
    ) -> Self {
        let encoded = json!({
            "nodeAggregateIdentifier": node_aggregate_id,
            "contentStreamIdentifier": content_stream,
            "dimensionSpacePoint": dimension_space_point,
        })
        .to_string();
        Self(sha256_hex(encoded))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Aggregated fulltext: bucket name → concatenated text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FulltextPayload {
    buckets: BTreeMap<String, String>,
}

impl FulltextPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `text` to `bucket`, separated from existing text by one space
    pub fn append(&mut self, bucket: &str, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let entry = self.buckets.entry(bucket.to_string()).or_default();
        if !entry.is_empty() {
            entry.push(' ');
        }
        entry.push_str(text);
    }

    /// Append every bucket of `other`
    pub fn merge(&mut self, other: &FulltextPayload) {
        for (bucket, text) in &other.buckets {
            self.append(bucket, text);
        }
    }

    pub fn get(&self, bucket: &str) -> Option<&str> {
        self.buckets.get(bucket).map(String::as_str)
    }

    pub fn buckets(&self) -> &BTreeMap<String, String> {
        &self.buckets
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Whether any bucket contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.buckets.values().any(|text| text.contains(needle))
    }
}

/// Rendered hierarchy relation inside a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyRelationEntry {
    /// Hash of the owning subgraph
    pub subgraph: String,
    pub sort_index: i64,
    pub access_roles: Vec<String>,
    pub hidden: bool,
    /// RFC 3339 without fractional seconds
    pub hidden_before_date_time: Option<String>,
    pub hidden_after_date_time: Option<String>,
    pub hidden_in_index: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingReferenceEntry {
    pub source: NodeAggregateId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingReferenceEntry {
    pub target: NodeAggregateId,
    pub name: String,
    pub sort_index: i64,
}

/// Backend-bound projection of one (node, dimension space point) pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    #[serde(skip)]
    pub id: DocumentId,

    /// Mapping type the document belongs to
    #[serde(skip)]
    pub mapping_type: String,

    /// Dimension space point of the subgraph the document was built in
    #[serde(skip)]
    pub dimension_space_point: DimensionSpacePoint,

    #[serde(skip)]
    pub fulltext: FulltextPayload,

    #[serde(skip)]
    pub is_fulltext_root: bool,

    #[serde(rename = "__identifier")]
    pub identifier: NodeAggregateId,

    #[serde(rename = "__nodeType")]
    pub node_type: String,

    #[serde(rename = "__dimensionCombinations")]
    pub dimension_combinations: BTreeMap<String, String>,

    #[serde(rename = "__dimensionCombinationHash")]
    pub dimension_combination_hash: String,

    #[serde(rename = "__hierarchyRelations")]
    pub hierarchy_relations: Vec<HierarchyRelationEntry>,

    #[serde(rename = "__incomingReferenceRelations")]
    pub incoming_reference_relations: Vec<IncomingReferenceEntry>,

    #[serde(rename = "__outgoingReferenceRelations")]
    pub outgoing_reference_relations: Vec<OutgoingReferenceEntry>,

    /// Extracted indexable properties
    #[serde(flatten)]
    pub properties: PropertyBag,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_changes_with_each_component() {
        let stream = ContentStreamIdentity::new("live");
        let node = NodeAggregateId::new("home");
        let en = DimensionSpacePoint::from_pairs([("_workspace", "live"), ("language", "en")]);
        let de = DimensionSpacePoint::from_pairs([("_workspace", "live"), ("language", "de")]);

        let base = DocumentId::compute(&stream, &node, &en);
        assert_ne!(base, DocumentId::compute(&stream, &node, &de));
        assert_ne!(
            base,
            DocumentId::compute(&ContentStreamIdentity::new("user-me"), &node, &en)
        );
        assert_ne!(
            base,
            DocumentId::compute(&stream, &NodeAggregateId::new("other"), &en)
        );
        assert_eq!(base.as_str().len(), 64);
    }

    #[test]
    fn test_fulltext_append_joins_with_space() {
        let mut payload = FulltextPayload::new();
        payload.append("text", "hello");
        payload.append("text", "  there ");
        payload.append("text", "   ");
        payload.append("h1", "Title");

        assert_eq!(payload.get("text"), Some("hello there"));
        assert_eq!(payload.get("h1"), Some("Title"));
        assert!(payload.contains("there"));
    }

    #[test]
    fn test_fulltext_merge() {
        let mut root = FulltextPayload::new();
        root.append("text", "root");
        let mut child = FulltextPayload::new();
        child.append("text", "child");
        child.append("h2", "Heading");

        root.merge(&child);
        assert_eq!(root.get("text"), Some("root child"));
        assert_eq!(root.get("h2"), Some("Heading"));
    }
}
