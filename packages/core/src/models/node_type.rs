//! Node Type Configuration
//!
//! A [`NodeType`] carries the search-related configuration the indexer needs:
//!
//! - whether the type is a **fulltext root** (`search.fulltext.enable`), i.e. it
//!   owns an aggregated text blob for itself and its non-root descendants
//! - an optional full mapping override for the backend
//! - per-property declarations: property type (for the type-default mapping
//!   table), an optional explicit mapping, whether the property is indexed at
//!   all, and how its text feeds the fulltext payload
//!
//! ## Example Node Type
//!
//! ```json
//! {
//!   "name": "Acme.Site:Page",
//!   "search": { "fulltext": { "enable": true } },
//!   "properties": {
//!     "title": {
//!       "type": "string",
//!       "search": { "fulltextExtractor": { "kind": "extractInto", "bucket": "h1" } }
//!     },
//!     "internalNote": { "type": "string", "search": { "indexing": false } }
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Node type excluded from mapping generation
pub const UNSTRUCTURED_NODE_TYPE: &str = "unstructured";

fn default_true() -> bool {
    true
}

/// How a property's text contributes to the fulltext payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FulltextExtractor {
    /// Route headings into `h1` .. `h6`, everything else into `text`
    ExtractHtmlTags,

    /// Append the tag-stripped value to one named bucket
    ExtractInto { bucket: String },
}

/// Search settings of a single property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySearchConfiguration {
    /// Explicit backend mapping for this property
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elastic_search_mapping: Option<Value>,

    /// Whether the property value is copied into the document
    #[serde(default = "default_true")]
    pub indexing: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fulltext_extractor: Option<FulltextExtractor>,
}

impl Default for PropertySearchConfiguration {
    fn default() -> Self {
        Self {
            elastic_search_mapping: None,
            indexing: true,
            fulltext_extractor: None,
        }
    }
}

/// Declaration of one property on a node type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyConfiguration {
    /// Property type name used to look up the default mapping (e.g. "string")
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,

    #[serde(default)]
    pub search: PropertySearchConfiguration,
}

impl PropertyConfiguration {
    pub fn typed(property_type: impl Into<String>) -> Self {
        Self {
            property_type: Some(property_type.into()),
            search: PropertySearchConfiguration::default(),
        }
    }

    pub fn with_fulltext(mut self, extractor: FulltextExtractor) -> Self {
        self.search.fulltext_extractor = Some(extractor);
        self
    }

    pub fn with_mapping(mut self, mapping: Value) -> Self {
        self.search.elastic_search_mapping = Some(mapping);
        self
    }

    pub fn not_indexed(mut self) -> Self {
        self.search.indexing = false;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulltextConfiguration {
    #[serde(default)]
    pub enable: bool,
}

/// Type-level search settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchConfiguration {
    #[serde(default)]
    pub fulltext: FulltextConfiguration,

    /// Full mapping override, used as the base of the generated mapping
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elastic_search_mapping: Option<Value>,
}

/// Node type with its search configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeType {
    /// Fully qualified type name, e.g. `Acme.Site:Page`
    pub name: String,

    /// Abstract types never get a mapping of their own
    #[serde(rename = "abstract", default)]
    pub is_abstract: bool,

    #[serde(default)]
    pub super_types: Vec<String>,

    #[serde(default)]
    pub search: SearchConfiguration,

    #[serde(default)]
    pub properties: BTreeMap<String, PropertyConfiguration>,
}

impl NodeType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_abstract: false,
            super_types: Vec::new(),
            search: SearchConfiguration::default(),
            properties: BTreeMap::new(),
        }
    }

    /// Mark the type as a fulltext root
    pub fn fulltext_root(mut self) -> Self {
        self.search.fulltext.enable = true;
        self
    }

    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, configuration: PropertyConfiguration) -> Self {
        self.properties.insert(name.into(), configuration);
        self
    }

    /// Whether nodes of this type own an aggregated fulltext payload
    pub fn is_fulltext_root(&self) -> bool {
        self.search.fulltext.enable
    }

    pub fn property(&self, name: &str) -> Option<&PropertyConfiguration> {
        self.properties.get(name)
    }

    /// Backend type name: `.` and `:` are not allowed there
    pub fn mapping_name(&self) -> String {
        mapping_name_for(&self.name)
    }
}

/// Convert a node type name into the name used for its mapping type
pub fn mapping_name_for(node_type_name: &str) -> String {
    node_type_name.replace(['.', ':'], "-")
}

/// Lookup table of node types by name
#[derive(Debug, Clone, Default)]
pub struct NodeTypeRegistry {
    types: BTreeMap<String, Arc<NodeType>>,
}

impl NodeTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node type, replacing any previous type with the same name
    pub fn register(&mut self, node_type: NodeType) -> Arc<NodeType> {
        let node_type = Arc::new(node_type);
        self.types.insert(node_type.name.clone(), node_type.clone());
        node_type
    }

    pub fn get(&self, name: &str) -> Option<Arc<NodeType>> {
        self.types.get(name).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<NodeType>> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl FromIterator<NodeType> for NodeTypeRegistry {
    fn from_iter<T: IntoIterator<Item = NodeType>>(iter: T) -> Self {
        let mut registry = Self::new();
        for node_type in iter {
            registry.register(node_type);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fulltext_root_flag_from_configuration() {
        let node_type: NodeType = serde_json::from_value(json!({
            "name": "Acme.Site:Page",
            "search": {"fulltext": {"enable": true}}
        }))
        .expect("valid node type");
        assert!(node_type.is_fulltext_root());

        let plain: NodeType =
            serde_json::from_value(json!({"name": "Acme.Site:Text"})).expect("valid node type");
        assert!(!plain.is_fulltext_root());
    }

    #[test]
    fn test_property_search_defaults() {
        let node_type: NodeType = serde_json::from_value(json!({
            "name": "Acme.Site:Text",
            "properties": {
                "text": {
                    "type": "string",
                    "search": {"fulltextExtractor": {"kind": "extractHtmlTags"}}
                },
                "secret": {"type": "string", "search": {"indexing": false}},
                "plain": {}
            }
        }))
        .expect("valid node type");

        let text = node_type.property("text").expect("declared");
        assert!(text.search.indexing);
        assert_eq!(
            text.search.fulltext_extractor,
            Some(FulltextExtractor::ExtractHtmlTags)
        );
        assert!(!node_type.property("secret").expect("declared").search.indexing);
        assert!(node_type.property("plain").expect("declared").search.indexing);
    }

    #[test]
    fn test_mapping_name_replaces_separators() {
        assert_eq!(mapping_name_for("Acme.Site:Page"), "Acme-Site-Page");
    }

    #[test]
    fn test_registry_lookup() {
        let registry: NodeTypeRegistry = [
            NodeType::new("Acme.Site:Page").fulltext_root(),
            NodeType::new("Acme.Site:Abstract").abstract_type(),
        ]
        .into_iter()
        .collect();

        assert_eq!(registry.len(), 2);
        assert!(registry.get("Acme.Site:Page").expect("registered").is_fulltext_root());
        assert!(registry.get("missing").is_none());
    }
}
