//! Mapping generation
//!
//! Every concrete node type gets one mapping: the optional full override from
//! its search configuration, the fixed system fields every document carries,
//! and one entry per declared property. Property mappings come from the
//! property's own `elasticSearchMapping`, else from the type-default table;
//! properties with neither are reported as warnings.

use crate::models::{NodeType, NodeTypeRegistry, UNSTRUCTURED_NODE_TYPE};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Generated mapping of one node type
#[derive(Debug, Clone, PartialEq)]
pub struct NodeTypeMapping {
    pub node_type: String,

    /// Backend type name, see [`NodeType::mapping_name`]
    pub type_name: String,

    pub body: Value,
}

/// All generated mappings plus the warnings collected on the way
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingCollection {
    pub mappings: Vec<NodeTypeMapping>,
    pub warnings: Vec<String>,
}

impl MappingCollection {
    pub fn get(&self, node_type: &str) -> Option<&NodeTypeMapping> {
        self.mappings
            .iter()
            .find(|mapping| mapping.node_type == node_type)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

/// Builds [`MappingCollection`]s from a node type registry
#[derive(Debug, Clone)]
pub struct MappingBuilder {
    default_property_mappings: BTreeMap<String, Value>,
}

impl MappingBuilder {
    pub fn new(default_property_mappings: BTreeMap<String, Value>) -> Self {
        Self {
            default_property_mappings,
        }
    }

    /// Mappings for every non-abstract type except `unstructured`
    pub fn build(&self, node_types: &NodeTypeRegistry) -> MappingCollection {
        let mut collection = MappingCollection::default();

        for node_type in node_types.iter() {
            if node_type.name == UNSTRUCTURED_NODE_TYPE || node_type.is_abstract {
                continue;
            }
            let body = self.mapping_for(node_type, &mut collection.warnings);
            collection.mappings.push(NodeTypeMapping {
                node_type: node_type.name.clone(),
                type_name: node_type.mapping_name(),
                body,
            });
        }

        collection
    }

    fn mapping_for(&self, node_type: &NodeType, warnings: &mut Vec<String>) -> Value {
        let mut body = match &node_type.search.elastic_search_mapping {
            Some(Value::Object(full)) => full.clone(),
            _ => Map::new(),
        };

        let mut templates = match body.remove("dynamic_templates") {
            Some(Value::Array(templates)) => templates,
            _ => Vec::new(),
        };
        templates.push(json!({
            "dimensions": {
                "path_match": "__dimensionCombinations.*",
                "match_mapping_type": "string",
                "mapping": { "type": "keyword" }
            }
        }));
        body.insert("dynamic_templates".to_string(), Value::Array(templates));

        let mut properties = match body.remove("properties") {
            Some(Value::Object(properties)) => properties,
            _ => Map::new(),
        };
        for (name, mapping) in system_fields() {
            properties.insert(name.to_string(), mapping);
        }

        for (name, declaration) in &node_type.properties {
            if let Some(mapping) = &declaration.search.elastic_search_mapping {
                properties.insert(name.clone(), mapping.clone());
                continue;
            }
            let default = declaration
                .property_type
                .as_ref()
                .and_then(|property_type| self.default_property_mappings.get(property_type));
            match default {
                Some(mapping) => {
                    properties.insert(name.clone(), mapping.clone());
                }
                None => warnings.push(format!(
                    "Node Type \"{}\" - property \"{}\": No ElasticSearch Mapping found.",
                    node_type.name, name
                )),
            }
        }

        body.insert("properties".to_string(), Value::Object(properties));
        Value::Object(body)
    }
}

fn system_fields() -> [(&'static str, Value); 7] {
    [
        ("__identifier", json!({"type": "keyword"})),
        ("__nodeType", json!({"type": "keyword"})),
        ("__dimensionCombinationHash", json!({"type": "keyword"})),
        (
            "__hierarchyRelations",
            json!({
                "type": "nested",
                "properties": {
                    "subgraph": {"type": "keyword"},
                    "sortIndex": {"type": "integer"},
                    "accessRoles": {"type": "keyword"},
                    "hidden": {"type": "boolean"},
                    "hiddenBeforeDateTime": {"type": "date", "format": "date_time_no_millis"},
                    "hiddenAfterDateTime": {"type": "date", "format": "date_time_no_millis"},
                    "hiddenInIndex": {"type": "boolean"}
                }
            }),
        ),
        (
            "__incomingReferenceRelations",
            json!({
                "type": "nested",
                "properties": {
                    "source": {"type": "keyword"},
                    "name": {"type": "keyword"}
                }
            }),
        ),
        (
            "__outgoingReferenceRelations",
            json!({
                "type": "nested",
                "properties": {
                    "target": {"type": "keyword"},
                    "name": {"type": "keyword"},
                    "sortIndex": {"type": "integer"}
                }
            }),
        ),
        ("__fulltext", json!({"type": "object"})),
    ]
}
