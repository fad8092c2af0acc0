//! Property extraction
//!
//! Turns a node's property bag into the document fields and its own fulltext
//! contribution, driven by the property declarations of its node type.

use crate::graph::ContentNode;
use crate::models::{FulltextExtractor, FulltextPayload, PropertyBag};
use crate::utils::{extract_html_tags, strip_html};
use serde_json::Value;

/// Output of a property extraction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedProperties {
    /// Properties copied into the document body
    pub fields: PropertyBag,

    /// The node's own fulltext contribution
    pub fulltext: FulltextPayload,
}

/// Extracts indexable fields and fulltext from a node
pub trait PropertyExtractor: Send + Sync {
    /// `on_unmapped` is called once per property without configuration
    fn extract(&self, node: &dyn ContentNode, on_unmapped: &mut dyn FnMut(&str)) -> ExtractedProperties;
}

/// [`PropertyExtractor`] reading the node type's property declarations
///
/// - undeclared properties are reported and skipped
/// - declared properties are copied unless `search.indexing` is false
/// - a `fulltextExtractor` routes the value's text into fulltext buckets
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfiguredPropertyExtractor;

impl PropertyExtractor for ConfiguredPropertyExtractor {
    fn extract(&self, node: &dyn ContentNode, on_unmapped: &mut dyn FnMut(&str)) -> ExtractedProperties {
        let node_type = node.node_type();
        let mut extracted = ExtractedProperties::default();

        for (name, value) in node.properties() {
            let Some(declaration) = node_type.property(name) else {
                on_unmapped(name);
                continue;
            };

            if declaration.search.indexing {
                extracted.fields.insert(name.clone(), value.clone());
            }

            let Some(extractor) = &declaration.search.fulltext_extractor else {
                continue;
            };
            let Some(text) = text_of(value) else {
                continue;
            };
            match extractor {
                FulltextExtractor::ExtractHtmlTags => {
                    for (bucket, content) in extract_html_tags(&text) {
                        extracted.fulltext.append(&bucket, &content);
                    }
                }
                FulltextExtractor::ExtractInto { bucket } => {
                    extracted.fulltext.append(bucket, &strip_html(&text));
                }
            }
        }

        extracted
    }
}

/// Text content of a property value
fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(text_of).collect();
            (!parts.is_empty()).then(|| parts.join(" "))
        }
        Value::Null | Value::Bool(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphNode;
    use crate::models::{DimensionSpacePoint, NodeKey, NodeType, PropertyConfiguration};
    use serde_json::json;
    use std::sync::Arc;

    fn node(node_type: NodeType, properties: Value) -> GraphNode {
        GraphNode::new(
            NodeKey::new("n", DimensionSpacePoint::from_pairs([("_workspace", "live")])),
            Arc::new(node_type),
            properties.as_object().cloned().unwrap_or_default(),
        )
    }

    #[test]
    fn test_extracts_declared_properties_and_reports_others() {
        let node_type = NodeType::new("Acme:Text")
            .with_property(
                "text",
                PropertyConfiguration::typed("string").with_fulltext(FulltextExtractor::ExtractHtmlTags),
            )
            .with_property("secret", PropertyConfiguration::typed("string").not_indexed());
        let node = node(
            node_type,
            json!({
                "text": "<h2>Intro</h2><p>Body text</p>",
                "secret": "hidden",
                "legacy": 42
            }),
        );

        let mut unmapped = Vec::new();
        let extracted = ConfiguredPropertyExtractor.extract(&node, &mut |name: &str| unmapped.push(name.to_string()));

        assert_eq!(unmapped, vec!["legacy".to_string()]);
        assert!(extracted.fields.contains_key("text"));
        assert!(!extracted.fields.contains_key("secret"));
        assert_eq!(extracted.fulltext.get("h2"), Some("Intro"));
        assert_eq!(extracted.fulltext.get("text"), Some("Body text"));
    }

    #[test]
    fn test_extract_into_named_bucket() {
        let node_type = NodeType::new("Acme:Page").with_property(
            "title",
            PropertyConfiguration::typed("string").with_fulltext(FulltextExtractor::ExtractInto {
                bucket: "h1".to_string(),
            }),
        );
        let node = node(node_type, json!({"title": "<b>Welcome</b> home"}));

        let extracted = ConfiguredPropertyExtractor.extract(&node, &mut |_: &str| {});
        assert_eq!(extracted.fulltext.get("h1"), Some("Welcome home"));
        assert_eq!(extracted.fields["title"], json!("<b>Welcome</b> home"));
    }

    #[test]
    fn test_non_text_values_have_no_fulltext() {
        let node_type = NodeType::new("Acme:Flag").with_property(
            "enabled",
            PropertyConfiguration::typed("boolean").with_fulltext(FulltextExtractor::ExtractInto {
                bucket: "text".to_string(),
            }),
        );
        let node = node(node_type, json!({"enabled": true}));

        let extracted = ConfiguredPropertyExtractor.extract(&node, &mut |_: &str| {});
        assert!(extracted.fulltext.is_empty());
        assert_eq!(extracted.fields["enabled"], json!(true));
    }
}
