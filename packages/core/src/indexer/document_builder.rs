//! Document building
//!
//! Converts one node in one subgraph into a [`Document`] and buffers the bulk
//! operations that write it.

use super::{
    BulkOperation, BulkWriteBuffer, FulltextAggregator, IndexingObserver, PropertyExtractor,
};
use crate::graph::{ContentGraph, ContentNode, SubgraphNode};
use crate::models::{
    Document, DocumentId, FulltextPayload, HierarchyRelation, HierarchyRelationEntry, IncomingReferenceEntry,
    OutgoingReferenceEntry, Subgraph,
};
use chrono::{DateTime, SecondsFormat, Utc};

/// Builds documents for node variants
pub struct DocumentBuilder<'a> {
    graph: &'a dyn ContentGraph,
    extractor: &'a dyn PropertyExtractor,
    observer: &'a dyn IndexingObserver,
    aggregator: FulltextAggregator,
}

impl<'a> DocumentBuilder<'a> {
    pub fn new(
        graph: &'a dyn ContentGraph,
        extractor: &'a dyn PropertyExtractor,
        observer: &'a dyn IndexingObserver,
    ) -> Self {
        Self {
            graph,
            extractor,
            observer,
            aggregator: FulltextAggregator,
        }
    }

    /// Project `node` into the subgraph's dimension space point
    pub fn build(&self, node: &dyn ContentNode, subgraph: &Subgraph) -> Document {
        let variant = SubgraphNode::new(node, subgraph);
        let point = variant.dimension_space_point();
        let node_type = node.node_type();

        let extracted = self.extractor.extract(&variant, &mut |property: &str| {
            self.observer.property_skipped(node.key(), property)
        });

        let is_fulltext_root = node.is_fulltext_root();
        let fulltext = if is_fulltext_root {
            let mut payload = extracted.fulltext;
            self.aggregator.append_descendants(
                self.graph,
                node,
                point,
                self.extractor,
                self.observer,
                &mut payload,
            );
            payload
        } else {
            FulltextPayload::default()
        };

        let hierarchy_relations = node
            .incoming_hierarchy_relations()
            .iter()
            .filter(|relation| relation.is_in_dimension(point))
            .map(hierarchy_entry)
            .collect();

        let incoming_reference_relations = node
            .incoming_reference_relations()
            .iter()
            .map(|relation| IncomingReferenceEntry {
                source: relation.source.aggregate_id.clone(),
                name: relation.name.clone(),
            })
            .collect();

        let outgoing_reference_relations = node
            .outgoing_reference_relations()
            .iter()
            .map(|relation| OutgoingReferenceEntry {
                target: relation.target.aggregate_id.clone(),
                name: relation.name.clone(),
                sort_index: relation.sort_index,
            })
            .collect();

        let combination = point.without_workspace();

        Document {
            id: variant.document_id(),
            mapping_type: node_type.mapping_name(),
            dimension_space_point: point.clone(),
            fulltext,
            is_fulltext_root,
            identifier: node.aggregate_id().clone(),
            node_type: node_type.name.clone(),
            dimension_combinations: combination.coordinates().clone(),
            dimension_combination_hash: combination.hash(),
            hierarchy_relations,
            incoming_reference_relations,
            outgoing_reference_relations,
            properties: extracted.fields,
        }
    }

    /// Build the document and buffer its operations under `dimension_hash`
    ///
    /// Every document gets an index operation; fulltext roots additionally get
    /// a fulltext update.
    pub fn index(
        &self,
        node: &dyn ContentNode,
        subgraph: &Subgraph,
        dimension_hash: &str,
        buffer: &mut BulkWriteBuffer,
    ) -> DocumentId {
        let mut document = self.build(node, subgraph);
        let id = document.id.clone();

        tracing::debug!(
            "Indexing node {} of type {} in {} as {}",
            document.identifier,
            document.node_type,
            document.dimension_space_point,
            id
        );

        if document.is_fulltext_root {
            let fulltext = std::mem::take(&mut document.fulltext);
            buffer.push(BulkOperation::index_document(dimension_hash, document));
            buffer.push(BulkOperation::index_fulltext(dimension_hash, id.clone(), fulltext));
        } else {
            buffer.push(BulkOperation::index_document(dimension_hash, document));
        }

        id
    }
}

fn hierarchy_entry(relation: &HierarchyRelation) -> HierarchyRelationEntry {
    HierarchyRelationEntry {
        subgraph: relation.subgraph_hash(),
        sort_index: relation.sort_index,
        access_roles: relation.access_roles.clone(),
        hidden: relation.hidden,
        hidden_before_date_time: relation.hidden_before_date_time.as_ref().map(format_date_time),
        hidden_after_date_time: relation.hidden_after_date_time.as_ref().map(format_date_time),
        hidden_in_index: relation.hidden_in_index,
    }
}

/// RFC 3339 with whole seconds and numeric offset, e.g. `2024-05-01T12:00:00+00:00`
fn format_date_time(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemorySearchBackend;
    use crate::graph::InMemoryContentGraph;
    use crate::indexer::{ConfiguredPropertyExtractor, ErrorTracker, TracingObserver};
    use crate::models::{
        DimensionSpacePoint, FulltextExtractor, NodeKey, NodeType, PropertyBag,
        PropertyConfiguration, ReferenceRelation,
    };
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::Arc;

    fn live(language: &str) -> DimensionSpacePoint {
        DimensionSpacePoint::from_pairs([("_workspace", "live"), ("language", language)])
    }

    fn props(value: serde_json::Value) -> PropertyBag {
        value.as_object().cloned().unwrap_or_default()
    }

    struct Fixture {
        graph: InMemoryContentGraph,
        page: NodeKey,
        text: NodeKey,
    }

    fn fixture() -> Fixture {
        let (en, de) = (live("en"), live("de"));
        let root = NodeKey::new("root", en.clone());
        let page = NodeKey::new("page", en.clone());
        let text = NodeKey::new("text", en.clone());
        let en_subgraph = Subgraph::for_point(en.clone()).expect("workspace");
        let de_subgraph = Subgraph::for_point(de.clone()).expect("workspace");

        let mut hidden = HierarchyRelation::new(root.clone(), page.clone(), en_subgraph.clone(), 10);
        hidden.hidden_before_date_time = Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        hidden.access_roles = vec!["Editor".to_string()];

        let graph = InMemoryContentGraph::builder()
            .node_type(NodeType::new("Acme:Root"))
            .node_type(
                NodeType::new("Acme.Site:Page")
                    .fulltext_root()
                    .with_property(
                        "title",
                        PropertyConfiguration::typed("string").with_fulltext(FulltextExtractor::ExtractInto {
                            bucket: "h1".to_string(),
                        }),
                    ),
            )
            .node_type(NodeType::new("Acme.Site:Text").with_property(
                "text",
                PropertyConfiguration::typed("string").with_fulltext(FulltextExtractor::ExtractHtmlTags),
            ))
            .dimension_space_point(en.clone())
            .dimension_space_point(de.clone())
            .node(root.clone(), "Acme:Root", PropertyBag::new())
            .node(page.clone(), "Acme.Site:Page", props(json!({"title": "Home", "legacy": 1})))
            .node(text.clone(), "Acme.Site:Text", props(json!({"text": "<p>hello</p>"})))
            .hierarchy(hidden)
            .hierarchy(HierarchyRelation::new(root.clone(), page.clone(), de_subgraph, 10))
            .hierarchy(HierarchyRelation::new(page.clone(), text.clone(), en_subgraph, 1))
            .reference(ReferenceRelation {
                source: text.clone(),
                target: page.clone(),
                name: "backlink".to_string(),
                sort_index: 3,
            })
            .build()
            .expect("valid graph");

        Fixture { graph, page, text }
    }

    #[test]
    fn test_build_renders_system_fields() {
        let fixture = fixture();
        let builder = DocumentBuilder::new(&fixture.graph, &ConfiguredPropertyExtractor, &TracingObserver);
        let page = fixture.graph.node(&fixture.page).expect("page");
        let subgraph = Subgraph::for_point(live("en")).expect("workspace");

        let document = builder.build(page, &subgraph);
        assert_eq!(document.mapping_type, "Acme-Site-Page");
        assert!(document.is_fulltext_root);
        assert_eq!(document.fulltext.get("h1"), Some("Home"));
        assert_eq!(document.fulltext.get("text"), Some("hello"));

        // only the relation owned by the en subgraph is attached
        assert_eq!(document.hierarchy_relations.len(), 1);
        let relation = &document.hierarchy_relations[0];
        assert_eq!(relation.subgraph, subgraph.hash());
        assert_eq!(
            relation.hidden_before_date_time.as_deref(),
            Some("2024-05-01T12:00:00+00:00")
        );

        let body = serde_json::to_value(&document).expect("serializable");
        assert_eq!(body["__identifier"], "page");
        assert_eq!(body["__nodeType"], "Acme.Site:Page");
        assert_eq!(body["__dimensionCombinations"], json!({"language": "en"}));
        assert_eq!(body["__incomingReferenceRelations"][0], json!({"source": "text", "name": "backlink"}));
        assert_eq!(body["__hierarchyRelations"][0]["accessRoles"], json!(["Editor"]));
        assert_eq!(body["title"], "Home");
        assert!(body.get("legacy").is_none());
        assert!(body.get("__fulltext").is_none());
    }

    #[test]
    fn test_non_root_has_empty_fulltext() {
        let fixture = fixture();
        let builder = DocumentBuilder::new(&fixture.graph, &ConfiguredPropertyExtractor, &TracingObserver);
        let text = fixture.graph.node(&fixture.text).expect("text");

        let document = builder.build(text, &Subgraph::for_point(live("en")).expect("workspace"));
        assert!(document.fulltext.is_empty());
        let body = serde_json::to_value(&document).expect("serializable");
        assert_eq!(
            body["__outgoingReferenceRelations"][0],
            json!({"target": "page", "name": "backlink", "sortIndex": 3})
        );
    }

    #[test]
    fn test_index_buffers_fulltext_only_for_roots() {
        let fixture = fixture();
        let builder = DocumentBuilder::new(&fixture.graph, &ConfiguredPropertyExtractor, &TracingObserver);
        let backend = Arc::new(InMemorySearchBackend::new());
        let mut buffer = BulkWriteBuffer::new(backend, 100, 1024, ErrorTracker::new());
        let subgraph = Subgraph::for_point(live("en")).expect("workspace");

        let page_id = builder.index(
            fixture.graph.node(&fixture.page).expect("page"),
            &subgraph,
            "combination",
            &mut buffer,
        );
        builder.index(
            fixture.graph.node(&fixture.text).expect("text"),
            &subgraph,
            "combination",
            &mut buffer,
        );

        let kinds: Vec<&str> = buffer
            .pending()
            .iter()
            .map(|operation| match operation {
                BulkOperation::IndexDocument { .. } => "document",
                BulkOperation::IndexFulltext { .. } => "fulltext",
                BulkOperation::DeleteDocument { .. } => "delete",
            })
            .collect();
        assert_eq!(kinds, vec!["document", "fulltext", "document"]);
        assert_eq!(buffer.pending()[1].document_id(), &page_id);
        assert!(buffer.pending().iter().all(|op| op.dimension_hash() == "combination"));
    }
}
