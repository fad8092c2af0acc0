//! Bulk write buffering
//!
//! Documents are not written one by one. The [`BulkWriteBuffer`] collects
//! [`BulkOperation`]s, each tagged with the dimension hash of the generation it
//! targets, and sends them as NDJSON bulk requests.
//!
//! # Flush Policy
//!
//! - **Count bound**: [`record_node`](BulkWriteBuffer::record_node) flushes as
//!   soon as `batch_size` nodes were processed since the last flush
//! - **Byte bound**: operations are encoded when pushed;
//!   [`record_node`](BulkWriteBuffer::record_node) also flushes once the
//!   encoded payload reaches `max_bulk_payload_bytes`, and a flush splits the
//!   pending operations into requests of at most that size. An operation
//!   larger than the ceiling is sent alone
//! - **At most once**: the buffer is cleared after every flush, whatever the
//!   outcome; nothing is retried
//!
//! Failures never abort the build. Dropped and rejected operations are logged,
//! returned in the [`FlushSummary`] and added to the shared
//! [`ErrorTracker`].

use super::ErrorTracker;
use crate::backend::SearchBackend;
use crate::models::{Document, DocumentId, FulltextPayload};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

/// One pending write
#[derive(Debug, Clone)]
pub enum BulkOperation {
    /// Create or replace a document
    IndexDocument {
        dimension_hash: String,
        document: Box<Document>,
    },

    /// Set the `__fulltext` field of a document, creating it if needed
    IndexFulltext {
        dimension_hash: String,
        id: DocumentId,
        fulltext: FulltextPayload,
    },

    DeleteDocument {
        dimension_hash: String,
        id: DocumentId,
    },
}

impl BulkOperation {
    pub fn index_document(dimension_hash: impl Into<String>, document: Document) -> Self {
        Self::IndexDocument {
            dimension_hash: dimension_hash.into(),
            document: Box::new(document),
        }
    }

    pub fn index_fulltext(
        dimension_hash: impl Into<String>,
        id: DocumentId,
        fulltext: FulltextPayload,
    ) -> Self {
        Self::IndexFulltext {
            dimension_hash: dimension_hash.into(),
            id,
            fulltext,
        }
    }

    pub fn delete_document(dimension_hash: impl Into<String>, id: DocumentId) -> Self {
        Self::DeleteDocument {
            dimension_hash: dimension_hash.into(),
            id,
        }
    }

    /// Dimension hash of the target generation
    pub fn dimension_hash(&self) -> &str {
        match self {
            Self::IndexDocument { dimension_hash, .. }
            | Self::IndexFulltext { dimension_hash, .. }
            | Self::DeleteDocument { dimension_hash, .. } => dimension_hash,
        }
    }

    pub fn document_id(&self) -> &DocumentId {
        match self {
            Self::IndexDocument { document, .. } => &document.id,
            Self::IndexFulltext { id, .. } | Self::DeleteDocument { id, .. } => id,
        }
    }

    /// Action line plus payload line (none for deletes), newline terminated
    pub fn to_ndjson(&self, index: &str) -> Result<String, serde_json::Error> {
        let target = json!({ "_index": index, "_id": self.document_id() });
        let mut out = String::new();
        match self {
            Self::IndexDocument { document, .. } => {
                out.push_str(&serde_json::to_string(&json!({ "index": target }))?);
                out.push('\n');
                out.push_str(&serde_json::to_string(document)?);
            }
            Self::IndexFulltext { fulltext, .. } => {
                out.push_str(&serde_json::to_string(&json!({ "update": target }))?);
                out.push('\n');
                out.push_str(&serde_json::to_string(&json!({
                    "doc": { "__fulltext": fulltext },
                    "doc_as_upsert": true,
                }))?);
            }
            Self::DeleteDocument { .. } => {
                out.push_str(&serde_json::to_string(&json!({ "delete": target }))?);
            }
        }
        out.push('\n');
        Ok(out)
    }
}

/// Outcome of one or more flushes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushSummary {
    /// Operations accepted by the backend
    pub sent: usize,

    /// Operations rejected by the backend or lost with a failed request
    pub failed: usize,

    /// Operations never sent: no registered target or not serializable
    pub dropped: usize,

    /// Bulk requests issued
    pub requests: usize,
}

impl FlushSummary {
    pub fn merge(&mut self, other: FlushSummary) {
        self.sent += other.sent;
        self.failed += other.failed;
        self.dropped += other.dropped;
        self.requests += other.requests;
    }

    pub fn errors(&self) -> usize {
        self.failed + self.dropped
    }
}

/// Ordered buffer of pending bulk operations
pub struct BulkWriteBuffer {
    backend: Arc<dyn SearchBackend>,
    /// Dimension hash → generation name
    targets: HashMap<String, String>,
    pending: Vec<BulkOperation>,
    /// NDJSON lines of `pending`, same order; `None` when not encodable at push
    encoded: Vec<Option<String>>,
    pending_bytes: usize,
    batch_size: usize,
    max_payload_bytes: usize,
    nodes_since_flush: usize,
    errors: ErrorTracker,
}

impl BulkWriteBuffer {
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        batch_size: usize,
        max_payload_bytes: usize,
        errors: ErrorTracker,
    ) -> Self {
        Self {
            backend,
            targets: HashMap::new(),
            pending: Vec::new(),
            encoded: Vec::new(),
            pending_bytes: 0,
            batch_size: batch_size.max(1),
            max_payload_bytes: max_payload_bytes.max(1),
            nodes_since_flush: 0,
            errors,
        }
    }

    /// Route operations tagged with `dimension_hash` to `generation`
    pub fn register_target(&mut self, dimension_hash: impl Into<String>, generation: impl Into<String>) {
        self.targets.insert(dimension_hash.into(), generation.into());
    }

    pub fn push(&mut self, operation: BulkOperation) {
        let lines = self.encode(&operation).and_then(Result::ok);
        self.pending_bytes += lines.as_ref().map_or(0, String::len);
        self.encoded.push(lines);
        self.pending.push(operation);
    }

    pub fn pending(&self) -> &[BulkOperation] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn nodes_since_flush(&self) -> usize {
        self.nodes_since_flush
    }

    /// Encoded size of the pending operations with a registered target
    pub fn pending_bytes(&self) -> usize {
        self.pending_bytes
    }

    /// Count one processed node; flushes when the batch is full or the
    /// pending payload reached the byte ceiling
    pub async fn record_node(&mut self) -> Option<FlushSummary> {
        self.nodes_since_flush += 1;
        if self.nodes_since_flush >= self.batch_size {
            Some(self.flush().await)
        } else if self.pending_bytes >= self.max_payload_bytes {
            tracing::debug!(
                "Pending payload of {} bytes reached the ceiling after {} nodes",
                self.pending_bytes,
                self.nodes_since_flush
            );
            Some(self.flush().await)
        } else {
            None
        }
    }

    /// `None` when no generation is registered for the operation
    fn encode(&self, operation: &BulkOperation) -> Option<Result<String, serde_json::Error>> {
        let index = self.targets.get(operation.dimension_hash())?;
        Some(operation.to_ndjson(index))
    }

    /// Send every pending operation and clear the buffer
    pub async fn flush(&mut self) -> FlushSummary {
        self.nodes_since_flush = 0;
        self.pending_bytes = 0;
        let operations = std::mem::take(&mut self.pending);
        let encoded = std::mem::take(&mut self.encoded);
        let mut summary = FlushSummary::default();
        if operations.is_empty() {
            return summary;
        }

        let mut chunk = String::new();
        let mut chunk_operations = 0;

        for (operation, lines) in operations.iter().zip(encoded) {
            // Targets registered after the push are picked up here
            let lines = match lines.map(Ok).or_else(|| self.encode(operation)) {
                Some(Ok(lines)) => lines,
                Some(Err(e)) => {
                    tracing::error!(
                        "Failed to serialize bulk operation for {}: {}",
                        operation.document_id(),
                        e
                    );
                    summary.dropped += 1;
                    continue;
                }
                None => {
                    tracing::error!(
                        "No generation registered for dimension hash {}, dropping operation for {}",
                        operation.dimension_hash(),
                        operation.document_id()
                    );
                    summary.dropped += 1;
                    continue;
                }
            };

            if !chunk.is_empty() && chunk.len() + lines.len() > self.max_payload_bytes {
                self.send(std::mem::take(&mut chunk), chunk_operations, &mut summary)
                    .await;
                chunk_operations = 0;
            }
            chunk.push_str(&lines);
            chunk_operations += 1;
        }

        if !chunk.is_empty() {
            self.send(chunk, chunk_operations, &mut summary).await;
        }

        self.errors.record_many(summary.errors());
        tracing::debug!(
            "Flushed {} operations in {} requests ({} failed, {} dropped)",
            operations.len(),
            summary.requests,
            summary.failed,
            summary.dropped
        );
        summary
    }

    async fn send(&self, body: String, operations: usize, summary: &mut FlushSummary) {
        summary.requests += 1;
        match self.backend.bulk(body).await {
            Ok(response) => {
                let mut failed = 0;
                for item in response.failed_items() {
                    failed += 1;
                    tracing::error!(
                        "Bulk {} of {} failed with status {}: {}",
                        item.action,
                        item.id.as_deref().unwrap_or("?"),
                        item.status,
                        item.error
                            .as_ref()
                            .map(|error| error.to_string())
                            .unwrap_or_default()
                    );
                }
                summary.failed += failed;
                summary.sent += operations.saturating_sub(failed);
            }
            Err(e) => {
                tracing::error!("Bulk request with {} operations failed: {}", operations, e);
                summary.failed += operations;
            }
        }
    }
}
