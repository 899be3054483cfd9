//! Chunk persistence: records, the transport seam, and the resilient client.
//!
//! ```text
//! ChunkRecord ──► ChunkStore::insert_chunks ──► ChunkStoreTransport::upsert_points
//!
//! query vector ──► ChunkStore::search ──► transport::search_points ──► ChunkRecord + score
//!
//! ChunkStore::delete_document
//!     ├─► filtered probe ──(missing index)──► create_payload_index ──► probe retry
//!     ├─► delete_by_filter                     (primary strategy)
//!     └─► bounded scroll scan ──► delete_by_ids (fallback strategy)
//! ```
//!
//! The client in this module is written entirely against the
//! [`ChunkStoreTransport`] trait; everything wire-specific lives in
//! [`qdrant`]. Swapping the backing store means writing a new transport,
//! not new deletion or pagination policy.

pub mod qdrant;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::types::StoreError;

pub use qdrant::QdrantTransport;

/// Default vector dimension for new collections.
pub const DEFAULT_DIMENSION: usize = 384;

/// Page size used for every scroll request, regardless of the caller's
/// `limit`. Bounds worst-case payload size and latency per round trip.
pub const SCROLL_PAGE_SIZE: usize = 64;

/// Maximum number of records inspected by the deletion fallback scan.
pub const SCAN_BUDGET: usize = 500;

/// Character length of content previews returned by [`ChunkStore::list`].
pub const PREVIEW_CHARS: usize = 80;

/// Payload keys owned by the store. Caller metadata under these keys is
/// dropped at write time rather than overwriting system fields.
pub const RESERVED_KEYS: [&str; 3] = ["content", "document_id", "ingested_at"];

/// A scalar metadata value.
///
/// Metadata is a closed union rather than open JSON so payload conversion
/// stays exhaustive: every variant has a defined wire representation and
/// anything else is rejected at the boundary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl MetadataValue {
    /// Converts a payload JSON value into a scalar, if it is one.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(MetadataValue::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(MetadataValue::Int(i))
                } else {
                    n.as_f64().map(MetadataValue::Float)
                }
            }
            serde_json::Value::String(s) => Some(MetadataValue::Str(s.clone())),
            _ => None,
        }
    }

    /// The wire representation of this value.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            MetadataValue::Bool(b) => serde_json::Value::from(*b),
            MetadataValue::Int(i) => serde_json::Value::from(*i),
            MetadataValue::Float(f) => serde_json::Value::from(*f),
            MetadataValue::Str(s) => serde_json::Value::from(s.clone()),
        }
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Bool(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Int(value)
    }
}

impl From<usize> for MetadataValue {
    fn from(value: usize) -> Self {
        MetadataValue::Int(value as i64)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        MetadataValue::Float(value)
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Str(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::Str(value)
    }
}

/// Open-ended scalar metadata attached to a chunk.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// A chunk ready for persistence, or read back from the store.
///
/// `logical_id` is the caller-meaningful identifier (`doc_{d}_chunk_{c}`),
/// carried in the store as the `document_id` payload field. The store's
/// internal point id is never part of this type's identity; when a read
/// operation surfaces it, it appears under the `point_id` metadata key.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub logical_id: String,
    pub content: String,
    /// Present on records slated for writing; read paths never return
    /// embeddings (callers do not need them and they dominate payload size).
    pub embedding: Option<Vec<f32>>,
    pub metadata: Metadata,
}

impl ChunkRecord {
    /// Creates a record with empty metadata and no embedding.
    pub fn new(logical_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            logical_id: logical_id.into(),
            content: content.into(),
            embedding: None,
            metadata: Metadata::new(),
        }
    }

    /// Attaches the embedding vector.
    #[must_use]
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Inserts a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A listing entry: identity plus a bounded preview, never the full payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChunkSummary {
    pub logical_id: String,
    /// First [`PREVIEW_CHARS`] characters of the content, with a trailing
    /// ellipsis when truncated.
    pub preview: String,
    /// Caller metadata with system-owned keys stripped. Includes `point_id`
    /// when the store's internal id differs from the logical id.
    pub metadata: Metadata,
}

/// Identity and session state of the remote collection.
///
/// Created once at startup and shared with every client that talks to the
/// collection. The index-readiness flag is the only mutable state in the
/// store layer; it is cached for the process lifetime and re-checked only
/// when a filtered operation fails with a missing-index error.
#[derive(Debug)]
pub struct CollectionHandle {
    name: String,
    dimension: usize,
    index_state: Mutex<IndexState>,
}

/// Readiness of the `document_id` payload index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexState {
    /// Not yet verified this session, or invalidated by a failed filtered
    /// operation.
    Unknown,
    /// Created or verified this session.
    Confirmed,
}

impl CollectionHandle {
    /// Creates a handle for `name` with the given vector dimension.
    pub fn new(name: impl Into<String>, dimension: usize) -> Self {
        Self {
            name: name.into(),
            dimension,
            index_state: Mutex::new(IndexState::Unknown),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Current cached index readiness.
    pub fn index_state(&self) -> IndexState {
        *self.index_state.lock()
    }

    fn mark_index(&self, state: IndexState) {
        *self.index_state.lock() = state;
    }
}

/// Collection configuration as reported by the store.
#[derive(Clone, Debug, PartialEq)]
pub struct CollectionInfo {
    pub dimension: usize,
    pub points_count: u64,
}

/// A point as written to the store: internal id, vector, raw payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PointRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: serde_json::Map<String, serde_json::Value>,
}

/// A search hit: point plus similarity score, no vector.
#[derive(Clone, Debug)]
pub struct ScoredPoint {
    pub id: String,
    pub score: f64,
    pub payload: serde_json::Map<String, serde_json::Value>,
}

/// A scrolled point: id and payload only.
#[derive(Clone, Debug)]
pub struct ScrollPoint {
    pub id: String,
    pub payload: serde_json::Map<String, serde_json::Value>,
}

/// One page of a scroll, with the cursor for the next page if any.
#[derive(Clone, Debug, Default)]
pub struct ScrollPage {
    pub points: Vec<ScrollPoint>,
    pub next_offset: Option<serde_json::Value>,
}

/// Wire-level operations against the backing store.
///
/// One method per logical store operation; the resilient client above never
/// touches HTTP directly. Implementations must surface the store's error
/// text through [`StoreError::Api`] so the client can recognize
/// missing-index failures.
#[async_trait]
pub trait ChunkStoreTransport: Send + Sync {
    /// Fetches collection configuration, or `None` when the collection does
    /// not exist.
    async fn collection_info(&self, collection: &str) -> Result<Option<CollectionInfo>, StoreError>;

    /// Creates the collection with the given vector dimension and cosine
    /// distance.
    async fn create_collection(&self, collection: &str, dimension: usize)
    -> Result<(), StoreError>;

    /// Creates a keyword payload index on `field`.
    async fn create_payload_index(&self, collection: &str, field: &str) -> Result<(), StoreError>;

    /// Best-effort current record count.
    async fn collection_stats(&self, collection: &str) -> Result<u64, StoreError>;

    /// Writes a batch of points. Not transactional: a mid-batch failure may
    /// leave earlier points written.
    async fn upsert_points(&self, collection: &str, points: Vec<PointRecord>)
    -> Result<(), StoreError>;

    /// Similarity search returning up to `limit` scored points, payloads
    /// included, vectors excluded.
    async fn search_points(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredPoint>, StoreError>;

    /// Enumerates one page of points in store-native order. When
    /// `document_id` is set the page is filtered server-side, which requires
    /// the payload index.
    async fn scroll_points(
        &self,
        collection: &str,
        document_id: Option<&str>,
        limit: usize,
        offset: Option<serde_json::Value>,
    ) -> Result<ScrollPage, StoreError>;

    /// Deletes by `document_id` payload match, or unconditionally when
    /// `document_id` is `None` (empty filter).
    async fn delete_by_filter(
        &self,
        collection: &str,
        document_id: Option<&str>,
    ) -> Result<(), StoreError>;

    /// Deletes points by their store-internal ids.
    async fn delete_by_ids(&self, collection: &str, ids: &[String]) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: ChunkStoreTransport + ?Sized> ChunkStoreTransport for Arc<T> {
    async fn collection_info(&self, collection: &str) -> Result<Option<CollectionInfo>, StoreError> {
        (**self).collection_info(collection).await
    }

    async fn create_collection(
        &self,
        collection: &str,
        dimension: usize,
    ) -> Result<(), StoreError> {
        (**self).create_collection(collection, dimension).await
    }

    async fn create_payload_index(&self, collection: &str, field: &str) -> Result<(), StoreError> {
        (**self).create_payload_index(collection, field).await
    }

    async fn collection_stats(&self, collection: &str) -> Result<u64, StoreError> {
        (**self).collection_stats(collection).await
    }

    async fn upsert_points(
        &self,
        collection: &str,
        points: Vec<PointRecord>,
    ) -> Result<(), StoreError> {
        (**self).upsert_points(collection, points).await
    }

    async fn search_points(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredPoint>, StoreError> {
        (**self).search_points(collection, vector, limit).await
    }

    async fn scroll_points(
        &self,
        collection: &str,
        document_id: Option<&str>,
        limit: usize,
        offset: Option<serde_json::Value>,
    ) -> Result<ScrollPage, StoreError> {
        (**self)
            .scroll_points(collection, document_id, limit, offset)
            .await
    }

    async fn delete_by_filter(
        &self,
        collection: &str,
        document_id: Option<&str>,
    ) -> Result<(), StoreError> {
        (**self).delete_by_filter(collection, document_id).await
    }

    async fn delete_by_ids(&self, collection: &str, ids: &[String]) -> Result<(), StoreError> {
        (**self).delete_by_ids(collection, ids).await
    }
}

/// Resilient client for one logical collection of chunk records.
///
/// Owns collection lifecycle, secondary-index bootstrap, writes, similarity
/// search, paginated listing and deletion with automatic index creation and
/// a scan-based fallback. Generic over the transport so every policy in
/// here is testable without a live store.
pub struct ChunkStore<T: ChunkStoreTransport> {
    transport: T,
    collection: Arc<CollectionHandle>,
}

impl<T: ChunkStoreTransport> ChunkStore<T> {
    /// Creates a client for `collection` over `transport`. Call
    /// [`initialize`](Self::initialize) before the first data operation.
    pub fn new(transport: T, collection: Arc<CollectionHandle>) -> Self {
        Self {
            transport,
            collection,
        }
    }

    /// The collection handle shared with this client.
    pub fn collection(&self) -> &Arc<CollectionHandle> {
        &self.collection
    }

    /// Ensures the collection exists and bootstraps the `document_id` index.
    ///
    /// Creates the collection with the configured dimension and cosine
    /// distance when absent; verifies the dimension when present and fails
    /// with [`StoreError::DimensionMismatch`] on conflict. Index creation is
    /// best-effort: a failure is logged and retried lazily on the first
    /// filtered operation that trips over it. Only collection
    /// creation/verification failures are fatal.
    pub async fn initialize(&self) -> Result<(), StoreError> {
        let name = self.collection.name();
        match self.transport.collection_info(name).await? {
            Some(info) => {
                if info.dimension != self.collection.dimension() {
                    return Err(StoreError::DimensionMismatch {
                        collection: name.to_string(),
                        expected: self.collection.dimension(),
                        actual: info.dimension,
                    });
                }
                debug!(collection = name, points = info.points_count, "collection verified");
            }
            None => {
                self.transport
                    .create_collection(name, self.collection.dimension())
                    .await?;
                info!(
                    collection = name,
                    dimension = self.collection.dimension(),
                    "collection created"
                );
            }
        }

        match self.transport.create_payload_index(name, "document_id").await {
            Ok(()) => self.collection.mark_index(IndexState::Confirmed),
            Err(err) => {
                // Not fatal: filtered operations will retry lazily.
                warn!(collection = name, error = %err, "payload index bootstrap failed");
            }
        }

        Ok(())
    }

    /// Writes a batch of chunk records.
    ///
    /// Every record becomes an independent point with a fresh internal id;
    /// the logical id travels as the `document_id` payload field next to the
    /// content, caller metadata and an ingestion timestamp. Duplicate
    /// logical ids across calls produce multiple points; the store never
    /// deduplicates.
    pub async fn insert_chunks(&self, records: Vec<ChunkRecord>) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }

        let ingested_at = Utc::now().to_rfc3339();
        let mut points = Vec::with_capacity(records.len());
        for record in records {
            let Some(embedding) = record.embedding else {
                warn!(logical_id = %record.logical_id, "skipping record without embedding");
                continue;
            };

            let mut payload = serde_json::Map::new();
            payload.insert("content".into(), record.content.into());
            payload.insert("document_id".into(), record.logical_id.into());
            payload.insert("ingested_at".into(), ingested_at.clone().into());
            for (key, value) in record.metadata {
                // System-owned keys win over caller metadata.
                if RESERVED_KEYS.contains(&key.as_str()) {
                    continue;
                }
                payload.insert(key, value.to_json());
            }

            points.push(PointRecord {
                id: Uuid::new_v4().to_string(),
                vector: embedding,
                payload,
            });
        }

        if points.is_empty() {
            return Ok(());
        }

        let count = points.len();
        self.transport
            .upsert_points(self.collection.name(), points)
            .await?;
        debug!(collection = self.collection.name(), count, "chunks written");
        Ok(())
    }

    /// Returns up to `max_results` records ranked by cosine similarity.
    ///
    /// Each record carries its similarity under the `score` metadata key and
    /// the store-internal id under `point_id`. Embeddings are not returned.
    /// Errors propagate; there is no implicit retry.
    pub async fn search(
        &self,
        query_embedding: &[f32],
        max_results: usize,
    ) -> Result<Vec<ChunkRecord>, StoreError> {
        let hits = self
            .transport
            .search_points(self.collection.name(), query_embedding, max_results)
            .await?;

        let records = hits
            .into_iter()
            .map(|hit| {
                let mut record = record_from_payload(&hit.payload);
                record
                    .metadata
                    .insert("score".into(), MetadataValue::Float(hit.score));
                record
                    .metadata
                    .insert("point_id".into(), MetadataValue::Str(hit.id));
                record
            })
            .collect();
        Ok(records)
    }

    /// Enumerates up to `limit` records in store-native order, skipping the
    /// first `offset`.
    ///
    /// Pages through the collection with a fixed page size of
    /// [`SCROLL_PAGE_SIZE`] and stops when `limit` entries are collected or
    /// the store reports no further pages. Ordering is whatever the store
    /// yields; neither insertion order nor logical-id order is guaranteed.
    pub async fn list(&self, limit: usize, offset: usize) -> Result<Vec<ChunkSummary>, StoreError> {
        let mut entries = Vec::new();
        let mut to_skip = offset;
        let mut cursor: Option<serde_json::Value> = None;

        while entries.len() < limit {
            let page = self
                .transport
                .scroll_points(self.collection.name(), None, SCROLL_PAGE_SIZE, cursor)
                .await?;

            for point in &page.points {
                if to_skip > 0 {
                    to_skip -= 1;
                    continue;
                }
                if entries.len() >= limit {
                    break;
                }
                entries.push(summarize_point(point));
            }

            cursor = page.next_offset;
            if cursor.is_none() {
                break;
            }
        }

        Ok(entries)
    }

    /// Removes records whose logical id equals `logical_id`.
    ///
    /// Primary strategy: server-side filtered delete, preceded by a filtered
    /// existence probe so an already-deleted id reports `false` instead of a
    /// blind acknowledgement. When a filtered operation fails with a
    /// missing-index error, the client creates the index and retries that
    /// operation exactly once. If the filtered path stays unusable, a
    /// bounded scan (page size [`SCROLL_PAGE_SIZE`], budget [`SCAN_BUDGET`])
    /// collects matching internal ids and deletes them directly.
    ///
    /// The scan stops after the first page containing a match: a logical id
    /// normally maps to a single point, and the early exit trades
    /// completeness under duplicates for latency. Returns `Ok(true)` only
    /// when some deletion request was acknowledged, `Ok(false)` when nothing
    /// could be deleted by any strategy.
    pub async fn delete_document(&self, logical_id: &str) -> Result<bool, StoreError> {
        match self.filtered_probe(logical_id).await {
            Ok(false) => {
                debug!(logical_id, "nothing to delete");
                return Ok(false);
            }
            Ok(true) => {
                match self
                    .transport
                    .delete_by_filter(self.collection.name(), Some(logical_id))
                    .await
                {
                    Ok(()) => {
                        debug!(logical_id, "deleted via filter");
                        return Ok(true);
                    }
                    Err(err) => {
                        warn!(logical_id, error = %err, "filtered delete failed, scanning");
                    }
                }
            }
            Err(err) => {
                warn!(logical_id, error = %err, "filtered probe failed, scanning");
            }
        }

        let ids = self.scan_for_document(logical_id).await?;
        if ids.is_empty() {
            return Ok(false);
        }

        match self
            .transport
            .delete_by_ids(self.collection.name(), &ids)
            .await
        {
            Ok(()) => {
                debug!(logical_id, count = ids.len(), "deleted via scan fallback");
                Ok(true)
            }
            Err(err) => {
                // All strategies exhausted; a non-deletion outcome, not an error.
                warn!(logical_id, error = %err, "fallback delete failed");
                Ok(false)
            }
        }
    }

    /// Removes every record in the collection.
    ///
    /// Returns the best-effort pre-deletion count as a diagnostic, or `-1`
    /// when either the stats call or the delete fails. `-1` means "count
    /// unknown", never "zero deleted".
    pub async fn delete_all(&self) -> i64 {
        let name = self.collection.name();
        let count = match self.transport.collection_stats(name).await {
            Ok(count) => count,
            Err(err) => {
                warn!(collection = name, error = %err, "stats before delete-all failed");
                return -1;
            }
        };

        match self.transport.delete_by_filter(name, None).await {
            Ok(()) => {
                info!(collection = name, count, "collection cleared");
                count as i64
            }
            Err(err) => {
                warn!(collection = name, error = %err, "delete-all failed");
                -1
            }
        }
    }

    /// Filtered existence check for `logical_id`, creating the payload index
    /// on demand.
    ///
    /// Drives the `Unknown → Confirmed` transition: a missing-index failure
    /// invalidates the cached flag, triggers one index creation, and retries
    /// the probe once.
    async fn filtered_probe(&self, logical_id: &str) -> Result<bool, StoreError> {
        let name = self.collection.name();
        let first = self
            .transport
            .scroll_points(name, Some(logical_id), 1, None)
            .await;

        let page = match first {
            Ok(page) => page,
            Err(err) if err.indicates_missing_index() => {
                self.collection.mark_index(IndexState::Unknown);
                info!(collection = name, "payload index missing, creating");
                self.transport.create_payload_index(name, "document_id").await?;
                self.collection.mark_index(IndexState::Confirmed);
                self.transport
                    .scroll_points(name, Some(logical_id), 1, None)
                    .await?
            }
            Err(err) => return Err(err),
        };

        Ok(!page.points.is_empty())
    }

    /// Unfiltered bounded scan for points carrying `logical_id`.
    ///
    /// Stops after the first page that yields a match, or after
    /// [`SCAN_BUDGET`] records, whichever comes first. Under duplicate
    /// logical ids spread across pages this can leave stragglers; a
    /// deliberate policy, not an oversight.
    async fn scan_for_document(&self, logical_id: &str) -> Result<Vec<String>, StoreError> {
        let mut matches = Vec::new();
        let mut scanned = 0usize;
        let mut cursor: Option<serde_json::Value> = None;

        loop {
            let page = self
                .transport
                .scroll_points(self.collection.name(), None, SCROLL_PAGE_SIZE, cursor)
                .await?;

            // A partial final page keeps the total inspected at the budget.
            for point in page.points.iter().take(SCAN_BUDGET - scanned) {
                scanned += 1;
                let id = point
                    .payload
                    .get("document_id")
                    .and_then(|value| value.as_str());
                if id == Some(logical_id) {
                    matches.push(point.id.clone());
                }
            }

            if !matches.is_empty() || scanned >= SCAN_BUDGET {
                break;
            }
            cursor = page.next_offset;
            if cursor.is_none() {
                break;
            }
        }

        Ok(matches)
    }
}

/// Rebuilds a [`ChunkRecord`] from a stored payload.
fn record_from_payload(payload: &serde_json::Map<String, serde_json::Value>) -> ChunkRecord {
    let content = payload
        .get("content")
        .and_then(|value| value.as_str())
        .unwrap_or_default()
        .to_string();
    let logical_id = payload
        .get("document_id")
        .and_then(|value| value.as_str())
        .unwrap_or_default()
        .to_string();

    let mut metadata = Metadata::new();
    for (key, value) in payload {
        if key == "content" || key == "document_id" {
            continue;
        }
        if let Some(scalar) = MetadataValue::from_json(value) {
            metadata.insert(key.clone(), scalar);
        }
    }

    ChunkRecord {
        logical_id,
        content,
        embedding: None,
        metadata,
    }
}

/// Builds a listing entry from a scrolled point.
fn summarize_point(point: &ScrollPoint) -> ChunkSummary {
    let logical_id = point
        .payload
        .get("document_id")
        .and_then(|value| value.as_str())
        .unwrap_or_default()
        .to_string();
    let content = point
        .payload
        .get("content")
        .and_then(|value| value.as_str())
        .unwrap_or_default();

    let preview: String = if content.chars().count() > PREVIEW_CHARS {
        let head: String = content.chars().take(PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        content.to_string()
    };

    let mut metadata = Metadata::new();
    for (key, value) in &point.payload {
        if key == "content" || key == "document_id" {
            continue;
        }
        if let Some(scalar) = MetadataValue::from_json(value) {
            metadata.insert(key.clone(), scalar);
        }
    }
    if point.id != logical_id {
        metadata.insert("point_id".into(), MetadataValue::Str(point.id.clone()));
    }

    ChunkSummary {
        logical_id,
        preview,
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_value_json_round_trip() {
        let cases = vec![
            MetadataValue::Bool(true),
            MetadataValue::Int(-7),
            MetadataValue::Float(2.5),
            MetadataValue::Str("hello".into()),
        ];
        for value in cases {
            let json = value.to_json();
            assert_eq!(MetadataValue::from_json(&json), Some(value));
        }
    }

    #[test]
    fn metadata_value_rejects_compound_json() {
        assert_eq!(MetadataValue::from_json(&serde_json::json!([1, 2])), None);
        assert_eq!(MetadataValue::from_json(&serde_json::json!({"a": 1})), None);
        assert_eq!(MetadataValue::from_json(&serde_json::Value::Null), None);
    }

    #[test]
    fn summary_truncates_long_content() {
        let long = "x".repeat(200);
        let mut payload = serde_json::Map::new();
        payload.insert("content".into(), long.clone().into());
        payload.insert("document_id".into(), "doc_0_chunk_0".into());
        payload.insert("chunk_index".into(), 0.into());
        let point = ScrollPoint {
            id: "11111111-2222-3333-4444-555555555555".into(),
            payload,
        };

        let summary = summarize_point(&point);
        assert_eq!(summary.logical_id, "doc_0_chunk_0");
        assert_eq!(summary.preview.len(), PREVIEW_CHARS + 3);
        assert!(summary.preview.ends_with("..."));
        assert!(!summary.metadata.contains_key("content"));
        assert!(!summary.metadata.contains_key("document_id"));
        assert_eq!(
            summary.metadata.get("point_id"),
            Some(&MetadataValue::Str(
                "11111111-2222-3333-4444-555555555555".into()
            ))
        );
    }

    #[test]
    fn summary_keeps_short_content_intact() {
        let mut payload = serde_json::Map::new();
        payload.insert("content".into(), "short".into());
        payload.insert("document_id".into(), "doc_1_chunk_2".into());
        let point = ScrollPoint {
            id: "doc_1_chunk_2".into(),
            payload,
        };

        let summary = summarize_point(&point);
        assert_eq!(summary.preview, "short");
        // Internal id equals the logical id, so no point_id diagnostic.
        assert!(!summary.metadata.contains_key("point_id"));
    }

    #[test]
    fn record_from_payload_strips_system_content_keys() {
        let mut payload = serde_json::Map::new();
        payload.insert("content".into(), "body".into());
        payload.insert("document_id".into(), "doc_0_chunk_1".into());
        payload.insert("ingested_at".into(), "2026-01-01T00:00:00Z".into());
        payload.insert("chunk_size".into(), 4.into());

        let record = record_from_payload(&payload);
        assert_eq!(record.logical_id, "doc_0_chunk_1");
        assert_eq!(record.content, "body");
        assert!(record.embedding.is_none());
        assert_eq!(record.metadata.get("chunk_size"), Some(&MetadataValue::Int(4)));
        // ingested_at is informative on reads even though writes own it.
        assert!(record.metadata.contains_key("ingested_at"));
    }

    #[test]
    fn collection_handle_tracks_index_state() {
        let handle = CollectionHandle::new("chunks", DEFAULT_DIMENSION);
        assert_eq!(handle.index_state(), IndexState::Unknown);
        handle.mark_index(IndexState::Confirmed);
        assert_eq!(handle.index_state(), IndexState::Confirmed);
        handle.mark_index(IndexState::Unknown);
        assert_eq!(handle.index_state(), IndexState::Unknown);
    }
}
