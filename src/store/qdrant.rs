//! Qdrant REST implementation of [`ChunkStoreTransport`].
//!
//! Speaks the plain HTTP API: collection lifecycle and stats on the
//! control plane, upsert/search/scroll/delete on the data plane. Responses
//! arrive in Qdrant's `{"status": ..., "result": ...}` envelope; parsing
//! assumes nothing beyond "status plus optional result", since the status
//! field is a string on success and an object carrying the error text on
//! failure.

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::types::StoreError;

use super::{
    ChunkStoreTransport, CollectionInfo, PointRecord, ScoredPoint, ScrollPage, ScrollPoint,
};

/// HTTP transport to a Qdrant instance.
#[derive(Clone, Debug)]
pub struct QdrantTransport {
    client: Client,
    base_url: Url,
}

impl QdrantTransport {
    /// Creates a transport for the Qdrant instance at `base_url`
    /// (e.g. `http://localhost:6333`).
    pub fn new(base_url: Url) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    /// Creates a transport reusing an existing HTTP client.
    pub fn with_client(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
        Ok(self.base_url.join(path)?)
    }

    /// Sends a request and unwraps Qdrant's response envelope.
    ///
    /// `NOT_FOUND` is surfaced as `Ok(None)` so callers can distinguish an
    /// absent collection from a failure; every other non-success status (or a
    /// success envelope with a non-`"ok"` status field) becomes
    /// [`StoreError::Api`] carrying the store's error text.
    async fn call(
        &self,
        operation: &'static str,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<Option<serde_json::Value>, StoreError> {
        let url = self.endpoint(path)?;
        debug!(%url, operation, "store request");

        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let envelope: Envelope = response
            .json()
            .await
            .map_err(|err| StoreError::InvalidResponse {
                operation,
                message: err.to_string(),
            })?;

        if !status.is_success() {
            return Err(StoreError::Api {
                operation,
                message: envelope.error_text(status),
            });
        }
        if !envelope.is_ok() {
            return Err(StoreError::Api {
                operation,
                message: envelope.error_text(status),
            });
        }

        Ok(Some(envelope.result.unwrap_or(serde_json::Value::Null)))
    }

    fn parse<T: serde::de::DeserializeOwned>(
        operation: &'static str,
        result: serde_json::Value,
    ) -> Result<T, StoreError> {
        serde_json::from_value(result).map_err(|err| StoreError::InvalidResponse {
            operation,
            message: err.to_string(),
        })
    }
}

/// Qdrant response envelope: `status` is `"ok"` or `{"error": "..."}`.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    status: serde_json::Value,
    #[serde(default)]
    result: Option<serde_json::Value>,
}

impl Envelope {
    fn is_ok(&self) -> bool {
        matches!(&self.status, serde_json::Value::String(s) if s == "ok")
            || self.status.is_null() && self.result.is_some()
    }

    fn error_text(&self, status: StatusCode) -> String {
        self.status
            .get("error")
            .and_then(|value| value.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("http status {status}"))
    }
}

#[derive(Debug, Deserialize)]
struct RawCollectionInfo {
    #[serde(default)]
    points_count: Option<u64>,
    config: RawCollectionConfig,
}

#[derive(Debug, Deserialize)]
struct RawCollectionConfig {
    params: RawCollectionParams,
}

#[derive(Debug, Deserialize)]
struct RawCollectionParams {
    vectors: RawVectorParams,
}

#[derive(Debug, Deserialize)]
struct RawVectorParams {
    size: usize,
}

#[derive(Debug, Deserialize)]
struct RawScoredPoint {
    id: serde_json::Value,
    score: f64,
    #[serde(default)]
    payload: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawScrollResult {
    #[serde(default)]
    points: Vec<RawScrollPoint>,
    #[serde(default)]
    next_page_offset: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawScrollPoint {
    id: serde_json::Value,
    #[serde(default)]
    payload: serde_json::Map<String, serde_json::Value>,
}

/// Qdrant point ids are either integers or UUID strings on the wire.
fn id_to_string(id: &serde_json::Value) -> String {
    match id {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn document_filter(document_id: &str) -> serde_json::Value {
    json!({
        "must": [
            {
                "key": "document_id",
                "match": { "value": document_id }
            }
        ]
    })
}

#[async_trait]
impl ChunkStoreTransport for QdrantTransport {
    async fn collection_info(&self, collection: &str) -> Result<Option<CollectionInfo>, StoreError> {
        let result = self
            .call(
                "collections/get",
                Method::GET,
                &format!("collections/{collection}"),
                None,
            )
            .await?;

        let Some(result) = result else {
            return Ok(None);
        };
        let raw: RawCollectionInfo = Self::parse("collections/get", result)?;
        Ok(Some(CollectionInfo {
            dimension: raw.config.params.vectors.size,
            points_count: raw.points_count.unwrap_or(0),
        }))
    }

    async fn create_collection(
        &self,
        collection: &str,
        dimension: usize,
    ) -> Result<(), StoreError> {
        self.call(
            "collections/create",
            Method::PUT,
            &format!("collections/{collection}"),
            Some(json!({
                "vectors": { "size": dimension, "distance": "Cosine" }
            })),
        )
        .await?
        .ok_or(StoreError::Api {
            operation: "collections/create",
            message: "collection endpoint not found".into(),
        })?;
        Ok(())
    }

    async fn create_payload_index(&self, collection: &str, field: &str) -> Result<(), StoreError> {
        self.call(
            "collections/index",
            Method::PUT,
            &format!("collections/{collection}/index?wait=true"),
            Some(json!({
                "field_name": field,
                "field_schema": "keyword"
            })),
        )
        .await?
        .ok_or(StoreError::Api {
            operation: "collections/index",
            message: "collection not found".into(),
        })?;
        Ok(())
    }

    async fn collection_stats(&self, collection: &str) -> Result<u64, StoreError> {
        let info = self
            .collection_info(collection)
            .await?
            .ok_or(StoreError::Api {
                operation: "collections/get",
                message: "collection not found".into(),
            })?;
        Ok(info.points_count)
    }

    async fn upsert_points(
        &self,
        collection: &str,
        points: Vec<PointRecord>,
    ) -> Result<(), StoreError> {
        let points: Vec<serde_json::Value> = points
            .into_iter()
            .map(|point| {
                json!({
                    "id": point.id,
                    "vector": point.vector,
                    "payload": point.payload,
                })
            })
            .collect();

        self.call(
            "points/upsert",
            Method::PUT,
            &format!("collections/{collection}/points?wait=true"),
            Some(json!({ "points": points })),
        )
        .await?
        .ok_or(StoreError::Api {
            operation: "points/upsert",
            message: "collection not found".into(),
        })?;
        Ok(())
    }

    async fn search_points(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredPoint>, StoreError> {
        let result = self
            .call(
                "points/search",
                Method::POST,
                &format!("collections/{collection}/points/search"),
                Some(json!({
                    "vector": vector,
                    "limit": limit,
                    "with_payload": true,
                    "with_vector": false,
                })),
            )
            .await?
            .ok_or(StoreError::Api {
                operation: "points/search",
                message: "collection not found".into(),
            })?;

        let raw: Vec<RawScoredPoint> = Self::parse("points/search", result)?;
        Ok(raw
            .into_iter()
            .map(|point| ScoredPoint {
                id: id_to_string(&point.id),
                score: point.score,
                payload: point.payload,
            })
            .collect())
    }

    async fn scroll_points(
        &self,
        collection: &str,
        document_id: Option<&str>,
        limit: usize,
        offset: Option<serde_json::Value>,
    ) -> Result<ScrollPage, StoreError> {
        let mut body = json!({
            "limit": limit,
            "with_payload": true,
            "with_vector": false,
        });
        if let Some(document_id) = document_id {
            body["filter"] = document_filter(document_id);
        }
        if let Some(offset) = offset {
            body["offset"] = offset;
        }

        let result = self
            .call(
                "points/scroll",
                Method::POST,
                &format!("collections/{collection}/points/scroll"),
                Some(body),
            )
            .await?
            .ok_or(StoreError::Api {
                operation: "points/scroll",
                message: "collection not found".into(),
            })?;

        let raw: RawScrollResult = Self::parse("points/scroll", result)?;
        Ok(ScrollPage {
            points: raw
                .points
                .into_iter()
                .map(|point| ScrollPoint {
                    id: id_to_string(&point.id),
                    payload: point.payload,
                })
                .collect(),
            next_offset: raw.next_page_offset.filter(|value| !value.is_null()),
        })
    }

    async fn delete_by_filter(
        &self,
        collection: &str,
        document_id: Option<&str>,
    ) -> Result<(), StoreError> {
        let filter = match document_id {
            Some(document_id) => document_filter(document_id),
            // Empty filter matches everything: the unconditional delete-all.
            None => json!({}),
        };

        self.call(
            "points/delete",
            Method::POST,
            &format!("collections/{collection}/points/delete?wait=true"),
            Some(json!({ "filter": filter })),
        )
        .await?
        .ok_or(StoreError::Api {
            operation: "points/delete",
            message: "collection not found".into(),
        })?;
        Ok(())
    }

    async fn delete_by_ids(&self, collection: &str, ids: &[String]) -> Result<(), StoreError> {
        self.call(
            "points/delete",
            Method::POST,
            &format!("collections/{collection}/points/delete?wait=true"),
            Some(json!({ "points": ids })),
        )
        .await?
        .ok_or(StoreError::Api {
            operation: "points/delete",
            message: "collection not found".into(),
        })?;
        Ok(())
    }
}
