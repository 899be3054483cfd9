//! Shared test doubles: an in-memory, call-recording chunk store transport.
#![allow(dead_code)]

use parking_lot::Mutex;

use async_trait::async_trait;
use tracing_subscriber::EnvFilter;

use chunkmill::store::{
    ChunkStoreTransport, CollectionInfo, PointRecord, ScoredPoint, ScrollPage, ScrollPoint,
};
use chunkmill::types::StoreError;

/// Installs a fmt subscriber so the client's swallowed-failure logs (index
/// bootstrap, delete fallbacks, skipped documents) are visible under
/// `RUST_LOG`. Safe to call from every test; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// What the fake store remembers between calls.
#[derive(Default)]
pub struct TransportState {
    pub collection: Option<(String, usize)>,
    pub index_created: bool,
    pub points: Vec<PointRecord>,
    /// Operation log, e.g. `scroll(filtered)`, `create_payload_index`.
    pub calls: Vec<String>,
    /// Remaining `create_payload_index` calls that should fail.
    pub failing_index_creates: usize,
    /// When set, every filtered scroll/delete fails with a generic error
    /// (one that does NOT mention the index), forcing the scan fallback.
    pub break_filtered_ops: bool,
    /// When set, `collection_stats` fails.
    pub break_stats: bool,
    /// When set, `delete_by_ids` fails.
    pub break_delete_by_ids: bool,
}

/// In-memory [`ChunkStoreTransport`] with injectable failures.
#[derive(Default)]
pub struct InMemoryTransport {
    pub state: Mutex<TransportState>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with an existing collection of the given dimension.
    pub fn with_collection(name: &str, dimension: usize) -> Self {
        let transport = Self::default();
        transport.state.lock().collection = Some((name.to_string(), dimension));
        transport
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn point_count_for(&self, logical_id: &str) -> usize {
        self.state
            .lock()
            .points
            .iter()
            .filter(|point| {
                point.payload.get("document_id").and_then(|v| v.as_str()) == Some(logical_id)
            })
            .count()
    }

    fn missing_index_error() -> StoreError {
        StoreError::Api {
            operation: "points/scroll",
            message: "Index required but not found for \"document_id\"".into(),
        }
    }

    fn broken_filter_error() -> StoreError {
        StoreError::Api {
            operation: "points/scroll",
            message: "filtered operations unavailable".into(),
        }
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| f64::from(*x) * f64::from(*y)).sum();
    let na: f64 = a.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    let nb: f64 = b.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    if na == 0.0 || nb == 0.0 { 0.0 } else { dot / (na * nb) }
}

#[async_trait]
impl ChunkStoreTransport for InMemoryTransport {
    async fn collection_info(&self, _collection: &str) -> Result<Option<CollectionInfo>, StoreError> {
        let state = self.state.lock();
        Ok(state.collection.as_ref().map(|(_, dimension)| CollectionInfo {
            dimension: *dimension,
            points_count: state.points.len() as u64,
        }))
    }

    async fn create_collection(&self, collection: &str, dimension: usize) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        state.calls.push("create_collection".into());
        state.collection = Some((collection.to_string(), dimension));
        Ok(())
    }

    async fn create_payload_index(&self, _collection: &str, _field: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        state.calls.push("create_payload_index".into());
        if state.failing_index_creates > 0 {
            state.failing_index_creates -= 1;
            return Err(StoreError::Api {
                operation: "collections/index",
                message: "service unavailable".into(),
            });
        }
        state.index_created = true;
        Ok(())
    }

    async fn collection_stats(&self, _collection: &str) -> Result<u64, StoreError> {
        let state = self.state.lock();
        if state.break_stats {
            return Err(StoreError::Api {
                operation: "collections/get",
                message: "stats unavailable".into(),
            });
        }
        Ok(state.points.len() as u64)
    }

    async fn upsert_points(&self, _collection: &str, points: Vec<PointRecord>) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        state.calls.push(format!("upsert({})", points.len()));
        state.points.extend(points);
        Ok(())
    }

    async fn search_points(
        &self,
        _collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredPoint>, StoreError> {
        let state = self.state.lock();
        let mut scored: Vec<ScoredPoint> = state
            .points
            .iter()
            .map(|point| ScoredPoint {
                id: point.id.clone(),
                score: cosine(vector, &point.vector),
                payload: point.payload.clone(),
            })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(limit);
        Ok(scored)
    }

    async fn scroll_points(
        &self,
        _collection: &str,
        document_id: Option<&str>,
        limit: usize,
        offset: Option<serde_json::Value>,
    ) -> Result<ScrollPage, StoreError> {
        let mut state = self.state.lock();
        state
            .calls
            .push(format!("scroll({})", if document_id.is_some() { "filtered" } else { "full" }));

        if let Some(document_id) = document_id {
            if state.break_filtered_ops {
                return Err(Self::broken_filter_error());
            }
            if !state.index_created {
                return Err(Self::missing_index_error());
            }
            let points: Vec<ScrollPoint> = state
                .points
                .iter()
                .filter(|point| {
                    point.payload.get("document_id").and_then(|v| v.as_str()) == Some(document_id)
                })
                .take(limit)
                .map(|point| ScrollPoint {
                    id: point.id.clone(),
                    payload: point.payload.clone(),
                })
                .collect();
            return Ok(ScrollPage {
                points,
                next_offset: None,
            });
        }

        let start = offset.and_then(|v| v.as_u64()).unwrap_or(0) as usize;
        let end = (start + limit).min(state.points.len());
        let points = state.points[start..end]
            .iter()
            .map(|point| ScrollPoint {
                id: point.id.clone(),
                payload: point.payload.clone(),
            })
            .collect();
        let next_offset = if end < state.points.len() {
            Some(serde_json::json!(end))
        } else {
            None
        };
        Ok(ScrollPage { points, next_offset })
    }

    async fn delete_by_filter(
        &self,
        _collection: &str,
        document_id: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        match document_id {
            Some(document_id) => {
                state.calls.push("delete_by_filter".into());
                if state.break_filtered_ops {
                    return Err(Self::broken_filter_error());
                }
                if !state.index_created {
                    return Err(Self::missing_index_error());
                }
                state.points.retain(|point| {
                    point.payload.get("document_id").and_then(|v| v.as_str()) != Some(document_id)
                });
            }
            None => {
                state.calls.push("delete_all".into());
                state.points.clear();
            }
        }
        Ok(())
    }

    async fn delete_by_ids(&self, _collection: &str, ids: &[String]) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        state.calls.push(format!("delete_by_ids({})", ids.len()));
        if state.break_delete_by_ids {
            return Err(StoreError::Api {
                operation: "points/delete",
                message: "delete unavailable".into(),
            });
        }
        state.points.retain(|point| !ids.contains(&point.id));
        Ok(())
    }
}
