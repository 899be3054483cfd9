//! Error taxonomy shared across the crate.
//!
//! Three boundaries, three enums:
//!
//! * [`StoreError`] — anything the chunk store client or its transport can fail
//!   with. Transport failures and store-side rejections are kept apart so the
//!   resilient deletion path can inspect the store's error text.
//! * [`ProviderError`] — failures from the external embedding/generation calls.
//! * [`PipelineError`] — orchestration failures; mostly a wrapper so `ingest`
//!   can report a failed final write without flattening it to a string.

use thiserror::Error;

/// Errors produced by the chunk store client and its transport.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The HTTP round trip itself failed (connect, timeout, TLS, decode).
    #[error("store transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// The store answered, but rejected the operation.
    #[error("store rejected {operation}: {message}")]
    Api {
        operation: &'static str,
        message: String,
    },

    /// The store answered with a body we could not interpret.
    #[error("unexpected store response for {operation}: {message}")]
    InvalidResponse {
        operation: &'static str,
        message: String,
    },

    /// The collection exists but was created with a different vector size.
    ///
    /// Fatal at initialization: every record ever written to a collection must
    /// share its configured dimension, so proceeding would poison writes.
    #[error("collection '{collection}' has vector dimension {actual}, expected {expected}")]
    DimensionMismatch {
        collection: String,
        expected: usize,
        actual: usize,
    },

    /// A malformed endpoint or path segment.
    #[error("invalid store URL: {0}")]
    Url(#[from] url::ParseError),
}

impl StoreError {
    /// Whether the store's error text indicates a missing payload index.
    ///
    /// Filtered operations against Qdrant fail with an "Index required but not
    /// found" style message when the `document_id` keyword index is absent.
    /// The deletion path uses this to decide between the create-index-and-retry
    /// step and the scan fallback.
    pub fn indicates_missing_index(&self) -> bool {
        match self {
            StoreError::Api { message, .. } => {
                let message = message.to_ascii_lowercase();
                message.contains("index")
            }
            _ => false,
        }
    }
}

/// Errors from the external model calls (embedding and generation).
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider rejected request: {0}")]
    Api(String),

    #[error("provider returned an unusable response: {0}")]
    InvalidResponse(String),
}

/// Orchestration-level errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_index_detection_matches_store_wording() {
        let err = StoreError::Api {
            operation: "points/delete",
            message: "Index required but not found for \"document_id\"".into(),
        };
        assert!(err.indicates_missing_index());

        let other = StoreError::Api {
            operation: "points/delete",
            message: "Wrong input: collection not found".into(),
        };
        assert!(!other.indicates_missing_index());
    }
}
