//! Environment-driven configuration.
//!
//! Values come from the process environment (a `.env` file is loaded first
//! via `dotenvy` when present); every field has a working local default so a
//! bare `PipelineConfig::from_env()` talks to a stock Qdrant and Ollama on
//! localhost.

use std::env;

use tracing::warn;

use crate::chunking::{DEFAULT_MAX_CHUNK_SIZE, DEFAULT_OVERLAP_SIZE};
use crate::pipeline::DEFAULT_TOP_K;
use crate::store::DEFAULT_DIMENSION;

/// Runtime configuration for the store, providers and chunker.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineConfig {
    /// Base URL of the vector store (`QDRANT_URL`).
    pub store_url: String,
    /// Collection name (`COLLECTION_NAME`).
    pub collection_name: String,
    /// Vector dimension every record must share (`EMBEDDING_DIM`).
    pub embedding_dim: usize,
    /// Base URL of the model endpoint (`OLLAMA_URL`).
    pub provider_url: String,
    /// Embedding model name (`EMBED_MODEL`).
    pub embed_model: String,
    /// Generation model name (`CHAT_MODEL`).
    pub chat_model: String,
    /// Chunk budget in characters (`CHUNK_SIZE`).
    pub chunk_size: usize,
    /// Overlap target in characters (`CHUNK_OVERLAP`).
    pub chunk_overlap: usize,
    /// Search hits per query (`TOP_K`).
    pub top_k: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            store_url: "http://localhost:6333".to_string(),
            collection_name: "documents".to_string(),
            embedding_dim: DEFAULT_DIMENSION,
            provider_url: "http://localhost:11434".to_string(),
            embed_model: "nomic-embed-text".to_string(),
            chat_model: "llama3.2".to_string(),
            chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            chunk_overlap: DEFAULT_OVERLAP_SIZE,
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl PipelineConfig {
    /// Builds a configuration from the environment, falling back to defaults
    /// for anything unset or unparsable.
    pub fn from_env() -> Self {
        // Best-effort: absence of a .env file is the normal case.
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        Self {
            store_url: string_var("QDRANT_URL", defaults.store_url),
            collection_name: string_var("COLLECTION_NAME", defaults.collection_name),
            embedding_dim: numeric_var("EMBEDDING_DIM", defaults.embedding_dim),
            provider_url: string_var("OLLAMA_URL", defaults.provider_url),
            embed_model: string_var("EMBED_MODEL", defaults.embed_model),
            chat_model: string_var("CHAT_MODEL", defaults.chat_model),
            chunk_size: numeric_var("CHUNK_SIZE", defaults.chunk_size),
            chunk_overlap: numeric_var("CHUNK_OVERLAP", defaults.chunk_overlap),
            top_k: numeric_var("TOP_K", defaults.top_k),
        }
    }
}

fn string_var(key: &str, default: String) -> String {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => default,
    }
}

fn numeric_var(key: &str, default: usize) -> usize {
    match env::var(key) {
        Ok(value) => match value.trim().parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(key, value = %value, "ignoring unparsable numeric override");
                default
            }
        },
        Err(_) => default,
    }
}
