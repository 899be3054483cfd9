//! ```text
//! Documents ──► chunking::Chunker ──► chunk texts
//!                                        │
//!                          providers::EmbeddingProvider
//!                                        │
//!                                        ▼
//!                         store::ChunkRecord (+ metadata)
//!                                        │
//!            store::ChunkStore ──► store::ChunkStoreTransport ──► Qdrant
//!
//! Question ──► embed ──► ChunkStore::search ──► [Context i] blocks
//!                                        │
//!                          providers::ChatProvider ──► answer
//! ```
//!
//! The resilient pieces live in [`store`]: collection lifecycle with
//! dimension verification, lazy secondary-index bootstrap, cursor-bounded
//! listing, and deletion that degrades from a server-side filtered delete to
//! a budgeted scan. [`pipeline`] wires the pure [`chunking`] step and the
//! [`providers`] seams around it.

pub mod chunking;
pub mod config;
pub mod pipeline;
pub mod providers;
pub mod store;
pub mod types;

pub use chunking::{Chunker, split_text};
pub use config::PipelineConfig;
pub use pipeline::{IngestReport, RagPipeline};
pub use providers::{ChatProvider, EmbeddingProvider, OllamaProvider};
pub use store::{
    ChunkRecord, ChunkStore, ChunkStoreTransport, ChunkSummary, CollectionHandle, MetadataValue,
    QdrantTransport,
};
pub use types::{PipelineError, ProviderError, StoreError};
