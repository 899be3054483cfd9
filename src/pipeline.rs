//! Ingestion and query orchestration.
//!
//! `ingest` drives document → chunks → embeddings → store; `query` drives
//! question → embedding → search → context → generation. Failures are
//! isolated per document on the ingest side and converted to a fixed
//! apology string on the query side, so neither path takes the process
//! down with it.

use tracing::{error, info, warn};

use crate::chunking::Chunker;
use crate::providers::{ChatProvider, EmbeddingProvider};
use crate::store::{ChunkRecord, ChunkStore, ChunkStoreTransport};
use crate::types::{PipelineError, ProviderError};

/// Number of search hits assembled into the answer context.
pub const DEFAULT_TOP_K: usize = 5;

/// Context placeholder when the search returns nothing.
pub const NO_CONTEXT: &str = "No relevant context found.";

/// Fixed reply for any failure on the query path.
pub const QUERY_FAILURE_REPLY: &str =
    "Sorry, something went wrong while answering your question. Please try again.";

/// Summary of an ingestion run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Documents chunked and embedded successfully.
    pub documents_ingested: usize,
    /// Documents skipped after a chunking/embedding failure.
    pub documents_failed: usize,
    /// Chunk records handed to the store.
    pub chunks_stored: usize,
}

/// Drives the ingest and query flows over a chunk store and the external
/// model calls.
pub struct RagPipeline<T, E, G>
where
    T: ChunkStoreTransport,
    E: EmbeddingProvider,
    G: ChatProvider,
{
    store: ChunkStore<T>,
    embedder: E,
    generator: G,
    chunker: Chunker,
    top_k: usize,
}

impl<T, E, G> RagPipeline<T, E, G>
where
    T: ChunkStoreTransport,
    E: EmbeddingProvider,
    G: ChatProvider,
{
    /// Creates a pipeline with the default chunker and top-k.
    pub fn new(store: ChunkStore<T>, embedder: E, generator: G) -> Self {
        Self {
            store,
            embedder,
            generator,
            chunker: Chunker::default(),
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Overrides the chunker.
    #[must_use]
    pub fn with_chunker(mut self, chunker: Chunker) -> Self {
        self.chunker = chunker;
        self
    }

    /// Overrides how many search hits feed the context.
    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// The underlying chunk store.
    pub fn store(&self) -> &ChunkStore<T> {
        &self.store
    }

    /// Ingests a batch of documents.
    ///
    /// Each document is chunked and embedded under the stable logical-id
    /// scheme `doc_{document_index}_chunk_{chunk_index}`; both indices are
    /// zero-based positions, never completion order. A failure while
    /// processing one document is logged and skips that document only.
    /// All records that survive are written in a single store call at the
    /// end; only that final write can fail the whole operation.
    pub async fn ingest(&self, documents: &[String]) -> Result<IngestReport, PipelineError> {
        let mut report = IngestReport::default();
        let mut records = Vec::new();

        for (document_index, document) in documents.iter().enumerate() {
            match self.build_records(document_index, document).await {
                Ok(mut built) => {
                    report.documents_ingested += 1;
                    records.append(&mut built);
                }
                Err(err) => {
                    report.documents_failed += 1;
                    error!(document_index, error = %err, "document skipped");
                }
            }
        }

        report.chunks_stored = records.len();
        self.store.insert_chunks(records).await?;
        info!(
            documents = report.documents_ingested,
            failed = report.documents_failed,
            chunks = report.chunks_stored,
            "ingestion finished"
        );
        Ok(report)
    }

    async fn build_records(
        &self,
        document_index: usize,
        document: &str,
    ) -> Result<Vec<ChunkRecord>, ProviderError> {
        let chunks = self.chunker.split(document);
        let mut records = Vec::with_capacity(chunks.len());

        for (chunk_index, chunk) in chunks.into_iter().enumerate() {
            let embedding = self.embedder.embed(&chunk).await?;
            let logical_id = format!("doc_{document_index}_chunk_{chunk_index}");
            let chunk_size = chunk.chars().count();
            records.push(
                ChunkRecord::new(logical_id, chunk)
                    .with_embedding(embedding)
                    .with_metadata("document_index", document_index)
                    .with_metadata("chunk_index", chunk_index)
                    .with_metadata("chunk_size", chunk_size),
            );
        }

        Ok(records)
    }

    /// Answers a question grounded in the stored chunks.
    ///
    /// Embeds the question, searches for the top matches, labels each hit as
    /// a `[Context i]` block (or substitutes [`NO_CONTEXT`] when nothing
    /// matches) and hands question plus context to the generator. Any
    /// failure along the way yields [`QUERY_FAILURE_REPLY`]; this path never
    /// returns an error.
    pub async fn query(&self, question: &str) -> String {
        match self.answer(question).await {
            Ok(answer) => answer,
            Err(err) => {
                warn!(error = %err, "query failed");
                QUERY_FAILURE_REPLY.to_string()
            }
        }
    }

    async fn answer(&self, question: &str) -> Result<String, PipelineError> {
        let embedding = self.embedder.embed(question).await?;
        let hits = self.store.search(&embedding, self.top_k).await?;

        let context = if hits.is_empty() {
            NO_CONTEXT.to_string()
        } else {
            hits.iter()
                .enumerate()
                .map(|(i, hit)| format!("[Context {}]\n{}", i + 1, hit.content))
                .collect::<Vec<_>>()
                .join("\n\n")
        };

        Ok(self.generator.generate(question, &context).await?)
    }
}
