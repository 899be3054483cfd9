//! External model calls: text → vector and (question, context) → answer.
//!
//! Both calls are opaque to the rest of the crate and sit behind traits so
//! orchestration can be tested with the deterministic mocks in [`mock`].
//! [`OllamaProvider`] implements both traits against an Ollama-compatible
//! HTTP endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::types::ProviderError;

/// Produces a fixed-length embedding vector for a piece of text.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;
}

/// Generates an answer grounded in the supplied context.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn generate(&self, question: &str, context: &str) -> Result<String, ProviderError>;
}

/// Embedding and generation via an Ollama-compatible HTTP API.
#[derive(Clone, Debug)]
pub struct OllamaProvider {
    client: Client,
    base_url: Url,
    embed_model: String,
    chat_model: String,
}

impl OllamaProvider {
    /// Creates a provider for the endpoint at `base_url`
    /// (e.g. `http://localhost:11434`).
    pub fn new(base_url: Url, embed_model: impl Into<String>, chat_model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url,
            embed_model: embed_model.into(),
            chat_model: chat_model.into(),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ProviderError> {
        self.base_url
            .join(path)
            .map_err(|err| ProviderError::InvalidResponse(err.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let url = self.endpoint("api/embeddings")?;
        debug!(model = %self.embed_model, chars = text.len(), "embedding request");

        let response = self
            .client
            .post(url)
            .json(&json!({ "model": self.embed_model, "prompt": text }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ProviderError::Api(format!(
                "embedding endpoint returned {}",
                response.status()
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|err| ProviderError::InvalidResponse(err.to_string()))?;
        if parsed.embedding.is_empty() {
            return Err(ProviderError::InvalidResponse(
                "embedding response carried no vector".into(),
            ));
        }
        Ok(parsed.embedding)
    }
}

#[async_trait]
impl ChatProvider for OllamaProvider {
    async fn generate(&self, question: &str, context: &str) -> Result<String, ProviderError> {
        let url = self.endpoint("api/generate")?;
        let prompt = format!(
            "Use the following context to answer the question.\n\n\
             Context:\n{context}\n\nQuestion: {question}\n\nAnswer:"
        );
        debug!(model = %self.chat_model, "generation request");

        let response = self
            .client
            .post(url)
            .json(&json!({
                "model": self.chat_model,
                "prompt": prompt,
                "stream": false,
            }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ProviderError::Api(format!(
                "generation endpoint returned {}",
                response.status()
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|err| ProviderError::InvalidResponse(err.to_string()))?;
        Ok(parsed.response)
    }
}

/// Deterministic providers for tests and offline runs.
pub mod mock {
    use super::*;

    /// Hash-seeded embeddings: identical text maps to identical vectors,
    /// different text to different vectors. No semantic meaning.
    #[derive(Clone, Debug)]
    pub struct MockEmbeddingProvider {
        dimension: usize,
    }

    impl MockEmbeddingProvider {
        pub fn new(dimension: usize) -> Self {
            Self { dimension }
        }
    }

    impl Default for MockEmbeddingProvider {
        fn default() -> Self {
            Self::new(crate::store::DEFAULT_DIMENSION)
        }
    }

    #[async_trait]
    impl EmbeddingProvider for MockEmbeddingProvider {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
            let mut seed = 0u64;
            for byte in text.bytes() {
                seed = seed.wrapping_mul(31).wrapping_add(u64::from(byte));
            }
            let mut state = seed;
            let vector = (0..self.dimension)
                .map(|_| {
                    // xorshift keeps the sequence cheap and reproducible.
                    state ^= state << 13;
                    state ^= state >> 7;
                    state ^= state << 17;
                    (state % 1000) as f32 / 1000.0
                })
                .collect();
            Ok(vector)
        }
    }

    /// Echoes the question and context so tests can assert exactly what the
    /// generation call received.
    #[derive(Clone, Debug, Default)]
    pub struct MockChatProvider;

    #[async_trait]
    impl ChatProvider for MockChatProvider {
        async fn generate(&self, question: &str, context: &str) -> Result<String, ProviderError> {
            Ok(format!("Q: {question} | CTX: {context}"))
        }
    }
}
