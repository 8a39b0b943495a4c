//! Embedding generation for the semantic index
//!
//! TigerStyle: Trait-based embedder with explicit dimension constraints.
//!
//! The index never talks to a provider directly; it goes through the
//! [`Embedder`] trait. The default [`HashEmbedder`] is fully local and
//! deterministic, so the crate works with no API key. [`HttpEmbedder`]
//! speaks the common `/embeddings` JSON shape for hosted models.

use crate::error::{MemoryError, MemoryResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Dimension of the local hashed embedding
pub const EMBEDDING_DIM_HASHED: usize = 256;

/// Dimension of OpenAI text-embedding-3-small
pub const EMBEDDING_DIM_1536: usize = 1536;

/// Environment variable holding the embeddings API key
pub const ENV_EMBEDDINGS_API_KEY: &str = "OPENAI_API_KEY";

/// Environment variable overriding the embeddings endpoint
pub const ENV_EMBEDDINGS_BASE_URL: &str = "SELKIE_EMBEDDINGS_BASE_URL";

/// Environment variable overriding the embeddings model
pub const ENV_EMBEDDINGS_MODEL: &str = "SELKIE_EMBEDDINGS_MODEL";

/// Trait for generating text embeddings
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Dimension of the vectors this embedder produces
    fn dimension(&self) -> usize;

    /// Model name or identifier
    fn model_name(&self) -> &str;

    /// Embed a single text string into a unit vector
    async fn embed(&self, text: &str) -> MemoryResult<Vec<f32>>;

    /// Embed multiple texts in a batch
    async fn embed_batch(&self, texts: &[&str]) -> MemoryResult<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }
}

/// Local deterministic embedder using word-level feature hashing
///
/// Each lowercased word hashes into one of N buckets; the bucket counts,
/// normalized to a unit vector, are the embedding. Texts sharing words get
/// proportionally similar vectors, which is enough for duplicate detection
/// and keyword-flavored recall without any model download or network call.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    /// Create a hash embedder with the given bucket count
    pub fn new(dimension: usize) -> Self {
        assert!(dimension > 0, "embedding dimension must be positive");
        Self { dimension }
    }

    fn bucket(&self, word: &str) -> (usize, f32) {
        // FNV-1a over the lowercased word
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in word.bytes() {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        }
        // Sign bit decorrelates buckets that collide
        let sign = if hash & (1 << 63) == 0 { 1.0 } else { -1.0 };
        ((hash as usize) % self.dimension, sign)
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(EMBEDDING_DIM_HASHED)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "hashed-bow"
    }

    async fn embed(&self, text: &str) -> MemoryResult<Vec<f32>> {
        let mut embedding = vec![0.0f32; self.dimension];

        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let lowered = word.to_lowercase();
            let (bucket, sign) = self.bucket(&lowered);
            embedding[bucket] += sign;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut embedding {
                *value /= norm;
            }
        }

        Ok(embedding)
    }
}

/// Hosted embedder speaking the common `/embeddings` JSON shape
pub struct HttpEmbedder {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    dimension: usize,
}

impl std::fmt::Debug for HttpEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpEmbedder")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("dimension", &self.dimension)
            .finish()
    }
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl HttpEmbedder {
    /// Create an embedder against an explicit endpoint
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        dimension: usize,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            dimension,
        }
    }

    /// Create from environment variables
    ///
    /// Requires `OPENAI_API_KEY`; `SELKIE_EMBEDDINGS_BASE_URL` and
    /// `SELKIE_EMBEDDINGS_MODEL` override the defaults. Returns `None`
    /// when no key is set, so callers can fall back to [`HashEmbedder`].
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var(ENV_EMBEDDINGS_API_KEY).ok()?;
        let base_url = std::env::var(ENV_EMBEDDINGS_BASE_URL)
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let model = std::env::var(ENV_EMBEDDINGS_MODEL)
            .unwrap_or_else(|_| "text-embedding-3-small".to_string());
        Some(Self::new(base_url, api_key, model, EMBEDDING_DIM_1536))
    }

    async fn request(&self, texts: Vec<&str>) -> MemoryResult<Vec<Vec<f32>>> {
        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&EmbeddingsRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .map_err(|e| MemoryError::embedding(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MemoryError::embedding(format!(
                "provider returned {}: {}",
                status, body
            )));
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| MemoryError::embedding(format!("malformed response: {}", e)))?;

        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> MemoryResult<Vec<f32>> {
        let mut vectors = self.request(vec![text]).await?;
        vectors
            .pop()
            .ok_or_else(|| MemoryError::embedding("provider returned no embedding"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> MemoryResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let vectors = self.request(texts.to_vec()).await?;
        if vectors.len() != texts.len() {
            return Err(MemoryError::embedding(format!(
                "provider returned {} embeddings for {} inputs",
                vectors.len(),
                texts.len()
            )));
        }
        Ok(vectors)
    }
}

/// Cosine similarity between two vectors
///
/// Returns 0.0 on dimension mismatch or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
