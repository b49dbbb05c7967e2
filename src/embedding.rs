//! The embedding seam: one [`EmbeddingProvider`] trait, three backends.
//!
//! - [`GeminiProvider`] talks to the Google Generative Language API over
//!   `batchEmbedContents`. One attempt per call, no automatic retries.
//! - [`MockProvider`] produces deterministic vectors offline, for tests and
//!   air-gapped smoke runs.
//! - [`DisabledProvider`] rejects every call. The default until a real
//!   provider is configured.
//!
//! [`create_provider`] picks the backend from config, failing fast on
//! unknown names or unsupported models. The blob codecs and
//! [`cosine_similarity`] live here too since both ends of the store's
//! embedding column need them.
//!
//! # Failure Policy
//!
//! A failed call fails the operation. Ingestion is idempotent, so the remedy
//! for a mid-run failure is to re-run it; at query time the retriever absorbs
//! the failure and the caller answers without context.

use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};

/// Gemini embedding models this crate accepts. Anything else fails
/// validation at startup rather than at the first API call.
pub const SUPPORTED_GEMINI_MODELS: &[&str] =
    &["models/text-embedding-004", "models/embedding-001"];

/// The batchEmbedContents endpoint caps requests per call.
const GEMINI_MAX_BATCH: usize = 100;

/// Vector width of the mock provider when the config leaves dims unset.
const MOCK_DEFAULT_DIMS: usize = 256;

/// Trait for embedding providers.
///
/// One implementation per backend. `embed` takes a batch and returns one
/// vector per input text, in input order.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"models/text-embedding-004"`).
    fn model_name(&self) -> &str;

    /// Returns the embedding vector dimensionality (e.g. `768`).
    fn dims(&self) -> usize;

    /// Embed a batch of texts.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single query text.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed(&[text.to_string()]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| Error::Provider("empty embedding response".to_string()))
    }
}

/// Create the appropriate [`EmbeddingProvider`] based on configuration.
///
/// | Config value | Provider |
/// |--------------|----------|
/// | `"disabled"` | [`DisabledProvider`] |
/// | `"gemini"`   | [`GeminiProvider`] |
/// | `"mock"`     | [`MockProvider`] |
///
/// Returns a `Validation` error for unknown provider names or unsupported
/// gemini models, and a `Provider` error if the gemini API key is missing
/// from the environment.
pub fn create_provider(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledProvider)),
        "mock" => Ok(Arc::new(MockProvider::new(
            config.dims.unwrap_or(MOCK_DEFAULT_DIMS),
        ))),
        "gemini" => Ok(Arc::new(GeminiProvider::new(config)?)),
        other => Err(Error::Validation(format!(
            "unknown embedding provider: '{other}'. Must be disabled, gemini, or mock."
        ))),
    }
}

// ============ Disabled Provider ============

/// A no-op embedding provider that always returns errors.
///
/// Used when `embedding.provider = "disabled"` in the configuration. Any
/// attempt to embed text fails; at query time the retriever turns that
/// failure into an empty-context outcome.
pub struct DisabledProvider;

#[async_trait]
impl EmbeddingProvider for DisabledProvider {
    fn model_name(&self) -> &str {
        "disabled"
    }
    fn dims(&self) -> usize {
        0
    }
    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(Error::Provider(
            "embedding provider is disabled".to_string(),
        ))
    }
}

// ============ Gemini Provider ============

/// Embedding provider backed by the Google Generative Language API.
///
/// Calls `POST {endpoint}/v1beta/{model}:batchEmbedContents` with the API
/// key in the query string. Reads the key from `GEMINI_API_KEY` (falling
/// back to `GOOGLE_API_KEY`). Batches larger than the API limit are split
/// into sequential calls; a failed call fails the whole batch immediately.
pub struct GeminiProvider {
    model: String,
    dims: usize,
    endpoint: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Create a new gemini provider from configuration.
    ///
    /// Fails with `Validation` if the model is missing or unsupported, and
    /// with `Provider` if no API key is present in the environment.
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model = config.model.clone().ok_or_else(|| {
            Error::Validation("embedding.model required for gemini provider".to_string())
        })?;

        if !SUPPORTED_GEMINI_MODELS.contains(&model.as_str()) {
            return Err(Error::Validation(format!(
                "unsupported gemini embedding model: '{}'. Supported: {}",
                model,
                SUPPORTED_GEMINI_MODELS.join(", ")
            )));
        }

        let dims = config.dims.ok_or_else(|| {
            Error::Validation("embedding.dims required for gemini provider".to_string())
        })?;

        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("GOOGLE_API_KEY"))
            .map_err(|_| {
                Error::Provider(
                    "GEMINI_API_KEY (or GOOGLE_API_KEY) environment variable not set".to_string(),
                )
            })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            model,
            dims,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!(
            "{}/v1beta/{}:batchEmbedContents?key={}",
            self.endpoint, self.model, self.api_key
        );

        let requests: Vec<serde_json::Value> = texts
            .iter()
            .map(|text| {
                serde_json::json!({
                    "model": self.model,
                    "content": { "parts": [ { "text": text } ] },
                })
            })
            .collect();

        let body = serde_json::json!({ "requests": requests });

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(Error::Provider(format!(
                "gemini API error {status}: {body_text}"
            )));
        }

        let parsed: BatchEmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::Provider(format!("invalid gemini response: {e}")))?;

        if parsed.embeddings.len() != texts.len() {
            return Err(Error::Provider(format!(
                "gemini returned {} embeddings for {} texts",
                parsed.embeddings.len(),
                texts.len()
            )));
        }

        let mut vectors = Vec::with_capacity(parsed.embeddings.len());
        for embedding in parsed.embeddings {
            if embedding.values.len() != self.dims {
                return Err(Error::Provider(format!(
                    "gemini returned {} dims, config says {}",
                    embedding.values.len(),
                    self.dims
                )));
            }
            vectors.push(embedding.values);
        }

        Ok(vectors)
    }
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for GeminiProvider {
    fn model_name(&self) -> &str {
        &self.model
    }
    fn dims(&self) -> usize {
        self.dims
    }
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(GEMINI_MAX_BATCH) {
            vectors.extend(self.embed_batch(batch).await?);
        }
        Ok(vectors)
    }
}

// ============ Mock Provider ============

/// Deterministic offline embedding provider.
///
/// Each text maps to the normalized sum of per-token vectors, where a
/// token's vector is seeded from its SHA-256 digest. Texts sharing words
/// land near each other; disjoint texts land near orthogonal. Identical
/// input produces identical output across processes, which is what the
/// idempotence and dedup tests lean on.
pub struct MockProvider {
    dims: usize,
}

impl MockProvider {
    pub fn new(dims: usize) -> Self {
        Self { dims }
    }

    fn token_vector(&self, token: &str) -> Vec<f32> {
        let digest = Sha256::digest(token.as_bytes());
        let mut state = u64::from_le_bytes([
            digest[0], digest[1], digest[2], digest[3], digest[4], digest[5], digest[6], digest[7],
        ]);

        (0..self.dims)
            .map(|_| {
                // Plain LCG over the digest seed; quality is irrelevant here,
                // determinism is not.
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                ((state >> 32) as f32 / (1u64 << 31) as f32) - 1.0
            })
            .collect()
    }

    fn text_vector(&self, text: &str) -> Vec<f32> {
        let mut sum = vec![0.0f32; self.dims];
        let mut tokens = 0usize;

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let token = token.to_lowercase();
            for (acc, v) in sum.iter_mut().zip(self.token_vector(&token)) {
                *acc += v;
            }
            tokens += 1;
        }

        if tokens == 0 {
            // Empty text gets a fixed direction instead of the zero vector.
            sum = self.token_vector("");
        }

        let norm = sum.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for v in &mut sum {
                *v /= norm;
            }
        }
        sum
    }
}

#[async_trait]
impl EmbeddingProvider for MockProvider {
    fn model_name(&self) -> &str {
        "mock"
    }
    fn dims(&self) -> usize {
        self.dims
    }
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.text_vector(t)).collect())
    }
}

// ============ Vector utilities ============

/// Serialize an embedding for BLOB storage: each `f32` as four
/// little-endian bytes, concatenated in order.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Inverse of [`vec_to_blob`]. Trailing bytes that do not fill a whole
/// `f32` are dropped.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

/// Cosine similarity of two embeddings, in `[-1.0, 1.0]`.
///
/// Mismatched lengths, empty inputs, and zero vectors all score `0.0`
/// rather than erroring; a malformed row should rank last, not kill a
/// query.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_roundtrip_preserves_values() {
        let original = vec![0.25f32, -1.5, 3.0e-3, f32::MAX, 0.0];
        assert_eq!(blob_to_vec(&vec_to_blob(&original)), original);
        assert_eq!(vec_to_blob(&original).len(), original.len() * 4);
    }

    #[test]
    fn test_blob_trailing_bytes_dropped() {
        let mut blob = vec_to_blob(&[1.0f32, 2.0]);
        blob.push(0xff);
        assert_eq!(blob_to_vec(&blob), vec![1.0, 2.0]);
    }

    #[test]
    fn test_cosine_directions() {
        let v = [3.0f32, 4.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-2.0, 0.0]) + 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 7.0]).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_degenerate_inputs_score_zero() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[tokio::test]
    async fn test_mock_is_deterministic() {
        let provider = MockProvider::new(64);
        let texts = vec!["the cat sat on the mat".to_string()];
        let a = provider.embed(&texts).await.unwrap();
        let b = provider.embed(&texts).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0].len(), 64);
    }

    #[tokio::test]
    async fn test_mock_vectors_are_normalized() {
        let provider = MockProvider::new(64);
        let v = provider.embed_query("alpha beta gamma").await.unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4, "norm was {norm}");
    }

    #[tokio::test]
    async fn test_mock_shared_vocabulary_scores_higher() {
        let provider = MockProvider::new(64);
        let a = provider.embed_query("alpha beta gamma").await.unwrap();
        let b = provider.embed_query("alpha beta delta").await.unwrap();
        let c = provider.embed_query("epsilon zeta eta").await.unwrap();

        let close = cosine_similarity(&a, &b);
        let far = cosine_similarity(&a, &c);
        assert!(
            close > far,
            "shared vocabulary should score higher: {close} vs {far}"
        );
        assert!(far < 0.5, "disjoint vocabulary should be near orthogonal");
    }

    #[tokio::test]
    async fn test_disabled_provider_errors_on_embed() {
        let provider = DisabledProvider;
        let err = provider.embed(&["x".to_string()]).await.unwrap_err();
        assert!(matches!(err, Error::Provider(_)));
    }

    #[test]
    fn test_create_provider_disabled_and_mock() {
        let config = EmbeddingConfig::default();
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.model_name(), "disabled");

        let config = EmbeddingConfig {
            provider: "mock".to_string(),
            dims: Some(32),
            ..EmbeddingConfig::default()
        };
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.model_name(), "mock");
        assert_eq!(provider.dims(), 32);
    }

    #[test]
    fn test_unsupported_gemini_model_is_validation_error() {
        let config = EmbeddingConfig {
            provider: "gemini".to_string(),
            model: Some("models/gemini-pro".to_string()),
            dims: Some(768),
            ..EmbeddingConfig::default()
        };
        let err = create_provider(&config).err().unwrap();
        assert!(matches!(err, Error::Validation(_)));
    }
}
