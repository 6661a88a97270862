//! Simple hash-based embedder (no external capability).
//!
//! Hashes words into a fixed-dimension signed feature space. Nowhere
//! near as semantically rich as a hosted embedding model, but it is
//! deterministic, offline, and good enough for tests and dry runs:
//! answers sharing vocabulary land measurably closer than unrelated
//! ones.

use crate::{Embedder, EmbeddingError, EmbeddingResult};
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

const HASH_ROUNDS: u64 = 4;

/// Deterministic hash-based embedder.
///
/// # Example
///
/// ```rust,ignore
/// use mingle_embeddings::{Embedder, SimpleEmbedder};
///
/// let embedder = SimpleEmbedder::new(384);
/// let vector = embedder.embed("I love jazz").await.unwrap();
/// assert_eq!(vector.len(), 384);
/// ```
pub struct SimpleEmbedder {
    dimension: usize,
}

impl SimpleEmbedder {
    /// Create a new hash embedder with the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    /// Lowercase word tokens, single characters dropped.
    fn tokenize(text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|s| s.len() > 1)
            .map(|s| s.to_string())
            .collect()
    }

    /// Hash a token under a round seed into a (bucket, sign) pair.
    fn feature(&self, token: &str, round: u64) -> (usize, f32) {
        let mut hasher = DefaultHasher::new();
        round.hash(&mut hasher);
        token.hash(&mut hasher);
        let h = hasher.finish();

        let bucket = (h >> 1) as usize % self.dimension;
        let sign = if h & 1 == 0 { 1.0 } else { -1.0 };
        (bucket, sign)
    }
}

impl Default for SimpleEmbedder {
    /// 384 dimensions, matching the lightweight hosted models the
    /// pipeline is usually configured with.
    fn default() -> Self {
        Self::new(384)
    }
}

#[async_trait]
impl Embedder for SimpleEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> EmbeddingResult<Vec<Vec<f32>>> {
        texts
            .iter()
            .map(|text| {
                if text.trim().is_empty() {
                    return Err(EmbeddingError::InvalidInput("empty text".to_string()));
                }

                let mut vector = vec![0.0f32; self.dimension];
                for token in Self::tokenize(text) {
                    for round in 0..HASH_ROUNDS {
                        let (bucket, sign) = self.feature(&token, round);
                        vector[bucket] += sign;
                    }
                }

                crate::normalize::normalize_l2(&mut vector);
                Ok(vector)
            })
            .collect()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "simple-hash"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deterministic_and_unit_norm() {
        let embedder = SimpleEmbedder::new(128);

        let v1 = embedder.embed("hello world").await.unwrap();
        let v2 = embedder.embed("hello world").await.unwrap();
        assert_eq!(v1, v2);
        assert_eq!(v1.len(), 128);

        let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_batch_composition_does_not_change_vectors() {
        let embedder = SimpleEmbedder::new(128);

        let alone = embedder.embed("favorite hiking trails").await.unwrap();
        let batch = embedder
            .embed_batch(&[
                "something else entirely".to_string(),
                "favorite hiking trails".to_string(),
            ])
            .await
            .unwrap();

        assert_eq!(alone, batch[1]);
    }

    #[tokio::test]
    async fn test_shared_vocabulary_scores_higher() {
        let embedder = SimpleEmbedder::default();

        let a = embedder.embed("I love jazz").await.unwrap();
        let b = embedder.embed("Jazz is my favorite").await.unwrap();
        let c = embedder.embed("I enjoy hiking").await.unwrap();

        let sim_ab = embedder.similarity(&a, &b).unwrap();
        let sim_ac = embedder.similarity(&a, &c).unwrap();
        assert!(sim_ab > sim_ac);
    }

    #[tokio::test]
    async fn test_empty_text_rejected() {
        let embedder = SimpleEmbedder::new(64);
        assert!(embedder.embed("   ").await.is_err());
    }
}
