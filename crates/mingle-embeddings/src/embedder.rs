//! Core embedder trait and error types.

use crate::retry::Retryable;
use async_trait::async_trait;
use thiserror::Error;

/// Embedding error types.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Non-success response from the embedding capability.
    #[error("API error ({status:?}): {message}")]
    Api {
        /// HTTP status, when one was received.
        status: Option<u16>,
        message: String,
    },

    /// Connection, DNS, or timeout failure before a response arrived.
    #[error("transport error: {0}")]
    Transport(String),

    /// The capability answered, but not with one vector per input text.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },
}

impl Retryable for EmbeddingError {
    /// Transient failures worth retrying: transport errors, rate limits,
    /// and server-side (5xx) responses. Client errors and malformed
    /// payloads are not.
    fn is_retryable(&self) -> bool {
        match self {
            EmbeddingError::Transport(_) => true,
            EmbeddingError::Api { status, .. } => {
                matches!(status, None | Some(429)) || status.is_some_and(|s| s >= 500)
            }
            _ => false,
        }
    }
}

/// Result type for embedding operations.
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// Core trait for embedding providers.
///
/// Implementors convert text to dense vectors for semantic similarity.
/// Embedding a text is pure: the vector for a given text must not depend
/// on what else is in the batch, so callers are free to batch per
/// attendee, per answer, or across the whole run.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text string.
    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| EmbeddingError::InvalidResponse("no embedding returned".to_string()))
    }

    /// Embed multiple texts, returning one vector per input in order.
    async fn embed_batch(&self, texts: &[String]) -> EmbeddingResult<Vec<Vec<f32>>>;

    /// Get the embedding dimension.
    fn dimension(&self) -> usize;

    /// Get the model name/identifier.
    fn model_name(&self) -> &str;

    /// Compute cosine similarity between two vectors.
    fn similarity(&self, a: &[f32], b: &[f32]) -> EmbeddingResult<f32> {
        if a.len() != b.len() {
            return Err(EmbeddingError::DimensionMismatch {
                expected: a.len(),
                got: b.len(),
            });
        }
        Ok(crate::normalize::cosine_similarity(a, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryability() {
        assert!(EmbeddingError::Transport("timeout".into()).is_retryable());
        assert!(EmbeddingError::Api {
            status: Some(429),
            message: "rate limited".into()
        }
        .is_retryable());
        assert!(EmbeddingError::Api {
            status: Some(503),
            message: "unavailable".into()
        }
        .is_retryable());

        assert!(!EmbeddingError::Api {
            status: Some(401),
            message: "bad key".into()
        }
        .is_retryable());
        assert!(!EmbeddingError::InvalidResponse("truncated".into()).is_retryable());
        assert!(!EmbeddingError::InvalidInput("empty".into()).is_retryable());
    }
}
