//! Matching error types.

use thiserror::Error;

/// Errors from similarity, clustering, and pipeline runs.
#[derive(Debug, Error)]
pub enum MatchError {
    /// Bad run parameters: empty input set, house count out of range,
    /// mismatched id/matrix sizes. Fatal before computation starts.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Embedding capability failure that aborted the whole run (partial
    /// per-attendee failures are recorded in the run report instead).
    #[error(transparent)]
    Embedding(#[from] mingle_embeddings::EmbeddingError),

    /// Vector store failure.
    #[error(transparent)]
    Store(#[from] mingle_vectors::VectorError),
}

/// Result type for matching operations.
pub type MatchResult<T> = Result<T, MatchError>;
