//! # Mingle Vectors
//!
//! Vector storage for attendee answer embeddings.
//!
//! The pipeline persists one record per (attendee, question) answer —
//! id, unit-norm vector, and enough metadata to trace any downstream
//! cluster or match back to the original answer text. The store
//! interface is deliberately small: upsert, retrieve-all in a
//! deterministic order, and optional nearest-neighbor search.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use mingle_vectors::{InMemoryStore, VectorRecord, VectorStore};
//!
//! let store = InMemoryStore::new(384);
//! store
//!     .upsert(vec![VectorRecord::new("Ada::Hype Song", vec![0.1; 384])
//!         .with_metadata("name", "Ada")
//!         .with_metadata("question", "Hype Song")
//!         .with_metadata("answer", "Paranoid Android")])
//!     .await?;
//!
//! let all = store.fetch_all().await?;
//! let nearest = store.search(&[0.1; 384], 5).await?;
//! ```

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur when working with vector stores.
#[derive(Debug, Error)]
pub enum VectorError {
    #[error("invalid vector dimension: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("store error: {0}")]
    Store(String),
}

/// Result type for vector operations.
pub type VectorResult<T> = Result<T, VectorError>;

/// A vector record to store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Unique identifier. Answer-level records use the composite
    /// `attendee::question` key; attendee-level records use the bare
    /// attendee name.
    pub id: String,
    /// The embedding vector.
    pub vector: Vec<f32>,
    /// Metadata: attendee name, source question, original answer text.
    pub metadata: HashMap<String, serde_json::Value>,
}

impl VectorRecord {
    /// Create a new vector record.
    pub fn new(id: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            vector,
            metadata: HashMap::new(),
        }
    }

    /// Add metadata to the record.
    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Get the vector dimension.
    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}

/// A scored search result.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The record id.
    pub id: String,
    /// Cosine similarity to the query (higher is more similar).
    pub score: f32,
    /// Metadata of the matched record.
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Abstract interface for vector storage and retrieval.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Get the name of this backend.
    fn name(&self) -> &str;

    /// Get the vector dimension.
    fn dimension(&self) -> usize;

    /// Insert or update records.
    ///
    /// A record whose id already exists replaces the stored one — ids
    /// never silently duplicate.
    async fn upsert(&self, records: Vec<VectorRecord>) -> VectorResult<()>;

    /// Retrieve every record, sorted by id.
    ///
    /// The sort fixes the entity ordering that similarity matrices and
    /// cluster labels are indexed by.
    async fn fetch_all(&self) -> VectorResult<Vec<VectorRecord>>;

    /// Search for the `k` records most similar to `vector`.
    async fn search(&self, vector: &[f32], k: usize) -> VectorResult<Vec<SearchResult>>;

    /// Get a record by id.
    async fn get(&self, id: &str) -> VectorResult<Option<VectorRecord>>;

    /// Number of stored records.
    async fn count(&self) -> VectorResult<usize>;

    /// Remove all records.
    async fn clear(&self) -> VectorResult<()>;
}

// A shared handle is a store too; callers keep an Arc to inspect
// records after handing the store to a pipeline.
#[async_trait]
impl<T: VectorStore + ?Sized> VectorStore for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    async fn upsert(&self, records: Vec<VectorRecord>) -> VectorResult<()> {
        (**self).upsert(records).await
    }

    async fn fetch_all(&self) -> VectorResult<Vec<VectorRecord>> {
        (**self).fetch_all().await
    }

    async fn search(&self, vector: &[f32], k: usize) -> VectorResult<Vec<SearchResult>> {
        (**self).search(vector, k).await
    }

    async fn get(&self, id: &str) -> VectorResult<Option<VectorRecord>> {
        (**self).get(id).await
    }

    async fn count(&self) -> VectorResult<usize> {
        (**self).count().await
    }

    async fn clear(&self) -> VectorResult<()> {
        (**self).clear().await
    }
}

pub use memory::InMemoryStore;
