//! # Mingle
//!
//! Semantic attendee matching for social events.
//!
//! Attendees answer a handful of free-text survey questions; mingle
//! embeds the answers, measures pairwise cosine similarity, clusters
//! everyone into "houses" via spectral clustering, and builds a
//! weighted match graph for one-to-one pairings.
//!
//! ```rust,ignore
//! use mingle::prelude::*;
//!
//! let rows = vec![
//!     SurveyResponse::new("Ada", [("Talk Forever", "category theory")]),
//!     SurveyResponse::new("Grace", [("Talk Forever", "compilers and type theory")]),
//!     SurveyResponse::new("Lin", [("Talk Forever", "sourdough baking")]),
//! ];
//!
//! let pipeline = Pipeline::new(
//!     Box::new(SimpleEmbedder::new(384)),
//!     Box::new(InMemoryStore::new(384)),
//!     PipelineConfig::default().with_houses(2),
//! );
//! let output = pipeline.run(&rows).await?;
//! println!("{}", serde_json::to_string_pretty(&output.graph)?);
//! ```
//!
//! Hosted embeddings plug in behind the same [`Embedder`] trait; enable
//! the `api` feature and swap in
//! [`ApiEmbedder`](mingle_embeddings::ApiEmbedder).
//!
//! ## Architecture
//!
//! Mingle is organized into several crates:
//!
//! - [`mingle_core`] - Survey types and answer normalization
//! - [`mingle_embeddings`] - Embedding/classification backends and retry policy
//! - [`mingle_vectors`] - Vector storage with traceable answer metadata
//! - [`mingle_match`] - Similarity matrix, spectral houses, match graph, pipeline
//!
//! ## Failure semantics
//!
//! Per-attendee failures (no valid answers, exhausted embedding retries)
//! are isolated: the attendee is recorded in the [`RunReport`] and
//! excluded from the similarity matrix and graph. Configuration errors
//! (empty input, house count out of range) abort the run immediately.

// Re-export all subcrates
pub use mingle_core as core;
pub use mingle_embeddings as embeddings;
pub use mingle_match as matching;
pub use mingle_vectors as vectors;

pub use mingle_core::{QuestionAnswer, SurveyResponse, ValidAnswers};
pub use mingle_embeddings::{Classifier, Embedder, RetryConfig, SimpleEmbedder, ToneScores};
pub use mingle_match::{
    HouseAssignment, MatchGraph, MatchPolicy, Pipeline, PipelineConfig, PipelineOutput, RunReport,
    SimilarityMatrix, SpectralClustering, SpectralConfig,
};
pub use mingle_vectors::{InMemoryStore, VectorRecord, VectorStore};

#[cfg(feature = "api")]
pub use mingle_embeddings::{ApiConfig, ApiEmbedder, ChatClassifier, ClassifierConfig};

/// Prelude for convenient imports.
pub mod prelude {
    pub use mingle_core::prelude::*;
    pub use mingle_embeddings::prelude::*;
    pub use mingle_match::prelude::*;
    pub use mingle_vectors::{InMemoryStore, VectorRecord, VectorStore};
}
