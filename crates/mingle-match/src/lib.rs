//! # Mingle Match
//!
//! The similarity-and-grouping core of mingle: pairwise cosine
//! similarity over attendee embeddings, spectral clustering into
//! "houses", and a weighted match graph for one-to-one pairings.
//!
//! [`Pipeline`] wires the whole run together: normalize survey answers,
//! embed them through an [`mingle_embeddings::Embedder`], persist
//! answer-level records in a [`mingle_vectors::VectorStore`], then
//! derive the similarity matrix, house assignments, and match graph.

mod error;
mod graph;
mod pipeline;
mod similarity;
mod spectral;

pub use error::{MatchError, MatchResult};
pub use graph::{GraphExport, GraphLink, GraphNode, MatchGraph, MatchPolicy};
pub use pipeline::{
    AttendeeTone, HouseAssignment, Pipeline, PipelineConfig, PipelineOutput, RunReport,
};
pub use similarity::{answer_similarity, SimilarityMatrix};
pub use spectral::{SpectralClustering, SpectralConfig};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{GraphExport, MatchGraph, MatchPolicy};
    pub use crate::{HouseAssignment, Pipeline, PipelineConfig, PipelineOutput, RunReport};
    pub use crate::{answer_similarity, SimilarityMatrix};
    pub use crate::{MatchError, MatchResult};
    pub use crate::{SpectralClustering, SpectralConfig};
}
