//! Pairwise cosine similarity matrix.
//!
//! Symmetric by construction: each (i, j) pair is computed once and
//! mirrored, so `similarity(i, j) == similarity(j, i)` exactly, not
//! just within floating-point tolerance.

use crate::error::MatchResult;
use mingle_vectors::VectorStore;
use serde::Serialize;

/// Square symmetric matrix of pairwise cosine similarities.
///
/// Indexed by the entity ordering of the vectors it was built from.
/// The diagonal is exactly 1.0 for every non-zero vector. Zero-norm
/// vectors are degenerate: similarity 0.0 to everything, themselves
/// included, with their indices flagged rather than crashing the run.
#[derive(Debug, Clone, Serialize)]
pub struct SimilarityMatrix {
    n: usize,
    /// Row-major entries.
    data: Vec<f32>,
    /// Indices of zero-norm input vectors.
    degenerate: Vec<usize>,
}

impl SimilarityMatrix {
    /// Build the matrix from a fixed-order sequence of vectors.
    pub fn from_vectors(vectors: &[Vec<f32>]) -> Self {
        let n = vectors.len();
        let mut data = vec![0.0f32; n * n];

        let norms: Vec<f32> = vectors
            .iter()
            .map(|v| v.iter().map(|x| x * x).sum::<f32>().sqrt())
            .collect();
        let degenerate: Vec<usize> = norms
            .iter()
            .enumerate()
            .filter(|(_, &norm)| norm == 0.0)
            .map(|(i, _)| i)
            .collect();

        for i in 0..n {
            data[i * n + i] = if norms[i] > 0.0 { 1.0 } else { 0.0 };

            for j in (i + 1)..n {
                let value = if norms[i] > 0.0 && norms[j] > 0.0 {
                    let dot: f32 = vectors[i]
                        .iter()
                        .zip(vectors[j].iter())
                        .map(|(x, y)| x * y)
                        .sum();
                    dot / (norms[i] * norms[j])
                } else {
                    0.0
                };

                data[i * n + j] = value;
                data[j * n + i] = value;
            }
        }

        Self { n, data, degenerate }
    }

    /// Number of entities (rows/columns).
    pub fn len(&self) -> usize {
        self.n
    }

    /// Whether the matrix is empty.
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Similarity between entities `i` and `j`.
    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.data[i * self.n + j]
    }

    /// Row `i` as a slice.
    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.n..(i + 1) * self.n]
    }

    /// Indices of zero-norm (degenerate) input vectors.
    pub fn degenerate(&self) -> &[usize] {
        &self.degenerate
    }

    /// Largest |m[i][j] - m[j][i]| over all pairs.
    ///
    /// Zero by construction; any nonzero value is a bug, and tests
    /// assert it stays under 1e-9.
    pub fn max_asymmetry(&self) -> f32 {
        let mut max = 0.0f32;
        for i in 0..self.n {
            for j in (i + 1)..self.n {
                max = max.max((self.get(i, j) - self.get(j, i)).abs());
            }
        }
        max
    }
}

/// Build the fine-grained answer-level similarity matrix from every
/// record in the store.
///
/// `fetch_all` returns records sorted by id, so the returned ids fix
/// the matrix's entity ordering deterministically across runs.
pub async fn answer_similarity(
    store: &dyn VectorStore,
) -> MatchResult<(Vec<String>, SimilarityMatrix)> {
    let records = store.fetch_all().await?;
    let ids: Vec<String> = records.iter().map(|r| r.id.clone()).collect();
    let vectors: Vec<Vec<f32>> = records.into_iter().map(|r| r.vector).collect();
    Ok((ids, SimilarityMatrix::from_vectors(&vectors)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagonal_is_one_for_nonzero_vectors() {
        let matrix = SimilarityMatrix::from_vectors(&[
            vec![1.0, 0.0],
            vec![0.5, 0.5],
            vec![-0.3, 0.9],
        ]);

        for i in 0..3 {
            assert!((matrix.get(i, i) - 1.0).abs() < 1e-6);
        }
        assert!(matrix.degenerate().is_empty());
    }

    #[test]
    fn test_symmetry_is_exact() {
        let matrix = SimilarityMatrix::from_vectors(&[
            vec![0.3, 0.7, -0.1],
            vec![0.9, 0.2, 0.4],
            vec![-0.5, 0.1, 0.8],
            vec![0.0, 0.6, 0.6],
        ]);

        assert!(matrix.max_asymmetry() <= 1e-9);
        for i in 0..4 {
            for j in 0..4 {
                assert_eq!(matrix.get(i, j), matrix.get(j, i));
            }
        }
    }

    #[test]
    fn test_known_similarities() {
        let matrix = SimilarityMatrix::from_vectors(&[
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![-1.0, 0.0],
        ]);

        assert!(matrix.get(0, 1).abs() < 1e-6);
        assert!((matrix.get(0, 2) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_norm_vector_flagged_not_fatal() {
        let matrix = SimilarityMatrix::from_vectors(&[
            vec![1.0, 0.0],
            vec![0.0, 0.0],
            vec![0.0, 1.0],
        ]);

        assert_eq!(matrix.degenerate(), &[1]);
        // Degenerate entity: zero to everything, itself included.
        assert_eq!(matrix.get(1, 1), 0.0);
        assert_eq!(matrix.get(1, 0), 0.0);
        assert_eq!(matrix.get(1, 2), 0.0);
        // The healthy entries are untouched.
        assert!((matrix.get(0, 0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_input() {
        let matrix = SimilarityMatrix::from_vectors(&[]);
        assert!(matrix.is_empty());
        assert_eq!(matrix.len(), 0);
    }

    #[tokio::test]
    async fn test_answer_similarity_uses_store_ordering() {
        use mingle_vectors::{InMemoryStore, VectorRecord};

        let store = InMemoryStore::new(2);
        store
            .upsert(vec![
                VectorRecord::new("Bo::Q1", vec![0.0, 1.0]),
                VectorRecord::new("Ada::Q1", vec![1.0, 0.0]),
                VectorRecord::new("Ada::Q2", vec![1.0, 0.0]),
            ])
            .await
            .unwrap();

        let (ids, matrix) = answer_similarity(&store).await.unwrap();
        assert_eq!(ids, vec!["Ada::Q1", "Ada::Q2", "Bo::Q1"]);
        assert!((matrix.get(0, 1) - 1.0).abs() < 1e-6);
        assert!(matrix.get(0, 2).abs() < 1e-6);
    }
}
