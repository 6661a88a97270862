//! Spectral clustering over a precomputed similarity matrix.
//!
//! Classic normalized-cut recipe:
//!
//! 1. Affinity: cosine similarity clamped at 0 (negative similarity
//!    carries no edge weight)
//! 2. Normalized Laplacian L = I − D^(−1/2) A D^(−1/2)
//! 3. Eigenvectors of the k smallest eigenvalues (cyclic Jacobi — the
//!    matrices here are event-sized, exactness beats asymptotics)
//! 4. Row-normalized spectral embedding
//! 5. Seeded k-means++ / Lloyd partition in eigenspace
//!
//! Label *identity* is arbitrary: which integer names which house
//! depends on centroid initialization. With a fixed seed the whole
//! assignment is reproducible; either way only group membership is
//! meaningful, and tests compare partitions up to label permutation.

use crate::error::{MatchError, MatchResult};
use crate::similarity::SimilarityMatrix;
use tracing::{debug, warn};

/// Configuration for spectral house clustering.
#[derive(Debug, Clone, Copy)]
pub struct SpectralConfig {
    /// Target number of houses (k). Not auto-selected.
    pub clusters: usize,
    /// Seed for centroid initialization; fixed seed ⇒ reproducible labels.
    pub seed: u64,
    /// Lloyd iteration cap.
    pub max_iterations: usize,
    /// Stop when no centroid moves farther than this between iterations.
    pub convergence_threshold: f64,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            clusters: 3,
            seed: 42,
            max_iterations: 100,
            convergence_threshold: 1e-6,
        }
    }
}

impl SpectralConfig {
    /// Create a config for `clusters` houses.
    pub fn new(clusters: usize) -> Self {
        Self {
            clusters,
            ..Self::default()
        }
    }

    /// Set the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the Lloyd iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// Spectral clustering engine.
pub struct SpectralClustering {
    config: SpectralConfig,
}

impl SpectralClustering {
    /// Create an engine with the given config.
    pub fn new(config: SpectralConfig) -> Self {
        Self { config }
    }

    /// Partition the entities of `similarity` into `config.clusters`
    /// houses. Returns one label in `0..clusters` per entity.
    ///
    /// A fully disconnected matrix (all off-diagonal zeros) is
    /// clustered without error, but its partition is essentially
    /// arbitrary — there is no structure to recover.
    pub fn cluster(&self, similarity: &SimilarityMatrix) -> MatchResult<Vec<usize>> {
        let n = similarity.len();
        let k = self.config.clusters;

        if n == 0 {
            return Err(MatchError::InvalidConfiguration(
                "similarity matrix is empty".to_string(),
            ));
        }
        if k == 0 {
            return Err(MatchError::InvalidConfiguration(
                "house count must be positive".to_string(),
            ));
        }
        if k >= n {
            return Err(MatchError::InvalidConfiguration(format!(
                "house count {} must be smaller than entity count {}",
                k, n
            )));
        }

        if !similarity.degenerate().is_empty() {
            warn!(
                degenerate = ?similarity.degenerate(),
                "clustering with zero-norm entities present"
            );
        }

        let laplacian = normalized_laplacian(similarity);
        let (eigenvalues, eigenvectors) = jacobi_eigen(laplacian);

        // Ascending eigenvalue order; the k smallest span the embedding.
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            eigenvalues[a]
                .partial_cmp(&eigenvalues[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut embedding: Vec<Vec<f64>> = (0..n)
            .map(|i| order[..k].iter().map(|&c| eigenvectors[i][c]).collect())
            .collect();

        for row in embedding.iter_mut() {
            let norm: f64 = row.iter().map(|x| x * x).sum::<f64>().sqrt();
            if norm > 0.0 {
                for x in row.iter_mut() {
                    *x /= norm;
                }
            }
        }

        debug!(n, k, "spectral embedding ready, running k-means");
        Ok(kmeans(
            &embedding,
            k,
            self.config.seed,
            self.config.max_iterations,
            self.config.convergence_threshold,
        ))
    }
}

/// Build the normalized Laplacian from clamped cosine affinity.
///
/// Zero-degree rows (disconnected or degenerate entities) get
/// D^(−1/2) = 0 instead of a division by zero.
fn normalized_laplacian(similarity: &SimilarityMatrix) -> Vec<Vec<f64>> {
    let n = similarity.len();

    let affinity: Vec<Vec<f64>> = (0..n)
        .map(|i| {
            similarity
                .row(i)
                .iter()
                .map(|&s| f64::from(s.max(0.0)))
                .collect()
        })
        .collect();

    let inv_sqrt_degree: Vec<f64> = affinity
        .iter()
        .map(|row| {
            let degree: f64 = row.iter().sum();
            if degree > 0.0 {
                1.0 / degree.sqrt()
            } else {
                0.0
            }
        })
        .collect();

    (0..n)
        .map(|i| {
            (0..n)
                .map(|j| {
                    let scaled = inv_sqrt_degree[i] * affinity[i][j] * inv_sqrt_degree[j];
                    if i == j {
                        1.0 - scaled
                    } else {
                        -scaled
                    }
                })
                .collect()
        })
        .collect()
}

/// Cyclic Jacobi eigendecomposition of a symmetric matrix.
///
/// Returns `(eigenvalues, eigenvectors)` where column `c` of the
/// eigenvector matrix (`vectors[i][c]` over `i`) pairs with
/// `eigenvalues[c]`. Unsorted.
fn jacobi_eigen(mut a: Vec<Vec<f64>>) -> (Vec<f64>, Vec<Vec<f64>>) {
    let n = a.len();
    let mut v: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect();

    const MAX_SWEEPS: usize = 64;
    const OFF_TOLERANCE: f64 = 1e-10;

    for _ in 0..MAX_SWEEPS {
        let off: f64 = (0..n)
            .flat_map(|i| (0..n).filter(move |&j| j != i).map(move |j| (i, j)))
            .map(|(i, j)| a[i][j] * a[i][j])
            .sum();
        if off.sqrt() < OFF_TOLERANCE {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                if a[p][q].abs() < 1e-15 {
                    continue;
                }

                // Symmetric Schur rotation zeroing a[p][q].
                let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for i in 0..n {
                    let aip = a[i][p];
                    let aiq = a[i][q];
                    a[i][p] = c * aip - s * aiq;
                    a[i][q] = s * aip + c * aiq;
                }
                for i in 0..n {
                    let api = a[p][i];
                    let aqi = a[q][i];
                    a[p][i] = c * api - s * aqi;
                    a[q][i] = s * api + c * aqi;
                }

                for row in v.iter_mut() {
                    let vip = row[p];
                    let viq = row[q];
                    row[p] = c * vip - s * viq;
                    row[q] = s * vip + c * viq;
                }
            }
        }
    }

    let eigenvalues: Vec<f64> = (0..n).map(|i| a[i][i]).collect();
    (eigenvalues, v)
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Seeded k-means++ initialization: first centroid uniform, the rest
/// sampled proportional to squared distance from the nearest chosen one.
fn kmeans_pp_init(points: &[Vec<f64>], k: usize, rng: &mut fastrand::Rng) -> Vec<Vec<f64>> {
    let n = points.len();
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.usize(0..n)].clone());

    let mut min_dist2 = vec![f64::MAX; n];
    while centroids.len() < k {
        let last = centroids.last().expect("at least one centroid");
        for (i, point) in points.iter().enumerate() {
            min_dist2[i] = min_dist2[i].min(squared_distance(point, last));
        }

        let total: f64 = min_dist2.iter().sum();
        let next = if total > 0.0 {
            let mut target = rng.f64() * total;
            let mut chosen = n - 1;
            for (i, &d2) in min_dist2.iter().enumerate() {
                target -= d2;
                if target <= 0.0 {
                    chosen = i;
                    break;
                }
            }
            chosen
        } else {
            // Every point coincides with a centroid already.
            rng.usize(0..n)
        };
        centroids.push(points[next].clone());
    }

    centroids
}

/// Lloyd's algorithm with k-means++ initialization.
fn kmeans(
    points: &[Vec<f64>],
    k: usize,
    seed: u64,
    max_iterations: usize,
    convergence_threshold: f64,
) -> Vec<usize> {
    let n = points.len();
    let dim = points[0].len();
    let mut rng = fastrand::Rng::with_seed(seed);

    let mut centroids = kmeans_pp_init(points, k, &mut rng);
    let mut labels = vec![0usize; n];

    for _ in 0..max_iterations {
        for (i, point) in points.iter().enumerate() {
            let mut best = 0;
            let mut best_dist = f64::MAX;
            for (c, centroid) in centroids.iter().enumerate() {
                let dist = squared_distance(point, centroid);
                if dist < best_dist {
                    best_dist = dist;
                    best = c;
                }
            }
            labels[i] = best;
        }

        let mut sums = vec![vec![0.0f64; dim]; k];
        let mut counts = vec![0usize; k];
        for (point, &label) in points.iter().zip(labels.iter()) {
            counts[label] += 1;
            for (s, x) in sums[label].iter_mut().zip(point.iter()) {
                *s += x;
            }
        }

        let mut movement = 0.0f64;
        for c in 0..k {
            if counts[c] == 0 {
                // Empty house keeps its centroid; membership may refill it.
                continue;
            }
            for s in sums[c].iter_mut() {
                *s /= counts[c] as f64;
            }
            movement = movement.max(squared_distance(&centroids[c], &sums[c]).sqrt());
            centroids[c] = std::mem::take(&mut sums[c]);
        }

        if movement < convergence_threshold {
            break;
        }
    }

    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Partition equality up to label permutation: two labelings agree
    /// when they group the same index pairs together.
    fn same_partition(a: &[usize], b: &[usize]) -> bool {
        a.len() == b.len()
            && (0..a.len()).all(|i| {
                (0..a.len()).all(|j| (a[i] == a[j]) == (b[i] == b[j]))
            })
    }

    fn two_block_matrix() -> SimilarityMatrix {
        SimilarityMatrix::from_vectors(&[
            vec![1.0, 0.0],
            vec![0.995, 0.1],
            vec![0.0, 1.0],
            vec![0.1, 0.995],
        ])
    }

    #[test]
    fn test_two_blocks_recovered() {
        let engine = SpectralClustering::new(SpectralConfig::new(2));
        let labels = engine.cluster(&two_block_matrix()).unwrap();

        assert_eq!(labels.len(), 4);
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[2], labels[3]);
        assert_ne!(labels[0], labels[2]);
    }

    #[test]
    fn test_labels_bounded_by_k() {
        let engine = SpectralClustering::new(SpectralConfig::new(3));
        let matrix = SimilarityMatrix::from_vectors(&[
            vec![1.0, 0.0, 0.0],
            vec![0.9, 0.1, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.9, 0.1],
            vec![0.0, 0.0, 1.0],
            vec![0.1, 0.0, 0.9],
        ]);

        let labels = engine.cluster(&matrix).unwrap();
        assert_eq!(labels.len(), 6);
        assert!(labels.iter().all(|&l| l < 3));
    }

    #[test]
    fn test_fixed_seed_is_reproducible() {
        let matrix = two_block_matrix();
        let engine = SpectralClustering::new(SpectralConfig::new(2).with_seed(7));

        let first = engine.cluster(&matrix).unwrap();
        let second = engine.cluster(&matrix).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_different_seeds_same_membership() {
        let matrix = two_block_matrix();

        let a = SpectralClustering::new(SpectralConfig::new(2).with_seed(1))
            .cluster(&matrix)
            .unwrap();
        let b = SpectralClustering::new(SpectralConfig::new(2).with_seed(99))
            .cluster(&matrix)
            .unwrap();

        // Integer labels may swap; the grouping may not.
        assert!(same_partition(&a, &b));
    }

    #[test]
    fn test_k_out_of_range_rejected() {
        let matrix = two_block_matrix();

        let too_many = SpectralClustering::new(SpectralConfig::new(4)).cluster(&matrix);
        assert!(matches!(
            too_many,
            Err(MatchError::InvalidConfiguration(_))
        ));

        let zero = SpectralClustering::new(SpectralConfig::new(0)).cluster(&matrix);
        assert!(matches!(zero, Err(MatchError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_empty_matrix_rejected() {
        let matrix = SimilarityMatrix::from_vectors(&[]);
        let result = SpectralClustering::new(SpectralConfig::new(1)).cluster(&matrix);
        assert!(matches!(result, Err(MatchError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_disconnected_matrix_does_not_crash() {
        // Mutually orthogonal vectors: all off-diagonal similarity 0.
        let matrix = SimilarityMatrix::from_vectors(&[
            vec![1.0, 0.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0, 0.0],
            vec![0.0, 0.0, 1.0, 0.0],
            vec![0.0, 0.0, 0.0, 1.0],
        ]);

        let labels = SpectralClustering::new(SpectralConfig::new(2))
            .cluster(&matrix)
            .unwrap();
        // No structure to recover; we only require a complete, bounded
        // assignment.
        assert_eq!(labels.len(), 4);
        assert!(labels.iter().all(|&l| l < 2));
    }

    #[test]
    fn test_degenerate_rows_survive_clustering() {
        let matrix = SimilarityMatrix::from_vectors(&[
            vec![1.0, 0.0],
            vec![0.9, 0.1],
            vec![0.0, 0.0], // zero-norm
            vec![0.0, 1.0],
        ]);
        assert_eq!(matrix.degenerate(), &[2]);

        let labels = SpectralClustering::new(SpectralConfig::new(2))
            .cluster(&matrix)
            .unwrap();
        assert_eq!(labels.len(), 4);
    }

    #[test]
    fn test_jacobi_recovers_known_eigenvalues() {
        // [[2, 1], [1, 2]] has eigenvalues 1 and 3.
        let (mut values, _) = jacobi_eigen(vec![vec![2.0, 1.0], vec![1.0, 2.0]]);
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert!((values[0] - 1.0).abs() < 1e-9);
        assert!((values[1] - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_jacobi_eigenvectors_are_orthonormal() {
        let (_, vectors) = jacobi_eigen(vec![
            vec![4.0, 1.0, 0.5],
            vec![1.0, 3.0, 0.2],
            vec![0.5, 0.2, 1.0],
        ]);

        let n = 3;
        for c1 in 0..n {
            for c2 in 0..n {
                let dot: f64 = (0..n).map(|i| vectors[i][c1] * vectors[i][c2]).sum();
                let expected = if c1 == c2 { 1.0 } else { 0.0 };
                assert!((dot - expected).abs() < 1e-9);
            }
        }
    }
}
