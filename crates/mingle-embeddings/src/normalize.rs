//! Vector normalization and similarity utilities.

/// L2 normalize a vector (unit length).
///
/// Zero vectors are left untouched; downstream similarity treats them
/// as degenerate rather than dividing by zero.
pub fn normalize_l2(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 for mismatched lengths or zero-norm inputs.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Compute dot product between two vectors.
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Average a set of same-length vectors into one, re-normalized to unit
/// length.
///
/// Used to aggregate an attendee's per-answer embeddings into a single
/// attendee-level vector. Returns `None` for an empty set or mismatched
/// lengths.
pub fn mean_embedding(vectors: &[Vec<f32>]) -> Option<Vec<f32>> {
    let first = vectors.first()?;
    let dim = first.len();
    if vectors.iter().any(|v| v.len() != dim) {
        return None;
    }

    let mut mean = vec![0.0f32; dim];
    for vector in vectors {
        for (m, v) in mean.iter_mut().zip(vector.iter()) {
            *m += v;
        }
    }
    let count = vectors.len() as f32;
    for m in mean.iter_mut() {
        *m /= count;
    }

    normalize_l2(&mut mean);
    Some(mean)
}
