//! In-memory vector store.
//!
//! Brute-force cosine scoring over a `RwLock<HashMap>`. The pipeline's
//! working sets are event-sized (tens to hundreds of attendees), so
//! linear scans are plenty; swap in a real backend behind the same
//! trait when that stops being true.

use crate::{SearchResult, VectorError, VectorRecord, VectorResult, VectorStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory vector store using brute-force search.
pub struct InMemoryStore {
    records: RwLock<HashMap<String, VectorRecord>>,
    dimension: usize,
}

impl InMemoryStore {
    /// Create a new in-memory store for vectors of the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            dimension,
        }
    }

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            0.0
        } else {
            dot / (norm_a * norm_b)
        }
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    fn name(&self) -> &str {
        "in-memory"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn upsert(&self, records: Vec<VectorRecord>) -> VectorResult<()> {
        let mut store = self
            .records
            .write()
            .map_err(|e| VectorError::Store(format!("write lock poisoned: {}", e)))?;

        for record in records {
            if record.vector.len() != self.dimension {
                return Err(VectorError::DimensionMismatch {
                    expected: self.dimension,
                    actual: record.vector.len(),
                });
            }
            store.insert(record.id.clone(), record);
        }

        Ok(())
    }

    async fn fetch_all(&self) -> VectorResult<Vec<VectorRecord>> {
        let store = self
            .records
            .read()
            .map_err(|e| VectorError::Store(format!("read lock poisoned: {}", e)))?;

        let mut all: Vec<VectorRecord> = store.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }

    async fn search(&self, vector: &[f32], k: usize) -> VectorResult<Vec<SearchResult>> {
        if vector.len() != self.dimension {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        let store = self
            .records
            .read()
            .map_err(|e| VectorError::Store(format!("read lock poisoned: {}", e)))?;

        let mut scored: Vec<(&VectorRecord, f32)> = store
            .values()
            .map(|record| (record, Self::cosine(vector, &record.vector)))
            .collect();

        // Descending score; id breaks ties so results are reproducible.
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.id.cmp(&b.0.id))
        });

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(record, score)| SearchResult {
                id: record.id.clone(),
                score,
                metadata: record.metadata.clone(),
            })
            .collect())
    }

    async fn get(&self, id: &str) -> VectorResult<Option<VectorRecord>> {
        let store = self
            .records
            .read()
            .map_err(|e| VectorError::Store(format!("read lock poisoned: {}", e)))?;
        Ok(store.get(id).cloned())
    }

    async fn count(&self) -> VectorResult<usize> {
        let store = self
            .records
            .read()
            .map_err(|e| VectorError::Store(format!("read lock poisoned: {}", e)))?;
        Ok(store.len())
    }

    async fn clear(&self) -> VectorResult<()> {
        let mut store = self
            .records
            .write()
            .map_err(|e| VectorError::Store(format!("write lock poisoned: {}", e)))?;
        store.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, vector: Vec<f32>) -> VectorRecord {
        VectorRecord::new(id, vector)
    }

    #[tokio::test]
    async fn test_upsert_and_fetch_all_sorted() {
        let store = InMemoryStore::new(2);
        store
            .upsert(vec![
                record("b", vec![0.0, 1.0]),
                record("a", vec![1.0, 0.0]),
                record("c", vec![0.7, 0.7]),
            ])
            .await
            .unwrap();

        let all = store.fetch_all().await.unwrap();
        let ids: Vec<&str> = all.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_id() {
        let store = InMemoryStore::new(2);
        store
            .upsert(vec![record("Ada::Q1", vec![1.0, 0.0])])
            .await
            .unwrap();
        store
            .upsert(vec![record("Ada::Q1", vec![0.0, 1.0])])
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        let stored = store.get("Ada::Q1").await.unwrap().unwrap();
        assert_eq!(stored.vector, vec![0.0, 1.0]);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let store = InMemoryStore::new(3);
        let result = store.upsert(vec![record("a", vec![1.0, 0.0])]).await;
        assert!(matches!(
            result,
            Err(VectorError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[tokio::test]
    async fn test_search_ranks_by_similarity() {
        let store = InMemoryStore::new(2);
        store
            .upsert(vec![
                record("x", vec![1.0, 0.0]),
                record("y", vec![0.0, 1.0]),
                record("z", vec![0.9, 0.1]),
            ])
            .await
            .unwrap();

        let results = store.search(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "x");
        assert_eq!(results[1].id, "z");
    }

    #[tokio::test]
    async fn test_clear_empties_the_store() {
        let store = InMemoryStore::new(1);
        store
            .upsert(vec![record("a", vec![1.0]), record("b", vec![2.0])])
            .await
            .unwrap();
        store.clear().await.unwrap();

        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.get("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_metadata_round_trip() {
        let store = InMemoryStore::new(1);
        store
            .upsert(vec![record("Ada::Q1", vec![1.0])
                .with_metadata("name", "Ada")
                .with_metadata("question", "Q1")
                .with_metadata("answer", "jazz")])
            .await
            .unwrap();

        let stored = store.get("Ada::Q1").await.unwrap().unwrap();
        assert_eq!(stored.metadata["name"], "Ada");
        assert_eq!(stored.metadata["answer"], "jazz");
    }
}
