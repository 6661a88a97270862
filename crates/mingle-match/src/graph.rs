//! Weighted match graph over attendees.
//!
//! Turns the attendee-level similarity matrix into an undirected graph
//! for one-to-one matchmaking — the pipeline's terminal artifact,
//! serialized as a node/link structure for downstream consumers.

use crate::error::{MatchError, MatchResult};
use crate::similarity::SimilarityMatrix;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::Serialize;

/// Edge selection policy, fixed at configuration time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchPolicy {
    /// Connect each attendee to their single highest-similarity partner.
    BestMatch,
    /// Connect every pair whose similarity is at least the threshold.
    Threshold(f32),
}

impl Default for MatchPolicy {
    fn default() -> Self {
        MatchPolicy::BestMatch
    }
}

/// Undirected weighted graph of attendee matches.
///
/// No self-loops; edge weights come straight from the similarity
/// matrix. Similarity ties break toward the lexically smaller partner
/// id so repeated runs produce identical graphs.
pub struct MatchGraph {
    inner: UnGraph<String, f32>,
}

impl MatchGraph {
    /// Build a match graph from attendee ids and their similarity
    /// matrix, which must be indexed in the same order.
    pub fn from_similarity(
        ids: &[String],
        similarity: &SimilarityMatrix,
        policy: MatchPolicy,
    ) -> MatchResult<Self> {
        if ids.len() != similarity.len() {
            return Err(MatchError::InvalidConfiguration(format!(
                "{} ids for a {}-entity similarity matrix",
                ids.len(),
                similarity.len()
            )));
        }

        let mut inner = UnGraph::new_undirected();
        let nodes: Vec<NodeIndex> = ids.iter().map(|id| inner.add_node(id.clone())).collect();

        let n = ids.len();
        match policy {
            MatchPolicy::BestMatch => {
                let mut chosen: Vec<(usize, usize)> = Vec::new();
                for i in 0..n {
                    if let Some(j) = best_partner(i, ids, similarity) {
                        let pair = (i.min(j), i.max(j));
                        if !chosen.contains(&pair) {
                            chosen.push(pair);
                        }
                    }
                }
                for (i, j) in chosen {
                    inner.add_edge(nodes[i], nodes[j], similarity.get(i, j));
                }
            }
            MatchPolicy::Threshold(min) => {
                for i in 0..n {
                    for j in (i + 1)..n {
                        let weight = similarity.get(i, j);
                        if weight >= min {
                            inner.add_edge(nodes[i], nodes[j], weight);
                        }
                    }
                }
            }
        }

        Ok(Self { inner })
    }

    /// Number of attendees in the graph.
    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Number of match edges.
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// An attendee's matches as `(partner id, weight)` pairs, sorted by
    /// descending weight then partner id.
    pub fn matches_for(&self, id: &str) -> Vec<(String, f32)> {
        let Some(node) = self.inner.node_indices().find(|&ix| self.inner[ix] == id) else {
            return Vec::new();
        };

        let mut matches: Vec<(String, f32)> = self
            .inner
            .edges(node)
            .map(|edge| {
                let other = if edge.source() == node {
                    edge.target()
                } else {
                    edge.source()
                };
                (self.inner[other].clone(), *edge.weight())
            })
            .collect();

        matches.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        matches
    }

    /// Serialize to the node/link export structure.
    ///
    /// Nodes keep the entity ordering; links are sorted by (source,
    /// target) id for byte-stable output.
    pub fn export(&self) -> GraphExport {
        let nodes: Vec<GraphNode> = self
            .inner
            .node_indices()
            .map(|ix| GraphNode {
                id: self.inner[ix].clone(),
            })
            .collect();

        let mut links: Vec<GraphLink> = self
            .inner
            .edge_indices()
            .map(|edge| {
                let (a, b) = self.inner.edge_endpoints(edge).expect("edge endpoints");
                let (source, target) = if self.inner[a] <= self.inner[b] {
                    (self.inner[a].clone(), self.inner[b].clone())
                } else {
                    (self.inner[b].clone(), self.inner[a].clone())
                };
                GraphLink {
                    source,
                    target,
                    weight: self.inner[edge],
                }
            })
            .collect();

        links.sort_by(|a, b| {
            a.source
                .cmp(&b.source)
                .then_with(|| a.target.cmp(&b.target))
        });

        GraphExport { nodes, links }
    }
}

/// Highest-similarity partner for entity `i`, ties broken by lexical
/// partner id. `None` only when there is no other entity.
fn best_partner(i: usize, ids: &[String], similarity: &SimilarityMatrix) -> Option<usize> {
    let mut best: Option<usize> = None;
    for j in 0..ids.len() {
        if j == i {
            continue;
        }
        best = match best {
            None => Some(j),
            Some(current) => {
                let sim_j = similarity.get(i, j);
                let sim_current = similarity.get(i, current);
                if sim_j > sim_current || (sim_j == sim_current && ids[j] < ids[current]) {
                    Some(j)
                } else {
                    Some(current)
                }
            }
        };
    }
    best
}

/// Serializable match graph: the pipeline's output artifact.
#[derive(Debug, Clone, Serialize)]
pub struct GraphExport {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

/// A node in the exported graph.
#[derive(Debug, Clone, Serialize)]
pub struct GraphNode {
    /// Attendee identifier.
    pub id: String,
}

/// A weighted undirected link in the exported graph.
#[derive(Debug, Clone, Serialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
    pub weight: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_best_match_connects_top_pair_only() {
        // sim(A,B) > sim(A,C) > sim(B,C): A and B pick each other, so
        // the only A/B edge is A—B; C still gets its own best edge C—A.
        let matrix = SimilarityMatrix::from_vectors(&[
            vec![1.0, 0.0],
            vec![0.95, 0.31225],
            vec![0.5, -0.866],
        ]);
        assert!(matrix.get(0, 1) > matrix.get(0, 2));
        assert!(matrix.get(0, 2) > matrix.get(1, 2));

        let graph =
            MatchGraph::from_similarity(&ids(&["A", "B", "C"]), &matrix, MatchPolicy::BestMatch)
                .unwrap();

        let a_matches = graph.matches_for("A");
        assert_eq!(a_matches[0].0, "B");
        let b_matches = graph.matches_for("B");
        assert_eq!(b_matches, vec![("A".to_string(), matrix.get(0, 1))]);

        // A↔B chosen from both sides collapses into one edge.
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_no_self_loops() {
        let matrix = SimilarityMatrix::from_vectors(&[
            vec![1.0, 0.0],
            vec![0.9, 0.1],
            vec![0.1, 0.9],
        ]);

        for policy in [MatchPolicy::BestMatch, MatchPolicy::Threshold(-1.0)] {
            let graph =
                MatchGraph::from_similarity(&ids(&["A", "B", "C"]), &matrix, policy).unwrap();
            for edge in graph.inner.edge_references() {
                assert_ne!(edge.source(), edge.target());
            }
        }
    }

    #[test]
    fn test_ties_break_lexically() {
        // B and C are equally similar to A; the lexically smaller
        // partner wins.
        let matrix = SimilarityMatrix::from_vectors(&[
            vec![1.0, 0.0, 0.0],
            vec![0.5, 0.5, 0.0],
            vec![0.5, 0.0, 0.5],
        ]);
        assert_eq!(matrix.get(0, 1), matrix.get(0, 2));

        let graph =
            MatchGraph::from_similarity(&ids(&["A", "C", "B"]), &matrix, MatchPolicy::BestMatch)
                .unwrap();
        let a_matches = graph.matches_for("A");
        assert_eq!(a_matches[0].0, "B");
    }

    #[test]
    fn test_threshold_policy() {
        let matrix = SimilarityMatrix::from_vectors(&[
            vec![1.0, 0.0],
            vec![0.9, 0.1],
            vec![0.0, 1.0],
        ]);

        let graph = MatchGraph::from_similarity(
            &ids(&["A", "B", "C"]),
            &matrix,
            MatchPolicy::Threshold(0.5),
        )
        .unwrap();

        // Only A—B clears 0.5.
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.matches_for("A")[0].0, "B");
        assert!(graph.matches_for("C").is_empty());
    }

    #[test]
    fn test_export_is_deterministic() {
        let matrix = SimilarityMatrix::from_vectors(&[
            vec![1.0, 0.0],
            vec![0.9, 0.1],
            vec![0.1, 0.9],
        ]);
        let names = ids(&["Cleo", "Ada", "Bo"]);

        let export_a = MatchGraph::from_similarity(&names, &matrix, MatchPolicy::BestMatch)
            .unwrap()
            .export();
        let export_b = MatchGraph::from_similarity(&names, &matrix, MatchPolicy::BestMatch)
            .unwrap()
            .export();

        let json_a = serde_json::to_string(&export_a).unwrap();
        let json_b = serde_json::to_string(&export_b).unwrap();
        assert_eq!(json_a, json_b);

        // Nodes keep entity order; links are source-sorted.
        let node_ids: Vec<&str> = export_a.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(node_ids, vec!["Cleo", "Ada", "Bo"]);
        for link in &export_a.links {
            assert!(link.source <= link.target);
        }
    }

    #[test]
    fn test_id_count_mismatch_rejected() {
        let matrix = SimilarityMatrix::from_vectors(&[vec![1.0], vec![1.0]]);
        let result = MatchGraph::from_similarity(&ids(&["A"]), &matrix, MatchPolicy::BestMatch);
        assert!(matches!(result, Err(MatchError::InvalidConfiguration(_))));
    }
}
