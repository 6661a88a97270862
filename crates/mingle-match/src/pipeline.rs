//! End-to-end matching pipeline.
//!
//! One explicit run context instead of script-global state: construct a
//! [`Pipeline`] with an embedder, a vector store, and a config, then
//! feed it cleaned survey rows. Every intermediate artifact (vectors,
//! similarity matrix, labels) is derived fresh per run, so a run is
//! re-runnable from scratch.
//!
//! Failure isolation: one attendee's embedding failure never aborts the
//! batch — the attendee is recorded in the [`RunReport`] and excluded
//! from the similarity matrix and the final graph. Configuration
//! errors (empty input, house count out of range) abort immediately.

use mingle_core::{answer_id, normalize_batch, SurveyError, SurveyResponse};
use mingle_embeddings::{
    mean_embedding, normalize_l2, retry, Classifier, Embedder, RetryConfig, ToneScores,
};
use mingle_vectors::{VectorRecord, VectorStore};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{MatchError, MatchResult};
use crate::graph::{GraphExport, MatchGraph, MatchPolicy};
use crate::similarity::SimilarityMatrix;
use crate::spectral::{SpectralClustering, SpectralConfig};

/// Configuration for a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Number of houses to cluster attendees into.
    pub houses: usize,
    /// Seed for the clustering stage.
    pub seed: u64,
    /// Match graph edge policy.
    pub policy: MatchPolicy,
    /// Retry policy for external capability calls.
    pub retry: RetryConfig,
    /// L2-normalize embeddings before storing and comparing.
    ///
    /// Downstream similarity is cosine, so this defaults to true;
    /// disable only when the embedding capability already returns
    /// unit-norm vectors.
    pub normalize_vectors: bool,
    /// Question whose answers are song titles to be replaced by a
    /// three-word vibe description before embedding (needs a
    /// classifier).
    pub vibe_question: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            houses: 3,
            seed: 42,
            policy: MatchPolicy::default(),
            retry: RetryConfig::default(),
            normalize_vectors: true,
            vibe_question: None,
        }
    }
}

impl PipelineConfig {
    /// Set the house count.
    pub fn with_houses(mut self, houses: usize) -> Self {
        self.houses = houses;
        self
    }

    /// Set the clustering seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the match graph policy.
    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Enable vibe description for the given song question.
    pub fn with_vibe_question(mut self, question: impl Into<String>) -> Self {
        self.vibe_question = Some(question.into());
        self
    }
}

/// One attendee's house label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HouseAssignment {
    pub name: String,
    /// House label in `0..houses`. Which integer names which house is
    /// arbitrary; only shared membership is meaningful.
    pub house: usize,
}

/// One attendee's tone scores.
#[derive(Debug, Clone, Serialize)]
pub struct AttendeeTone {
    pub name: String,
    pub scores: ToneScores,
}

/// Accounting for a pipeline run: nothing is dropped silently.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Unique id of this run.
    pub run_id: Uuid,
    /// Input rows received.
    pub total_rows: usize,
    /// Attendees that made it into the similarity matrix.
    pub embedded: usize,
    /// Rows rejected before normalization (empty or duplicate names).
    pub invalid_rows: Vec<String>,
    /// Attendees excluded because every answer was null/empty.
    pub skipped_no_answers: Vec<String>,
    /// Attendees whose embedding calls exhausted their retries.
    pub failed_embedding: Vec<String>,
}

/// Everything a run produces.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    /// House label per embedded attendee.
    pub houses: Vec<HouseAssignment>,
    /// Tone scores per embedded attendee (empty without a classifier).
    pub tones: Vec<AttendeeTone>,
    /// The weighted match graph, the terminal artifact.
    pub graph: GraphExport,
    /// Skip/failure accounting.
    pub report: RunReport,
}

/// The matching pipeline run context.
pub struct Pipeline {
    embedder: Box<dyn Embedder>,
    store: Box<dyn VectorStore>,
    classifier: Option<Box<dyn Classifier>>,
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline from an embedder, a vector store, and a config.
    pub fn new(
        embedder: Box<dyn Embedder>,
        store: Box<dyn VectorStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            embedder,
            store,
            classifier: None,
            config,
        }
    }

    /// Attach a tone/vibe classifier.
    pub fn with_classifier(mut self, classifier: Box<dyn Classifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Run the full pipeline over cleaned survey rows.
    pub async fn run(&self, responses: &[SurveyResponse]) -> MatchResult<PipelineOutput> {
        if responses.is_empty() {
            return Err(MatchError::InvalidConfiguration(
                "empty input set".to_string(),
            ));
        }

        let run_id = Uuid::new_v4();
        info!(%run_id, rows = responses.len(), houses = self.config.houses, "pipeline run started");

        // Input validation: identifiers must be present and unique.
        let mut invalid_rows = Vec::new();
        let mut seen = std::collections::HashSet::new();
        let mut valid_rows: Vec<SurveyResponse> = Vec::new();
        for response in responses {
            if response.name.trim().is_empty() {
                let err = SurveyError::EmptyName;
                warn!(error = %err, "dropping invalid row");
                invalid_rows.push(err.to_string());
            } else if !seen.insert(response.name.clone()) {
                let err = SurveyError::DuplicateAttendee(response.name.clone());
                warn!(error = %err, "dropping invalid row");
                invalid_rows.push(err.to_string());
            } else {
                valid_rows.push(response.clone());
            }
        }

        let batch = normalize_batch(&valid_rows);
        for name in &batch.skipped {
            info!(%name, "attendee skipped: no valid answers");
        }

        // Embed per attendee; failures are isolated and recorded.
        let mut failed_embedding = Vec::new();
        let mut names: Vec<String> = Vec::new();
        let mut vectors: Vec<Vec<f32>> = Vec::new();
        let mut tones: Vec<AttendeeTone> = Vec::new();

        for (name, valid) in &batch.kept {
            let mut answers = valid.answers.clone();
            if let Some(question) = &self.config.vibe_question {
                self.describe_vibes(name, question, &valid.questions, &mut answers)
                    .await;
            }

            let embedded = retry(&self.config.retry, || {
                self.embedder.embed_batch(&answers)
            })
            .await;

            let mut answer_vectors = match embedded {
                Ok(vectors) => vectors,
                Err(err) => {
                    warn!(%name, error = %err, "embedding failed, excluding attendee");
                    failed_embedding.push(name.clone());
                    continue;
                }
            };

            if self.config.normalize_vectors {
                for vector in answer_vectors.iter_mut() {
                    normalize_l2(vector);
                }
            }

            let records: Vec<VectorRecord> = valid
                .questions
                .iter()
                .zip(answers.iter().zip(answer_vectors.iter()))
                .map(|(question, (answer, vector))| {
                    VectorRecord::new(answer_id(name, question), vector.clone())
                        .with_metadata("name", name.as_str())
                        .with_metadata("question", question.as_str())
                        .with_metadata("answer", answer.as_str())
                })
                .collect();
            self.store.upsert(records).await?;

            let Some(mean) = mean_embedding(&answer_vectors) else {
                warn!(%name, "embedding returned inconsistent dimensions, excluding attendee");
                failed_embedding.push(name.clone());
                continue;
            };

            if let Some(scores) = self.classify_tone(name, &answers).await {
                tones.push(AttendeeTone {
                    name: name.clone(),
                    scores,
                });
            }

            names.push(name.clone());
            vectors.push(mean);
        }

        if names.is_empty() {
            return Err(MatchError::InvalidConfiguration(
                "no attendees with embeddings".to_string(),
            ));
        }

        // Attendee-level similarity, houses, and matches.
        let similarity = SimilarityMatrix::from_vectors(&vectors);
        for &i in similarity.degenerate() {
            warn!(name = %names[i], "zero-norm attendee vector, similarity forced to 0");
        }

        let spectral_config = SpectralConfig::new(self.config.houses).with_seed(self.config.seed);
        let labels = SpectralClustering::new(spectral_config).cluster(&similarity)?;
        let houses: Vec<HouseAssignment> = names
            .iter()
            .zip(labels.iter())
            .map(|(name, &house)| HouseAssignment {
                name: name.clone(),
                house,
            })
            .collect();

        let graph = MatchGraph::from_similarity(&names, &similarity, self.config.policy)?.export();

        let report = RunReport {
            run_id,
            total_rows: responses.len(),
            embedded: names.len(),
            invalid_rows,
            skipped_no_answers: batch.skipped,
            failed_embedding,
        };
        info!(
            %run_id,
            embedded = report.embedded,
            skipped = report.skipped_no_answers.len(),
            failed = report.failed_embedding.len(),
            "pipeline run finished"
        );

        Ok(PipelineOutput {
            houses,
            tones,
            graph,
            report,
        })
    }

    /// Replace song-title answers with three-word vibe descriptions.
    ///
    /// A failed or unvalidated description keeps the original title —
    /// enrichment never costs an attendee their answer.
    async fn describe_vibes(
        &self,
        name: &str,
        vibe_question: &str,
        questions: &[String],
        answers: &mut [String],
    ) {
        let Some(classifier) = &self.classifier else {
            return;
        };

        for (question, answer) in questions.iter().zip(answers.iter_mut()) {
            if question != vibe_question {
                continue;
            }
            match retry(&self.config.retry, || classifier.describe_vibe(answer)).await {
                Ok(Some(vibe)) => {
                    info!(%name, %vibe, "hype song replaced with vibe description");
                    *answer = vibe;
                }
                Ok(None) => {
                    info!(%name, "vibe description did not validate, keeping title");
                }
                Err(err) => {
                    warn!(%name, error = %err, "vibe description failed, keeping title");
                }
            }
        }
    }

    /// Tone-score an attendee's combined answers, degrading to unscored
    /// on failure (null scores are valid per the capability contract).
    async fn classify_tone(&self, name: &str, answers: &[String]) -> Option<ToneScores> {
        let classifier = self.classifier.as_ref()?;
        let combined = answers.join(" ");

        match retry(&self.config.retry, || classifier.classify_tone(&combined)).await {
            Ok(scores) => Some(scores),
            Err(err) => {
                warn!(%name, error = %err, "tone classification failed, recording unscored");
                Some(ToneScores::unscored())
            }
        }
    }
}
