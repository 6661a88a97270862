//! API-based embeddings (Cohere, OpenAI, custom endpoints).
//!
//! Requires the `api` feature. The capability is opaque: texts go out,
//! one vector per text comes back in order. Transient failures surface
//! as retryable [`EmbeddingError`] variants for the caller's retry
//! policy; this module never substitutes zero vectors.

use crate::{Embedder, EmbeddingError, EmbeddingResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const COHERE_API_URL: &str = "https://api.cohere.ai/v1/embed";
const OPENAI_API_URL: &str = "https://api.openai.com/v1/embeddings";

/// API provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiProvider {
    /// Cohere embeddings (embed-english-light-v3.0 and friends).
    Cohere,
    /// OpenAI embeddings (text-embedding-3-small, text-embedding-3-large).
    OpenAI,
    /// Custom OpenAI-compatible endpoint.
    Custom,
}

/// Configuration for API-based embeddings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// API provider.
    pub provider: ApiProvider,
    /// API key.
    pub api_key: String,
    /// Model name.
    pub model: String,
    /// Endpoint override (required for `Custom`).
    pub endpoint: Option<String>,
    /// Embedding dimension the model produces.
    pub dimensions: usize,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl ApiConfig {
    /// Create config for Cohere's lightweight English model.
    pub fn cohere(api_key: &str) -> Self {
        Self {
            provider: ApiProvider::Cohere,
            api_key: api_key.to_string(),
            model: "embed-english-light-v3.0".to_string(),
            endpoint: None,
            dimensions: 384,
            timeout_secs: 30,
        }
    }

    /// Create config for OpenAI embeddings.
    pub fn openai(api_key: &str) -> Self {
        Self {
            provider: ApiProvider::OpenAI,
            api_key: api_key.to_string(),
            model: "text-embedding-3-small".to_string(),
            endpoint: None,
            dimensions: 1536,
            timeout_secs: 30,
        }
    }

    /// Create config for a custom OpenAI-compatible endpoint.
    pub fn custom(endpoint: &str, api_key: &str, model: &str, dimensions: usize) -> Self {
        Self {
            provider: ApiProvider::Custom,
            api_key: api_key.to_string(),
            model: model.to_string(),
            endpoint: Some(endpoint.to_string()),
            dimensions,
            timeout_secs: 30,
        }
    }

    /// Set the model.
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Set the dimension the model produces.
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

// ============================================================================
// Request/response types
// ============================================================================

#[derive(Debug, Serialize)]
struct CohereRequest {
    model: String,
    texts: Vec<String>,
    input_type: String,
}

#[derive(Debug, Deserialize)]
struct CohereResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    data: Vec<OpenAiEmbedding>,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbedding {
    embedding: Vec<f32>,
}

// ============================================================================
// ApiEmbedder
// ============================================================================

/// Embedder backed by a hosted embedding API.
///
/// # Example
///
/// ```rust,ignore
/// use mingle_embeddings::{ApiConfig, ApiEmbedder, Embedder};
///
/// let embedder = ApiEmbedder::new(ApiConfig::cohere("co-..."))?;
/// let vectors = embedder.embed_batch(&answers).await?;
/// ```
pub struct ApiEmbedder {
    config: ApiConfig,
    client: reqwest::Client,
}

impl ApiEmbedder {
    /// Create a new API embedder with the given config.
    pub fn new(config: ApiConfig) -> EmbeddingResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::Transport(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Create a Cohere embedder from the `COHERE_API_KEY` environment
    /// variable.
    pub fn from_env() -> EmbeddingResult<Self> {
        let api_key = std::env::var("COHERE_API_KEY").map_err(|_| {
            EmbeddingError::InvalidInput("COHERE_API_KEY is not set".to_string())
        })?;
        Self::new(ApiConfig::cohere(&api_key))
    }

    fn endpoint(&self) -> &str {
        if let Some(ref endpoint) = self.config.endpoint {
            return endpoint;
        }
        match self.config.provider {
            ApiProvider::Cohere => COHERE_API_URL,
            ApiProvider::OpenAI => OPENAI_API_URL,
            ApiProvider::Custom => "",
        }
    }

    async fn post_json<Req: Serialize>(
        &self,
        request: &Req,
    ) -> EmbeddingResult<reqwest::Response> {
        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| EmbeddingError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api {
                status: Some(status.as_u16()),
                message: body,
            });
        }

        Ok(response)
    }

    /// One vector per input text, or `InvalidResponse`.
    fn check_count(&self, got: usize, expected: usize) -> EmbeddingResult<()> {
        if got != expected {
            return Err(EmbeddingError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                expected, got
            )));
        }
        Ok(())
    }

    async fn embed_cohere(&self, texts: &[String]) -> EmbeddingResult<Vec<Vec<f32>>> {
        let request = CohereRequest {
            model: self.config.model.clone(),
            texts: texts.to_vec(),
            input_type: "search_document".to_string(),
        };

        let resp: CohereResponse = self
            .post_json(&request)
            .await?
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        self.check_count(resp.embeddings.len(), texts.len())?;
        Ok(resp.embeddings)
    }

    async fn embed_openai(&self, texts: &[String]) -> EmbeddingResult<Vec<Vec<f32>>> {
        let request = OpenAiRequest {
            model: self.config.model.clone(),
            input: texts.to_vec(),
        };

        let resp: OpenAiResponse = self
            .post_json(&request)
            .await?
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        self.check_count(resp.data.len(), texts.len())?;
        Ok(resp.data.into_iter().map(|e| e.embedding).collect())
    }
}

#[async_trait]
impl Embedder for ApiEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> EmbeddingResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        match self.config.provider {
            ApiProvider::Cohere => self.embed_cohere(texts).await,
            // Custom endpoints speak the OpenAI format.
            ApiProvider::OpenAI | ApiProvider::Custom => self.embed_openai(texts).await,
        }
    }

    fn dimension(&self) -> usize {
        self.config.dimensions
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
