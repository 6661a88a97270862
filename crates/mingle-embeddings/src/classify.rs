//! Text classification via a chat-completion capability.
//!
//! Two enrichments feed the matching pipeline:
//! - Tone scoring: certainty scores in [0, 1] for how formal and how
//!   emotionally expressive an attendee's writing is.
//! - Vibe description: a hype-song title condensed to exactly three
//!   words of embeddable text.
//!
//! The capability may legitimately decline to score: a `None` field is
//! "unscored", not an error. Only transport/API failures are errors.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::retry::Retryable;

/// Classification error types.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("API error ({status:?}): {message}")]
    Api {
        status: Option<u16>,
        message: String,
    },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl Retryable for ClassifyError {
    fn is_retryable(&self) -> bool {
        match self {
            ClassifyError::Transport(_) => true,
            ClassifyError::Api { status, .. } => {
                matches!(status, None | Some(429)) || status.is_some_and(|s| s >= 500)
            }
            ClassifyError::InvalidResponse(_) => false,
        }
    }
}

/// Result type for classification operations.
pub type ClassifyResult<T> = Result<T, ClassifyError>;

/// Tone certainty scores for a piece of text.
///
/// `None` means the capability could not score that axis ("unscored"),
/// which is a valid outcome carried through to attendee metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ToneScores {
    /// 1.0 = very formal, 0.0 = very informal.
    pub formal: Option<f32>,
    /// 1.0 = highly expressive, 0.0 = neutral or logical.
    pub emotional: Option<f32>,
}

impl ToneScores {
    /// Both axes unscored.
    pub fn unscored() -> Self {
        Self::default()
    }

    /// Whether at least one axis was scored.
    pub fn is_scored(&self) -> bool {
        self.formal.is_some() || self.emotional.is_some()
    }
}

/// External text classification capability.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Score how formal and how emotionally expressive `text` reads.
    async fn classify_tone(&self, text: &str) -> ClassifyResult<ToneScores>;

    /// Describe a song's vibe in exactly three words, or `None` when the
    /// capability's answer doesn't validate.
    async fn describe_vibe(&self, song: &str) -> ClassifyResult<Option<String>>;
}

/// Parse a strict-JSON tone response.
///
/// Invalid JSON or missing keys degrade to unscored axes rather than
/// failing the attendee.
pub fn parse_tone_json(raw: &str) -> ToneScores {
    #[derive(Deserialize)]
    struct Raw {
        formal: Option<f32>,
        emotional: Option<f32>,
    }

    match serde_json::from_str::<Raw>(raw.trim()) {
        Ok(parsed) => ToneScores {
            formal: parsed.formal,
            emotional: parsed.emotional,
        },
        Err(_) => ToneScores::unscored(),
    }
}

/// Validate a three-word vibe answer like `"Energetic, Uplifting, Fun"`.
///
/// Returns the canonical `"A, B, C"` form, or `None` when the response
/// doesn't contain exactly three non-empty comma-separated words.
pub fn parse_vibe_words(raw: &str) -> Option<String> {
    let words: Vec<&str> = raw
        .trim()
        .trim_matches('"')
        .split(',')
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .collect();

    if words.len() == 3 && words.iter().all(|w| w.split_whitespace().count() == 1) {
        Some(words.join(", "))
    } else {
        None
    }
}

// ============================================================================
// Chat-completion backend (feature = "api")
// ============================================================================

/// Configuration for the chat-completion classifier.
#[cfg(feature = "api")]
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// API key.
    pub api_key: String,
    /// Chat model name.
    pub model: String,
    /// Chat completions endpoint.
    pub endpoint: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

#[cfg(feature = "api")]
impl ClassifierConfig {
    /// OpenAI chat completions with the given key.
    pub fn openai(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: "gpt-4-turbo".to_string(),
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            max_tokens: 256,
            timeout_secs: 30,
        }
    }

    /// Set the model.
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Use a custom OpenAI-compatible endpoint.
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }
}

#[cfg(feature = "api")]
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[cfg(feature = "api")]
#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[cfg(feature = "api")]
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[cfg(feature = "api")]
#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[cfg(feature = "api")]
#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Classifier backed by an OpenAI-style chat completions API.
///
/// Temperature is pinned to 0 so repeated runs score consistently.
#[cfg(feature = "api")]
pub struct ChatClassifier {
    config: ClassifierConfig,
    client: reqwest::Client,
}

#[cfg(feature = "api")]
impl ChatClassifier {
    /// Create a new chat classifier.
    pub fn new(config: ClassifierConfig) -> ClassifyResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClassifyError::Transport(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Create from the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> ClassifyResult<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| ClassifyError::Api {
            status: None,
            message: "OPENAI_API_KEY is not set".to_string(),
        })?;
        Self::new(ClassifierConfig::openai(&api_key))
    }

    async fn complete(&self, system: &str, user: String) -> ClassifyResult<String> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user,
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: 0.0,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ClassifyError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifyError::Api {
                status: Some(status.as_u16()),
                message: body,
            });
        }

        let resp: ChatResponse = response
            .json()
            .await
            .map_err(|e| ClassifyError::InvalidResponse(e.to_string()))?;

        resp.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ClassifyError::InvalidResponse("no choices returned".to_string()))
    }
}

#[cfg(feature = "api")]
#[async_trait]
impl Classifier for ChatClassifier {
    async fn classify_tone(&self, text: &str) -> ClassifyResult<ToneScores> {
        let prompt = format!(
            "Analyze the following text and provide certainty scores (0-1) for:\n\
             - Formal (1 = very formal, 0 = very informal)\n\
             - Emotional (1 = highly expressive, 0 = neutral or logical)\n\n\
             Text: \"{}\"\n\n\
             Return valid JSON with numeric keys \"formal\" and \"emotional\", \
             for example: {{\"formal\": 0.5, \"emotional\": 0.8}}",
            text
        );

        let content = self
            .complete("You are a strict JSON generator. Always output valid JSON.", prompt)
            .await?;
        Ok(parse_tone_json(&content))
    }

    async fn describe_vibe(&self, song: &str) -> ClassifyResult<Option<String>> {
        let prompt = format!(
            "Describe the overall vibe of the song \"{}\" in exactly three words, \
             separated by commas. Example format: \"Energetic, Uplifting, Fun\"",
            song
        );

        let content = self
            .complete(
                "You are a music analyst that summarizes song vibes in three words.",
                prompt,
            )
            .await?;
        Ok(parse_vibe_words(&content))
    }
}
