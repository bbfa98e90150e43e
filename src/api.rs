//! Text-generation API client.
//!
//! The module uses a trait-based design:
//! - [`AskAsync`]: the seam the summary generator talks to
//! - [`OpenAiChat`]: an OpenAI-compatible `/chat/completions` client over `reqwest`
//!
//! Request and response bodies are explicit schema structs. Optional response
//! fields default to empty so a partial payload decodes and is then judged by
//! [`ChatResponse::content`].

use crate::error::GenerationError;
use crate::utils::truncate_for_log;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, instrument, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Trait for async LLM interaction.
///
/// Implementors send one chat request and return the decoded response, or a
/// [`GenerationError::Api`] describing a transport or service failure.
pub trait AskAsync {
    async fn ask(&self, request: &ChatRequest) -> Result<ChatResponse, GenerationError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: Some(content.into()),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(content.into()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub message: Option<ChatMessage>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

impl ChatResponse {
    pub fn finish_reason(&self) -> Option<&str> {
        self.choices.first()?.finish_reason.as_deref()
    }

    /// Trimmed content of the first choice, if any non-blank content exists.
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()?
            .message
            .as_ref()?
            .content
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

/// OpenAI-compatible chat client. Relies on the HTTP client's default timeout.
#[derive(Debug)]
pub struct OpenAiChat {
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

impl OpenAiChat {
    pub fn new(api_key: &str, base_url: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }
}

impl AskAsync for OpenAiChat {
    #[instrument(level = "info", skip_all, fields(model = %request.model))]
    async fn ask(&self, request: &ChatRequest) -> Result<ChatResponse, GenerationError> {
        let t0 = Instant::now();
        let url = format!("{}/chat/completions", self.base_url);

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| GenerationError::Api(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| GenerationError::Api(e.to_string()))?;
        let dt = t0.elapsed();

        if !status.is_success() {
            let detail = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .and_then(|e| e.message)
                .unwrap_or_else(|| truncate_for_log(&body, 300));
            warn!(elapsed_ms = dt.as_millis() as u64, status = status.as_u16(), %detail, "API call failed");
            return Err(GenerationError::Api(format!("{status}: {detail}")));
        }

        debug!(elapsed_ms = dt.as_millis() as u64, "API call succeeded");
        serde_json::from_str(&body).map_err(|e| {
            GenerationError::Api(format!(
                "malformed response ({e}): {}",
                truncate_for_log(&body, 300)
            ))
        })
    }
}
