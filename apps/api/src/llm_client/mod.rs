//! LLM Client: the classifier adapter every pipeline stage goes through.
//!
//! ARCHITECTURAL RULE: no stage talks to a model provider directly. Stages build a
//! `PromptSpec`, hand it to a `Classifier`, and parse the raw text themselves.
//!
//! One call = one request. The adapter never retries; each caller owns its fallback.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod prompts;
pub mod structured;

#[cfg(test)]
pub mod stub;

/// Every use case wants reproducible categorical output.
pub const DETERMINISTIC: f32 = 0.0;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("classifier returned empty content")]
    EmptyContent,

    #[error("classifier call timed out after {0:?}")]
    Timeout(Duration),
}

/// Fully determines one classifier request: the question, the expected output
/// shape (described inside the instruction), and the sampling limits.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptSpec {
    pub instruction: String,
    /// Few-shot or format constraint text, sent as the system message.
    pub constraints: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl PromptSpec {
    pub fn new(instruction: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            instruction: instruction.into(),
            constraints: None,
            max_tokens,
            temperature: DETERMINISTIC,
        }
    }

    pub fn with_constraints(mut self, constraints: impl Into<String>) -> Self {
        self.constraints = Some(constraints.into());
        self
    }
}

/// The narrow capability the pipeline depends on. Any backend (hosted model,
/// local classifier, scripted stub) can sit behind it.
///
/// Carried by `evaluation::Pipeline` as `Arc<dyn Classifier>`.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, spec: &PromptSpec) -> Result<String, ClassifierError>;
}

/// Runs one classification under a caller-imposed deadline. A timed-out call is
/// reported exactly like any other adapter failure.
pub async fn classify_within(
    classifier: &dyn Classifier,
    spec: &PromptSpec,
    timeout: Duration,
) -> Result<String, ClassifierError> {
    match tokio::time::timeout(timeout, classifier.classify(spec)).await {
        Ok(result) => result,
        Err(_) => Err(ClassifierError::Timeout(timeout)),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// OpenAI-compatible chat completions backend
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatResponse {
    /// Text of the first choice, trimmed. `None` when absent or blank.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Chat-completions client for OpenAI and the OpenAI-compatible endpoints
/// exposed by Ollama and Gemini.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl LlmClient {
    pub fn new(base_url: String, api_key: Option<String>, model: String) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn chat(&self, spec: &PromptSpec) -> Result<ChatResponse, ClassifierError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(constraints) = spec.constraints.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: constraints,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &spec.instruction,
        });

        let request_body = ChatRequest {
            model: &self.model,
            messages,
            temperature: spec.temperature,
            max_tokens: spec.max_tokens,
        };

        let mut request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&request_body);
        if let Some(key) = self.api_key.as_deref() {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(ClassifierError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let chat: ChatResponse = response.json().await?;
        if let Some(usage) = &chat.usage {
            debug!(
                "classifier call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }
        Ok(chat)
    }
}

#[async_trait]
impl Classifier for LlmClient {
    async fn classify(&self, spec: &PromptSpec) -> Result<String, ClassifierError> {
        let response = self.chat(spec).await?;
        response
            .text()
            .map(str::to_string)
            .ok_or(ClassifierError::EmptyContent)
    }
}
