//! Groq provider, via its `OpenAI`-compatible chat completions endpoint

use super::types::{LlmMessage, LlmResponse, Usage};
use super::{GenerationError, ResponseGenerator};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

/// Longest slice of a response body quoted in an error message
const BODY_EXCERPT_CHARS: usize = 200;

/// First part of a response body, for error messages
fn excerpt(body: &str) -> String {
    let mut chars = body.chars();
    let head: String = chars.by_ref().take(BODY_EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// Connection settings for [`GroqGenerator`]
#[derive(Debug, Clone)]
pub struct GroqConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    /// Prepended as a `system` message when set
    pub system_prompt: Option<String>,
    pub max_tokens: Option<u32>,
    /// Transport-level request timeout
    pub request_timeout: Duration,
}

impl GroqConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            system_prompt: None,
            max_tokens: None,
            request_timeout: Duration::from_secs(120),
        }
    }
}

/// Groq chat completions client
pub struct GroqGenerator {
    client: Client,
    config: GroqConfig,
}

impl GroqGenerator {
    pub fn new(config: GroqConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self { client, config })
    }

    fn translate_request(&self, history: &[LlmMessage]) -> ChatRequest {
        let mut messages = Vec::with_capacity(history.len() + 1);

        if let Some(system) = self.config.system_prompt.as_deref() {
            if !system.trim().is_empty() {
                messages.push(ChatMessage {
                    role: "system".to_string(),
                    content: Some(system.to_string()),
                });
            }
        }

        messages.extend(history.iter().map(|msg| ChatMessage {
            role: msg.role.as_str().to_string(),
            content: Some(msg.content.clone()),
        }));

        ChatRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: self.config.max_tokens,
            stream: false,
        }
    }

    fn normalize_response(resp: ChatResponse) -> Result<LlmResponse, GenerationError> {
        let choice = resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::malformed("No choices in response"))?;

        let text = choice
            .message
            .content
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| GenerationError::malformed("Response contained no text"))?;

        let usage = resp.usage.map_or_else(Usage::default, |u| Usage {
            input_tokens: u64::from(u.prompt_tokens),
            output_tokens: u64::from(u.completion_tokens),
        });

        Ok(LlmResponse { text, usage })
    }

    fn classify_send_error(e: &reqwest::Error) -> GenerationError {
        if e.is_timeout() {
            GenerationError::timeout(format!("Request timeout: {e}"))
        } else if e.is_connect() {
            GenerationError::transport(format!("Connection failed: {e}"))
        } else {
            GenerationError::transport(format!("Request failed: {e}"))
        }
    }

    fn classify_status(status: StatusCode, body: &str) -> GenerationError {
        let message = serde_json::from_str::<ChatErrorResponse>(body)
            .map_or_else(|_| excerpt(body), |resp| resp.error.message);

        match status.as_u16() {
            401 | 403 => GenerationError::rejected(format!("Authentication failed: {message}")),
            400 | 404 | 422 => GenerationError::rejected(format!("Invalid request: {message}")),
            408 => GenerationError::timeout(format!("Request timeout: {message}")),
            429 => GenerationError::transport(format!("Rate limit exceeded: {message}")),
            500..=599 => GenerationError::transport(format!("Server error: {message}")),
            _ => GenerationError::rejected(format!("HTTP {status}: {message}")),
        }
    }
}

#[async_trait]
impl ResponseGenerator for GroqGenerator {
    async fn generate(&self, history: &[LlmMessage]) -> Result<LlmResponse, GenerationError> {
        let request = self.translate_request(history);

        let response = self
            .client
            .post(&self.config.base_url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Self::classify_send_error(&e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                GenerationError::timeout(format!("Timed out reading response: {e}"))
            } else {
                GenerationError::transport(format!("Failed to read response: {e}"))
            }
        })?;

        if !status.is_success() {
            return Err(Self::classify_status(status, &body));
        }

        let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            GenerationError::malformed(format!(
                "Failed to parse response: {e} - body: {}",
                excerpt(&body)
            ))
        })?;

        Self::normalize_response(parsed)
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }
}

// Chat completions wire types

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
#[allow(clippy::struct_field_names)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatErrorResponse {
    error: ChatError,
}

#[derive(Debug, Deserialize)]
struct ChatError {
    message: String,
}
