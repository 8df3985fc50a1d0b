//! OpenRouter LLM provider implementation
//!
//! OpenRouter exposes an OpenAI-compatible `chat/completions` endpoint, so the
//! wire types below follow that format.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_LLM_MODEL, LlmSettings, OPENROUTER_API_KEY_VAR};
use crate::error::{CompanionError, Result};
use crate::llm::{LLMProvider, LLMRequest, LLMResponse, Message, TokenUsage};

/// Application title reported to OpenRouter
const APP_TITLE: &str = "papercrew";

/// OpenRouter LLM provider.
pub struct OpenRouterProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl OpenRouterProvider {
    /// Create from configuration.
    ///
    /// A missing API key is accepted here; calls fail with a configuration
    /// error until one is provided.
    pub fn from_settings(settings: &LlmSettings) -> Self {
        let model = if settings.model.trim().is_empty() {
            DEFAULT_LLM_MODEL.to_string()
        } else {
            settings.model.clone()
        };

        Self {
            client: reqwest::Client::new(),
            api_key: settings.api_key.clone(),
            model,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            CompanionError::Configuration(format!(
                "{} environment variable not set",
                OPENROUTER_API_KEY_VAR
            ))
        })
    }

    fn build_request(&self, request: &LLMRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: convert_messages(&request.messages),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stop: if request.stop_sequences.is_empty() {
                None
            } else {
                Some(request.stop_sequences.clone())
            },
        }
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatMessageResponse>,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
    total_tokens: usize,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
    #[serde(default)]
    code: Option<serde_json::Value>,
}

fn convert_messages(messages: &[Message]) -> Vec<ChatMessage> {
    messages
        .iter()
        .map(|m| ChatMessage {
            role: m.role.as_str(),
            content: m.content.clone(),
        })
        .collect()
}

/// Turn a non-success body into a readable error.
fn parse_error_body(status: reqwest::StatusCode, body: &str) -> CompanionError {
    if let Ok(error) = serde_json::from_str::<ApiError>(body) {
        let code = error
            .error
            .code
            .map(|c| match c {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .unwrap_or_else(|| status.to_string());
        return CompanionError::Provider(format!(
            "OpenRouter API error ({}): {}",
            code, error.error.message
        ));
    }

    CompanionError::Provider(format!("OpenRouter API error ({}): {}", status, body))
}

/// Parse a successful completion body.
fn parse_completion(body: &str) -> Result<LLMResponse> {
    let response: ChatCompletionResponse = serde_json::from_str(body).map_err(|e| {
        CompanionError::Provider(format!("Failed to parse OpenRouter response: {}", e))
    })?;

    let Some(choice) = response.choices.into_iter().next() else {
        return Err(CompanionError::Provider(
            "OpenRouter API returned no choices".to_string(),
        ));
    };

    let content = choice.message.and_then(|m| m.content).unwrap_or_default();

    let usage = response.usage.map(|u| TokenUsage {
        prompt_tokens: u.prompt_tokens,
        completion_tokens: u.completion_tokens,
        total_tokens: u.total_tokens,
    });

    Ok(LLMResponse { content, usage })
}

#[async_trait]
impl LLMProvider for OpenRouterProvider {
    async fn generate_request(&self, request: &LLMRequest) -> Result<LLMResponse> {
        let api_key = self.api_key()?;
        let body = self.build_request(request);
        let url = format!("{}/chat/completions", self.base_url);

        tracing::debug!(model = %self.model, messages = body.messages.len(), "Sending chat completion");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .header("X-Title", APP_TITLE)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                CompanionError::Provider(format!("Failed to send request to OpenRouter: {}", e))
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            CompanionError::Provider(format!("Failed to read OpenRouter response: {}", e))
        })?;

        if !status.is_success() {
            return Err(parse_error_body(status, &text));
        }

        parse_completion(&text)
    }
}
