//! Anthropic Messages API provider

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::provider::{ChatRole, LlmError, LlmProvider, LlmRequest, LlmResponse};

const API_VERSION: &str = "2023-06-01";

/// Messages API request format
#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<AnthropicMessage>,
    temperature: f32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
struct AnthropicMessage {
    role: ChatRole,
    content: String,
}

/// Messages API response format
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    model: String,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

/// Anthropic provider.
///
/// The Messages API takes the system prompt out of band and expects turns
/// to alternate starting with the user, so history is reshaped here.
#[derive(Debug)]
pub struct AnthropicProvider {
    api_key: String,
    client: reqwest::Client,
    base_url: String,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider with a per-request timeout
    pub fn new(api_key: &str, timeout: Duration) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            api_key: api_key.to_string(),
            client,
            base_url: "https://api.anthropic.com".to_string(),
        })
    }

    /// Set a custom base URL
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    /// Merge consecutive same-role turns and make sure the first turn is the user's
    fn messages(request: &LlmRequest) -> Vec<AnthropicMessage> {
        let turns = request
            .history
            .iter()
            .map(|m| (m.role, m.content.as_str()))
            .chain(std::iter::once((ChatRole::User, request.prompt.as_str())));

        let mut messages: Vec<AnthropicMessage> = Vec::new();
        for (role, content) in turns {
            if messages.is_empty() && role == ChatRole::Assistant {
                messages.push(AnthropicMessage {
                    role: ChatRole::User,
                    content: "Debate transcript so far:".to_string(),
                });
            }

            match messages.last_mut() {
                Some(last) if last.role == role => {
                    last.content.push_str("\n\n");
                    last.content.push_str(content);
                }
                _ => {
                    messages.push(AnthropicMessage {
                        role,
                        content: content.to_string(),
                    });
                }
            }
        }
        messages
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = Instant::now();
        let url = format!("{}/v1/messages", self.base_url);

        let body = AnthropicRequest {
            model: request.config.model.clone(),
            max_tokens: request.config.max_tokens,
            system: request.system.clone(),
            messages: Self::messages(&request),
            temperature: request.config.temperature,
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::ConnectionFailed(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimited);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::RequestFailed(format!(
                "Status: {}, Body: {}",
                status, body
            )));
        }

        let api_response: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let content = api_response
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        Ok(LlmResponse {
            content,
            model: api_response.model,
            tokens_used: api_response
                .usage
                .map(|u| u.input_tokens + u.output_tokens),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}
