//! Configuration management for ThinkTank
//!
//! Handles API keys, the default model, response limits and the provider
//! registry location. Everything is read once and passed into the
//! [`ModelGateway`] explicitly.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thinktank_core::ProviderConfig;

use crate::anthropic::AnthropicProvider;
use crate::gateway::ModelGateway;
use crate::mock::MockProvider;
use crate::ollama::OllamaProvider;
use crate::openai::OpenAIProvider;
use crate::provider::LlmError;
use crate::registry::ProviderRegistry;

/// Error types for configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Failed to create provider client: {0}")]
    Client(#[from] LlmError),
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// OpenAI API key (env: OPENAI_API_KEY)
    pub openai_api_key: Option<String>,
    /// Anthropic API key (env: ANTHROPIC_API_KEY)
    pub anthropic_api_key: Option<String>,
    /// Ollama base URL (default: http://localhost:11434)
    pub ollama_url: String,
    /// Default provider
    pub default_provider: String,
    /// Default model
    pub default_model: String,
    /// Temperature for the default config
    pub default_temperature: f32,
    /// Token limit for the default config
    pub default_max_tokens: u32,
    /// Longest response, in characters, that leaves the gateway
    pub max_response_chars: usize,
    /// Provider registry file
    pub models_path: PathBuf,
    /// Per-request HTTP timeout
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            anthropic_api_key: None,
            ollama_url: "http://localhost:11434".to_string(),
            default_provider: "openai".to_string(),
            default_model: "gpt-4-turbo-preview".to_string(),
            default_temperature: 0.7,
            default_max_tokens: 500,
            max_response_chars: 1900,
            models_path: PathBuf::from("config/models.json"),
            request_timeout_secs: 120,
        }
    }
}

impl LlmConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            openai_api_key: env::var("OPENAI_API_KEY").ok(),
            anthropic_api_key: env::var("ANTHROPIC_API_KEY").ok(),
            ollama_url: env::var("OLLAMA_URL").unwrap_or(defaults.ollama_url),
            default_provider: env::var("THINKTANK_DEFAULT_PROVIDER")
                .unwrap_or(defaults.default_provider),
            default_model: env::var("THINKTANK_DEFAULT_MODEL").unwrap_or(defaults.default_model),
            default_temperature: defaults.default_temperature,
            default_max_tokens: defaults.default_max_tokens,
            max_response_chars: env::var("THINKTANK_MAX_RESPONSE_CHARS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_response_chars),
            models_path: env::var("THINKTANK_MODELS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.models_path),
            request_timeout_secs: env::var("THINKTANK_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.request_timeout_secs),
        }
    }

    /// Get API key for a provider
    pub fn api_key(&self, provider: &str) -> Option<&str> {
        match provider.to_lowercase().as_str() {
            "openai" => self.openai_api_key.as_deref(),
            "anthropic" => self.anthropic_api_key.as_deref(),
            _ => None,
        }
    }

    /// Check if a provider is configured
    pub fn is_configured(&self, provider: &str) -> bool {
        match provider.to_lowercase().as_str() {
            "openai" => self.openai_api_key.is_some(),
            "anthropic" => self.anthropic_api_key.is_some(),
            "ollama" | "mock" => true, // Always available
            _ => false,
        }
    }

    /// List available providers
    pub fn available_providers(&self) -> Vec<&str> {
        let mut providers = vec!["mock", "ollama"];
        if self.openai_api_key.is_some() {
            providers.push("openai");
        }
        if self.anthropic_api_key.is_some() {
            providers.push("anthropic");
        }
        providers
    }

    /// The gateway's global default config
    pub fn default_config(&self) -> ProviderConfig {
        ProviderConfig::new(&self.default_provider, &self.default_model)
            .with_temperature(self.default_temperature)
            .with_max_tokens(self.default_max_tokens)
    }

    /// Load the provider registry, degrading to an empty one if the file
    /// is missing or malformed
    pub fn load_registry(&self) -> ProviderRegistry {
        match ProviderRegistry::load(&self.models_path) {
            Ok(registry) => registry,
            Err(e) => {
                tracing::warn!(
                    path = %self.models_path.display(),
                    error = %e,
                    "Could not load provider registry, every personality will use the default model"
                );
                ProviderRegistry::new()
            }
        }
    }

    /// Build a gateway with a client for every configured provider
    pub fn build_gateway(&self) -> Result<ModelGateway, ConfigError> {
        if !self.is_configured(&self.default_provider) {
            let var = match self.default_provider.to_lowercase().as_str() {
                "openai" => "OPENAI_API_KEY".to_string(),
                "anthropic" => "ANTHROPIC_API_KEY".to_string(),
                other => {
                    return Err(ConfigError::Invalid(format!(
                        "unknown default provider '{}'",
                        other
                    )))
                }
            };
            return Err(ConfigError::MissingEnvVar(var));
        }

        let timeout = Duration::from_secs(self.request_timeout_secs);
        let mut builder = ModelGateway::builder(self.default_config())
            .registry(self.load_registry())
            .max_response_chars(self.max_response_chars)
            .provider("mock", Arc::new(MockProvider::smart()))
            .provider("ollama", Arc::new(OllamaProvider::new(&self.ollama_url, timeout)?));

        if let Some(key) = &self.openai_api_key {
            builder = builder.provider("openai", Arc::new(OpenAIProvider::new(key, timeout)?));
        }
        if let Some(key) = &self.anthropic_api_key {
            builder = builder.provider("anthropic", Arc::new(AnthropicProvider::new(key, timeout)?));
        }

        tracing::debug!(providers = ?self.available_providers(), "Gateway configured");
        Ok(builder.build())
    }
}
