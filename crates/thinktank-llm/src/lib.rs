//! # ThinkTank LLM
//!
//! Provider integrations and the [`ModelGateway`] that debates generate
//! through.
//!
//! ## Supported Backends
//!
//! | Provider | Type | Key Required |
//! |----------|------|--------------|
//! | OpenAI | API | `OPENAI_API_KEY` |
//! | Anthropic | API | `ANTHROPIC_API_KEY` |
//! | Ollama | Local | None |
//! | Mock | Testing | None |
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use thinktank_core::{ModelPreference, Personality, RoundContext};
//! use thinktank_llm::{MockProvider, ModelGateway};
//!
//! #[tokio::main]
//! async fn main() {
//!     let gateway = ModelGateway::builder(ModelPreference::new("mock", "mock-1"))
//!         .provider("mock", Arc::new(MockProvider::smart()))
//!         .build();
//!
//!     let socrates = Personality::new("Socrates", "Athenian gadfly", "Ask questions.");
//!     let round = RoundContext::new(1, 3, "opening", "State your position.");
//!     let text = gateway
//!         .generate(&socrates, "What is justice?", &[], &round)
//!         .await
//!         .unwrap();
//!     println!("{}", text);
//! }
//! ```
//!
//! ## Provider Preferences
//!
//! A personality lists `(provider, model)` preferences in priority order. The
//! gateway picks the first one present in the [`ProviderRegistry`]; if none
//! is, or if the chosen one fails, it uses its default config (once).

pub mod anthropic;
pub mod config;
pub mod gateway;
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod provider;
pub mod registry;

pub use anthropic::AnthropicProvider;
pub use config::{ConfigError, LlmConfig};
pub use gateway::{truncate_at_sentence, GatewayBuilder, GatewayError, ModelGateway, ELLIPSIS};
pub use mock::MockProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAIProvider;
pub use provider::{ChatMessage, ChatRole, LlmError, LlmProvider, LlmRequest, LlmResponse};
pub use registry::ProviderRegistry;
