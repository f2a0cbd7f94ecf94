//! Model gateway - uniform generation across providers
//!
//! The gateway resolves which provider/model voices a personality, shapes the
//! request, dispatches it, falls back to the default config once on failure
//! and truncates whatever comes back.
//!
//! All state is fixed at construction; a single gateway can be shared by any
//! number of concurrently running debates.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use thinktank_core::{Personality, ProviderConfig, RoundContext, TranscriptEntry};

use crate::provider::{ChatMessage, LlmError, LlmProvider, LlmRequest};
use crate::registry::ProviderRegistry;

/// Marker appended when a response has to be cut mid-sentence
pub const ELLIPSIS: &str = "...";

/// Preferred config plus one fallback to the default
const MAX_ATTEMPTS: u32 = 2;

const SUMMARY_INSTRUCTION: &str = "You are an impartial debate moderator. Your duties are to \
    summarize the key points of the debate, identify areas of agreement and disagreement \
    between the participants, evaluate the quality of each participant's arguments, and \
    declare a winner with a clear justification.";

const MODERATOR_INSTRUCTION: &str = "You are the impartial moderator of a philosophical debate. \
    You never argue for or against any position and you do not judge the participants in these \
    remarks. Keep your remarks brief, neutral and welcoming.";

/// Gateway failures
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Both the preferred and the default config failed
    #[error("LLM service failed after {attempts} attempt(s): {source}")]
    Service {
        attempts: u32,
        #[source]
        source: LlmError,
    },
}

/// Uniform text generation over the registered providers
#[derive(Debug)]
pub struct ModelGateway {
    providers: HashMap<String, Arc<dyn LlmProvider>>,
    registry: ProviderRegistry,
    default_config: ProviderConfig,
    max_response_chars: usize,
    target_words: u32,
    tag_rounds: bool,
}

/// Builder for [`ModelGateway`]
#[derive(Debug)]
pub struct GatewayBuilder {
    providers: HashMap<String, Arc<dyn LlmProvider>>,
    registry: ProviderRegistry,
    default_config: ProviderConfig,
    max_response_chars: usize,
    target_words: u32,
    tag_rounds: bool,
}

impl GatewayBuilder {
    /// Register the client serving a provider identifier
    pub fn provider(mut self, id: &str, provider: Arc<dyn LlmProvider>) -> Self {
        self.providers.insert(id.to_string(), provider);
        self
    }

    /// Set the registry of permitted (provider, model) pairs
    pub fn registry(mut self, registry: ProviderRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Longest response, in characters, the gateway will return
    pub fn max_response_chars(mut self, limit: usize) -> Self {
        self.max_response_chars = limit;
        self
    }

    /// Word budget stated in the system instruction
    pub fn target_words(mut self, words: u32) -> Self {
        self.target_words = words;
        self
    }

    /// Prefix each history line with its round type
    pub fn tag_rounds(mut self, tag: bool) -> Self {
        self.tag_rounds = tag;
        self
    }

    pub fn build(self) -> ModelGateway {
        ModelGateway {
            providers: self.providers,
            registry: self.registry,
            default_config: self.default_config,
            max_response_chars: self.max_response_chars,
            target_words: self.target_words,
            tag_rounds: self.tag_rounds,
        }
    }
}

impl ModelGateway {
    /// Start building a gateway around its global default config
    pub fn builder(default_config: ProviderConfig) -> GatewayBuilder {
        GatewayBuilder {
            providers: HashMap::new(),
            registry: ProviderRegistry::new(),
            default_config,
            max_response_chars: 1900,
            target_words: 250,
            tag_rounds: true,
        }
    }

    pub fn default_config(&self) -> &ProviderConfig {
        &self.default_config
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn has_provider(&self, id: &str) -> bool {
        self.providers.contains_key(id)
    }

    /// First preference present in the registry, else the default config
    pub fn resolve_config(&self, personality: &Personality) -> ProviderConfig {
        personality
            .model_preferences
            .iter()
            .find(|pref| self.registry.contains(&pref.provider, &pref.model))
            .cloned()
            .unwrap_or_else(|| self.default_config.clone())
    }

    /// Generate one personality's contribution for a round
    pub async fn generate(
        &self,
        personality: &Personality,
        topic: &str,
        history: &[TranscriptEntry],
        round: &RoundContext,
    ) -> Result<String, GatewayError> {
        let config = self.resolve_config(personality);
        let system = format!(
            "{}\n\nResponse guidelines:\n\
             - Keep your response under {} words.\n\
             - Address the other participants directly and keep a respectful, engaged tone.\n\
             - Do not prefix your response with your own name.\n\n\
             {}",
            personality.composed_system_prompt(),
            self.target_words,
            round.instruction()
        );
        let prompt = format!(
            "As {}, provide your response to the debate topic and previous arguments. \
             Be true to your perspective and engage with the previous arguments.",
            personality.name
        );

        let request =
            LlmRequest::new(&system, &prompt, config).with_history(self.linearize(topic, history));
        let text = self.complete_with_fallback(request).await?;
        Ok(self.truncate(&text))
    }

    /// Generate the closing summary and verdict with the default config
    pub async fn generate_summary(
        &self,
        topic: &str,
        history: &[TranscriptEntry],
        participants: &[Personality],
    ) -> Result<String, GatewayError> {
        let names = participants
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let prompt = format!(
            "Please provide a comprehensive summary of the debate between {}, highlighting the \
             main arguments, points of agreement, areas of contention and the strength of each \
             argument. Finish by declaring a winner and explaining why.",
            names
        );

        let request = LlmRequest::new(SUMMARY_INSTRUCTION, &prompt, self.default_config.clone())
            .with_history(self.linearize(topic, history));
        let text = self.complete_with_fallback(request).await?;
        Ok(self.truncate(&text))
    }

    /// Generate neutral moderator remarks for an opening or closing segment.
    ///
    /// Uses the default config and none of the debater framing.
    pub async fn generate_moderation(
        &self,
        topic: &str,
        history: &[TranscriptEntry],
        segment: &RoundContext,
    ) -> Result<String, GatewayError> {
        let system = format!("{}\n\n{}", MODERATOR_INSTRUCTION, segment.instruction());
        let prompt = "As the moderator, deliver your remarks for this segment of the debate.";

        let request = LlmRequest::new(&system, prompt, self.default_config.clone())
            .with_history(self.linearize(topic, history));
        let text = self.complete_with_fallback(request).await?;
        Ok(self.truncate(&text))
    }

    /// Cut a response down to the configured limit
    pub fn truncate(&self, text: &str) -> String {
        truncate_at_sentence(text, self.max_response_chars)
    }

    /// Topic turn followed by one turn per transcript entry
    fn linearize(&self, topic: &str, history: &[TranscriptEntry]) -> Vec<ChatMessage> {
        let opening = if history.is_empty() {
            format!("Debate topic: {}\n\nNo arguments have been made yet.", topic)
        } else {
            format!("Debate topic: {}\n\nPrevious debate history:", topic)
        };

        std::iter::once(ChatMessage::user(opening))
            .chain(
                history
                    .iter()
                    .map(|entry| ChatMessage::assistant(entry.render(self.tag_rounds))),
            )
            .collect()
    }

    /// Try the request's config, then the default config once.
    async fn complete_with_fallback(&self, mut request: LlmRequest) -> Result<String, GatewayError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.dispatch(request.clone()).await {
                Ok(content) => return Ok(content),
                Err(e) if attempt < MAX_ATTEMPTS && request.config != self.default_config => {
                    tracing::warn!(
                        provider = %request.config.provider,
                        model = %request.config.model,
                        error = %e,
                        "Preferred model failed, falling back to default"
                    );
                    request.config = self.default_config.clone();
                }
                Err(e) => {
                    tracing::error!(
                        provider = %request.config.provider,
                        model = %request.config.model,
                        attempts = attempt,
                        error = %e,
                        "Generation failed"
                    );
                    return Err(GatewayError::Service {
                        attempts: attempt,
                        source: e,
                    });
                }
            }
        }
    }

    async fn dispatch(&self, request: LlmRequest) -> Result<String, LlmError> {
        let provider = self
            .providers
            .get(&request.config.provider)
            .ok_or_else(|| LlmError::UnknownProvider(request.config.provider.clone()))?;

        let response = provider.complete(request).await?;
        if response.content.trim().is_empty() {
            return Err(LlmError::InvalidResponse("empty completion".to_string()));
        }

        tracing::debug!(
            provider = %provider.name(),
            model = %response.model,
            latency_ms = response.latency_ms,
            tokens = ?response.tokens_used,
            "Generation complete"
        );
        Ok(response.content)
    }
}

/// Cut `text` to at most `limit` characters.
///
/// Prefers the last sentence end (`.`, `!` or `?` followed by whitespace or
/// the end of the text) within the limit; without one, hard-cuts and appends
/// [`ELLIPSIS`].
pub fn truncate_at_sentence(text: &str, limit: usize) -> String {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    if chars.len() <= limit {
        return text.to_string();
    }

    let boundary = (0..limit).rev().find(|&i| {
        matches!(chars[i].1, '.' | '!' | '?')
            && chars.get(i + 1).map_or(true, |(_, next)| next.is_whitespace())
    });

    match boundary {
        Some(i) => {
            let (offset, c) = chars[i];
            text[..offset + c.len_utf8()].to_string()
        }
        None => format!("{}{}", &text[..chars[limit].0], ELLIPSIS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockProvider;
    use thinktank_core::ModelPreference;

    fn registry() -> ProviderRegistry {
        ProviderRegistry::new()
            .with_models("openai", ["model-a"])
            .with_models("anthropic", ["model-b"])
    }

    fn default_config() -> ProviderConfig {
        ModelPreference::new("openai", "default-model")
    }

    fn round() -> RoundContext {
        RoundContext::new(1, 3, "opening", "State your position.")
    }

    #[test]
    fn test_resolve_skips_unregistered_preferences() {
        let gateway = ModelGateway::builder(default_config())
            .registry(registry())
            .build();
        let personality = Personality::new("Kant", "", "")
            .with_preference(ModelPreference::new("openai", "model-b"))
            .with_preference(ModelPreference::new("mistral", "model-a"))
            .with_preference(ModelPreference::new("anthropic", "model-b"));

        let config = gateway.resolve_config(&personality);
        assert_eq!(config.provider, "anthropic");
        assert_eq!(config.model, "model-b");
        assert_eq!(gateway.resolve_config(&personality), config);
    }

    #[test]
    fn test_resolve_without_preferences_uses_default() {
        let gateway = ModelGateway::builder(default_config())
            .registry(registry())
            .build();
        let personality = Personality::new("Hume", "", "");

        assert_eq!(gateway.resolve_config(&personality), default_config());
    }

    #[test]
    fn test_truncate_cuts_at_sentence_boundary() {
        assert_eq!(
            truncate_at_sentence("Sentence one. Sentence two. Overflow...", 20),
            "Sentence one."
        );
    }

    #[test]
    fn test_truncate_without_boundary_appends_ellipsis() {
        assert_eq!(
            truncate_at_sentence("NoPeriodsAtAllOverflowingText", 10),
            "NoPeriodsA..."
        );
    }

    #[test]
    fn test_truncate_leaves_short_text_alone() {
        assert_eq!(truncate_at_sentence("Short.", 20), "Short.");
        assert_eq!(truncate_at_sentence("", 0), "");
    }

    #[test]
    fn test_truncate_ignores_decimal_points() {
        assert_eq!(
            truncate_at_sentence("Pi is about 3.14159 and more", 15),
            "Pi is about 3.1..."
        );
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate_at_sentence("Ünïcödé wörds hère", 5), "Ünïcö...");
    }

    #[tokio::test]
    async fn test_fallback_depth_is_one() {
        let preferred = Arc::new(MockProvider::failing());
        let fallback = Arc::new(MockProvider::failing());
        let gateway = ModelGateway::builder(default_config())
            .registry(registry())
            .provider("anthropic", preferred.clone())
            .provider("openai", fallback.clone())
            .build();
        let personality = Personality::new("Kant", "", "")
            .with_preference(ModelPreference::new("anthropic", "model-b"))
            .with_preference(ModelPreference::new("openai", "model-a"));

        let err = gateway
            .generate(&personality, "Is lying ever permitted?", &[], &round())
            .await
            .unwrap_err();

        let GatewayError::Service { attempts, .. } = err;
        assert_eq!(attempts, 2);
        assert_eq!(preferred.calls() + fallback.calls(), 2);
        assert_eq!(preferred.calls(), 1);
    }

    #[tokio::test]
    async fn test_default_config_is_not_retried() {
        let provider = Arc::new(MockProvider::failing());
        let gateway = ModelGateway::builder(default_config())
            .provider("openai", provider.clone())
            .build();

        let result = gateway
            .generate(&Personality::new("Hume", "", ""), "topic", &[], &round())
            .await;

        assert!(matches!(result, Err(GatewayError::Service { attempts: 1, .. })));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_falls_back_to_default_on_failure() {
        let preferred = Arc::new(MockProvider::failing());
        let fallback = Arc::new(MockProvider::constant("The default model answers."));
        let gateway = ModelGateway::builder(default_config())
            .registry(registry())
            .provider("anthropic", preferred.clone())
            .provider("openai", fallback.clone())
            .build();
        let personality = Personality::new("Kant", "", "")
            .with_preference(ModelPreference::new("anthropic", "model-b"));

        let text = gateway
            .generate(&personality, "topic", &[], &round())
            .await
            .unwrap();

        assert_eq!(text, "The default model answers.");
        let requests = fallback.requests().await;
        assert_eq!(requests[0].config.model, "default-model");
    }

    #[tokio::test]
    async fn test_unregistered_client_triggers_fallback() {
        let fallback = Arc::new(MockProvider::constant("Fallback."));
        let gateway = ModelGateway::builder(default_config())
            .registry(registry())
            .provider("openai", fallback.clone())
            .build();
        let personality = Personality::new("Kant", "", "")
            .with_preference(ModelPreference::new("anthropic", "model-b"));

        let text = gateway
            .generate(&personality, "topic", &[], &round())
            .await
            .unwrap();
        assert_eq!(text, "Fallback.");
        assert_eq!(fallback.calls(), 1);
    }

    #[tokio::test]
    async fn test_request_shape() {
        let provider = Arc::new(MockProvider::constant("Reply."));
        let gateway = ModelGateway::builder(default_config())
            .provider("openai", provider.clone())
            .build();
        let history = vec![
            TranscriptEntry::new("Plato", "Forms are real.", "opening"),
            TranscriptEntry::new("Aristotle", "Substance is primary.", "opening"),
        ];

        gateway
            .generate(&Personality::new("Hume", "Sceptic", ""), "Universals", &history, &round())
            .await
            .unwrap();

        let request = &provider.requests().await[0];
        assert!(request.system.starts_with("You are Hume,"));
        assert!(request.system.contains("Current round: 1 of 3 (opening)"));
        assert_eq!(request.history.len(), 3);
        assert!(request.history[0].content.starts_with("Debate topic: Universals"));
        assert_eq!(request.history[1].content, "[opening] Plato: Forms are real.");
        assert!(request.prompt.starts_with("As Hume,"));
    }

    #[tokio::test]
    async fn test_responses_are_truncated() {
        let provider = Arc::new(MockProvider::constant("First point. Second point goes on."));
        let gateway = ModelGateway::builder(default_config())
            .provider("openai", provider)
            .max_response_chars(15)
            .build();

        let text = gateway
            .generate(&Personality::new("Hume", "", ""), "topic", &[], &round())
            .await
            .unwrap();
        assert_eq!(text, "First point.");

        let summary = gateway.generate_summary("topic", &[], &[]).await.unwrap();
        assert_eq!(summary, "First point.");
    }

    #[tokio::test]
    async fn test_empty_completion_is_a_failure() {
        let gateway = ModelGateway::builder(default_config())
            .provider("openai", Arc::new(MockProvider::constant("   ")))
            .build();

        let result = gateway.generate_summary("topic", &[], &[]).await;
        assert!(matches!(
            result,
            Err(GatewayError::Service { source: LlmError::InvalidResponse(_), .. })
        ));
    }

    #[tokio::test]
    async fn test_moderation_skips_debater_framing() {
        let provider = Arc::new(MockProvider::constant("Welcome."));
        let gateway = ModelGateway::builder(default_config())
            .provider("openai", provider.clone())
            .build();
        let segment = RoundContext::new(0, 3, "moderator_opening", "Introduce the topic.");

        let text = gateway
            .generate_moderation("Universals", &[], &segment)
            .await
            .unwrap();
        assert_eq!(text, "Welcome.");

        let request = &provider.requests().await[0];
        assert_eq!(request.config, default_config());
        assert!(request.system.starts_with("You are the impartial moderator"));
        assert!(request.system.contains("Current segment: moderator_opening\nIntroduce the topic."));
        assert!(!request.system.contains("philosophical thinker"));
        assert!(!request.system.contains("Stay true to your philosophical perspective"));
        assert!(request.prompt.starts_with("As the moderator,"));
        assert!(request.history[0].content.starts_with("Debate topic: Universals"));
    }

    #[tokio::test]
    async fn test_summary_uses_default_config() {
        let provider = Arc::new(MockProvider::constant("Summary."));
        let gateway = ModelGateway::builder(default_config())
            .provider("openai", provider.clone())
            .build();
        let participants = vec![Personality::new("Plato", "", ""), Personality::new("Hume", "", "")];

        gateway.generate_summary("topic", &[], &participants).await.unwrap();

        let request = &provider.requests().await[0];
        assert_eq!(request.config, default_config());
        assert!(request.system.contains("declare a winner"));
        assert!(request.prompt.contains("Plato, Hume"));
    }
}
