//! Personality types for ThinkTank
//!
//! A [`Personality`] is a debating agent: a persona-defining prompt plus an
//! ordered list of [`ModelPreference`]s saying which provider should voice it.

use serde::{Deserialize, Deserializer, Serialize};

/// Placeholder rendered for optional fields that are absent
const NOT_SPECIFIED: &str = "Not specified";

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    500
}

/// Personality files written by hand use `null` and omission interchangeably
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A provider/model pair a personality would like to be generated with.
///
/// The gateway uses the same type for its resolved configuration, see
/// [`ProviderConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPreference {
    /// Provider identifier (e.g. "openai", "anthropic")
    pub provider: String,
    /// Model identifier within the provider
    #[serde(alias = "model_name")]
    pub model: String,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl ModelPreference {
    /// Create a preference with default sampling settings
    pub fn new(provider: &str, model: &str) -> Self {
        Self {
            provider: provider.to_string(),
            model: model.to_string(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }

    /// Override the temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Override the token limit
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Configuration actually used for one generation call
pub type ProviderConfig = ModelPreference;

/// A configured debating agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    /// Display name, unique case-insensitively
    pub name: String,
    /// Short description of who this is
    pub description: String,
    /// Persona-specific instructions appended to the composed prompt
    pub system_prompt: String,
    /// School of thought, if any
    #[serde(default)]
    pub philosophical_school: Option<String>,
    /// Thinkers this personality draws on, in order of influence
    #[serde(default, deserialize_with = "null_as_empty")]
    pub key_philosophers: Vec<String>,
    /// Beliefs the personality argues from
    #[serde(default, deserialize_with = "null_as_empty")]
    pub core_beliefs: Vec<String>,
    /// How the personality tends to argue
    #[serde(default)]
    pub debate_style: Option<String>,
    /// Provider preferences in priority order
    #[serde(default, deserialize_with = "null_as_empty")]
    pub model_preferences: Vec<ModelPreference>,
}

impl Personality {
    /// Create a personality with only the required fields set
    pub fn new(name: &str, description: &str, system_prompt: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            system_prompt: system_prompt.to_string(),
            philosophical_school: None,
            key_philosophers: Vec::new(),
            core_beliefs: Vec::new(),
            debate_style: None,
            model_preferences: Vec::new(),
        }
    }

    /// Add a model preference at the lowest priority
    pub fn with_preference(mut self, preference: ModelPreference) -> Self {
        self.model_preferences.push(preference);
        self
    }

    /// Lowercase lookup key
    pub fn key(&self) -> String {
        self.name.to_lowercase()
    }

    /// Build the full system prompt from every field.
    ///
    /// Pure: the same fields always produce the same bytes.
    pub fn composed_system_prompt(&self) -> String {
        let influences = if self.key_philosophers.is_empty() {
            NOT_SPECIFIED.to_string()
        } else {
            self.key_philosophers.join(", ")
        };

        let beliefs = if self.core_beliefs.is_empty() {
            NOT_SPECIFIED.to_string()
        } else {
            self.core_beliefs
                .iter()
                .map(|belief| format!("- {}", belief))
                .collect::<Vec<_>>()
                .join("\n")
        };

        format!(
            "You are {name}, a philosophical thinker with the following characteristics:\n\n\
             Description: {description}\n\n\
             Philosophical School: {school}\n\n\
             Key Influences: {influences}\n\n\
             Core Beliefs:\n{beliefs}\n\n\
             Debate Style: {style}\n\n\
             Additional Instructions:\n\
             1. Stay true to your philosophical perspective\n\
             2. Engage directly with other arguments\n\
             3. Use examples and analogies to illustrate your points\n\
             4. Be passionate but respectful\n\
             5. Reference relevant philosophical concepts and thinkers\n\
             6. Maintain consistency with your stated beliefs and style\n\n\
             {system_prompt}",
            name = self.name,
            description = self.description,
            school = self.philosophical_school.as_deref().unwrap_or(NOT_SPECIFIED),
            influences = influences,
            beliefs = beliefs,
            style = self.debate_style.as_deref().unwrap_or(NOT_SPECIFIED),
            system_prompt = self.system_prompt,
        )
    }
}
