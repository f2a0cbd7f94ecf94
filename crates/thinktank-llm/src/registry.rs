//! Provider registry: which models each provider is allowed to serve

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::config::ConfigError;

/// Mapping from provider identifier to its permitted model identifiers.
///
/// Loaded once from a JSON document of the form
/// `{ "openai": ["gpt-4o"], "anthropic": ["claude-3-5-sonnet-latest"] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, BTreeSet<String>>,
}

impl ProviderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add models for a provider
    pub fn with_models<I, S>(mut self, provider: &str, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.providers
            .entry(provider.to_string())
            .or_default()
            .extend(models.into_iter().map(Into::into));
        self
    }

    /// Parse a registry from JSON
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a registry file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&contents)
    }

    /// Whether the (provider, model) pair is permitted
    pub fn contains(&self, provider: &str, model: &str) -> bool {
        self.providers
            .get(provider)
            .is_some_and(|models| models.contains(model))
    }

    /// Registered provider identifiers, sorted
    pub fn providers(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    /// Models registered for a provider, sorted
    pub fn models(&self, provider: &str) -> Vec<&str> {
        self.providers
            .get(provider)
            .map(|models| models.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
