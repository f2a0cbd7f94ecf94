//! Orchestrator - turns a topic and a list of names into a ready debate

use std::sync::Arc;

use thiserror::Error;

use thinktank_core::Personality;
use thinktank_debate::{DebateEngine, DebateError, EngineConfig};
use thinktank_llm::ModelGateway;

use crate::repository::{PersonalityRepository, RepositoryError};

/// Errors from setting up a debate
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Unknown personality '{name}'. Available: {}", .available.join(", "))]
    Resolution { name: String, available: Vec<String> },

    #[error("No participants to debate")]
    EmptyParticipants,

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Engine(#[from] DebateError),
}

/// Resolves participants and hands out engines.
///
/// Cheap to share: one orchestrator (and its gateway) can start any number
/// of concurrent debates.
#[derive(Debug, Clone)]
pub struct DebateOrchestrator {
    repository: Arc<dyn PersonalityRepository>,
    gateway: Arc<ModelGateway>,
    config: EngineConfig,
}

impl DebateOrchestrator {
    pub fn new(
        repository: Arc<dyn PersonalityRepository>,
        gateway: Arc<ModelGateway>,
        config: EngineConfig,
    ) -> Self {
        Self {
            repository,
            gateway,
            config,
        }
    }

    pub fn repository(&self) -> &Arc<dyn PersonalityRepository> {
        &self.repository
    }

    pub fn gateway(&self) -> &Arc<ModelGateway> {
        &self.gateway
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolve `names` (ignoring case) and build an engine. No generation
    /// happens until the engine is pulled.
    pub async fn start_debate<S: AsRef<str>>(
        &self,
        topic: &str,
        names: &[S],
    ) -> Result<DebateEngine, OrchestratorError> {
        let mut participants = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref().trim();
            match self.repository.get(name).await? {
                Some(personality) => participants.push(personality),
                None => {
                    let available = self.repository.list().await?;
                    tracing::warn!(name, "Unknown personality requested");
                    return Err(OrchestratorError::Resolution {
                        name: name.to_string(),
                        available,
                    });
                }
            }
        }
        self.build(topic, participants)
    }

    /// Build a debate between every known personality
    pub async fn start_debate_with_all(
        &self,
        topic: &str,
    ) -> Result<DebateEngine, OrchestratorError> {
        let participants = self.repository.all().await?;
        self.build(topic, participants)
    }

    fn build(
        &self,
        topic: &str,
        participants: Vec<Personality>,
    ) -> Result<DebateEngine, OrchestratorError> {
        if participants.is_empty() {
            return Err(OrchestratorError::EmptyParticipants);
        }

        tracing::info!(
            topic,
            participants = ?participants.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
            repository = self.repository.name(),
            "Starting debate"
        );

        Ok(DebateEngine::new(
            topic,
            participants,
            self.gateway.clone(),
            self.config.clone(),
        )?)
    }
}
