//! # ThinkTank Runtime
//!
//! Personality storage and debate orchestration.

pub mod orchestrator;
pub mod repository;

pub use orchestrator::{DebateOrchestrator, OrchestratorError};
pub use repository::{
    InMemoryRepository, JsonDirectoryRepository, PersonalityRepository, RepositoryError,
};
