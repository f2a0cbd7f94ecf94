//! # ThinkTank Debate
//!
//! Debate formats and the engine that runs a session round by round.
//!
//! ## Key Types
//!
//! - [`FormatCatalog`] — the fixed set of named round structures
//! - [`DebateEngine`] — pull-based state machine producing [`DebateEvent`]s
//! - [`RefusalDetector`] — spots content-policy refusals in generated turns
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use thinktank_core::{ModelPreference, Personality};
//! use thinktank_debate::{DebateEngine, EngineConfig};
//! use thinktank_llm::{MockProvider, ModelGateway};
//!
//! # async fn run() -> Result<(), thinktank_debate::DebateError> {
//! let gateway = Arc::new(
//!     ModelGateway::builder(ModelPreference::new("mock", "mock-1"))
//!         .provider("mock", Arc::new(MockProvider::smart()))
//!         .build(),
//! );
//! let participants = vec![
//!     Personality::new("Hume", "A sceptic", "Doubt everything."),
//!     Personality::new("Kant", "A critic of reason", "Seek the a priori."),
//! ];
//!
//! let mut engine = DebateEngine::new("Is knowledge possible?", participants, gateway, EngineConfig::default())?;
//! while let Some(event) = engine.next_event().await? {
//!     println!("{}", event);
//! }
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod event;
pub mod format;
pub mod refusal;

pub use engine::{
    abstention_line, unavailable_line, DebateEngine, DebateError, DebatePhase, DebateSession,
    EarlyTermination, EngineConfig, NeverEndEarly, RoundPolicy,
};
pub use event::{DebateEvent, EventKind};
pub use format::{DebateFormat, FormatCatalog, FormatError, RoundDescriptor};
pub use refusal::{RefusalDetector, DEFAULT_PATTERNS};
