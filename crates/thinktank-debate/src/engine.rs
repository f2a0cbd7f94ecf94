//! Debate engine - the round/turn state machine
//!
//! ```text
//! Init -> OpeningModerator -> Round(1..=max_rounds) -> ClosingModerator -> Summary -> Done
//! ```
//!
//! The engine is pull-based: every call to [`DebateEngine::next_event`]
//! advances the machine by exactly one event and makes at most one logical
//! generation call. Nothing runs ahead of the consumer, so dropping the
//! engine (or its stream) stops the debate.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::Stream;
use rand::Rng;
use thiserror::Error;
use uuid::Uuid;

use thinktank_core::{Personality, RoundContext, TranscriptEntry};
use thinktank_llm::{GatewayError, ModelGateway};

use crate::event::DebateEvent;
use crate::format::{DebateFormat, FormatCatalog, FormatError, RoundDescriptor};
use crate::refusal::RefusalDetector;

/// Errors from constructing or running a debate
#[derive(Debug, Error)]
pub enum DebateError {
    /// The final summary could not be generated
    #[error("Summary generation failed: {0}")]
    Service(#[from] GatewayError),
    #[error("Unknown debate format '{0}'")]
    UnknownFormat(String),
    #[error("Invalid round policy: {0}")]
    InvalidRoundPolicy(String),
    #[error("A debate needs at least one participant")]
    NoParticipants,
    #[error(transparent)]
    Format(#[from] FormatError),
}

/// How many rounds a session runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPolicy {
    /// One round per descriptor of the selected format
    FixedFormat,
    /// A count drawn once, uniformly from `min_rounds..=max_rounds`.
    /// Rounds past the end of the format wrap around its descriptors.
    FreeForm { min_rounds: u32, max_rounds: u32 },
}

/// Engine settings
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub round_policy: RoundPolicy,
    /// Re-generations allowed when a turn reads as a refusal
    pub max_retries: u32,
    /// Use this format instead of a random one
    pub format: Option<String>,
    pub refusals: RefusalDetector,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            round_policy: RoundPolicy::FixedFormat,
            max_retries: 1,
            format: None,
            refusals: RefusalDetector::default(),
        }
    }
}

/// Decision point consulted after every completed round
pub trait EarlyTermination: Send + Sync {
    /// Return true to skip the remaining rounds and go to closing remarks
    fn should_end_early(&self, session: &DebateSession) -> bool;
}

/// Default policy: always run every round
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverEndEarly;

impl EarlyTermination for NeverEndEarly {
    fn should_end_early(&self, _session: &DebateSession) -> bool {
        false
    }
}

/// State of one debate, owned by its engine
#[derive(Debug, Clone)]
pub struct DebateSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    topic: String,
    participants: Vec<Personality>,
    format: &'static DebateFormat,
    current_round: u32,
    max_rounds: u32,
    history: Vec<TranscriptEntry>,
}

impl DebateSession {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Participants in speaking order
    pub fn participants(&self) -> &[Personality] {
        &self.participants
    }

    pub fn format(&self) -> &'static DebateFormat {
        self.format
    }

    /// Number of completed rounds
    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    pub fn history(&self) -> &[TranscriptEntry] {
        &self.history
    }

    /// Descriptor for a 0-based round index under the session's round count
    pub fn descriptor_for(&self, round_index: u32) -> Result<&'static RoundDescriptor, DebateError> {
        let index = round_index as usize % self.format.len();
        Ok(self.format.descriptor_at(index)?)
    }
}

/// Externally visible phase of the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebatePhase {
    Init,
    OpeningModerator,
    /// 1-based round in progress
    Round(u32),
    ClosingModerator,
    Summary,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Start,
    Opening,
    RoundHeader,
    Turn(usize),
    Closing,
    Ended,
    Summary,
    Done,
}

/// Runs one debate session
pub struct DebateEngine {
    session: DebateSession,
    gateway: Arc<ModelGateway>,
    config: EngineConfig,
    early_termination: Box<dyn EarlyTermination>,
    step: Step,
}

impl DebateEngine {
    /// Create an engine, drawing the format (and free-form round count) at random
    pub fn new(
        topic: &str,
        participants: Vec<Personality>,
        gateway: Arc<ModelGateway>,
        config: EngineConfig,
    ) -> Result<Self, DebateError> {
        Self::with_rng(topic, participants, gateway, config, &mut rand::rng())
    }

    /// Create an engine using the given random source
    pub fn with_rng<R: Rng + ?Sized>(
        topic: &str,
        participants: Vec<Personality>,
        gateway: Arc<ModelGateway>,
        config: EngineConfig,
        rng: &mut R,
    ) -> Result<Self, DebateError> {
        if participants.is_empty() {
            return Err(DebateError::NoParticipants);
        }

        let catalog = FormatCatalog::builtin();
        let format = match &config.format {
            Some(name) => catalog
                .by_name(name)
                .ok_or_else(|| DebateError::UnknownFormat(name.clone()))?,
            None => catalog.select(rng),
        };

        let max_rounds = match config.round_policy {
            RoundPolicy::FixedFormat => format.len() as u32,
            RoundPolicy::FreeForm {
                min_rounds,
                max_rounds,
            } => {
                if min_rounds == 0 || min_rounds > max_rounds {
                    return Err(DebateError::InvalidRoundPolicy(format!(
                        "free-form range {}..={} must be non-empty and start at 1 or more",
                        min_rounds, max_rounds
                    )));
                }
                rng.random_range(min_rounds..=max_rounds)
            }
        };

        let session = DebateSession {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            topic: topic.to_string(),
            participants,
            format,
            current_round: 0,
            max_rounds,
            history: Vec::new(),
        };

        tracing::info!(
            session = %session.id,
            format = session.format.name,
            rounds = session.max_rounds,
            participants = session.participants.len(),
            "Debate session created"
        );

        Ok(Self {
            session,
            gateway,
            config,
            early_termination: Box::new(NeverEndEarly),
            step: Step::Start,
        })
    }

    /// Replace the early-termination policy
    pub fn with_early_termination(mut self, policy: Box<dyn EarlyTermination>) -> Self {
        self.early_termination = policy;
        self
    }

    pub fn session(&self) -> &DebateSession {
        &self.session
    }

    pub fn phase(&self) -> DebatePhase {
        match self.step {
            Step::Start => DebatePhase::Init,
            Step::Opening => DebatePhase::OpeningModerator,
            Step::RoundHeader | Step::Turn(_) => DebatePhase::Round(self.session.current_round + 1),
            Step::Closing => DebatePhase::ClosingModerator,
            Step::Ended | Step::Summary => DebatePhase::Summary,
            Step::Done => DebatePhase::Done,
        }
    }

    /// Advance by one event. `Ok(None)` once the debate is over.
    ///
    /// The only error that escapes is a failed final summary; after it the
    /// engine is done.
    pub async fn next_event(&mut self) -> Result<Option<DebateEvent>, DebateError> {
        let event = match self.step {
            Step::Start => {
                self.step = Step::Opening;
                DebateEvent::started(self.header())
            }
            Step::Opening => {
                self.step = Step::RoundHeader;
                DebateEvent::moderator(self.opening_remarks().await)
            }
            Step::RoundHeader => {
                let number = self.session.current_round + 1;
                let descriptor = self.session.descriptor_for(self.session.current_round)?;
                self.step = Step::Turn(0);
                DebateEvent::round(
                    number,
                    format!(
                        "Round {} of {}: {}\n{}",
                        number, self.session.max_rounds, descriptor.kind, descriptor.description
                    ),
                )
            }
            Step::Turn(speaker) => {
                let event = self.take_turn(speaker).await?;
                if speaker + 1 < self.session.participants.len() {
                    self.step = Step::Turn(speaker + 1);
                } else {
                    self.finish_round();
                }
                event
            }
            Step::Closing => {
                self.step = Step::Ended;
                DebateEvent::moderator(self.closing_remarks().await)
            }
            Step::Ended => {
                self.step = Step::Summary;
                DebateEvent::ended(format!(
                    "The debate has concluded after {} round(s). The moderator will now summarize.",
                    self.session.current_round
                ))
            }
            Step::Summary => {
                self.step = Step::Done;
                let summary = self
                    .gateway
                    .generate_summary(
                        &self.session.topic,
                        &self.session.history,
                        &self.session.participants,
                    )
                    .await?;
                tracing::info!(session = %self.session.id, "Debate complete");
                DebateEvent::summary(summary)
            }
            Step::Done => return Ok(None),
        };
        Ok(Some(event))
    }

    /// Consume the engine as a forward-only stream of events
    pub fn into_stream(self) -> impl Stream<Item = Result<DebateEvent, DebateError>> + Send {
        futures::stream::unfold(self, |mut engine| async move {
            match engine.next_event().await {
                Ok(Some(event)) => Some((Ok(event), engine)),
                Ok(None) => None,
                Err(e) => Some((Err(e), engine)),
            }
        })
    }

    fn finish_round(&mut self) {
        self.session.current_round += 1;
        let completed = self.session.current_round;

        if completed >= self.session.max_rounds {
            self.step = Step::Closing;
        } else if self.early_termination.should_end_early(&self.session) {
            tracing::info!(
                session = %self.session.id,
                round = completed,
                "Ending debate early"
            );
            self.step = Step::Closing;
        } else {
            self.step = Step::RoundHeader;
        }
    }

    async fn take_turn(&mut self, speaker: usize) -> Result<DebateEvent, DebateError> {
        let descriptor = self.session.descriptor_for(self.session.current_round)?;
        let context = RoundContext::new(
            self.session.current_round + 1,
            self.session.max_rounds,
            descriptor.kind,
            descriptor.description,
        );

        let response = self.generate_turn(speaker, &context).await;
        let name = self.session.participants[speaker].name.clone();
        let reply_to = self.session.history.last().map(|entry| entry.response.clone());

        self.session
            .history
            .push(TranscriptEntry::new(&name, &response, descriptor.kind));

        Ok(DebateEvent::turn(&name, response, reply_to))
    }

    /// Generate a turn, re-asking on refusals. Never fails: exhausted retries
    /// and service errors both become canned lines.
    async fn generate_turn(&self, speaker: usize, context: &RoundContext) -> String {
        let personality = &self.session.participants[speaker];
        let attempts = self.config.max_retries.saturating_add(1);

        for attempt in 1..=attempts {
            let result = self
                .gateway
                .generate(
                    personality,
                    &self.session.topic,
                    &self.session.history,
                    context,
                )
                .await;

            match result {
                Ok(text) if !self.config.refusals.is_refusal(&text) => {
                    tracing::debug!(
                        session = %self.session.id,
                        round = context.round,
                        speaker = %personality.name,
                        attempt,
                        "Turn generated"
                    );
                    return text;
                }
                Ok(text) => {
                    tracing::warn!(
                        session = %self.session.id,
                        round = context.round,
                        speaker = %personality.name,
                        attempt,
                        patterns = ?self.config.refusals.matching_patterns(&text),
                        "Refusal detected"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        session = %self.session.id,
                        round = context.round,
                        speaker = %personality.name,
                        error = %e,
                        "Turn failed, substituting"
                    );
                    return unavailable_line(&personality.name);
                }
            }
        }

        tracing::warn!(
            session = %self.session.id,
            speaker = %personality.name,
            attempts,
            "Still refusing after retries, substituting"
        );
        abstention_line(&personality.name)
    }

    async fn opening_remarks(&self) -> String {
        let format = self.session.format;
        let context = RoundContext::new(
            0,
            self.session.max_rounds,
            "moderator_opening",
            &format!(
                "Open the debate. Introduce the topic, the format ({}: {}) and the participants \
                 ({}). Do not take a side.",
                format.name,
                format.description,
                self.participant_names()
            ),
        );
        let fallback = format!(
            "Welcome to this debate on \"{}\". Let us begin.",
            self.session.topic
        );
        self.moderate(&context, fallback).await
    }

    async fn closing_remarks(&self) -> String {
        let context = RoundContext::new(
            0,
            self.session.max_rounds,
            "moderator_closing",
            "Close the rounds. Thank the participants and note the main lines of disagreement. \
             Do not declare a winner yet.",
        );
        let fallback = "That concludes the debate rounds. Thank you to all participants.".to_string();
        self.moderate(&context, fallback).await
    }

    /// Moderator generation; any failure or refusal becomes the fallback line
    async fn moderate(&self, context: &RoundContext, fallback: String) -> String {
        match self
            .gateway
            .generate_moderation(&self.session.topic, &self.session.history, context)
            .await
        {
            Ok(text) if !self.config.refusals.is_refusal(&text) => text,
            Ok(_) => {
                tracing::warn!(session = %self.session.id, segment = %context.round_type, "Moderator refused");
                fallback
            }
            Err(e) => {
                tracing::warn!(
                    session = %self.session.id,
                    segment = %context.round_type,
                    error = %e,
                    "Moderator failed"
                );
                fallback
            }
        }
    }

    fn header(&self) -> String {
        let format = self.session.format;
        format!(
            "Topic: {}\nFormat: {} ({})\nParticipants: {}\nRounds: {}",
            self.session.topic,
            format.name,
            format.description,
            self.participant_names(),
            self.session.max_rounds
        )
    }

    fn participant_names(&self) -> String {
        self.session
            .participants
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Line used when a personality keeps refusing
pub fn abstention_line(name: &str) -> String {
    format!("{} declines to address this point and yields the floor.", name)
}

/// Line used when generation fails for a personality
pub fn unavailable_line(name: &str) -> String {
    format!(
        "{} is unable to respond this round due to a technical difficulty.",
        name
    )
}
