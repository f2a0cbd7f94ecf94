//! Transcript types shared by the gateway and the debate engine

use serde::{Deserialize, Serialize};

/// One personality's contribution, as recorded in a session's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Name of the personality that spoke
    pub personality: String,
    /// What it said (after truncation and any substitution)
    pub response: String,
    /// Round type tag of the round it was produced in
    pub round_type: String,
}

impl TranscriptEntry {
    /// Create a new entry
    pub fn new(personality: &str, response: &str, round_type: &str) -> Self {
        Self {
            personality: personality.to_string(),
            response: response.to_string(),
            round_type: round_type.to_string(),
        }
    }

    /// Render as a single history line, optionally tagged with the round type
    pub fn render(&self, tag_round: bool) -> String {
        if tag_round {
            format!("[{}] {}: {}", self.round_type, self.personality, self.response)
        } else {
            format!("{}: {}", self.personality, self.response)
        }
    }
}

/// Framing for the round a generation call belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundContext {
    /// 1-based round number (0 for moderator framing outside the rounds)
    pub round: u32,
    /// Total rounds in the session
    pub total_rounds: u32,
    /// Round type tag (e.g. "opening", "rebuttal")
    pub round_type: String,
    /// What participants are expected to do in this round
    pub description: String,
}

impl RoundContext {
    /// Create a round context
    pub fn new(round: u32, total_rounds: u32, round_type: &str, description: &str) -> Self {
        Self {
            round,
            total_rounds,
            round_type: round_type.to_string(),
            description: description.to_string(),
        }
    }

    /// Instruction block appended to the system prompt
    pub fn instruction(&self) -> String {
        if self.round == 0 {
            format!("Current segment: {}\n{}", self.round_type, self.description)
        } else {
            format!(
                "Current round: {} of {} ({})\n{}",
                self.round, self.total_rounds, self.round_type, self.description
            )
        }
    }
}
