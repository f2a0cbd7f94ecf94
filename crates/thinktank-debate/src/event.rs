//! Events emitted by the debate engine

use serde::Serialize;
use std::fmt;

/// What an event represents
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    /// Session header: topic, format, participants
    DebateStarted,
    /// Moderator narration (opening or closing)
    Moderator,
    /// Start of a 1-based round
    Round { number: u32 },
    /// One personality's turn
    Turn { personality: String },
    /// All rounds are over
    DebateEnded,
    /// Moderator summary and verdict, always last
    FinalSummary,
}

/// A single record of the debate stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebateEvent {
    #[serde(flatten)]
    pub kind: EventKind,
    /// Rendered title (`DEBATE_STARTED`, `ROUND_2`, a personality name, ...)
    pub title: String,
    pub body: String,
    /// Text this event replies to, for threading consumers
    pub reply_to: Option<String>,
}

impl DebateEvent {
    fn new(kind: EventKind, body: String, reply_to: Option<String>) -> Self {
        let title = match &kind {
            EventKind::DebateStarted => "DEBATE_STARTED".to_string(),
            EventKind::Moderator => "MODERATOR".to_string(),
            EventKind::Round { number } => format!("ROUND_{}", number),
            EventKind::Turn { personality } => personality.clone(),
            EventKind::DebateEnded => "DEBATE_ENDED".to_string(),
            EventKind::FinalSummary => "FINAL_SUMMARY".to_string(),
        };
        Self {
            kind,
            title,
            body,
            reply_to,
        }
    }

    pub fn started(body: String) -> Self {
        Self::new(EventKind::DebateStarted, body, None)
    }

    pub fn moderator(body: String) -> Self {
        Self::new(EventKind::Moderator, body, None)
    }

    pub fn round(number: u32, body: String) -> Self {
        Self::new(EventKind::Round { number }, body, None)
    }

    pub fn turn(personality: &str, body: String, reply_to: Option<String>) -> Self {
        Self::new(
            EventKind::Turn {
                personality: personality.to_string(),
            },
            body,
            reply_to,
        )
    }

    pub fn ended(body: String) -> Self {
        Self::new(EventKind::DebateEnded, body, None)
    }

    pub fn summary(body: String) -> Self {
        Self::new(EventKind::FinalSummary, body, None)
    }

    /// Section headers start a new message; everything else is threaded
    pub fn is_header(&self) -> bool {
        matches!(
            self.kind,
            EventKind::DebateStarted | EventKind::Round { .. } | EventKind::DebateEnded
        )
    }
}

impl fmt::Display for DebateEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "**{}**: {}", self.title, self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_titles() {
        assert_eq!(DebateEvent::started(String::new()).title, "DEBATE_STARTED");
        assert_eq!(DebateEvent::round(3, String::new()).title, "ROUND_3");
        assert_eq!(DebateEvent::turn("Kant", String::new(), None).title, "Kant");
        assert_eq!(DebateEvent::summary(String::new()).title, "FINAL_SUMMARY");
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let event = DebateEvent::turn("Kant", "Act only...".to_string(), Some("Prior".to_string()));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "turn");
        assert_eq!(json["personality"], "Kant");
        assert_eq!(json["title"], "Kant");
        assert_eq!(json["reply_to"], "Prior");
    }

    #[test]
    fn test_headers() {
        assert!(DebateEvent::round(1, String::new()).is_header());
        assert!(!DebateEvent::moderator(String::new()).is_header());
        assert!(!DebateEvent::summary(String::new()).is_header());
    }
}
