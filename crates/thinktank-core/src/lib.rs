//! # ThinkTank Core
//!
//! Core types shared across the ThinkTank crates:
//! - [`Personality`] — a debating agent and its composed system prompt
//! - [`ModelPreference`] — provider/model priority entries ([`ProviderConfig`])
//! - [`TranscriptEntry`] — one recorded turn of a debate
//! - [`RoundContext`] — framing for the round a generation belongs to

pub mod personality;
pub mod transcript;

pub use personality::{ModelPreference, Personality, ProviderConfig};
pub use transcript::{RoundContext, TranscriptEntry};
