//! Debate command - stream a debate to the terminal
//!
//! Usage:
//! ```bash
//! thinktank debate "Is virtue teachable?" --debaters socrates,confucius
//! thinktank debate "Is virtue teachable?" --format socratic --free-form 3..6 --json
//! ```

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use futures::StreamExt;

use thinktank_debate::{DebateEvent, EngineConfig, EventKind, RoundPolicy};
use thinktank_llm::LlmConfig;
use thinktank_runtime::{DebateOrchestrator, JsonDirectoryRepository};

/// Longest quote of the previous turn shown above a reply
const QUOTE_CHARS: usize = 100;

/// Inclusive round range, written `MIN..MAX`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundRange {
    pub min: u32,
    pub max: u32,
}

impl FromStr for RoundRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (min, max) = s
            .split_once("..")
            .ok_or_else(|| format!("expected MIN..MAX, got '{}'", s))?;
        let min: u32 = min.trim().parse().map_err(|_| format!("invalid minimum '{}'", min))?;
        let max: u32 = max
            .trim()
            .trim_start_matches('=')
            .parse()
            .map_err(|_| format!("invalid maximum '{}'", max))?;
        if min == 0 || min > max {
            return Err(format!("range {}..{} must satisfy 1 <= MIN <= MAX", min, max));
        }
        Ok(Self { min, max })
    }
}

/// Arguments for the debate command
#[derive(Args)]
pub struct DebateArgs {
    /// Topic to debate
    topic: String,

    /// Comma-separated personality names (default: every personality)
    #[arg(long, value_delimiter = ',')]
    debaters: Vec<String>,

    /// Debate format (default: chosen at random)
    #[arg(long)]
    format: Option<String>,

    /// Run a random number of rounds in MIN..MAX instead of the format's count
    #[arg(long, value_name = "MIN..MAX")]
    free_form: Option<RoundRange>,

    /// Re-generations allowed when a personality refuses
    #[arg(long, default_value_t = 1)]
    max_retries: u32,

    /// Provider for the moderator and for fallbacks
    #[arg(long, env = "THINKTANK_DEFAULT_PROVIDER")]
    provider: Option<String>,

    /// Model for the moderator and for fallbacks
    #[arg(long, env = "THINKTANK_DEFAULT_MODEL")]
    model: Option<String>,

    /// Print one JSON event per line
    #[arg(long)]
    json: bool,
}

/// Run the debate command
pub async fn run(args: DebateArgs, personalities_dir: &Path) -> Result<()> {
    let mut llm = LlmConfig::from_env();
    if let Some(provider) = args.provider {
        llm.default_provider = provider;
    }
    if let Some(model) = args.model {
        llm.default_model = model;
    }
    let gateway = llm.build_gateway().with_context(|| {
        format!(
            "Cannot use '{}' as the default provider (try --provider mock --model mock-1)",
            llm.default_provider
        )
    })?;

    let repository = JsonDirectoryRepository::open(personalities_dir)
        .await
        .with_context(|| format!("Failed to open {}", personalities_dir.display()))?;

    let config = EngineConfig {
        round_policy: match args.free_form {
            Some(range) => RoundPolicy::FreeForm {
                min_rounds: range.min,
                max_rounds: range.max,
            },
            None => RoundPolicy::FixedFormat,
        },
        max_retries: args.max_retries,
        format: args.format,
        ..EngineConfig::default()
    };

    let orchestrator = DebateOrchestrator::new(Arc::new(repository), Arc::new(gateway), config);
    let engine = if args.debaters.is_empty() {
        orchestrator.start_debate_with_all(&args.topic).await?
    } else {
        orchestrator.start_debate(&args.topic, args.debaters.as_slice()).await?
    };

    let mut events = std::pin::pin!(engine.into_stream());
    while let Some(event) = events.next().await {
        let event = event.context("Debate aborted")?;
        if args.json {
            println!("{}", serde_json::to_string(&event)?);
        } else {
            render(&event);
        }
    }

    Ok(())
}

/// Headers open a new section; everything else reads as a threaded reply
fn render(event: &DebateEvent) {
    if event.is_header() {
        println!();
        println!("{}", event.title.bold().cyan());
        println!("{}", "═".repeat(50).cyan());
        println!("{}", event.body);
        return;
    }

    match &event.kind {
        EventKind::Moderator => {
            println!();
            println!("{} {}", "🎙".yellow(), event.title.bold().yellow());
        }
        EventKind::FinalSummary => {
            println!();
            println!("{}", event.title.bold().magenta());
            println!("{}", "═".repeat(50).magenta());
        }
        _ => {
            println!();
            if let Some(previous) = &event.reply_to {
                println!("  {} {}", "↳".dimmed(), quote(previous).dimmed().italic());
            }
            println!("{}", event.title.bold().green());
        }
    }
    println!("{}", event.body);
}

fn quote(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() > QUOTE_CHARS || line.len() < text.len() {
        let cut: String = line.chars().take(QUOTE_CHARS).collect();
        format!("{}...", cut.trim_end())
    } else {
        line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_range_parsing() {
        assert_eq!("3..6".parse(), Ok(RoundRange { min: 3, max: 6 }));
        assert_eq!("2..=2".parse(), Ok(RoundRange { min: 2, max: 2 }));
        assert!("6..3".parse::<RoundRange>().is_err());
        assert!("0..3".parse::<RoundRange>().is_err());
        assert!("3".parse::<RoundRange>().is_err());
    }

    #[test]
    fn test_quote_shortens() {
        assert_eq!(quote("Short."), "Short.");
        assert_eq!(quote("First line.\nSecond."), "First line....");
        let long = "word ".repeat(40);
        assert!(quote(&long).chars().count() <= QUOTE_CHARS + 3);
    }
}
